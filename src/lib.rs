pub mod config;
pub mod error;
pub mod json;
pub mod pitch;
pub mod playback;
pub mod progression;
pub mod transpose;

pub use config::EngineConfig;
pub use error::*;
pub use json::{export_progression, import_progression, ImportOutcome};
pub use pitch::{Pitch, PitchClass};
pub use playback::{create_playable_sequence, parse_chord, PlayableSequence};
pub use progression::{ChordProgression, Measure};
pub use transpose::transpose_progression;

/// Arrange a progression file into playable sequence JSON.
/// This is the main entry point for the library.
pub fn arrange(source: &str) -> Result<String, AccompError> {
    arrange_with(source, &EngineConfig::default())
}

/// Arrange with explicit engine settings (piano octave, count-in)
pub fn arrange_with(source: &str, config: &EngineConfig) -> Result<String, AccompError> {
    let outcome = import_progression(source)?;
    let sequence = playback::create_playable_sequence_with(&outcome.progression, &config.arrangement);
    serde_json::to_string_pretty(&sequence).map_err(|e| AccompError::ExportError(e.to_string()))
}

/// Transpose a progression file by `semitones` and return it in the same format
pub fn transpose_file(source: &str, semitones: i32) -> Result<String, AccompError> {
    let outcome = import_progression(source)?;
    export_progression(&transpose_progression(&outcome.progression, semitones))
}
