//! # Playback Module
//!
//! Arrange chord progressions into a backing band and schedule it for audio playback.
//!
//! ## Purpose
//! This module turns a [`ChordProgression`](crate::progression::ChordProgression) into:
//! 1. **Arranged tracks** - piano block chords, a walking bass line, hi-hat, cymbal,
//!    bass drum and snare, plus a one-measure count-in
//! 2. **Timed audio triggers** - every note at an absolute time on the audio clock,
//!    repeated for each loop
//! 3. **Position updates** - measure-change events for highlighting the current bar
//!
//! ## Sub-modules
//! - `types` - Note, Track, MusicData, PlayableSequence type definitions
//! - `chord_parser` - Chord symbol parsing (C, Am7, G7(b9), F/A, etc.)
//! - `voicing` - Octave placement on the 88-key range table
//! - `drums` - Count-in, hi-hat, cymbal, bass drum and snare patterns
//! - `walking_bass` - Walking bass line with chromatic approach notes
//! - `engine` - Main arrangement logic
//! - `audio` - Audio backend trait and the owned audio engine
//! - `offline` - Recording backend for tests and dry runs
//! - `scheduler` - Absolute-time scheduling, loops, cancellation and position cues
//!
//! ## Key Types
//! - [`PlayableSequence`] - Count-in plus main loop, ready to schedule
//! - [`ParsedChord`] - Pitch classes of one chord symbol
//! - [`AudioEngine`] - Owner of the audio backend (init/dispose lifecycle)
//! - [`PlaybackScheduler`] - Play, stop and poll for [`PlaybackEvent`]s
//!
//! ## Entry Points
//! - [`create_playable_sequence()`] - Arrange a progression
//! - [`PlaybackScheduler::play()`] - Schedule it on an initialised engine
//!
//! ## Example
//! ```rust
//! use accomp::playback::{
//!     create_playable_sequence, AudioEngine, OfflineBackend, PlaybackEvent, PlaybackScheduler,
//! };
//! use accomp::progression::{ChordProgression, Measure};
//!
//! let slots = |c: &str| vec![c.to_string(), String::new(), String::new(), String::new()];
//! let progression = ChordProgression::new(
//!     "Two Bar",
//!     120.0,
//!     vec![
//!         Measure::new(4, 4, slots("C")).unwrap(),
//!         Measure::new(4, 4, slots("G7")).unwrap(),
//!     ],
//! )
//! .unwrap();
//! let sequence = create_playable_sequence(&progression);
//!
//! let mut engine = AudioEngine::new();
//! engine.init(|| Ok(OfflineBackend::new())).unwrap();
//! let mut scheduler = PlaybackScheduler::default();
//! scheduler.play(&mut engine, &sequence, 1).unwrap();
//! assert!(scheduler.is_playing());
//!
//! // Count-in is 2s, so measure 0 starts at 2.1s
//! let events = scheduler.poll(2.2);
//! assert_eq!(events, vec![PlaybackEvent::MeasureChanged { index: 0 }]);
//! ```
//!
//! ## Timing
//!
//! Arrangement times are seconds relative to the start of a section (count-in
//! or one pass of the main loop). The scheduler adds a single anchor taken from
//! the audio clock when play is pressed, so loops never drift against each
//! other.
//!
//! ## Pitch Spelling
//!
//! Pitch classes are computed in semitones and spelled at the edges with flats
//! for Eb, Ab and Bb and sharps for C# and F#.

mod types;
mod chord_parser;
mod voicing;
mod drums;
mod walking_bass;
mod engine;
mod audio;
mod offline;
mod scheduler;

#[cfg(test)]
mod tests;

pub use types::{
    Instrument, MeasureTiming, MusicData, Note, PlayableSequence, Track, DEFAULT_VELOCITY,
};
pub use chord_parser::{parse_chord, ParsedChord};
pub use voicing::{assign_octaves, find_closest_octave, voice_chord};
pub use drums::{bass_drum_track, count_in, cymbal_track, hihat_track, snare_drum_track};
pub use walking_bass::walking_bass_track;
pub use engine::{
    create_playable_sequence, create_playable_sequence_with, ArrangementOptions,
    DEFAULT_PIANO_LOWEST_OCTAVE,
};
pub use audio::{AudioBackend, AudioEngine, Voice, DEFAULT_MASTER_VOLUME};
pub use offline::{OfflineBackend, OfflineVoice, TriggerRecord};
pub use scheduler::{
    PlaybackEvent, PlaybackScheduler, SchedulerOptions, DEFAULT_COMPLETION_GRACE, DEFAULT_LEAD_IN,
};
