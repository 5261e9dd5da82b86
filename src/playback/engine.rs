//! Arrangement engine
//!
//! Turns a chord progression into a [`PlayableSequence`]: a one-measure
//! count-in plus the main loop with hi-hat, piano, bass drum, snare, cymbal and
//! walking bass tracks, all timed in seconds from the start of their section.

use log::debug;

use crate::progression::{ChordProgression, Measure};
use super::chord_parser::parse_chord;
use super::drums::{bass_drum_track, count_in, cymbal_track, hihat_track, snare_drum_track};
use super::types::{Instrument, MeasureTiming, MusicData, Note, PlayableSequence, Track};
use super::voicing::voice_chord;
use super::walking_bass::walking_bass_track;

/// Default floor octave for piano voicings.
pub const DEFAULT_PIANO_LOWEST_OCTAVE: i8 = 3;

/// Knobs for the arrangement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrangementOptions {
    /// Octave the piano block chords are stacked up from.
    pub piano_lowest_octave: i8,
    /// Whether to generate the one-measure count-in.
    pub count_in: bool,
}

impl Default for ArrangementOptions {
    fn default() -> Self {
        ArrangementOptions {
            piano_lowest_octave: DEFAULT_PIANO_LOWEST_OCTAVE,
            count_in: true,
        }
    }
}

/// Piano block chords: one beat per non-empty slot, held slots stay silent.
fn piano_track(measures: &[Measure], beat_duration: f64, lowest_octave: i8) -> Track {
    let mut notes = Vec::new();
    let mut current_time = 0.0;
    for measure in measures {
        for (beat, symbol) in measure.chords().iter().enumerate() {
            if symbol.is_empty() {
                continue;
            }
            let Some(chord) = parse_chord(symbol) else {
                debug!("Piano skips unparseable chord {:?}", symbol);
                continue;
            };
            let start = current_time + beat as f64 * beat_duration;
            notes.extend(
                voice_chord(&chord, lowest_octave)
                    .into_iter()
                    .map(|pitch| Note::pitched(start, beat_duration, pitch)),
            );
        }
        current_time += measure.duration(beat_duration);
    }
    Track::new(Instrument::Piano, notes)
}

/// Cumulative start time of every measure.
fn measure_timings(measures: &[Measure], beat_duration: f64) -> Vec<MeasureTiming> {
    let mut start_time = 0.0;
    measures
        .iter()
        .enumerate()
        .map(|(index, measure)| {
            let timing = MeasureTiming { index, start_time };
            start_time += measure.duration(beat_duration);
            timing
        })
        .collect()
}

/// Arrange a progression with the default options
///
/// Never fails: chords that cannot be parsed are left silent.
///
/// # Example
/// ```
/// use accomp::playback::{create_playable_sequence, Instrument};
/// use accomp::progression::{ChordProgression, Measure};
///
/// let measure = Measure::new(4, 4, vec!["C".into(), "".into(), "".into(), "".into()]).unwrap();
/// let progression = ChordProgression::new("Demo", 120.0, vec![measure]).unwrap();
/// let sequence = create_playable_sequence(&progression);
///
/// assert_eq!(sequence.main_loop_data.duration, 2.0);
/// assert_eq!(sequence.count_in_duration(), 2.0);
/// assert_eq!(sequence.main_loop_data.track(Instrument::Piano).unwrap().notes.len(), 3);
/// ```
pub fn create_playable_sequence(progression: &ChordProgression) -> PlayableSequence {
    create_playable_sequence_with(progression, &ArrangementOptions::default())
}

pub fn create_playable_sequence_with(
    progression: &ChordProgression,
    options: &ArrangementOptions,
) -> PlayableSequence {
    let tempo = progression.tempo();
    let beat_duration = progression.beat_duration();
    let measures = progression.measures();

    let count_in_data = if options.count_in {
        count_in(measures, tempo, beat_duration)
    } else {
        None
    };

    let tracks = vec![
        hihat_track(measures, beat_duration),
        piano_track(measures, beat_duration, options.piano_lowest_octave),
        bass_drum_track(measures, beat_duration),
        snare_drum_track(measures, beat_duration),
        cymbal_track(measures, beat_duration),
        walking_bass_track(measures, beat_duration),
    ];

    let duration: f64 = measures.iter().map(|m| m.duration(beat_duration)).sum();

    PlayableSequence {
        main_loop_data: MusicData {
            tempo,
            duration,
            tracks,
            measure_timings: measure_timings(measures, beat_duration),
        },
        count_in_data,
    }
}
