//! Playback data type definitions
//!
//! This module defines the arranged performance handed from the arrangement
//! engine to the scheduler. All times are in seconds.

use serde::Serialize;
use std::fmt;

use crate::pitch::Pitch;

/// Velocity used by every generated note.
pub const DEFAULT_VELOCITY: f32 = 1.0;

/// Sound source a track plays through
///
/// Each variant maps to a key in the host's sound registry (see [`Instrument::key`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instrument {
    Piano,
    Bass,
    #[serde(rename = "hihat")]
    HiHat,
    Cymbal,
    BassDrum,
    SnareDrum,
    /// Count-in click (finger snap)
    #[serde(rename = "finger")]
    CountIn,
}

impl Instrument {
    /// Key into the external sound-source registry.
    pub fn key(&self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Bass => "bass",
            Instrument::HiHat => "hihat",
            Instrument::Cymbal => "cymbal",
            Instrument::BassDrum => "bass-drum",
            Instrument::SnareDrum => "snare-drum",
            Instrument::CountIn => "finger",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

/// A single note event
///
/// # Fields
/// - `start_time`: Seconds from the start of the section (count-in or main loop)
/// - `duration`: Seconds
/// - `pitch`: Octave-qualified pitch, `None` for unpitched percussion and clicks
/// - `velocity`: 0.0 to 1.0
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub start_time: f64,
    pub duration: f64,
    pub pitch: Option<Pitch>,
    pub velocity: f32,
}

impl Note {
    pub fn pitched(start_time: f64, duration: f64, pitch: Pitch) -> Self {
        Note {
            start_time,
            duration,
            pitch: Some(pitch),
            velocity: DEFAULT_VELOCITY,
        }
    }

    pub fn unpitched(start_time: f64, duration: f64) -> Self {
        Note {
            start_time,
            duration,
            pitch: None,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

/// One instrument's notes, in the order they were generated (chronological).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub instrument: Instrument,
    pub notes: Vec<Note>,
}

impl Track {
    pub fn new(instrument: Instrument, notes: Vec<Note>) -> Self {
        Track { instrument, notes }
    }
}

/// Start time of a measure within the main loop, for position highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureTiming {
    pub index: usize,
    pub start_time: f64,
}

/// A self-contained section of the performance (count-in or main loop)
///
/// # Fields
/// - `tempo`: BPM the section was arranged at
/// - `duration`: Section length in seconds; loop iterations are this far apart
/// - `tracks`: One track per instrument
/// - `measure_timings`: Start of each measure, indices 0..K-1 in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicData {
    pub tempo: f64,
    pub duration: f64,
    pub tracks: Vec<Track>,
    pub measure_timings: Vec<MeasureTiming>,
}

impl MusicData {
    /// Track for an instrument, if the section has one.
    pub fn track(&self, instrument: Instrument) -> Option<&Track> {
        self.tracks.iter().find(|track| track.instrument == instrument)
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|track| track.notes.len()).sum()
    }
}

/// Everything the scheduler needs to play a progression
///
/// The count-in plays once; the main loop repeats once per requested loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayableSequence {
    pub main_loop_data: MusicData,
    pub count_in_data: Option<MusicData>,
}

impl PlayableSequence {
    /// Seconds of count-in before the first loop iteration.
    pub fn count_in_duration(&self) -> f64 {
        self.count_in_data.as_ref().map_or(0.0, |data| data.duration)
    }

    /// Seconds from the first count-in click to the end of the last loop.
    pub fn total_duration(&self, loop_count: u32) -> f64 {
        self.count_in_duration() + self.main_loop_data.duration * loop_count as f64
    }
}
