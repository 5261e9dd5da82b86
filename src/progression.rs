//! # Chord Progression Types
//!
//! The user-facing score: a title, a tempo and an ordered list of measures,
//! each measure holding one chord-symbol slot per beat.
//!
//! ```text
//! ChordProgression
//!   ├── title: String
//!   ├── tempo: f64 (BPM, > 0)
//!   └── Vec<Measure>
//!         ├── numerator / denominator (time signature, both > 0)
//!         └── chords: Vec<String>   (len == numerator, "" = hold previous chord)
//! ```
//!
//! Both types are values. Every edit returns a new progression and leaves the
//! original untouched, so a snapshot taken when playback starts cannot be
//! changed underneath the scheduler.
//!
//! The serialized form of [`ChordProgression`] is the exchange format
//! (see [`crate::json`]).

use serde::Serialize;

use crate::error::AccompError;

/// Most beats a single measure may hold.
pub const MAX_BEATS_PER_MEASURE: u32 = 64;

/// One measure: a time signature and one chord slot per beat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    numerator: u32,
    denominator: u32,
    chords: Vec<String>,
}

impl Measure {
    /// Build a measure, requiring exactly `numerator` chord slots.
    pub fn new(numerator: u32, denominator: u32, chords: Vec<String>) -> Result<Self, AccompError> {
        check_time_signature(numerator, denominator)?;
        if chords.len() != numerator as usize {
            return Err(AccompError::ChordSlotMismatch {
                numerator,
                slots: chords.len(),
            });
        }
        Ok(Measure {
            numerator,
            denominator,
            chords,
        })
    }

    /// A measure with every slot empty.
    pub fn empty(numerator: u32, denominator: u32) -> Result<Self, AccompError> {
        check_time_signature(numerator, denominator)?;
        Self::new(numerator, denominator, vec![String::new(); numerator as usize])
    }

    /// Build a measure, padding missing slots with "" and dropping extra ones.
    pub fn fitted(
        numerator: u32,
        denominator: u32,
        mut chords: Vec<String>,
    ) -> Result<Self, AccompError> {
        check_time_signature(numerator, denominator)?;
        chords.resize(numerator as usize, String::new());
        Self::new(numerator, denominator, chords)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn chords(&self) -> &[String] {
        &self.chords
    }

    /// Chord symbol in a beat slot (0-indexed). Empty string means "hold".
    pub fn chord(&self, beat: usize) -> Option<&str> {
        self.chords.get(beat).map(String::as_str)
    }

    /// Length of the measure in seconds for a given beat length.
    pub fn duration(&self, beat_duration: f64) -> f64 {
        self.numerator as f64 * beat_duration
    }

    /// Copy of this measure with one slot replaced.
    pub fn with_chord(&self, beat: usize, chord: impl Into<String>) -> Option<Self> {
        if beat >= self.chords.len() {
            return None;
        }
        let mut chords = self.chords.clone();
        chords[beat] = chord.into();
        Some(Measure {
            numerator: self.numerator,
            denominator: self.denominator,
            chords,
        })
    }

    /// Copy of this measure with every slot rewritten by `f`.
    pub fn map_chords(&self, f: impl FnMut(&String) -> String) -> Self {
        Measure {
            numerator: self.numerator,
            denominator: self.denominator,
            chords: self.chords.iter().map(f).collect(),
        }
    }
}

fn check_time_signature(numerator: u32, denominator: u32) -> Result<(), AccompError> {
    if numerator == 0 || denominator == 0 || numerator > MAX_BEATS_PER_MEASURE {
        return Err(AccompError::InvalidTimeSignature {
            numerator,
            denominator,
        });
    }
    Ok(())
}

fn check_tempo(tempo: f64) -> Result<(), AccompError> {
    if !tempo.is_finite() || tempo <= 0.0 {
        return Err(AccompError::InvalidTempo(tempo));
    }
    Ok(())
}

/// A titled chord progression at a fixed tempo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordProgression {
    title: String,
    tempo: f64,
    measures: Vec<Measure>,
}

impl ChordProgression {
    pub fn new(
        title: impl Into<String>,
        tempo: f64,
        measures: Vec<Measure>,
    ) -> Result<Self, AccompError> {
        check_tempo(tempo)?;
        Ok(ChordProgression {
            title: title.into(),
            tempo,
            measures,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// Seconds per beat. Every track generator uses this same value.
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.tempo
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        ChordProgression {
            title: title.into(),
            ..self.clone()
        }
    }

    pub fn with_tempo(&self, tempo: f64) -> Result<Self, AccompError> {
        check_tempo(tempo)?;
        Ok(ChordProgression {
            tempo,
            ..self.clone()
        })
    }

    /// Replace the measure list wholesale.
    pub fn with_measures(&self, measures: Vec<Measure>) -> Self {
        ChordProgression {
            measures,
            ..self.clone()
        }
    }

    /// Append an empty measure in the given time signature.
    pub fn with_measure_appended(&self, numerator: u32, denominator: u32) -> Result<Self, AccompError> {
        let mut measures = self.measures.clone();
        measures.push(Measure::empty(numerator, denominator)?);
        Ok(self.with_measures(measures))
    }

    /// Set the chord symbol of one beat slot.
    pub fn with_chord(
        &self,
        measure: usize,
        beat: usize,
        chord: impl Into<String>,
    ) -> Result<Self, AccompError> {
        let target = self.measure_at(measure)?;
        let edited = target.with_chord(beat, chord).ok_or_else(|| AccompError::MeasureError {
            measure: measure + 1,
            message: format!("beat {} is out of range", beat + 1),
        })?;
        let mut measures = self.measures.clone();
        measures[measure] = edited;
        Ok(self.with_measures(measures))
    }

    /// Insert a copy of a measure directly after it.
    pub fn with_measure_copied_after(&self, measure: usize) -> Result<Self, AccompError> {
        let copy = self.measure_at(measure)?.clone();
        let mut measures = self.measures.clone();
        measures.insert(measure + 1, copy);
        Ok(self.with_measures(measures))
    }

    /// Append a copy of a measure at the end.
    pub fn with_measure_copied_to_end(&self, measure: usize) -> Result<Self, AccompError> {
        let copy = self.measure_at(measure)?.clone();
        let mut measures = self.measures.clone();
        measures.push(copy);
        Ok(self.with_measures(measures))
    }

    pub fn without_measure(&self, measure: usize) -> Result<Self, AccompError> {
        self.measure_at(measure)?;
        let mut measures = self.measures.clone();
        measures.remove(measure);
        Ok(self.with_measures(measures))
    }

    fn measure_at(&self, measure: usize) -> Result<&Measure, AccompError> {
        self.measures.get(measure).ok_or_else(|| AccompError::MeasureError {
            measure: measure + 1,
            message: format!("no such measure (progression has {})", self.measures.len()),
        })
    }
}
