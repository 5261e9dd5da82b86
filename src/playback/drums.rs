//! Drum and click tracks
//!
//! Fixed per-measure patterns derived from each measure's numerator:
//! - Hi-hat on every beat
//! - Bass drum on beat 1
//! - Snare on the last beat, with a 2/3 + 1/3 fill on every fourth measure
//!   in even meters
//! - Cymbal on the even beats in even meters, on the first and last beat in
//!   odd meters

use crate::progression::Measure;
use super::types::{Instrument, MusicData, Note, Track};

/// Calls `f(measure_number, measure, measure_start)` for every measure, with
/// 1-based measure numbers and start times in seconds.
fn for_each_measure(measures: &[Measure], beat_duration: f64, mut f: impl FnMut(usize, &Measure, f64)) {
    let mut current_time = 0.0;
    for (index, measure) in measures.iter().enumerate() {
        f(index + 1, measure, current_time);
        current_time += measure.duration(beat_duration);
    }
}

/// One measure of clicks in the first measure's meter, or `None` when there
/// are no measures.
pub fn count_in(measures: &[Measure], tempo: f64, beat_duration: f64) -> Option<MusicData> {
    let first = measures.first()?;
    let beats = first.numerator();
    let notes = (0..beats)
        .map(|beat| Note::unpitched(beat as f64 * beat_duration, beat_duration))
        .collect();
    Some(MusicData {
        tempo,
        duration: first.duration(beat_duration),
        tracks: vec![Track::new(Instrument::CountIn, notes)],
        measure_timings: Vec::new(),
    })
}

pub fn hihat_track(measures: &[Measure], beat_duration: f64) -> Track {
    let mut notes = Vec::new();
    for_each_measure(measures, beat_duration, |_, measure, start| {
        for beat in 0..measure.numerator() {
            notes.push(Note::unpitched(start + beat as f64 * beat_duration, beat_duration));
        }
    });
    Track::new(Instrument::HiHat, notes)
}

pub fn bass_drum_track(measures: &[Measure], beat_duration: f64) -> Track {
    let mut notes = Vec::new();
    for_each_measure(measures, beat_duration, |_, _, start| {
        notes.push(Note::unpitched(start, beat_duration));
    });
    Track::new(Instrument::BassDrum, notes)
}

/// Snare on the last beat of each measure
///
/// In even meters, every measure whose 1-based number is a multiple of 4 splits
/// the last beat into a 2/3-beat hit followed by a 1/3-beat hit.
pub fn snare_drum_track(measures: &[Measure], beat_duration: f64) -> Track {
    let mut notes = Vec::new();
    for_each_measure(measures, beat_duration, |number, measure, start| {
        let numerator = measure.numerator();
        let last_beat = start + (numerator - 1) as f64 * beat_duration;

        if numerator % 2 == 0 && number % 4 == 0 {
            let long = beat_duration * (2.0 / 3.0);
            let short = beat_duration * (1.0 / 3.0);
            notes.push(Note::unpitched(last_beat, long));
            notes.push(Note::unpitched(last_beat + long, short));
        } else {
            notes.push(Note::unpitched(last_beat, beat_duration));
        }
    });
    Track::new(Instrument::SnareDrum, notes)
}

pub fn cymbal_track(measures: &[Measure], beat_duration: f64) -> Track {
    let mut notes = Vec::new();
    for_each_measure(measures, beat_duration, |_, measure, start| {
        let numerator = measure.numerator();
        if numerator % 2 == 0 {
            // Beats 2, 4, 6, ... (0-indexed 1, 3, 5, ...)
            for beat in (1..numerator).step_by(2) {
                notes.push(Note::unpitched(start + beat as f64 * beat_duration, beat_duration));
            }
        } else {
            notes.push(Note::unpitched(start, beat_duration));
            if numerator > 1 {
                let last_beat = start + (numerator - 1) as f64 * beat_duration;
                notes.push(Note::unpitched(last_beat, beat_duration));
            }
        }
    });
    Track::new(Instrument::Cymbal, notes)
}
