//! Octave placement over the 88-key range table.
//!
//! Two strategies:
//! - [`assign_octaves`] stacks pitch classes upward from a floor octave
//!   (piano block chords).
//! - [`find_closest_octave`] picks the octave nearest the previous note
//!   (bass voice leading).

use log::debug;

use crate::pitch::{keyboard, Pitch, PitchClass, KEY_COUNT};
use super::chord_parser::ParsedChord;

/// First note of a bass line lands in E1..=Eb2, the open-E-string register.
const FIRST_BASS_LOW: Pitch = Pitch { class: PitchClass::E, octave: 1 };
const FIRST_BASS_HIGH: Pitch = Pitch { class: PitchClass::DSharp, octave: 2 };

fn class_at(index: usize) -> Option<PitchClass> {
    Pitch::from_key_index(index).map(|pitch| pitch.class)
}

/// Stack pitch classes upward starting from the first key of `lowest_octave`
///
/// Each class takes its next occurrence strictly above the previous note, so
/// the result is always ascending and as low as possible.
///
/// Classes that would land above C8 are dropped. A floor octave below the
/// keyboard starts at A0; one above it yields no notes.
///
/// # Example
/// ```
/// use accomp::pitch::PitchClass;
/// use accomp::playback::assign_octaves;
///
/// let voicing = assign_octaves(&[PitchClass::C, PitchClass::E, PitchClass::G], 3);
/// let names: Vec<String> = voicing.iter().map(|p| p.to_string()).collect();
/// assert_eq!(names, vec!["C3", "E3", "G3"]);
/// ```
pub fn assign_octaves(pitch_classes: &[PitchClass], lowest_octave: i8) -> Vec<Pitch> {
    let mut cursor: Option<usize> = match keyboard().position(|key| key.octave == lowest_octave) {
        Some(0) => None,
        Some(first) => Some(first - 1),
        None if lowest_octave < 0 => None,
        None => return Vec::new(),
    };

    let mut pitches = Vec::with_capacity(pitch_classes.len());
    for &class in pitch_classes {
        let from = cursor.map_or(0, |c| c + 1);
        match (from..KEY_COUNT).find(|&index| class_at(index) == Some(class)) {
            Some(index) => {
                pitches.push(Pitch::from_key_index(index).unwrap_or(Pitch::new(class, lowest_octave)));
                cursor = Some(index);
            }
            None => debug!("No room above the voicing for {}", class),
        }
    }
    pitches
}

/// Voice a parsed chord as an ascending block chord.
pub fn voice_chord(chord: &ParsedChord, lowest_octave: i8) -> Vec<Pitch> {
    assign_octaves(&chord.pitch_classes(), lowest_octave)
}

/// Pick the occurrence of `target` closest to `last` on the keyboard
///
/// Distance is measured in key indices (semitones). When two occurrences are
/// equally close (a tritone up or down) the lower one wins.
///
/// Without a previous note the target is placed in the E1..=Eb2 window, which
/// holds exactly one occurrence of every pitch class.
///
/// # Example
/// ```
/// use accomp::pitch::{Pitch, PitchClass};
/// use accomp::playback::find_closest_octave;
///
/// let g2 = Pitch::parse("G2").unwrap();
/// assert_eq!(find_closest_octave(Some(g2), PitchClass::C).to_string(), "C3");
/// assert_eq!(find_closest_octave(None, PitchClass::C).to_string(), "C2");
/// ```
pub fn find_closest_octave(last: Option<Pitch>, target: PitchClass) -> Pitch {
    let last = match last {
        Some(pitch) => pitch,
        None => {
            return keyboard()
                .filter(|key| *key >= FIRST_BASS_LOW && *key <= FIRST_BASS_HIGH)
                .find(|key| key.class == target)
                .unwrap_or(Pitch::new(target, 1));
        }
    };

    let mut best: Option<(Pitch, i32)> = None;
    for key in keyboard().filter(|key| key.class == target) {
        let distance = (key.midi() - last.midi()).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((key, distance)),
        }
    }
    best.map_or(Pitch::new(target, last.octave), |(pitch, _)| pitch)
}
