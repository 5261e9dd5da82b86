//! Pitch classes, octave-qualified pitches and the 88-key range table.
//!
//! Pitch arithmetic is done in semitones. Names are only produced at the
//! edges: [`PitchClass::name`] spells D#, G# and A# as Eb, Ab and Bb, while
//! C# and F# stay sharp. The same spelling is used for octave-qualified
//! pitches, so `Pitch::to_string()` yields names like `Eb1`, `F#3` or `C8`.
//!
//! ## Key Index
//! The range table is the grand piano keyboard, A0 through C8. Key index 0 is
//! A0 (MIDI 21) and key index 87 is C8 (MIDI 108). Voice-leading distances in
//! [`crate::playback`] are measured in key indices.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::AccompError;

/// Number of keys in the range table (A0..C8).
pub const KEY_COUNT: usize = 88;

/// MIDI number of A0, the lowest key.
const LOWEST_KEY_MIDI: i32 = 21;

/// One of the twelve pitch classes, independent of octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in semitone order starting from C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Pitch class for a semitone offset from C. Wraps in both directions.
    pub fn from_semitone(semitone: i32) -> Self {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    /// Semitones above C (0..=11).
    pub fn semitone(self) -> i32 {
        self as i32
    }

    /// Read a pitch class name such as `"C"`, `"F#"` or `"Bb"`.
    ///
    /// Accepts naturals, the five sharps and the five flats that name black
    /// keys. Spellings like `"E#"` or `"Cb"` are rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "C" => PitchClass::C,
            "C#" | "Db" => PitchClass::CSharp,
            "D" => PitchClass::D,
            "D#" | "Eb" => PitchClass::DSharp,
            "E" => PitchClass::E,
            "F" => PitchClass::F,
            "F#" | "Gb" => PitchClass::FSharp,
            "G" => PitchClass::G,
            "G#" | "Ab" => PitchClass::GSharp,
            "A" => PitchClass::A,
            "A#" | "Bb" => PitchClass::ASharp,
            "B" => PitchClass::B,
            _ => return None,
        };
        Some(class)
    }

    /// Display name: flats for Eb, Ab and Bb, sharps for C# and F#.
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "Ab",
            PitchClass::A => "A",
            PitchClass::ASharp => "Bb",
            PitchClass::B => "B",
        }
    }

    /// Name spelled with sharps only (`C#`, `D#`, `F#`, `G#`, `A#`).
    pub fn sharp_name(self) -> &'static str {
        match self {
            PitchClass::DSharp => "D#",
            PitchClass::GSharp => "G#",
            PitchClass::ASharp => "A#",
            other => other.name(),
        }
    }

    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_semitone(self.semitone() + semitones)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PitchClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// An octave-qualified pitch such as `C4` (middle C, MIDI 60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    pub fn new(class: PitchClass, octave: i8) -> Self {
        Pitch { class, octave }
    }

    /// MIDI note number (C4 = 60).
    pub fn midi(self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.class.semitone()
    }

    pub fn from_midi(midi: i32) -> Self {
        Pitch {
            class: PitchClass::from_semitone(midi),
            octave: (midi.div_euclid(12) - 1) as i8,
        }
    }

    /// Position in the 88-key range table, or `None` if off the keyboard.
    pub fn key_index(self) -> Option<usize> {
        let index = self.midi() - LOWEST_KEY_MIDI;
        if (0..KEY_COUNT as i32).contains(&index) {
            Some(index as usize)
        } else {
            None
        }
    }

    pub fn from_key_index(index: usize) -> Option<Self> {
        if index < KEY_COUNT {
            Some(Self::from_midi(index as i32 + LOWEST_KEY_MIDI))
        } else {
            None
        }
    }

    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_midi(self.midi() + semitones)
    }

    /// Read a pitch such as `"C4"`, `"Eb1"`, `"F#3"` or `"D#1"`.
    pub fn parse(text: &str) -> Result<Self, AccompError> {
        let text = text.trim();
        let split = text
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| AccompError::InvalidPitch(text.to_string()))?;
        let (name, octave) = text.split_at(split);
        let class =
            PitchClass::from_name(name).ok_or_else(|| AccompError::InvalidPitch(text.to_string()))?;
        let octave: i8 = octave
            .parse()
            .map_err(|_| AccompError::InvalidPitch(text.to_string()))?;
        Ok(Pitch { class, octave })
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.midi().cmp(&other.midi())
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class.name(), self.octave)
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> Self {
        pitch.to_string()
    }
}

impl TryFrom<String> for Pitch {
    type Error = AccompError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pitch::parse(&value)
    }
}

/// The 88 keys from A0 to C8, lowest first.
pub fn keyboard() -> impl Iterator<Item = Pitch> {
    (0..KEY_COUNT).filter_map(Pitch::from_key_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_prefer_flats_for_eb_ab_bb() {
        let names: Vec<&str> = PitchClass::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"]
        );
    }

    #[test]
    fn test_from_name_accepts_both_spellings() {
        assert_eq!(PitchClass::from_name("Db"), Some(PitchClass::CSharp));
        assert_eq!(PitchClass::from_name("C#"), Some(PitchClass::CSharp));
        assert_eq!(PitchClass::from_name("A#"), Some(PitchClass::ASharp));
        assert_eq!(PitchClass::from_name("Bb"), Some(PitchClass::ASharp));
        assert_eq!(PitchClass::from_name("E#"), None);
        assert_eq!(PitchClass::from_name("H"), None);
    }

    #[test]
    fn test_transpose_wraps() {
        assert_eq!(PitchClass::B.transpose(1), PitchClass::C);
        assert_eq!(PitchClass::C.transpose(-1), PitchClass::B);
        assert_eq!(PitchClass::G.transpose(-19), PitchClass::C);
    }

    #[test]
    fn test_key_indices_of_landmarks() {
        assert_eq!(Pitch::parse("A0").unwrap().key_index(), Some(0));
        assert_eq!(Pitch::parse("Eb1").unwrap().key_index(), Some(6));
        assert_eq!(Pitch::parse("E1").unwrap().key_index(), Some(7));
        assert_eq!(Pitch::parse("Eb2").unwrap().key_index(), Some(18));
        assert_eq!(Pitch::parse("C3").unwrap().key_index(), Some(27));
        assert_eq!(Pitch::parse("F3").unwrap().key_index(), Some(32));
        assert_eq!(Pitch::parse("C8").unwrap().key_index(), Some(87));
        assert_eq!(Pitch::parse("G#0").unwrap().key_index(), None);
    }

    #[test]
    fn test_keyboard_table() {
        let keys: Vec<String> = keyboard().map(|p| p.to_string()).collect();
        assert_eq!(keys.len(), KEY_COUNT);
        assert_eq!(keys[0], "A0");
        assert_eq!(keys[1], "Bb0");
        assert_eq!(keys[3], "C1");
        assert_eq!(keys[87], "C8");
    }

    #[test]
    fn test_parse_accepts_sharp_spelling() {
        let pitch = Pitch::parse("D#1").unwrap();
        assert_eq!(pitch.to_string(), "Eb1");
        assert!(Pitch::parse("X4").is_err());
        assert!(Pitch::parse("C").is_err());
    }

    #[test]
    fn test_midi_numbers() {
        let a4 = Pitch::new(PitchClass::A, 4);
        assert_eq!(a4.midi(), 69);
        let c4 = Pitch::new(PitchClass::C, 4);
        assert_eq!(c4.midi(), 60);
        assert_eq!(Pitch::from_midi(60), c4);
        assert_eq!(Pitch::from_midi(11).to_string(), "B-1");
    }

    #[test]
    fn test_pitch_ordering_follows_midi() {
        let b2 = Pitch::new(PitchClass::B, 2);
        let c3 = Pitch::new(PitchClass::C, 3);
        assert!(b2 < c3);
    }

    #[test]
    fn test_serializes_as_name() {
        let pitch = Pitch::new(PitchClass::GSharp, 2);
        assert_eq!(serde_json::to_string(&pitch).unwrap(), "\"Ab2\"");
        let back: Pitch = serde_json::from_str("\"G#2\"").unwrap();
        assert_eq!(back, pitch);
    }
}
