//! Chord symbol parsing for accompaniment
//!
//! Parses chord symbols (C, Am7, G7(b9), F/A, etc.) into pitch classes.
//! Octaves are assigned later by the voicing module.

use log::{debug, warn};
use serde::Serialize;

use crate::pitch::PitchClass;

/// A parsed chord symbol.
///
/// `third` and `fifth` hold the chord's third and fifth or whatever stands in
/// for them (the 4th of a sus4, the flat fifth of a m7b5, ...). `extra_tones`
/// holds sevenths, sixths and tensions in the order they were found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedChord {
    pub root: PitchClass,
    pub third: PitchClass,
    pub fifth: PitchClass,
    pub extra_tones: Vec<PitchClass>,
    /// Slash bass (`Am/G` → G), if one was written.
    pub bass: Option<PitchClass>,
}

impl ParsedChord {
    /// All pitch classes without duplicates: slash bass first, then root,
    /// third, fifth and extra tones.
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let mut classes = Vec::with_capacity(4 + self.extra_tones.len());
        let ordered = self
            .bass
            .into_iter()
            .chain([self.root, self.third, self.fifth])
            .chain(self.extra_tones.iter().copied());
        for class in ordered {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }

    /// Display names of [`pitch_classes`](Self::pitch_classes).
    pub fn names(&self) -> Vec<&'static str> {
        self.pitch_classes().into_iter().map(PitchClass::name).collect()
    }

    /// The note a bass player lands on: the slash bass if present, else the root.
    pub fn bass_root(&self) -> PitchClass {
        self.bass.unwrap_or(self.root)
    }
}

/// Alternate spellings rewritten before structural parsing. Order matters.
const SPELLINGS: &[(&str, &str)] = &[
    ("♭", "b"),
    ("♯", "#"),
    ("（", "("),
    ("）", ")"),
    ("，", ","),
    ("△", "maj"),
    ("ø7", "m7b5"),
    ("ø", "m7b5"),
    ("°", "dim"),
    ("-", "m"),
    ("min", "m"),
    ("mM7", "mMaj7"),
    ("M7", "maj7"),
    ("m7(b5)", "m7b5"),
    ("6/9", "69"),
    ("o", "dim"),
];

fn normalize(symbol: &str) -> String {
    let mut text: String = symbol.chars().filter(|c| !c.is_whitespace()).collect();
    for (from, to) in SPELLINGS {
        if text.contains(from) {
            text = text.replace(from, to);
        }
    }
    text
}

/// Semitone offsets from the root for each core chord type.
fn core_intervals(core: &str) -> Option<&'static [i32]> {
    let intervals: &'static [i32] = match core {
        "" | "M" | "maj" => &[0, 4, 7],
        "m" => &[0, 3, 7],
        "maj7" => &[0, 4, 7, 11],
        "7" => &[0, 4, 7, 10],
        "m7" => &[0, 3, 7, 10],
        "m7b5" => &[0, 3, 6, 10],
        "6" => &[0, 4, 7, 9],
        "m6" => &[0, 3, 7, 9],
        "69" => &[0, 4, 7, 9, 14],
        "m69" => &[0, 3, 7, 9, 14],
        "dim" => &[0, 3, 6],
        "dim7" => &[0, 3, 6, 9],
        "aug" => &[0, 4, 8],
        "aug7" => &[0, 4, 8, 10],
        "add9" => &[0, 4, 7, 14],
        "madd9" => &[0, 3, 7, 14],
        "sus4" => &[0, 5, 7],
        "sus2" => &[0, 2, 7],
        "mMaj7" => &[0, 3, 7, 11],

        // 9th chords
        "9" => &[0, 4, 7, 10, 14],
        "maj9" => &[0, 4, 7, 11, 14],
        "m9" => &[0, 3, 7, 10, 14],
        "7b9" => &[0, 4, 7, 10, 13],
        "7#9" => &[0, 4, 7, 10, 15],

        // 11th chords
        "11" => &[0, 4, 7, 10, 14, 17],
        "m11" => &[0, 3, 7, 10, 14, 17],
        "maj11" => &[0, 4, 7, 11, 14, 17],

        // 13th chords
        "13" => &[0, 4, 7, 10, 14, 17, 21],
        "m13" => &[0, 3, 7, 10, 14, 17, 21],
        "maj13" => &[0, 4, 7, 11, 14, 17, 21],

        // Altered dominants
        "7b5" => &[0, 4, 6, 10],
        "7#5" => &[0, 4, 8, 10],
        "7b9#9" => &[0, 4, 7, 10, 13, 15],
        "7b9b13" => &[0, 4, 7, 10, 13, 20],
        "7#9b13" => &[0, 4, 7, 10, 15, 20],

        _ => return None,
    };
    Some(intervals)
}

enum Tension {
    Add(i32),
    ReplaceFifth(i32),
}

fn tension(label: &str) -> Option<Tension> {
    let tension = match label {
        "9" => Tension::Add(2),
        "b9" => Tension::Add(1),
        "#9" => Tension::Add(3),
        "11" => Tension::Add(5),
        "#11" => Tension::Add(6),
        "13" => Tension::Add(9),
        "b13" => Tension::Add(8),
        "b5" => Tension::ReplaceFifth(6),
        "#5" => Tension::ReplaceFifth(8),
        _ => return None,
    };
    Some(tension)
}

/// Split `"Cm7"` into the root `C` and the remainder `"m7"`.
fn split_root(main: &str) -> Option<(PitchClass, &str)> {
    let bytes = main.as_bytes();
    if !matches!(bytes.first(), Some(b'A'..=b'G')) {
        return None;
    }
    let root_len = match bytes.get(1) {
        Some(b'b') | Some(b'#') => 2,
        _ => 1,
    };
    let root = PitchClass::from_name(&main[..root_len])?;
    Some((root, &main[root_len..]))
}

/// Split `"7(b9,13)"` into `"7"` and `["b9", "13"]`.
fn split_tensions(kind: &str) -> (&str, Vec<&str>) {
    match kind.find('(') {
        Some(open) if kind.ends_with(')') => {
            let labels = kind[open + 1..kind.len() - 1]
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .collect();
            (&kind[..open], labels)
        }
        _ => (kind, Vec::new()),
    }
}

/// Parse a chord symbol into its pitch classes
///
/// Returns `None` when the symbol cannot be read: an empty string, a root
/// that is not `A`-`G` with an optional `b`/`#`, an unknown chord type, or a
/// slash bass that is not a note name. Unknown chord types are always
/// rejected rather than guessed as a major triad.
///
/// # Supported Chord Types
/// - **Triads**: `C`, `CM`, `Cmaj`, `Cm`, `Cdim`, `Caug`, `Csus4`, `Csus2`
/// - **Sevenths**: `C7`, `Cmaj7`, `Cm7`, `Cm7b5`, `Cdim7`, `Caug7`, `CmMaj7`
/// - **Sixths**: `C6`, `Cm6`, `C69`, `Cm69`
/// - **Added tones**: `Cadd9`, `Cmadd9`
/// - **Extensions**: `C9`, `Cmaj9`, `Cm9`, `C11`, `Cm11`, `Cmaj11`, `C13`, `Cm13`, `Cmaj13`
/// - **Altered dominants**: `C7b5`, `C7#5`, `C7b9`, `C7#9`, `C7b9#9`, `C7b9b13`, `C7#9b13`
///
/// # Alternate Spellings
/// `△` → `maj`, `-` and `min` → `m`, `M7` → `maj7`, `ø` and `m7(b5)` → `m7b5`,
/// `o` and `°` → `dim`, `♭`/`♯` → `b`/`#`, full-width parentheses are accepted.
///
/// # Tensions
/// Parenthesized, comma-separated: `9`, `b9`, `#9`, `11`, `#11`, `13`, `b13`
/// add a tone; `b5` and `#5` replace the fifth. Unknown labels are ignored.
///
/// # Examples
/// ```
/// use accomp::playback::parse_chord;
///
/// let cmaj7 = parse_chord("Cmaj7").unwrap();
/// assert_eq!(cmaj7.names(), vec!["C", "E", "G", "B"]);
///
/// let g7b9 = parse_chord("G7(b9)").unwrap();
/// assert_eq!(g7b9.names(), vec!["G", "B", "D", "F", "Ab"]);
///
/// let slash = parse_chord("Am/G").unwrap();
/// assert_eq!(slash.names(), vec!["G", "A", "C", "E"]);
///
/// assert!(parse_chord("Cxyz").is_none());
/// ```
pub fn parse_chord(symbol: &str) -> Option<ParsedChord> {
    let normalized = normalize(symbol);
    if normalized.is_empty() {
        return None;
    }

    let (main, bass) = match normalized.split_once('/') {
        Some((main, bass)) => (main, Some(bass)),
        None => (normalized.as_str(), None),
    };
    let bass = match bass {
        Some(name) => match PitchClass::from_name(name) {
            Some(class) => Some(class),
            None => {
                debug!("Unreadable slash bass '{}' in chord '{}'", name, symbol);
                return None;
            }
        },
        None => None,
    };

    let (root, kind) = match split_root(main) {
        Some(parts) => parts,
        None => {
            debug!("Chord '{}' does not start with a note name", symbol);
            return None;
        }
    };

    let (core, tensions) = split_tensions(kind);
    let intervals = match core_intervals(core) {
        Some(intervals) => intervals,
        None => {
            debug!("Unknown chord type '{}' in chord '{}'", core, symbol);
            return None;
        }
    };

    let mut fifth = root.transpose(intervals[2]);
    let mut extra_tones: Vec<PitchClass> =
        intervals[3..].iter().map(|&i| root.transpose(i)).collect();

    for label in tensions {
        match tension(label) {
            Some(Tension::Add(interval)) => extra_tones.push(root.transpose(interval)),
            Some(Tension::ReplaceFifth(interval)) => fifth = root.transpose(interval),
            None => warn!("Unknown tension '{}' in chord '{}'", label, symbol),
        }
    }

    Some(ParsedChord {
        root,
        third: root.transpose(intervals[1]),
        fifth,
        extra_tones,
        bass,
    })
}
