//! Key transposition for chord progressions
//!
//! Moves the root and slash bass of every chord symbol by a number of
//! semitones and leaves the chord quality untouched. Results are spelled with
//! sharps (`C#`, `D#`, `F#`, `G#`, `A#`).

use crate::pitch::PitchClass;
use crate::progression::ChordProgression;

/// Shift a pitch class by `semitones`, wrapping around the octave.
pub fn transpose_pitch_class(class: PitchClass, semitones: i32) -> PitchClass {
    class.transpose(semitones)
}

/// Transpose a note name, or return it unchanged if it is not one of the
/// twelve sharp/flat spellings (`Cb`, `E#`, ...).
fn transpose_note_name(name: &str, semitones: i32) -> String {
    match PitchClass::from_name(name) {
        Some(class) => transpose_pitch_class(class, semitones).sharp_name().to_string(),
        None => name.to_string(),
    }
}

/// Length of a leading `[A-G][b#]?` note name, if there is one.
fn note_name_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.first(), Some(b'A'..=b'G')) {
        return None;
    }
    match bytes.get(1) {
        Some(b'b') | Some(b'#') => Some(2),
        _ => Some(1),
    }
}

/// Transpose one chord symbol
///
/// The symbol must look like `<root><quality>[/<bass>]` where root and bass
/// are a letter `A`-`G` with an optional `b` or `#`. Anything else, including
/// the empty string, is returned unchanged.
///
/// # Example
/// ```
/// use accomp::transpose::transpose_chord_symbol;
///
/// assert_eq!(transpose_chord_symbol("Am7", 2), "Bm7");
/// assert_eq!(transpose_chord_symbol("Bb/D", 1), "B/D#");
/// assert_eq!(transpose_chord_symbol("N.C.", 5), "N.C.");
/// ```
pub fn transpose_chord_symbol(symbol: &str, semitones: i32) -> String {
    let Some(root_len) = note_name_len(symbol) else {
        return symbol.to_string();
    };
    let (root, rest) = symbol.split_at(root_len);

    let (quality, bass) = match rest.split_once('/') {
        Some((quality, bass)) => {
            if note_name_len(bass) != Some(bass.len()) {
                return symbol.to_string();
            }
            (quality, Some(bass))
        }
        None => (rest, None),
    };

    let mut transposed = transpose_note_name(root, semitones);
    transposed.push_str(quality);
    if let Some(bass) = bass {
        transposed.push('/');
        transposed.push_str(&transpose_note_name(bass, semitones));
    }
    transposed
}

/// Transpose every chord in a progression
///
/// Returns a new progression; empty slots stay empty and title, tempo and
/// time signatures are unchanged. A shift of 0 returns an equal copy; any
/// other shift respells flats as sharps, even a whole octave.
pub fn transpose_progression(progression: &ChordProgression, semitones: i32) -> ChordProgression {
    if semitones == 0 {
        return progression.clone();
    }
    let measures = progression
        .measures()
        .iter()
        .map(|measure| measure.map_chords(|chord| transpose_chord_symbol(chord, semitones)))
        .collect();
    progression.with_measures(measures)
}
