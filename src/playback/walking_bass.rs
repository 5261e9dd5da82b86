//! Walking bass line generation
//!
//! The progression is flattened into chord runs (a chord plus the number of
//! beats it is held). Each run plays one quarter-note pattern chosen by its
//! length, ending on an approach note that leads into the next run:
//!
//! ```text
//! N = 1   R
//! N = 2   R A
//! N = 3   R 3 A
//! N = 4   R 3 5 A
//! N = 5   R 3 5 5 A
//! N >= 6  R (R 3 5 5)* A        cycle truncated to N - 2 steps
//! ```
//!
//! The approach note is a chromatic neighbour of the run's fifth when that
//! neighbour is the next run's bass root, otherwise the fifth itself.
//!
//! Octaves follow the previous bass note (see [`find_closest_octave`]); every
//! note is then clamped into the bass register [Eb1, F3).

use log::debug;

use crate::pitch::{Pitch, PitchClass};
use crate::progression::Measure;
use super::chord_parser::{parse_chord, ParsedChord};
use super::types::{Instrument, Note, Track};
use super::voicing::find_closest_octave;

/// Lowest note the bass may play.
const BASS_FLOOR: Pitch = Pitch { class: PitchClass::DSharp, octave: 1 };
/// First note above the bass register.
const BASS_CEILING: Pitch = Pitch { class: PitchClass::F, octave: 3 };

/// Reference note for the approach calculation when nothing has been played.
const APPROACH_REFERENCE: Pitch = Pitch { class: PitchClass::A, octave: 2 };

/// Key indices below this have no lower octave on the keyboard.
const OCTAVE_KEYS: usize = 12;

/// A chord held for a number of beats. `chord` is `None` for the rest before
/// the first chord of the progression.
#[derive(Debug, Clone, PartialEq)]
struct ChordRun<'a> {
    chord: Option<&'a str>,
    beats: usize,
}

/// Flatten every beat slot into runs, holding the last chord through empty
/// slots and merging consecutive equal symbols.
fn flatten_runs(measures: &[Measure]) -> Vec<ChordRun<'_>> {
    let mut runs: Vec<ChordRun<'_>> = Vec::new();
    for slot in measures.iter().flat_map(|m| m.chords()) {
        let slot = slot.as_str();
        match runs.last_mut() {
            Some(run) if slot.is_empty() || run.chord == Some(slot) => run.beats += 1,
            _ => runs.push(ChordRun {
                chord: if slot.is_empty() { None } else { Some(slot) },
                beats: 1,
            }),
        }
    }
    runs
}

/// Bass-facing view of a chord: the landing note plus third and fifth.
#[derive(Debug, Clone, Copy)]
struct BassTones {
    root: PitchClass,
    third: PitchClass,
    fifth: PitchClass,
}

impl From<&ParsedChord> for BassTones {
    fn from(chord: &ParsedChord) -> Self {
        BassTones {
            root: chord.bass_root(),
            third: chord.third,
            fifth: chord.fifth,
        }
    }
}

/// Choose the last note of a run
///
/// Places the fifth near `last` and checks the keys one semitone above, then
/// one below, for the next run's bass root.
fn approach_note(last: Option<Pitch>, fifth: PitchClass, next_root: Option<PitchClass>) -> PitchClass {
    let Some(next_root) = next_root else {
        return fifth;
    };
    let provisional = find_closest_octave(Some(last.unwrap_or(APPROACH_REFERENCE)), fifth);
    let Some(index) = provisional.key_index() else {
        return fifth;
    };

    let above = Pitch::from_key_index(index + 1);
    let below = index.checked_sub(1).and_then(Pitch::from_key_index);
    [above, below]
        .into_iter()
        .flatten()
        .map(|neighbour| neighbour.class)
        .find(|&class| class == next_root)
        .unwrap_or(fifth)
}

/// Note names for a run of `beats` beats.
fn pattern(tones: BassTones, approach: PitchClass, beats: usize) -> Vec<PitchClass> {
    let BassTones { root, third, fifth } = tones;
    match beats {
        0 => Vec::new(),
        1 => vec![root],
        2 => vec![root, approach],
        3 => vec![root, third, approach],
        4 => vec![root, third, fifth, approach],
        5 => vec![root, third, fifth, fifth, approach],
        n => {
            let cycle = [root, third, fifth, fifth];
            let mut names = Vec::with_capacity(n);
            names.push(root);
            names.extend(cycle.iter().copied().cycle().take(n - 2));
            names.push(approach);
            names
        }
    }
}

/// Positions where a repeated fifth is played an octave down.
fn is_lower_fifth_position(beats: usize, position: usize) -> bool {
    match beats {
        5 => position == 3,
        n if n >= 6 => position > 0 && position < n - 1 && (position - 1) % 4 == 3,
        _ => false,
    }
}

/// Shift by octaves until `BASS_FLOOR <= pitch < BASS_CEILING`.
fn clamp_to_bass_range(mut pitch: Pitch) -> Pitch {
    while pitch < BASS_FLOOR {
        pitch = pitch.transpose(12);
    }
    while pitch >= BASS_CEILING {
        pitch = pitch.transpose(-12);
    }
    pitch
}

/// Generate the walking bass track for a sequence of measures
///
/// Runs whose chord cannot be parsed are silent but still take up their
/// beats, as does the rest before the first chord.
///
/// # Example
/// ```
/// use accomp::progression::Measure;
/// use accomp::playback::walking_bass_track;
///
/// let measures = vec![
///     Measure::new(4, 4, vec!["C".into(), "".into(), "".into(), "".into()]).unwrap(),
///     Measure::new(4, 4, vec!["G7".into(), "".into(), "".into(), "".into()]).unwrap(),
/// ];
/// let track = walking_bass_track(&measures, 0.5);
/// let first_run: Vec<String> = track.notes[..4]
///     .iter()
///     .filter_map(|note| note.pitch.map(|p| p.to_string()))
///     .collect();
/// assert_eq!(first_run, vec!["C2", "E2", "G2", "G2"]);
/// ```
pub fn walking_bass_track(measures: &[Measure], beat_duration: f64) -> Track {
    let runs = flatten_runs(measures);
    let parsed: Vec<Option<ParsedChord>> = runs
        .iter()
        .map(|run| run.chord.and_then(parse_chord))
        .collect();

    let mut notes = Vec::new();
    let mut current_time = 0.0;
    let mut last_played: Option<Pitch> = None;

    for (i, run) in runs.iter().enumerate() {
        let Some(chord) = parsed[i].as_ref() else {
            if let Some(symbol) = run.chord {
                debug!("Bass rests for {} beats on unparseable chord {:?}", run.beats, symbol);
            }
            current_time += run.beats as f64 * beat_duration;
            continue;
        };

        let tones = BassTones::from(chord);
        let next_root = parsed
            .get(i + 1)
            .and_then(|next| next.as_ref())
            .map(ParsedChord::bass_root);
        let approach = approach_note(last_played, tones.fifth, next_root);

        for (position, class) in pattern(tones, approach, run.beats).into_iter().enumerate() {
            let mut pitch = find_closest_octave(last_played, class);

            if class == tones.fifth && is_lower_fifth_position(run.beats, position) {
                if let Some(index) = pitch.key_index().filter(|&index| index >= OCTAVE_KEYS) {
                    pitch = Pitch::from_key_index(index - OCTAVE_KEYS).unwrap_or(pitch);
                }
            }

            let pitch = clamp_to_bass_range(pitch);
            notes.push(Note::pitched(current_time, beat_duration, pitch));
            last_played = Some(pitch);
            current_time += beat_duration;
        }
    }

    Track::new(Instrument::Bass, notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(chords: &[&str]) -> Measure {
        Measure::new(
            chords.len() as u32,
            4,
            chords.iter().map(|c| c.to_string()).collect(),
        )
        .unwrap()
    }

    fn pitch(name: &str) -> Pitch {
        Pitch::parse(name).unwrap()
    }

    fn names(track: &Track) -> Vec<String> {
        track
            .notes
            .iter()
            .filter_map(|note| note.pitch.map(|p| p.to_string()))
            .collect()
    }

    #[test]
    fn test_flatten_runs_holds_and_merges() {
        let measures = vec![measure(&["C", "", "C", "F"]), measure(&["", "", "G7", ""])];
        let runs = flatten_runs(&measures);
        assert_eq!(
            runs,
            vec![
                ChordRun { chord: Some("C"), beats: 3 },
                ChordRun { chord: Some("F"), beats: 3 },
                ChordRun { chord: Some("G7"), beats: 2 },
            ]
        );
    }

    #[test]
    fn test_flatten_runs_leading_rest() {
        let measures = [measure(&["", "", "Am", ""])];
        let runs = flatten_runs(&measures);
        assert_eq!(
            runs,
            vec![
                ChordRun { chord: None, beats: 2 },
                ChordRun { chord: Some("Am"), beats: 2 },
            ]
        );
    }

    #[test]
    fn test_patterns_by_length() {
        use PitchClass::*;
        let tones = BassTones { root: C, third: E, fifth: G };
        assert_eq!(pattern(tones, FSharp, 1), vec![C]);
        assert_eq!(pattern(tones, FSharp, 2), vec![C, FSharp]);
        assert_eq!(pattern(tones, FSharp, 3), vec![C, E, FSharp]);
        assert_eq!(pattern(tones, FSharp, 4), vec![C, E, G, FSharp]);
        assert_eq!(pattern(tones, FSharp, 5), vec![C, E, G, G, FSharp]);
        assert_eq!(pattern(tones, FSharp, 6), vec![C, C, E, G, G, FSharp]);
        assert_eq!(pattern(tones, FSharp, 8), vec![C, C, E, G, G, C, E, FSharp]);
    }

    #[test]
    fn test_lower_fifth_positions() {
        assert!(is_lower_fifth_position(5, 3));
        assert!(!is_lower_fifth_position(5, 2));
        assert!(!is_lower_fifth_position(4, 3));
        assert!(is_lower_fifth_position(6, 4));
        assert!(!is_lower_fifth_position(6, 5));
        assert!(is_lower_fifth_position(10, 8));
        assert!(!is_lower_fifth_position(9, 8));
    }

    #[test]
    fn test_approach_note_chromatic_neighbour() {
        // Fifth of C near A2 is G2; Ab2 leads into Ab
        assert_eq!(approach_note(None, PitchClass::G, Some(PitchClass::GSharp)), PitchClass::GSharp);
        // F#2 sits one below G2
        assert_eq!(approach_note(None, PitchClass::G, Some(PitchClass::FSharp)), PitchClass::FSharp);
        // F is a whole step away, so the fifth is kept
        assert_eq!(approach_note(None, PitchClass::G, Some(PitchClass::F)), PitchClass::G);
        assert_eq!(approach_note(None, PitchClass::G, None), PitchClass::G);
    }

    #[test]
    fn test_c_to_g7_at_120_bpm() {
        let measures = vec![measure(&["C", "", "", ""]), measure(&["G7", "", "", ""])];
        let track = walking_bass_track(&measures, 0.5);
        assert_eq!(track.instrument, Instrument::Bass);
        assert_eq!(track.notes.len(), 8);

        let starts: Vec<f64> = track.notes[..4].iter().map(|n| n.start_time).collect();
        assert_eq!(starts, vec![0.0, 0.5, 1.0, 1.5]);
        assert!(track.notes.iter().all(|n| n.duration == 0.5));
        assert_eq!(names(&track)[..4], ["C2", "E2", "G2", "G2"]);
        // Last run has no successor and ends on its fifth
        assert_eq!(names(&track)[4..], ["G2", "B2", "D3", "D3"]);
    }

    #[test]
    fn test_c_to_f_approach_falls_back_to_fifth() {
        let measures = vec![measure(&["C", "", "", ""]), measure(&["F", "", "", ""])];
        let track = walking_bass_track(&measures, 1.0);
        assert_eq!(names(&track)[..4], ["C2", "E2", "G2", "G2"]);
    }

    #[test]
    fn test_chromatic_approach_into_next_chord() {
        let measures = vec![measure(&["C", "", "", ""]), measure(&["Ab", "", "", ""])];
        let track = walking_bass_track(&measures, 1.0);
        assert_eq!(names(&track)[..4], ["C2", "E2", "G2", "Ab2"]);
        assert_eq!(names(&track)[4], "Ab2");
    }

    #[test]
    fn test_slash_chord_walks_from_slash_bass() {
        let measures = vec![measure(&["C/E", "", "", ""]), measure(&["F", "", "", ""])];
        let track = walking_bass_track(&measures, 1.0);
        assert_eq!(names(&track)[0], "E1");
    }

    #[test]
    fn test_lower_fifth_in_five_beat_run() {
        let track = walking_bass_track(&[measure(&["C", "", "", "", ""])], 1.0);
        // Second G drops an octave from G2
        assert_eq!(names(&track), vec!["C2", "E2", "G2", "G1", "G1"]);
    }

    #[test]
    fn test_notes_stay_in_bass_range() {
        let measures = vec![
            measure(&["E", "", "B7", ""]),
            measure(&["F#m7b5", "", "", "", "", "", "", ""]),
            measure(&["C#", "D#", "E", "F"]),
        ];
        let track = walking_bass_track(&measures, 0.5);
        assert!(!track.notes.is_empty());
        for note in &track.notes {
            let p = note.pitch.unwrap();
            assert!(p >= pitch("Eb1") && p < pitch("F3"), "{}", p);
        }
    }

    #[test]
    fn test_unparseable_runs_rest_in_time() {
        let measures = vec![measure(&["", "Xyz", "", "C"])];
        let track = walking_bass_track(&measures, 1.0);
        assert_eq!(track.notes.len(), 1);
        assert_eq!(track.notes[0].start_time, 3.0);
        assert_eq!(names(&track), vec!["C2"]);
    }

    #[test]
    fn test_empty_progression() {
        assert!(walking_bass_track(&[], 0.5).notes.is_empty());
        assert!(walking_bass_track(&[measure(&["", "", ""])], 0.5).notes.is_empty());
    }
}
