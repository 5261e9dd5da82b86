//! Progression exchange format
//!
//! ```json
//! {
//!   "title": "Autumn Sketch",
//!   "tempo": 120,
//!   "measures": [
//!     { "numerator": 4, "denominator": 4, "chords": ["Am7", "", "D7", ""] }
//!   ]
//! }
//! ```
//!
//! Import is lenient per measure and strict for the whole file: a bad title,
//! tempo or measure list rejects the import, while a single bad measure is
//! dropped and reported.

use log::warn;
use serde_json::Value;

use crate::error::AccompError;
use crate::progression::{ChordProgression, Measure};

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub progression: ChordProgression,
    /// 1-based positions in the file of measures that were dropped.
    pub skipped_measures: Vec<usize>,
}

/// Serialize a progression as pretty-printed JSON.
pub fn export_progression(progression: &ChordProgression) -> Result<String, AccompError> {
    serde_json::to_string_pretty(progression).map_err(|e| AccompError::ExportError(e.to_string()))
}

/// A JSON number that is a whole number of at least 1.
fn positive_integer(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok().filter(|&n| n > 0);
    }
    let n = value.as_f64()?;
    if n.fract() == 0.0 && n >= 1.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

fn import_measure(value: &Value, number: usize) -> Result<Measure, String> {
    let numerator = value
        .get("numerator")
        .and_then(positive_integer)
        .ok_or("numerator must be a positive integer")?;
    let denominator = value
        .get("denominator")
        .and_then(positive_integer)
        .ok_or("denominator must be a positive integer")?;
    let chords: Vec<String> = value
        .get("chords")
        .and_then(Value::as_array)
        .ok_or("chords must be an array")?
        .iter()
        .map(|chord| chord.as_str().unwrap_or_default().to_string())
        .collect();

    if chords.len() != numerator as usize {
        warn!(
            "Measure {} has {} chord slots for {} beats; fitting to the time signature",
            number,
            chords.len(),
            numerator
        );
    }
    Measure::fitted(numerator, denominator, chords).map_err(|e| e.to_string())
}

/// Read a progression from the exchange format
///
/// # Example
/// ```
/// use accomp::import_progression;
///
/// let text = r#"{"title":"Blues","tempo":100,"measures":[
///     {"numerator":4,"denominator":4,"chords":["C7","","",""]},
///     {"numerator":0,"denominator":4,"chords":[]}
/// ]}"#;
/// let outcome = import_progression(text).unwrap();
/// assert_eq!(outcome.progression.measures().len(), 1);
/// assert_eq!(outcome.skipped_measures, vec![2]);
/// ```
pub fn import_progression(text: &str) -> Result<ImportOutcome, AccompError> {
    let data: Value = serde_json::from_str(text)
        .map_err(|e| AccompError::ImportError(format!("malformed JSON: {}", e)))?;

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| AccompError::ImportError("title must be a string".to_string()))?;
    let tempo = data
        .get("tempo")
        .and_then(Value::as_f64)
        .filter(|tempo| *tempo > 0.0)
        .ok_or_else(|| AccompError::ImportError("tempo must be a positive number".to_string()))?;
    let entries = data
        .get("measures")
        .and_then(Value::as_array)
        .ok_or_else(|| AccompError::ImportError("measures must be an array".to_string()))?;

    let mut measures = Vec::with_capacity(entries.len());
    let mut skipped_measures = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let number = index + 1;
        match import_measure(entry, number) {
            Ok(measure) => measures.push(measure),
            Err(reason) => {
                warn!("Skipping measure {}: {}", number, reason);
                skipped_measures.push(number);
            }
        }
    }

    let progression = ChordProgression::new(title, tempo, measures)
        .map_err(|e| AccompError::ImportError(e.to_string()))?;
    Ok(ImportOutcome {
        progression,
        skipped_measures,
    })
}
