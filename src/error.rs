//! # Error Types
//!
//! This module defines the error type shared by the accompaniment engine.
//!
//! Only environment-level problems surface as errors: a bad progression file,
//! a bad config file, or audio that is not ready yet. Chord symbols that fail
//! to parse are not errors; the parser returns `None` and the arrangement
//! skips them.
//!
//! ## Error Types
//! - `ImportError` - The exchange JSON is malformed or has the wrong shape
//! - `ExportError` - A progression or sequence could not be serialized
//! - `MeasureError` - A measure edit referred to a measure or beat that does not exist
//! - `InvalidTimeSignature` - Numerator or denominator was zero, or the numerator exceeds 64 beats
//! - `ChordSlotMismatch` - A measure's chord list does not have one slot per beat
//! - `InvalidTempo` - Tempo was zero, negative or not finite
//! - `ConfigError` - Invalid YAML engine configuration
//! - `AudioNotReady` - `play()` was called before the audio engine was initialized
//! - `InvalidLoopCount` - `play()` was asked to loop zero times
//! - `InvalidPitch` - A pitch string could not be read
//! - `Backend` - The audio backend reported a failure
//!
//! ## Usage
//! ```rust
//! use accomp::{import_progression, AccompError};
//!
//! match import_progression("{\"title\": 3}") {
//!     Ok(outcome) => println!("{} measures", outcome.progression.measures().len()),
//!     Err(AccompError::ImportError(message)) => eprintln!("Rejected: {}", message),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccompError {
    /// The progression file could not be imported.
    ///
    /// # Example
    /// ```
    /// # use accomp::AccompError;
    /// let err = AccompError::ImportError("title must be a string".to_string());
    /// assert_eq!(err.to_string(), "Invalid progression file: title must be a string");
    /// ```
    #[error("Invalid progression file: {0}")]
    ImportError(String),

    #[error("Could not export progression: {0}")]
    ExportError(String),

    /// A measure could not be built or edited.
    ///
    /// `measure` is 1-indexed, matching what a user sees.
    ///
    /// # Example
    /// ```
    /// # use accomp::AccompError;
    /// let err = AccompError::MeasureError {
    ///     measure: 3,
    ///     message: "beat 5 is out of range".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid measure 3: beat 5 is out of range");
    /// ```
    #[error("Invalid measure {measure}: {message}")]
    MeasureError { measure: usize, message: String },

    #[error("Invalid time signature {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u32, denominator: u32 },

    #[error("A measure of {numerator} beats needs {numerator} chord slots, got {slots}")]
    ChordSlotMismatch { numerator: u32, slots: usize },

    #[error("Invalid tempo: {0} (must be a positive number of beats per minute)")]
    InvalidTempo(f64),

    #[error("Invalid config: {0}")]
    ConfigError(String),

    /// Audio output has not been initialized yet.
    ///
    /// Browsers only allow audio after a user gesture, so this is the normal
    /// state until the first click.
    #[error("Audio is not ready; interact with the page and try again")]
    AudioNotReady,

    #[error("Loop count must be at least 1")]
    InvalidLoopCount,

    #[error("Invalid pitch: {0}")]
    InvalidPitch(String),

    #[error("Audio backend error: {0}")]
    Backend(String),
}
