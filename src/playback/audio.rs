//! Audio output abstraction
//!
//! [`AudioBackend`] is the "play this sampled sound at absolute time T"
//! primitive the scheduler drives. Sample loading, decoding and gain wiring
//! live behind it. [`AudioEngine`] owns one backend instance with an explicit
//! lifecycle: nothing is audible until [`AudioEngine::init`] succeeds, and
//! [`AudioEngine::dispose`] releases it again.

use log::{debug, info};

use crate::error::AccompError;
use crate::pitch::Pitch;
use super::types::{Instrument, DEFAULT_VELOCITY};

/// Master volume before anyone touches the slider.
pub const DEFAULT_MASTER_VOLUME: f32 = 0.5;

/// Handle to a triggered sound, used to cancel it before or while it plays.
pub trait Voice {
    /// Stop the sound. Stopping a voice that already ended or was already
    /// stopped may fail; callers treat that as harmless.
    fn stop(&mut self) -> Result<(), AccompError>;
}

/// A sound output with a monotonic clock
pub trait AudioBackend {
    type Voice: Voice;

    /// Seconds on the backend's clock. Never decreases.
    fn current_time(&self) -> f64;

    /// Schedule `instrument` to sound at absolute time `at`.
    ///
    /// Returns `None` when the instrument has no loaded sample; the note is
    /// then silently dropped.
    fn trigger(
        &mut self,
        instrument: Instrument,
        pitch: Option<Pitch>,
        at: f64,
        velocity: f32,
    ) -> Option<Self::Voice>;

    /// Gain applied to everything the backend plays, 0.0 to 1.0.
    fn set_master_gain(&mut self, gain: f32);
}

/// Explicit owner of the audio backend
///
/// Replaces ambient global audio state: whoever needs to make sound borrows
/// the engine. The master volume is remembered while the engine is disposed
/// and applied when it is initialised again.
#[derive(Debug)]
pub struct AudioEngine<B: AudioBackend> {
    backend: Option<B>,
    master_volume: f32,
}

impl<B: AudioBackend> Default for AudioEngine<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn new() -> Self {
        AudioEngine {
            backend: None,
            master_volume: DEFAULT_MASTER_VOLUME,
        }
    }

    /// Create the backend if it does not exist yet
    ///
    /// Idempotent: once ready, later calls do not invoke `create`. Browsers
    /// only allow audio after a user gesture, so hosts call this lazily.
    pub fn init<F>(&mut self, create: F) -> Result<(), AccompError>
    where
        F: FnOnce() -> Result<B, AccompError>,
    {
        if self.backend.is_some() {
            return Ok(());
        }
        let mut backend = create()?;
        backend.set_master_gain(self.master_volume);
        self.backend = Some(backend);
        info!("Audio engine ready (master volume {:.2})", self.master_volume);
        Ok(())
    }

    /// Release the backend. Safe to call when not initialised.
    pub fn dispose(&mut self) {
        if self.backend.take().is_some() {
            info!("Audio engine disposed");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_some()
    }

    /// Current time on the backend clock.
    pub fn now(&self) -> Result<f64, AccompError> {
        self.backend
            .as_ref()
            .map(AudioBackend::current_time)
            .ok_or(AccompError::AudioNotReady)
    }

    /// Schedule one sound at absolute time `at` with the default velocity.
    pub fn trigger_sound(
        &mut self,
        instrument: Instrument,
        pitch: Option<Pitch>,
        at: f64,
    ) -> Result<Option<B::Voice>, AccompError> {
        self.trigger_sound_with_velocity(instrument, pitch, at, DEFAULT_VELOCITY)
    }

    pub fn trigger_sound_with_velocity(
        &mut self,
        instrument: Instrument,
        pitch: Option<Pitch>,
        at: f64,
        velocity: f32,
    ) -> Result<Option<B::Voice>, AccompError> {
        let backend = self.backend.as_mut().ok_or(AccompError::AudioNotReady)?;
        let voice = backend.trigger(instrument, pitch, at, velocity);
        if voice.is_none() {
            debug!("No sound source for {}", instrument);
        }
        Ok(voice)
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Set the master volume, clamped to 0.0..=1.0.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        if let Some(backend) = self.backend.as_mut() {
            backend.set_master_gain(self.master_volume);
        }
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }
}
