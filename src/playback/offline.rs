//! In-memory audio backend
//!
//! Records every trigger instead of making sound. The clock only moves when
//! told to, so schedules can be inspected deterministically.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::error::AccompError;
use crate::pitch::Pitch;
use super::audio::{AudioBackend, Voice};
use super::types::Instrument;

/// One recorded call to [`AudioBackend::trigger`].
#[derive(Debug, Clone)]
pub struct TriggerRecord {
    pub instrument: Instrument,
    pub pitch: Option<Pitch>,
    pub at: f64,
    pub velocity: f32,
    cancelled: Rc<Cell<bool>>,
}

impl TriggerRecord {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Voice handle returned by [`OfflineBackend`].
#[derive(Debug)]
pub struct OfflineVoice {
    cancelled: Rc<Cell<bool>>,
}

impl Voice for OfflineVoice {
    fn stop(&mut self) -> Result<(), AccompError> {
        if self.cancelled.replace(true) {
            return Err(AccompError::Backend("voice already stopped".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct OfflineBackend {
    time: f64,
    master_gain: f32,
    triggers: Vec<TriggerRecord>,
    missing: HashSet<Instrument>,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `instrument` has no loaded sample: its triggers return no voice.
    pub fn without_instrument(mut self, instrument: Instrument) -> Self {
        self.missing.insert(instrument);
        self
    }

    /// Move the clock to `time`. The clock never runs backwards.
    pub fn set_time(&mut self, time: f64) {
        if time > self.time {
            self.time = time;
        }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.set_time(self.time + seconds);
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Every trigger in the order it was requested, cancelled ones included.
    pub fn triggers(&self) -> &[TriggerRecord] {
        &self.triggers
    }

    /// Triggers that have not been cancelled.
    pub fn active_triggers(&self) -> impl Iterator<Item = &TriggerRecord> {
        self.triggers.iter().filter(|record| !record.is_cancelled())
    }
}

impl AudioBackend for OfflineBackend {
    type Voice = OfflineVoice;

    fn current_time(&self) -> f64 {
        self.time
    }

    fn trigger(
        &mut self,
        instrument: Instrument,
        pitch: Option<Pitch>,
        at: f64,
        velocity: f32,
    ) -> Option<OfflineVoice> {
        if self.missing.contains(&instrument) {
            return None;
        }
        let cancelled = Rc::new(Cell::new(false));
        self.triggers.push(TriggerRecord {
            instrument,
            pitch,
            at,
            velocity,
            cancelled: Rc::clone(&cancelled),
        });
        Some(OfflineVoice { cancelled })
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }
}
