//! Playback scheduler
//!
//! Every instant is computed up front from a single clock reading taken when
//! playback starts:
//!
//! ```text
//! start      = now + lead_in
//! count-in   = start + note.start_time
//! loop i     = start + count_in_duration + i * loop_duration + note.start_time
//! finished   = start + total_duration + completion_grace
//! ```
//!
//! Notes are handed to the audio backend immediately with their absolute
//! times. Position updates cannot be pushed to the UI from the audio clock, so
//! they wait in a time-ordered cue queue which the host drains by calling
//! [`PlaybackScheduler::poll`] from its timer or animation frame.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::AccompError;
use super::audio::{AudioBackend, AudioEngine, Voice};
use super::types::{MusicData, PlayableSequence};

/// Seconds between pressing play and the first scheduled sound.
pub const DEFAULT_LEAD_IN: f64 = 0.1;
/// Seconds after the last loop ends before playback reports completion.
pub const DEFAULT_COMPLETION_GRACE: f64 = 0.2;

/// Timing knobs. Negative or non-finite values are treated as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerOptions {
    pub lead_in: f64,
    pub completion_grace: f64,
}

impl SchedulerOptions {
    fn sanitized(self) -> Self {
        SchedulerOptions {
            lead_in: seconds_or_zero("lead-in", self.lead_in),
            completion_grace: seconds_or_zero("completion-grace", self.completion_grace),
        }
    }
}

fn seconds_or_zero(name: &str, value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("Ignoring {} of {}s, using 0", name, value);
        0.0
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        SchedulerOptions {
            lead_in: DEFAULT_LEAD_IN,
            completion_grace: DEFAULT_COMPLETION_GRACE,
        }
    }
}

/// What the UI hears about while playback runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// The measure at `index` started sounding.
    MeasureChanged { index: usize },
    /// The last loop has finished.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CueAction {
    Measure(usize),
    Finish,
}

/// A deferred state change. `seq` keeps cues with equal times in the order
/// they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cue {
    due: f64,
    seq: u64,
    action: CueAction,
}

impl Eq for Cue {}

impl PartialOrd for Cue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cue {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap behavior (earliest first)
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Schedules a [`PlayableSequence`] on an [`AudioEngine`] and tracks position
///
/// Idle until [`play`](Self::play), playing until the completion cue fires or
/// [`stop`](Self::stop) is called. `play` always stops first, so at most one
/// set of voices is ever live.
pub struct PlaybackScheduler<B: AudioBackend> {
    options: SchedulerOptions,
    voices: Vec<B::Voice>,
    cues: BinaryHeap<Cue>,
    next_seq: u64,
    is_playing: bool,
    current_measure_index: Option<usize>,
}

impl<B: AudioBackend> Default for PlaybackScheduler<B> {
    fn default() -> Self {
        Self::new(SchedulerOptions::default())
    }
}

impl<B: AudioBackend> PlaybackScheduler<B> {
    pub fn new(options: SchedulerOptions) -> Self {
        PlaybackScheduler {
            options: options.sanitized(),
            voices: Vec::new(),
            cues: BinaryHeap::new(),
            next_seq: 0,
            is_playing: false,
            current_measure_index: None,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Index of the measure currently sounding, `None` before the first
    /// measure starts and after playback ends.
    pub fn current_measure_index(&self) -> Option<usize> {
        self.current_measure_index
    }

    /// Voices scheduled by the current playback.
    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn pending_cue_count(&self) -> usize {
        self.cues.len()
    }

    /// When the next cue is due, so hosts can arm a single timer.
    pub fn next_due(&self) -> Option<f64> {
        self.cues.peek().map(|cue| cue.due)
    }

    /// Play `sequence`: the count-in once, then the main loop `loop_count` times
    ///
    /// Any previous playback is stopped first. Fails with
    /// [`AccompError::AudioNotReady`] if the engine has not been initialised
    /// and [`AccompError::InvalidLoopCount`] for zero loops; in both cases
    /// nothing is scheduled.
    pub fn play(
        &mut self,
        engine: &mut AudioEngine<B>,
        sequence: &PlayableSequence,
        loop_count: u32,
    ) -> Result<(), AccompError> {
        self.stop();

        if loop_count == 0 {
            return Err(AccompError::InvalidLoopCount);
        }
        let now = engine.now().map_err(|e| {
            warn!("Cannot start playback: {}", e);
            e
        })?;

        let schedule_start = now + self.options.lead_in;
        let count_in_duration = sequence.count_in_duration();
        let loop_data = &sequence.main_loop_data;

        if let Some(count_in) = &sequence.count_in_data {
            self.schedule_section(engine, count_in, schedule_start)?;
        }

        for i in 0..loop_count {
            let offset = schedule_start + count_in_duration + i as f64 * loop_data.duration;
            self.schedule_section(engine, loop_data, offset)?;
            for timing in &loop_data.measure_timings {
                let due = (offset + timing.start_time).max(now);
                self.push_cue(due, CueAction::Measure(timing.index));
            }
        }

        let total = sequence.total_duration(loop_count);
        self.push_cue(schedule_start + total + self.options.completion_grace, CueAction::Finish);

        self.is_playing = true;
        self.current_measure_index = None;
        info!(
            "Playback started: {} loop(s), {} voices, {:.2}s",
            loop_count,
            self.voices.len(),
            total
        );
        Ok(())
    }

    fn schedule_section(
        &mut self,
        engine: &mut AudioEngine<B>,
        data: &MusicData,
        offset: f64,
    ) -> Result<(), AccompError> {
        for track in &data.tracks {
            for note in &track.notes {
                let at = offset + note.start_time;
                if let Some(voice) =
                    engine.trigger_sound_with_velocity(track.instrument, note.pitch, at, note.velocity)?
                {
                    self.voices.push(voice);
                }
            }
        }
        Ok(())
    }

    fn push_cue(&mut self, due: f64, action: CueAction) {
        self.cues.push(Cue {
            due,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
    }

    /// Fire every cue due at or before `now`, in time order.
    pub fn poll(&mut self, now: f64) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Some(cue) = self.cues.peek() {
            if cue.due > now {
                break;
            }
            let Some(cue) = self.cues.pop() else { break };
            match cue.action {
                CueAction::Measure(index) => {
                    self.current_measure_index = Some(index);
                    events.push(PlaybackEvent::MeasureChanged { index });
                }
                CueAction::Finish => {
                    self.is_playing = false;
                    self.current_measure_index = None;
                    // Every voice has played out; nothing left to cancel
                    self.voices.clear();
                    self.cues.clear();
                    events.push(PlaybackEvent::Finished);
                    info!("Playback finished");
                    break;
                }
            }
        }
        events
    }

    /// Cancel every scheduled voice and pending cue. Safe to call at any time.
    pub fn stop(&mut self) {
        let cancelled = self.voices.len();
        for mut voice in self.voices.drain(..) {
            if let Err(e) = voice.stop() {
                debug!("Ignoring voice stop failure: {}", e);
            }
        }
        self.cues.clear();

        if self.is_playing {
            info!("Playback stopped ({} voices cancelled)", cancelled);
        }
        self.is_playing = false;
        self.current_measure_index = None;
    }
}
