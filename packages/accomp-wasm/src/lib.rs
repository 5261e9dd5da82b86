use accomp::playback::{AudioBackend, AudioEngine, Instrument, PlaybackScheduler, Voice};
use accomp::{AccompError, ChordProgression, EngineConfig, Pitch};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct ErrorPayload {
    kind: &'static str,
    message: String,
    measure: Option<usize>,
}

fn error_kind(e: &AccompError) -> &'static str {
    match e {
        AccompError::ImportError(_) => "import",
        AccompError::ExportError(_) => "export",
        AccompError::MeasureError { .. } => "measure",
        AccompError::InvalidTimeSignature { .. } => "time-signature",
        AccompError::ChordSlotMismatch { .. } => "chord-slots",
        AccompError::InvalidTempo(_) => "tempo",
        AccompError::ConfigError(_) => "config",
        AccompError::AudioNotReady => "audio-not-ready",
        AccompError::InvalidLoopCount => "loop-count",
        AccompError::InvalidPitch(_) => "pitch",
        AccompError::Backend(_) => "backend",
    }
}

fn to_js_error(e: AccompError) -> JsValue {
    let message = e.to_string();
    let payload = ErrorPayload {
        kind: error_kind(&e),
        measure: match &e {
            AccompError::MeasureError { measure, .. } => Some(*measure),
            _ => None,
        },
        message: message.clone(),
    };
    JsValue::from_str(&serde_json::to_string(&payload).unwrap_or(message))
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn load_config(config_yaml: Option<String>) -> Result<EngineConfig, JsValue> {
    match config_yaml {
        Some(yaml) => EngineConfig::from_yaml_str(&yaml).map_err(to_js_error),
        None => Ok(EngineConfig::default()),
    }
}

/// Arrange a progression (exchange JSON) into playable sequence JSON
#[wasm_bindgen]
pub fn arrange(source: &str) -> Result<String, JsValue> {
    accomp::arrange(source).map_err(to_js_error)
}

/// Arrange with a YAML engine config (count-in, piano octave)
#[wasm_bindgen]
pub fn arrange_with_config(source: &str, config_yaml: &str) -> Result<String, JsValue> {
    let config = EngineConfig::from_yaml_str(config_yaml).map_err(to_js_error)?;
    accomp::arrange_with(source, &config).map_err(to_js_error)
}

/// Transpose every chord in a progression file
#[wasm_bindgen]
pub fn transpose(source: &str, semitones: i32) -> Result<String, JsValue> {
    accomp::transpose_file(source, semitones).map_err(to_js_error)
}

/// Parse a chord symbol; `null` when it cannot be read
#[wasm_bindgen]
pub fn parse_chord(symbol: &str) -> Result<JsValue, JsValue> {
    match accomp::parse_chord(symbol) {
        Some(chord) => to_js_value(&chord),
        None => Ok(JsValue::NULL),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportReport<'a> {
    progression: &'a ChordProgression,
    skipped_measures: &'a [usize],
}

/// Validate a progression file and report which measures were dropped
#[wasm_bindgen]
pub fn import_progression(source: &str) -> Result<JsValue, JsValue> {
    let outcome = accomp::import_progression(source).map_err(to_js_error)?;
    to_js_value(&ImportReport {
        progression: &outcome.progression,
        skipped_measures: &outcome.skipped_measures,
    })
}

#[wasm_bindgen]
extern "C" {
    /// Sample player provided by the page (Web Audio buffers and gain nodes).
    pub type AudioHost;

    #[wasm_bindgen(method, js_name = currentTime)]
    fn current_time(this: &AudioHost) -> f64;

    /// Returns a voice handle, or null/undefined when the sample is missing.
    #[wasm_bindgen(method)]
    fn trigger(this: &AudioHost, instrument: &str, pitch: Option<String>, at: f64, velocity: f32) -> JsValue;

    #[wasm_bindgen(method, js_name = setMasterGain)]
    fn set_master_gain(this: &AudioHost, gain: f32);

    #[wasm_bindgen(method, catch, js_name = stopVoice)]
    fn stop_voice(this: &AudioHost, voice: &JsValue) -> Result<(), JsValue>;
}

struct HostBackend {
    host: AudioHost,
}

struct HostVoice {
    host: AudioHost,
    handle: JsValue,
}

impl Voice for HostVoice {
    fn stop(&mut self) -> Result<(), AccompError> {
        self.host
            .stop_voice(&self.handle)
            .map_err(|e| AccompError::Backend(e.as_string().unwrap_or_else(|| "stop failed".to_string())))
    }
}

impl AudioBackend for HostBackend {
    type Voice = HostVoice;

    fn current_time(&self) -> f64 {
        self.host.current_time()
    }

    fn trigger(
        &mut self,
        instrument: Instrument,
        pitch: Option<Pitch>,
        at: f64,
        velocity: f32,
    ) -> Option<HostVoice> {
        let handle = self
            .host
            .trigger(instrument.key(), pitch.map(|p| p.to_string()), at, velocity);
        if handle.is_null() || handle.is_undefined() {
            return None;
        }
        Some(HostVoice {
            host: self.host.clone(),
            handle,
        })
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.host.set_master_gain(gain);
    }
}

/// Audio engine plus scheduler for one page
#[wasm_bindgen]
pub struct Player {
    engine: AudioEngine<HostBackend>,
    scheduler: PlaybackScheduler<HostBackend>,
    config: EngineConfig,
}

#[wasm_bindgen]
impl Player {
    #[wasm_bindgen(constructor)]
    pub fn new(config_yaml: Option<String>) -> Result<Player, JsValue> {
        let config = load_config(config_yaml)?;
        let mut engine = AudioEngine::new();
        engine.set_master_volume(config.master_volume);
        Ok(Player {
            engine,
            scheduler: PlaybackScheduler::new(config.scheduler),
            config,
        })
    }

    /// Attach the page's sample player. Call from a user gesture; later calls are ignored.
    pub fn init(&mut self, host: AudioHost) -> Result<(), JsValue> {
        self.engine.init(|| Ok(HostBackend { host })).map_err(to_js_error)
    }

    pub fn dispose(&mut self) {
        self.scheduler.stop();
        self.engine.dispose();
    }

    /// Arrange `source` and start playing it, stopping anything already playing.
    pub fn play(&mut self, source: &str, loop_count: Option<u32>) -> Result<(), JsValue> {
        let outcome = accomp::import_progression(source).map_err(to_js_error)?;
        let sequence = accomp::playback::create_playable_sequence_with(
            &outcome.progression,
            &self.config.arrangement,
        );
        let loops = loop_count.unwrap_or(self.config.loop_count);
        self.scheduler
            .play(&mut self.engine, &sequence, loops)
            .map_err(to_js_error)
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Fire due position cues; returns an array of playback events.
    pub fn poll(&mut self, now: f64) -> Result<JsValue, JsValue> {
        let events = self.scheduler.poll(now);
        to_js_value(&events)
    }

    #[wasm_bindgen(getter, js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    #[wasm_bindgen(getter, js_name = currentMeasureIndex)]
    pub fn current_measure_index(&self) -> Option<usize> {
        self.scheduler.current_measure_index()
    }

    #[wasm_bindgen(js_name = nextDue)]
    pub fn next_due(&self) -> Option<f64> {
        self.scheduler.next_due()
    }

    #[wasm_bindgen(getter, js_name = masterVolume)]
    pub fn master_volume(&self) -> f32 {
        self.engine.master_volume()
    }

    #[wasm_bindgen(js_name = setMasterVolume)]
    pub fn set_master_volume(&mut self, volume: f32) {
        self.engine.set_master_volume(volume);
    }
}
