//! Local "time's up" cue.
//!
//! The cue is a short sine tone shaped by a linear attack/release gain
//! envelope, rendered to mono PCM samples. [`ToneAlert`] renders the tone
//! once and logs each expiry; audio output is left to the embedding UI.

use std::f32::consts::TAU;
use std::time::Duration;

use podium_core::types::DbId;

/// Something that reacts to an authoritative timer expiry.
pub trait Alert: Send + Sync {
    fn time_up(&self, session_id: DbId, seq: i64);
}

/// Shape of the time's-up tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration: Duration,
    pub attack: Duration,
    pub release: Duration,
    /// Peak gain, 0.0 to 1.0.
    pub gain: f32,
    pub sample_rate: u32,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            duration: Duration::from_millis(600),
            attack: Duration::from_millis(10),
            release: Duration::from_millis(250),
            gain: 0.3,
            sample_rate: 44_100,
        }
    }
}

/// Render `spec` to mono `f32` samples in `-gain..=gain`.
pub fn render_tone(spec: &ToneSpec) -> Vec<f32> {
    let rate = spec.sample_rate as f32;
    let total = (spec.duration.as_secs_f32() * rate) as usize;
    let attack = (spec.attack.as_secs_f32() * rate) as usize;
    let release = (spec.release.as_secs_f32() * rate) as usize;

    (0..total)
        .map(|i| {
            let envelope = if attack > 0 && i < attack {
                i as f32 / attack as f32
            } else if release > 0 && i + release >= total {
                (total - i) as f32 / release as f32
            } else {
                1.0
            };
            let phase = TAU * spec.frequency_hz * i as f32 / rate;
            phase.sin() * envelope.min(1.0) * spec.gain
        })
        .collect()
}

/// Alert that holds a pre-rendered tone and logs every expiry.
pub struct ToneAlert {
    spec: ToneSpec,
    samples: Vec<f32>,
}

impl ToneAlert {
    pub fn new(spec: ToneSpec) -> Self {
        let samples = render_tone(&spec);
        Self { spec, samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl Default for ToneAlert {
    fn default() -> Self {
        Self::new(ToneSpec::default())
    }
}

impl Alert for ToneAlert {
    fn time_up(&self, session_id: DbId, seq: i64) {
        tracing::info!(
            session_id,
            seq,
            frequency_hz = self.spec.frequency_hz,
            samples = self.samples.len(),
            "Time's up"
        );
    }
}
