//! Audio system using Web Audio API
//!
//! Procedurally generated sound cues - no external files needed!

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::SoundKey;

/// Envelope floor relative to the start gain (≈ e^-3)
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
const DECAY_FLOOR: f32 = 0.05;

/// One enveloped sine note of a cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Frequency in Hz
    pub freq: f32,
    /// Start offset from the cue start (seconds)
    pub delay: f64,
    pub duration: f64,
    /// Peak gain before volume scaling
    pub gain: f32,
}

impl Tone {
    const fn new(freq: f32, delay: f64, duration: f64) -> Self {
        Self {
            freq,
            delay,
            duration,
            gain: 0.3,
        }
    }
}

/// Notes making up a cue
pub fn cue_tones(key: SoundKey) -> Vec<Tone> {
    match key {
        // A4
        SoundKey::Tissue => vec![Tone::new(440.0, 0.0, 0.5)],
        // C#5
        SoundKey::Carrot => vec![Tone::new(550.0, 0.0, 0.5)],
        // E5
        SoundKey::Treat => vec![Tone::new(660.0, 0.0, 0.5)],
        // Low munch
        SoundKey::Eat => vec![Tone::new(300.0, 0.0, 0.4)],
        // C5 E5 G5 arpeggio
        SoundKey::Success => vec![
            Tone::new(523.0, 0.0, 0.15),
            Tone::new(659.0, 0.15, 0.15),
            Tone::new(784.0, 0.3, 0.2),
        ],
    }
}

/// Per-cue mix level
pub fn cue_volume(key: SoundKey) -> f32 {
    match key {
        SoundKey::Tissue | SoundKey::Carrot | SoundKey::Treat => 0.8,
        SoundKey::Eat => 0.6,
        SoundKey::Success => 0.7,
    }
}

/// Total length of a cue in seconds
pub fn cue_length(key: SoundKey) -> f64 {
    cue_tones(key)
        .iter()
        .map(|t| t.delay + t.duration)
        .fold(0.0, f64::max)
}

/// Audio manager for the game
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    unlocked: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        #[cfg(target_arch = "wasm32")]
        let ctx = {
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            ctx
        };
        Self {
            #[cfg(target_arch = "wasm32")]
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            unlocked: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(ctx) = &self.ctx {
                if ctx.resume().is_err() {
                    log::warn!("Audio unlock failed, continuing anyway");
                }
            }
        }
        self.unlocked = true;
        log::info!("Audio unlocked");
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume for a cue
    pub fn effective_volume(&self, key: SoundKey) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume * cue_volume(key)
        }
    }

    /// Play a sound cue (dropped when muted)
    pub fn play(&self, key: SoundKey) {
        let vol = self.effective_volume(key);
        if vol <= 0.0 {
            return;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in cue_tones(key) {
                self.play_tone(ctx, &tone, vol);
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        log::debug!("Sound cue '{}' at volume {:.2}", key.as_str(), vol);
    }

    /// Create an oscillator with gain envelope
    #[cfg(target_arch = "wasm32")]
    fn create_osc(&self, ctx: &AudioContext, freq: f32) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(OscillatorType::Sine);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Single note with exponential decay
    #[cfg(target_arch = "wasm32")]
    fn play_tone(&self, ctx: &AudioContext, tone: &Tone, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, tone.freq) else {
            return;
        };
        let t = ctx.current_time() + tone.delay;
        let peak = vol * tone.gain;

        gain.gain().set_value_at_time(peak, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(peak * DECAY_FLOOR, t + tone.duration)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + tone.duration).ok();
    }
}
