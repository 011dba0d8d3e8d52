//! Audio system using Web Audio API
//!
//! Procedurally generated sound - no external files needed. The pop effect
//! plays per completed action; the ambient pad loops for the whole session
//! through its own gain node so music volume and mute are independent of
//! the sound effects.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Base gain of the ambient pad at music volume 1.0
const MUSIC_LEVEL: f32 = 0.18;

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    music_gain: Option<GainNode>,
    // Held so the pad's oscillator nodes stay rooted for the session
    #[allow(dead_code)]
    music_oscs: Vec<OscillatorNode>,
    music_volume: f32,
    music_paused: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            music_gain: None,
            music_oscs: Vec::new(),
            music_volume: 0.0,
            music_paused: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Start the ambient pad. Call from a user gesture; no-op if already
    /// running.
    pub fn start_music(&mut self, volume: f32) {
        if self.music_gain.is_some() {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Ok(gain) = ctx.create_gain() else { return };
        if gain.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }
        self.music_volume = volume.clamp(0.0, 1.0);
        gain.gain().set_value(self.music_volume * MUSIC_LEVEL);

        // Slightly detuned triangles make a soft lo-fi drone
        for freq in [110.0, 110.7, 220.4] {
            let Ok(osc) = ctx.create_oscillator() else {
                continue;
            };
            osc.set_type(OscillatorType::Triangle);
            osc.frequency().set_value(freq);
            if osc.connect_with_audio_node(&gain).is_ok() && osc.start().is_ok() {
                self.music_oscs.push(osc);
            }
        }
        self.music_gain = Some(gain);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if !self.music_paused {
            if let Some(gain) = &self.music_gain {
                gain.gain().set_value(self.music_volume * MUSIC_LEVEL);
            }
        }
    }

    /// Silence the pad without tearing the oscillators down
    pub fn pause_music(&mut self) {
        self.music_paused = true;
        if let Some(gain) = &self.music_gain {
            gain.gain().set_value(0.0);
        }
    }

    pub fn resume_music(&mut self) {
        self.music_paused = false;
        if let Some(gain) = &self.music_gain {
            gain.gain().set_value(self.music_volume * MUSIC_LEVEL);
        }
    }

    /// Play the popcorn pop at the given volume factor (0.0 - 1.0)
    pub fn play_pop(&self, volume_factor: f32) {
        let vol = volume_factor.clamp(0.0, 1.0);
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let t = ctx.current_time();

        // Body of the pop - quick pitch drop
        if let Some((osc, gain)) = self.create_osc(ctx, 520.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.frequency().set_value_at_time(520.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(140.0, t + 0.12)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        // Hull crack on top
        if let Some((osc, gain)) = self.create_osc(ctx, 1800.0, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.12, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.03)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.05).ok();
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }
}
