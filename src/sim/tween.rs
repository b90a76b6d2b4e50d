//! Flying treat tween
//!
//! Position follows a power2 in-out curve; the sprite spins one full turn
//! linearly over the same duration.

use glam::Vec2;

use crate::lerp;

/// Quadratic ease-in-out (`power2.inOut`)
#[inline]
pub fn ease_power2_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// One in-flight treat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Vec2,
    pub to: Vec2,
    pub duration: f64,
    pub started_at: f64,
}

impl Tween {
    pub fn new(from: Vec2, to: Vec2, duration: f64, started_at: f64) -> Self {
        Self {
            from,
            to,
            duration,
            started_at,
        }
    }

    /// Linear progress in [0, 1]
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn is_done(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }

    /// Eased sprite position
    pub fn position(&self, now: f64) -> Vec2 {
        lerp(self.from, self.to, ease_power2_in_out(self.progress(now)))
    }

    /// Sprite rotation in degrees (linear, one turn)
    pub fn rotation_deg(&self, now: f64) -> f32 {
        self.progress(now) * 360.0
    }
}
