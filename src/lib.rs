//! Cat Treat - talk to the cat, watch it point, feed it a treat
//!
//! Core modules:
//! - `sim`: Deterministic round sequencing (phases, timers, tween)
//! - `audio`: Procedural Web Audio sound cues
//! - `feedback`: Particle burst and floating text layout
//! - `platform`: Browser microphone capture and platform errors
//! - `settings`: Persisted player preferences

pub mod audio;
pub mod feedback;
pub mod platform;
pub mod settings;
pub mod sim;

pub use platform::PlatformError;
pub use settings::Settings;

use glam::Vec2;

/// Game timing constants (seconds)
pub mod consts {
    /// Shortest cat sway before it commits to a target
    pub const SWAY_MIN_SECS: f64 = 2.0;
    /// Upper bound (exclusive) of the sway duration
    pub const SWAY_MAX_SECS: f64 = 5.0;
    /// Fraction of the sway after which the confirm nod starts
    pub const CONFIRM_RATIO: f64 = 0.8;
    /// Length of the confirm nod
    pub const CONFIRM_SETTLE_SECS: f64 = 0.6;
    /// Treat flight time from the button to the cat
    pub const FEED_FLIGHT_SECS: f64 = 0.8;
    /// Chewing before the happy reaction
    pub const CHEW_SECS: f64 = 0.6;
    /// Happy pose hold before the round resets
    pub const HAPPY_HOLD_SECS: f64 = 0.8;

    /// Particles in the success burst
    pub const SUCCESS_PARTICLES: usize = 12;
    /// Particle lifetime before removal
    pub const PARTICLE_LIFETIME_SECS: f64 = 1.2;
    /// Floating text lifetime before removal
    pub const FLOATING_TEXT_LIFETIME_SECS: f64 = 1.5;
}

/// Linear interpolation between two points
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Point on a circle of radius `r` at angle `theta` around `center`
#[inline]
pub fn polar_offset(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + Vec2::new(r * theta.cos(), r * theta.sin())
}
