//! Success feedback layout
//!
//! Decides where each burst particle flies and how it looks. The browser
//! shell turns these into short-lived DOM nodes.

use glam::Vec2;
use rand::Rng;

use crate::polar_offset;

/// Glyphs a burst particle can take
pub const PARTICLE_GLYPHS: [&str; 4] = ["✨", "💫", "⭐", "🌟"];

/// Base travel distance of a particle (px)
const BURST_DISTANCE: f32 = 80.0;
/// Random extra distance (px)
const BURST_DISTANCE_JITTER: f32 = 40.0;
/// Smallest particle font size (px)
const PARTICLE_MIN_FONT: f32 = 15.0;
/// Random extra font size (px)
const PARTICLE_FONT_JITTER: f32 = 20.0;

/// One particle of a burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpec {
    /// Spawn position
    pub origin: Vec2,
    /// Travel (CSS `--tx` / `--ty`)
    pub offset: Vec2,
    pub glyph: &'static str,
    pub font_px: f32,
}

impl ParticleSpec {
    /// Where the particle ends up
    pub fn destination(&self) -> Vec2 {
        self.origin + self.offset
    }
}

/// Lay out `count` particles evenly around `center`
pub fn burst_particles<R: Rng>(center: Vec2, count: usize, rng: &mut R) -> Vec<ParticleSpec> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let distance = BURST_DISTANCE + rng.random::<f32>() * BURST_DISTANCE_JITTER;
            let glyph = PARTICLE_GLYPHS[rng.random_range(0..PARTICLE_GLYPHS.len())];
            let font_px = PARTICLE_MIN_FONT + rng.random::<f32>() * PARTICLE_FONT_JITTER;
            ParticleSpec {
                origin: center,
                offset: polar_offset(Vec2::ZERO, distance, angle),
                glyph,
                font_px,
            }
        })
        .collect()
}
