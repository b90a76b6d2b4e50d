//! Outbound commands to the presentation collaborators
//!
//! The sequencer never touches audio, DOM or tweens directly. It queues
//! commands which the session (and the browser shell) carries out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{CatPose, StatusText, Target};

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundKey {
    Tissue,
    Carrot,
    Treat,
    Eat,
    Success,
}

impl SoundKey {
    pub const ALL: [SoundKey; 5] = [
        SoundKey::Tissue,
        SoundKey::Carrot,
        SoundKey::Treat,
        SoundKey::Eat,
        SoundKey::Success,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundKey::Tissue => "tissue",
            SoundKey::Carrot => "carrot",
            SoundKey::Treat => "treat",
            SoundKey::Eat => "eat",
            SoundKey::Success => "success",
        }
    }

    /// Cue announcing a target
    pub fn for_target(target: Target) -> Self {
        match target {
            Target::TissueSide => SoundKey::Tissue,
            Target::CarrotSide => SoundKey::Carrot,
        }
    }
}

/// Floating text styles (CSS class suffix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    Hearts,
}

impl TextStyle {
    pub fn class(&self) -> &'static str {
        match self {
            TextStyle::Hearts => "hearts",
        }
    }
}

/// A single collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Play a sound (the audio layer drops it when muted)
    PlaySound(SoundKey),
    /// Fly the treat sprite; the tween reports back when it lands
    FlyTreat { from: Vec2, to: Vec2, duration: f64 },
    /// Particle burst around a point
    Burst { at: Vec2, count: usize },
    /// Floating glyph above a point
    FloatingText {
        at: Vec2,
        glyph: &'static str,
        style: TextStyle,
    },
    /// Highlight one item (None clears all highlights)
    HighlightTarget(Option<Target>),
    SetStatus(StatusText),
    SetFeedEnabled(bool),
    SetCatPose(CatPose),
    /// Length of the pointing sway animation (seconds)
    SetSwayDuration(f64),
    /// Mic button recording indicator
    SetRecording(bool),
    /// Mute flag changed (persist + update button)
    MuteChanged(bool),
}

/// Screen geometry the sequencer needs for commands (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Centre of the treat button (flight start)
    pub treat_button: Vec2,
    /// Top-left corner of the cat element
    pub cat_origin: Vec2,
    /// Size of the cat element
    pub cat_size: Vec2,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            treat_button: Vec2::new(180.0, 620.0),
            cat_origin: Vec2::new(90.0, 200.0),
            cat_size: Vec2::new(180.0, 180.0),
        }
    }
}

impl Layout {
    /// Where the treat lands
    pub fn cat_mouth(&self) -> Vec2 {
        self.cat_origin + self.cat_size / 2.0
    }

    /// Centre of the success particle burst
    pub fn burst_center(&self) -> Vec2 {
        self.cat_origin + Vec2::new(90.0, 50.0)
    }

    /// Anchor of the floating success glyph
    pub fn floating_text_anchor(&self) -> Vec2 {
        self.cat_origin + Vec2::new(60.0, -30.0)
    }
}
