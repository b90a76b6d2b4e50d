//! Game state and core round types
//!
//! One `GameState` lives for the whole session; it is reset in place at the
//! end of every round.

use serde::{Deserialize, Serialize};

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to tap the mic
    #[default]
    Idle,
    /// Microphone is recording
    Listening,
    /// Cat sways toward the chosen target
    Pointing,
    /// Cat nods to confirm its choice
    Confirming,
    /// Feed button is live, waiting for the player
    AwaitingFeed,
    /// Treat is in flight
    Feeding,
    /// Cat is chewing (then happy)
    Eating,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "Idle",
            GamePhase::Listening => "Listening",
            GamePhase::Pointing => "Pointing",
            GamePhase::Confirming => "Confirming",
            GamePhase::AwaitingFeed => "AwaitingFeed",
            GamePhase::Feeding => "Feeding",
            GamePhase::Eating => "Eating",
        }
    }

    /// True once a round has started and until it resets
    pub fn in_round(&self) -> bool {
        !matches!(self, GamePhase::Idle | GamePhase::Listening)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two feedable items the cat can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Tissue box on the left
    TissueSide,
    /// Carrot on the right
    CarrotSide,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::TissueSide, Target::CarrotSide];

    /// Item key (matches the `data-type` attribute of the item element)
    pub fn key(&self) -> &'static str {
        match self {
            Target::TissueSide => "tissue",
            Target::CarrotSide => "carrot",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tissue" => Some(Target::TissueSide),
            "carrot" => Some(Target::CarrotSide),
            _ => None,
        }
    }

    /// Pose the cat takes while swaying toward this target
    pub fn pointing_pose(&self) -> CatPose {
        match self {
            Target::TissueSide => CatPose::PointingLeft,
            Target::CarrotSide => CatPose::PointingRight,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Visual state tag of the cat sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CatPose {
    /// Listening pose (base)
    #[default]
    Hold,
    PointingLeft,
    PointingRight,
    /// Nodding after the sway
    Confirming,
    Eating,
    Happy,
}

impl CatPose {
    /// Swaying toward one of the items
    pub fn is_pointing(&self) -> bool {
        matches!(self, CatPose::PointingLeft | CatPose::PointingRight)
    }

    /// Sprite image for this pose
    pub fn image(&self) -> &'static str {
        match self {
            CatPose::PointingLeft => "assets/images/l.png",
            CatPose::PointingRight => "assets/images/r.png",
            CatPose::Eating => "assets/images/e.png",
            CatPose::Hold | CatPose::Confirming | CatPose::Happy => "assets/images/hold.png",
        }
    }

    /// CSS class applied to the cat image
    pub fn image_class(&self) -> &'static str {
        match self {
            CatPose::Hold | CatPose::Confirming | CatPose::Happy => "cat-image hold",
            CatPose::PointingLeft => "cat-image pointing-left",
            CatPose::PointingRight => "cat-image pointing-right",
            CatPose::Eating => "cat-image eating",
        }
    }

    /// Extra CSS class on the cat container, if any
    pub fn container_class(&self) -> Option<&'static str> {
        match self {
            CatPose::Confirming => Some("confirming"),
            CatPose::Happy => Some("happy"),
            _ => None,
        }
    }
}

/// Status line shown under the cat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusText {
    /// Idle prompt
    #[default]
    TapMic,
    Listening,
    /// Cat points at the given target
    Pointing(Target),
}

impl StatusText {
    pub fn text(&self) -> &'static str {
        match self {
            StatusText::TapMic => "Tap the mic and start talking...",
            StatusText::Listening => "Listening...",
            StatusText::Pointing(Target::TissueSide) => "The cat points at: tissue",
            StatusText::Pointing(Target::CarrotSide) => "The cat points at: carrot",
        }
    }
}

/// Complete round state (single instance per session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase
    pub phase: GamePhase,
    /// Target chosen for this round (set on recording completion)
    pub pending_target: Option<Target>,
    /// Animation lock
    pub is_animating: bool,
    /// Microphone is capturing
    pub is_recording: bool,
    /// Sound muted (survives resets)
    pub is_muted: bool,
    /// Current cat sprite pose
    pub cat_pose: CatPose,
    /// Item currently highlighted
    pub highlighted: Option<Target>,
    /// Feed button enabled
    pub feed_enabled: bool,
    /// Status line
    pub status: StatusText,
    /// Rounds started so far (timers are tagged with it)
    pub round: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(false)
    }
}

impl GameState {
    /// Fresh state with all round flags cleared
    pub fn new(is_muted: bool) -> Self {
        Self {
            phase: GamePhase::Idle,
            pending_target: None,
            is_animating: false,
            is_recording: false,
            is_muted,
            cat_pose: CatPose::Hold,
            highlighted: None,
            feed_enabled: false,
            status: StatusText::TapMic,
            round: 0,
        }
    }

    /// Restore the per-round fields to their initial shape
    pub fn clear_round(&mut self) {
        self.phase = GamePhase::Idle;
        self.pending_target = None;
        self.cat_pose = CatPose::Hold;
        self.highlighted = None;
        self.feed_enabled = false;
        self.status = StatusText::TapMic;
    }
}
