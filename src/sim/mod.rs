//! Deterministic round simulation
//!
//! All game sequencing lives here. This module must stay pure:
//! - Time only advances through the timer queue
//! - Seeded dice only
//! - No DOM, audio or platform dependencies (effects leave as commands)

pub mod command;
pub mod dice;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod timer;
pub mod tween;

pub use command::{Command, Layout, SoundKey, TextStyle};
pub use dice::{FixedDice, RoundDice, SeededDice};
pub use sequencer::{SUCCESS_GLYPH, Sequencer, Timings};
pub use session::{Emitted, Session};
pub use state::{CatPose, GamePhase, GameState, StatusText, Target};
pub use timer::{Scheduler, Timer, TimerEvent, TimerQueue};
pub use tween::{Tween, ease_power2_in_out};
