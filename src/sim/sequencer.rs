//! Round sequencer
//!
//! Owns the phase, the pending target and the animation lock. Every
//! delayed step goes through a `Scheduler`; every visible effect is queued
//! as a `Command`.

use serde::{Deserialize, Serialize};

use super::command::{Command, Layout, SoundKey, TextStyle};
use super::dice::RoundDice;
use super::state::{CatPose, GamePhase, GameState, StatusText, Target};
use super::timer::{Scheduler, Timer, TimerEvent};
use crate::consts::*;

/// Glyph floated above the cat after a successful feed
pub const SUCCESS_GLYPH: &str = "😋";

/// Round timing configuration (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub sway_min: f64,
    pub sway_max: f64,
    /// Fraction of the sway at which the confirm nod starts
    pub confirm_ratio: f64,
    pub confirm_settle: f64,
    pub feed_flight: f64,
    pub chew: f64,
    pub happy_hold: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            sway_min: SWAY_MIN_SECS,
            sway_max: SWAY_MAX_SECS,
            confirm_ratio: CONFIRM_RATIO,
            confirm_settle: CONFIRM_SETTLE_SECS,
            feed_flight: FEED_FLIGHT_SECS,
            chew: CHEW_SECS,
            happy_hold: HAPPY_HOLD_SECS,
        }
    }
}

impl Timings {
    /// Default timings with a different treat flight time
    pub fn with_feed_flight(feed_flight: f64) -> Self {
        Self {
            feed_flight,
            ..Self::default()
        }
    }
}

/// The game's round state machine
#[derive(Debug, Clone)]
pub struct Sequencer<D: RoundDice> {
    state: GameState,
    timings: Timings,
    layout: Layout,
    dice: D,
    outbox: Vec<Command>,
    last_sway: Option<f64>,
}

impl<D: RoundDice> Sequencer<D> {
    pub fn new(dice: D, timings: Timings, is_muted: bool) -> Self {
        Self {
            state: GameState::new(is_muted),
            timings,
            layout: Layout::default(),
            dice,
            outbox: Vec::new(),
            last_sway: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Update screen geometry (the shell calls this on resize)
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    /// Sway duration drawn for the most recent pointing sequence
    pub fn last_sway_secs(&self) -> Option<f64> {
        self.last_sway
    }

    /// Take all queued commands
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, command: Command) {
        self.outbox.push(command);
    }

    fn set_pose(&mut self, pose: CatPose) {
        self.state.cat_pose = pose;
        self.emit(Command::SetCatPose(pose));
    }

    fn set_status(&mut self, status: StatusText) {
        self.state.status = status;
        self.emit(Command::SetStatus(status));
    }

    fn set_feed_enabled(&mut self, enabled: bool) {
        self.state.feed_enabled = enabled;
        self.emit(Command::SetFeedEnabled(enabled));
    }

    fn set_highlight(&mut self, target: Option<Target>) {
        self.state.highlighted = target;
        self.emit(Command::HighlightTarget(target));
    }

    fn set_recording(&mut self, recording: bool) {
        self.state.is_recording = recording;
        self.emit(Command::SetRecording(recording));
    }

    fn schedule(&self, sched: &mut dyn Scheduler, seconds: f64, event: TimerEvent) {
        sched.after(seconds, Timer::new(self.state.round, event));
    }

    // === Recording ===

    /// Mic pressed while idle. Returns false if ignored.
    pub fn start_recording(&mut self) -> bool {
        if self.state.phase != GamePhase::Idle || self.state.is_recording || self.state.is_animating
        {
            log::debug!("start_recording ignored in {}", self.state.phase);
            return false;
        }
        self.set_recording(true);
        self.state.phase = GamePhase::Listening;
        self.set_status(StatusText::Listening);
        log::info!("Recording started");
        true
    }

    /// Mic pressed while recording. Completion arrives separately through
    /// `on_recording_complete` once the recorder has flushed.
    pub fn stop_recording(&mut self) -> bool {
        if !self.state.is_recording {
            log::debug!("stop_recording ignored: not recording");
            return false;
        }
        self.set_recording(false);
        log::info!("Recording stopped");
        true
    }

    /// Mic button: start when idle, stop when recording
    pub fn toggle_recording(&mut self) -> bool {
        if self.state.is_recording {
            self.stop_recording()
        } else {
            self.start_recording()
        }
    }

    /// Recorder finished: pick a target and start pointing.
    /// Ignored while a round is already running.
    pub fn on_recording_complete(&mut self, sched: &mut dyn Scheduler) -> bool {
        if self.state.phase.in_round() {
            log::debug!("Recording completion ignored in {}", self.state.phase);
            return false;
        }
        if self.state.is_recording {
            self.set_recording(false);
        }

        let target = self.dice.pick_target();
        self.state.round += 1;
        self.state.pending_target = Some(target);
        self.state.phase = GamePhase::Pointing;
        log::info!("Round {}: cat picks {}", self.state.round, target);

        self.set_status(StatusText::Pointing(target));
        self.start_pointing_sequence(target, sched);
        true
    }

    // === Pointing ===

    /// Sway toward `target`, then nod. No-op while animating.
    pub fn start_pointing_sequence(&mut self, target: Target, sched: &mut dyn Scheduler) -> bool {
        if self.state.is_animating {
            log::debug!("Pointing sequence ignored: already animating");
            return false;
        }
        self.state.is_animating = true;
        self.state.phase = GamePhase::Pointing;

        let sway = self
            .dice
            .sway_secs(self.timings.sway_min, self.timings.sway_max);
        self.last_sway = Some(sway);
        log::info!("Cat points at {}, sway {:.2}s", target, sway);

        self.emit(Command::SetSwayDuration(sway));
        self.set_pose(target.pointing_pose());
        self.set_highlight(Some(target));
        self.schedule(
            sched,
            sway * self.timings.confirm_ratio,
            TimerEvent::ConfirmStart,
        );
        true
    }

    fn on_confirm_start(&mut self, sched: &mut dyn Scheduler) {
        if self.state.phase != GamePhase::Pointing {
            log::debug!("Confirm start ignored in {}", self.state.phase);
            return;
        }
        self.state.phase = GamePhase::Confirming;
        self.set_pose(CatPose::Confirming);
        if let Some(target) = self.state.pending_target {
            self.emit(Command::PlaySound(SoundKey::for_target(target)));
        }
        log::info!("Cat confirms");
        self.schedule(sched, self.timings.confirm_settle, TimerEvent::ConfirmSettled);
    }

    fn on_confirm_settled(&mut self) {
        if self.state.phase != GamePhase::Confirming {
            log::debug!("Confirm settle ignored in {}", self.state.phase);
            return;
        }
        self.state.is_animating = false;
        self.state.phase = GamePhase::AwaitingFeed;
        self.set_pose(CatPose::Hold);
        self.set_feed_enabled(true);
    }

    // === Feeding ===

    /// Throw the treat. Only accepted while awaiting a feed.
    pub fn feed(&mut self) -> bool {
        if self.state.phase != GamePhase::AwaitingFeed
            || self.state.is_animating
            || self.state.pending_target.is_none()
        {
            log::debug!(
                "feed ignored (phase {}, animating {})",
                self.state.phase,
                self.state.is_animating
            );
            return false;
        }
        self.state.phase = GamePhase::Feeding;
        self.set_feed_enabled(false);
        self.state.is_animating = true;

        if let Some(target) = self.state.pending_target {
            log::info!("Treat thrown, cat pointed at {}", target);
        }
        self.emit(Command::PlaySound(SoundKey::Treat));
        self.emit(Command::FlyTreat {
            from: self.layout.treat_button,
            to: self.layout.cat_mouth(),
            duration: self.timings.feed_flight,
        });
        true
    }

    /// Tween completion callback
    pub fn on_treat_landed(&mut self, sched: &mut dyn Scheduler) -> bool {
        if self.state.phase != GamePhase::Feeding {
            log::debug!("Treat landing ignored in {}", self.state.phase);
            return false;
        }
        self.start_eating_sequence(sched);
        true
    }

    /// Chew, celebrate, then reset
    pub fn start_eating_sequence(&mut self, sched: &mut dyn Scheduler) {
        self.state.is_animating = true;
        self.state.phase = GamePhase::Eating;
        self.set_pose(CatPose::Eating);
        self.emit(Command::PlaySound(SoundKey::Eat));
        self.schedule(sched, self.timings.chew, TimerEvent::ChewDone);
    }

    fn on_chew_done(&mut self, sched: &mut dyn Scheduler) {
        if self.state.phase != GamePhase::Eating || self.state.cat_pose != CatPose::Eating {
            log::debug!(
                "Chew end ignored (phase {}, pose {:?})",
                self.state.phase,
                self.state.cat_pose
            );
            return;
        }
        self.set_pose(CatPose::Happy);
        self.emit(Command::Burst {
            at: self.layout.burst_center(),
            count: SUCCESS_PARTICLES,
        });
        self.emit(Command::FloatingText {
            at: self.layout.floating_text_anchor(),
            glyph: SUCCESS_GLYPH,
            style: TextStyle::Hearts,
        });
        self.emit(Command::PlaySound(SoundKey::Success));
        self.schedule(sched, self.timings.happy_hold, TimerEvent::HappyHoldDone);
    }

    fn on_happy_hold_done(&mut self) {
        if self.state.phase != GamePhase::Eating {
            log::debug!("Happy hold end ignored in {}", self.state.phase);
            return;
        }
        self.state.is_animating = false;
        self.reset();
    }

    // === Round boundary ===

    /// Back to the idle prompt. Ignored while animating or recording.
    pub fn reset(&mut self) -> bool {
        if self.state.is_animating || self.state.is_recording {
            log::debug!("reset ignored while busy ({})", self.state.phase);
            return false;
        }
        self.state.clear_round();
        self.emit(Command::HighlightTarget(None));
        self.emit(Command::SetCatPose(CatPose::Hold));
        self.emit(Command::SetFeedEnabled(false));
        self.emit(Command::SetStatus(StatusText::TapMic));
        log::info!("Round reset, ready for the next one");
        true
    }

    /// Force the machine back to idle (screen teardown). Pending timers
    /// must be cancelled by the caller; any that still fire are stale.
    pub fn abort_round(&mut self) {
        if self.state.phase != GamePhase::Idle || self.state.is_animating {
            log::warn!("Aborting round in {}", self.state.phase);
        }
        self.state.is_animating = false;
        if self.state.is_recording {
            self.set_recording(false);
        }
        self.reset();
    }

    /// Dispatch a fired timer. Timers from an earlier round are dropped.
    pub fn handle_timer(&mut self, timer: Timer, sched: &mut dyn Scheduler) {
        if timer.round != self.state.round {
            log::debug!(
                "Stale timer {:?} from round {} (now {})",
                timer.event,
                timer.round,
                self.state.round
            );
            return;
        }
        match timer.event {
            TimerEvent::ConfirmStart => self.on_confirm_start(sched),
            TimerEvent::ConfirmSettled => self.on_confirm_settled(),
            TimerEvent::TreatLanded => {
                self.on_treat_landed(sched);
            }
            TimerEvent::ChewDone => self.on_chew_done(sched),
            TimerEvent::HappyHoldDone => self.on_happy_hold_done(),
        }
    }

    // === Mute ===

    pub fn set_muted(&mut self, muted: bool) {
        if self.state.is_muted != muted {
            self.state.is_muted = muted;
            self.emit(Command::MuteChanged(muted));
        }
    }

    pub fn toggle_muted(&mut self) -> bool {
        let muted = !self.state.is_muted;
        self.set_muted(muted);
        muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::dice::FixedDice;
    use crate::sim::timer::TimerQueue;

    fn sequencer(target: Target, sway: f64) -> Sequencer<FixedDice> {
        Sequencer::new(FixedDice::new(target, sway), Timings::default(), false)
    }

    /// Fire every due timer up to `until`
    fn run_until(seq: &mut Sequencer<FixedDice>, q: &mut TimerQueue, until: f64) {
        while let Some((_, timer)) = q.pop_due(until) {
            seq.handle_timer(timer, q);
        }
        q.advance_to(until);
    }

    #[test]
    fn test_recording_round_trip() {
        let mut seq = sequencer(Target::TissueSide, 3.0);
        assert!(seq.start_recording());
        assert_eq!(seq.state().phase, GamePhase::Listening);
        assert!(seq.state().is_recording);
        assert!(!seq.start_recording());

        assert!(seq.stop_recording());
        assert!(!seq.state().is_recording);
        assert_eq!(seq.state().phase, GamePhase::Listening);
        assert!(!seq.stop_recording());
    }

    #[test]
    fn test_toggle_recording() {
        let mut seq = sequencer(Target::TissueSide, 3.0);
        assert!(seq.toggle_recording());
        assert!(seq.state().is_recording);
        assert!(seq.toggle_recording());
        assert!(!seq.state().is_recording);
        let cmds = seq.drain_commands();
        assert!(cmds.contains(&Command::SetRecording(true)));
        assert!(cmds.contains(&Command::SetRecording(false)));
    }

    #[test]
    fn test_recording_complete_starts_pointing() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::CarrotSide, 2.5);
        seq.start_recording();
        seq.stop_recording();
        seq.drain_commands();

        assert!(seq.on_recording_complete(&mut q));
        let s = seq.state();
        assert_eq!(s.phase, GamePhase::Pointing);
        assert_eq!(s.pending_target, Some(Target::CarrotSide));
        assert!(s.is_animating);
        assert!(!s.feed_enabled);
        assert_eq!(s.cat_pose, CatPose::PointingRight);
        assert_eq!(s.round, 1);
        assert_eq!(seq.last_sway_secs(), Some(2.5));
        assert_eq!(q.next_due(), Some(2.5 * CONFIRM_RATIO));

        let cmds = seq.drain_commands();
        assert!(cmds.contains(&Command::SetStatus(StatusText::Pointing(Target::CarrotSide))));
        assert!(cmds.contains(&Command::HighlightTarget(Some(Target::CarrotSide))));
        assert!(!cmds.contains(&Command::SetFeedEnabled(true)));
    }

    #[test]
    fn test_sway_duration_reaches_shell() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 4.7);
        seq.start_recording();
        seq.stop_recording();
        seq.drain_commands();

        seq.on_recording_complete(&mut q);
        let cmds = seq.drain_commands();
        let sway = cmds.iter().position(|c| *c == Command::SetSwayDuration(4.7));
        let pose = cmds
            .iter()
            .position(|c| *c == Command::SetCatPose(CatPose::PointingLeft));
        assert!(sway.is_some());
        assert!(sway < pose);
        assert_eq!(q.next_due(), Some(4.7 * CONFIRM_RATIO));
    }

    #[test]
    fn test_recording_complete_while_recording_clears_flag() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        seq.start_recording();
        assert!(seq.on_recording_complete(&mut q));
        assert!(!seq.state().is_recording);
    }

    #[test]
    fn test_recording_complete_reentrancy_guarded() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        assert!(seq.on_recording_complete(&mut q));
        let before = seq.state().clone();
        let pending = q.len();
        assert!(!seq.on_recording_complete(&mut q));
        assert_eq!(seq.state(), &before);
        assert_eq!(q.len(), pending);
    }

    #[test]
    fn test_pointing_ignored_while_animating() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        seq.on_recording_complete(&mut q);
        assert!(!seq.start_pointing_sequence(Target::CarrotSide, &mut q));
        assert_eq!(q.len(), 1);
        assert_eq!(seq.state().cat_pose, CatPose::PointingLeft);
    }

    #[test]
    fn test_confirm_then_awaiting_feed() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 4.0);
        seq.on_recording_complete(&mut q);

        run_until(&mut seq, &mut q, 3.19);
        assert_eq!(seq.state().phase, GamePhase::Pointing);

        run_until(&mut seq, &mut q, 3.2);
        assert_eq!(seq.state().phase, GamePhase::Confirming);
        assert!(seq.state().is_animating);
        assert!(seq.drain_commands().contains(&Command::PlaySound(SoundKey::Tissue)));

        run_until(&mut seq, &mut q, 3.8 + 1e-9);
        let s = seq.state();
        assert_eq!(s.phase, GamePhase::AwaitingFeed);
        assert!(!s.is_animating);
        assert!(s.feed_enabled);
        assert_eq!(s.cat_pose, CatPose::Hold);
    }

    #[test]
    fn test_feed_outside_awaiting_is_noop() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);

        assert!(!seq.feed());
        assert!(seq.drain_commands().is_empty());

        seq.on_recording_complete(&mut q);
        seq.drain_commands();
        let before = seq.state().clone();
        assert!(!seq.feed());
        assert_eq!(seq.state(), &before);
        assert!(seq.drain_commands().is_empty());
    }

    #[test]
    fn test_feed_emits_flight_and_locks() {
        let mut q = TimerQueue::new();
        let mut seq = Sequencer::new(
            FixedDice::new(Target::CarrotSide, 2.0),
            Timings::with_feed_flight(1.25),
            false,
        );
        seq.on_recording_complete(&mut q);
        run_until(&mut seq, &mut q, 10.0);
        seq.drain_commands();

        assert!(seq.feed());
        assert_eq!(seq.state().phase, GamePhase::Feeding);
        assert!(seq.state().is_animating);
        assert!(!seq.state().feed_enabled);
        assert!(!seq.feed());

        let layout = *seq.layout();
        let cmds = seq.drain_commands();
        assert!(cmds.contains(&Command::FlyTreat {
            from: layout.treat_button,
            to: layout.cat_mouth(),
            duration: 1.25,
        }));
        assert_eq!(cmds.first(), Some(&Command::SetFeedEnabled(false)));
    }

    #[test]
    fn test_eating_sequence_resets() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        seq.on_recording_complete(&mut q);
        run_until(&mut seq, &mut q, 5.0);
        seq.feed();
        assert!(seq.on_treat_landed(&mut q));
        assert_eq!(seq.state().phase, GamePhase::Eating);
        assert_eq!(seq.state().cat_pose, CatPose::Eating);

        run_until(&mut seq, &mut q, 5.6 + 1e-9);
        assert_eq!(seq.state().cat_pose, CatPose::Happy);
        assert!(seq.state().is_animating);

        run_until(&mut seq, &mut q, 6.4 + 1e-9);
        let s = seq.state();
        assert_eq!(s.phase, GamePhase::Idle);
        assert_eq!(s.pending_target, None);
        assert!(!s.is_animating);
        assert_eq!(s.status, StatusText::TapMic);
    }

    #[test]
    fn test_treat_landing_outside_feeding_ignored() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        assert!(!seq.on_treat_landed(&mut q));
        assert!(q.is_empty());
        assert_eq!(seq.state().phase, GamePhase::Idle);
    }

    #[test]
    fn test_reset_idempotent() {
        let mut seq = sequencer(Target::TissueSide, 2.0);
        assert!(seq.reset());
        let once = seq.state().clone();
        assert!(seq.reset());
        assert_eq!(seq.state(), &once);
    }

    #[test]
    fn test_reset_ignored_while_animating() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        seq.on_recording_complete(&mut q);
        assert!(!seq.reset());
        assert_eq!(seq.state().pending_target, Some(Target::TissueSide));
    }

    #[test]
    fn test_stale_timer_ignored_after_abort() {
        let mut q = TimerQueue::new();
        let mut seq = sequencer(Target::TissueSide, 2.0);
        seq.on_recording_complete(&mut q);
        seq.abort_round();
        assert_eq!(seq.state().phase, GamePhase::Idle);
        assert!(!seq.state().is_animating);

        // Start a new round; the old ConfirmStart is still queued
        seq.on_recording_complete(&mut q);
        assert_eq!(seq.state().round, 2);
        let (_, stale) = q.pop_due(10.0).expect("stale timer");
        assert_eq!(stale.round, 1);
        seq.handle_timer(stale, &mut q);
        assert_eq!(seq.state().phase, GamePhase::Pointing);
    }

    #[test]
    fn test_mute_survives_reset() {
        let mut seq = sequencer(Target::TissueSide, 2.0);
        assert!(seq.toggle_muted());
        seq.reset();
        assert!(seq.state().is_muted);
        let cmds = seq.drain_commands();
        assert_eq!(cmds.first(), Some(&Command::MuteChanged(true)));

        seq.set_muted(true);
        assert!(seq.drain_commands().is_empty());
    }

    #[test]
    fn test_timings_deserialize_partial() {
        let t: Timings = serde_json::from_str(r#"{"feed_flight": 1.5}"#).expect("parse");
        assert_eq!(t.feed_flight, 1.5);
        assert_eq!(t.chew, CHEW_SECS);
        assert_eq!(t.confirm_ratio, CONFIRM_RATIO);
    }
}
