//! Session driver
//!
//! Couples a `Sequencer` with a `TimerQueue` and the treat tween. The
//! browser shell feeds it frame deltas; tests and the native binary feed it
//! simulated time. Every command leaves with the time it was emitted at.

use glam::Vec2;

use super::command::{Command, Layout};
use super::dice::{RoundDice, SeededDice};
use super::sequencer::{Sequencer, Timings};
use super::state::GameState;
use super::timer::{Scheduler, Timer, TimerEvent, TimerQueue};
use super::tween::Tween;

/// A command stamped with its emission time
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub at: f64,
    pub command: Command,
}

/// Sequencer + clock + tween
#[derive(Debug, Clone)]
pub struct Session<D: RoundDice> {
    sequencer: Sequencer<D>,
    timers: TimerQueue,
    tween: Option<Tween>,
    emitted: Vec<Emitted>,
}

impl Session<SeededDice> {
    /// Session with PCG dice seeded from `seed`
    pub fn seeded(seed: u64, timings: Timings, is_muted: bool) -> Self {
        Self::new(Sequencer::new(SeededDice::new(seed), timings, is_muted))
    }
}

impl<D: RoundDice> Session<D> {
    pub fn new(sequencer: Sequencer<D>) -> Self {
        Self {
            sequencer,
            timers: TimerQueue::new(),
            tween: None,
            emitted: Vec::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.timers.now()
    }

    pub fn state(&self) -> &GameState {
        self.sequencer.state()
    }

    pub fn sequencer(&self) -> &Sequencer<D> {
        &self.sequencer
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Due time of the next timer, if any
    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    /// Treat sprite position and rotation while it flies
    pub fn treat_sprite(&self) -> Option<(Vec2, f32)> {
        let now = self.now();
        self.tween
            .map(|tw| (tw.position(now), tw.rotation_deg(now)))
    }

    /// Commands emitted since the last call
    pub fn take_commands(&mut self) -> Vec<Emitted> {
        std::mem::take(&mut self.emitted)
    }

    // === Inputs ===

    pub fn set_layout(&mut self, layout: Layout) {
        self.sequencer.set_layout(layout);
    }

    pub fn start_recording(&mut self) -> bool {
        let ok = self.sequencer.start_recording();
        self.collect();
        ok
    }

    pub fn stop_recording(&mut self) -> bool {
        let ok = self.sequencer.stop_recording();
        self.collect();
        ok
    }

    pub fn toggle_recording(&mut self) -> bool {
        let ok = self.sequencer.toggle_recording();
        self.collect();
        ok
    }

    /// Recorder stop callback
    pub fn recording_complete(&mut self) -> bool {
        let ok = self.sequencer.on_recording_complete(&mut self.timers);
        self.collect();
        ok
    }

    /// Feed button
    pub fn feed(&mut self) -> bool {
        let ok = self.sequencer.feed();
        self.collect();
        ok
    }

    pub fn reset(&mut self) -> bool {
        let ok = self.sequencer.reset();
        self.collect();
        ok
    }

    pub fn toggle_muted(&mut self) -> bool {
        let muted = self.sequencer.toggle_muted();
        self.collect();
        muted
    }

    /// Drop all pending timers and the tween, then force idle
    pub fn teardown(&mut self) {
        self.timers.cancel_all();
        self.tween = None;
        self.sequencer.abort_round();
        self.collect();
    }

    // === Time ===

    /// Advance the clock by `dt` seconds, firing due timers in order.
    /// Negative or non-finite deltas leave the clock where it is.
    pub fn advance(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let until = self.now() + dt;
        self.advance_to(until);
    }

    /// Advance the clock to `until`, firing due timers in order
    pub fn advance_to(&mut self, until: f64) {
        while let Some((_, timer)) = self.timers.pop_due(until) {
            if timer.event == TimerEvent::TreatLanded {
                self.tween = None;
            }
            self.sequencer.handle_timer(timer, &mut self.timers);
            self.collect();
        }
        self.timers.advance_to(until);
    }

    /// Fire timers until none are left (or `max_secs` of simulated time)
    pub fn run_until_settled(&mut self, max_secs: f64) {
        let deadline = self.now() + max_secs;
        while let Some(due) = self.timers.next_due() {
            if due > deadline {
                break;
            }
            self.advance_to(due);
        }
    }

    /// Move queued sequencer commands to the outbox, acting as the tween
    /// collaborator for `FlyTreat`
    fn collect(&mut self) {
        let now = self.now();
        for command in self.sequencer.drain_commands() {
            if let Command::FlyTreat { from, to, duration } = command {
                self.tween = Some(Tween::new(from, to, duration, now));
                let round = self.sequencer.state().round;
                self.timers
                    .after(duration, Timer::new(round, TimerEvent::TreatLanded));
            }
            self.emitted.push(Emitted { at: now, command });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::command::SoundKey;
    use crate::sim::dice::FixedDice;
    use crate::sim::state::{GamePhase, StatusText, Target};

    const EPS: f64 = 1e-9;

    fn session(target: Target, sway: f64) -> Session<FixedDice> {
        Session::new(Sequencer::new(
            FixedDice::new(target, sway),
            Timings::default(),
            false,
        ))
    }

    fn times_of(emitted: &[Emitted], command: &Command) -> Vec<f64> {
        emitted
            .iter()
            .filter(|e| &e.command == command)
            .map(|e| e.at)
            .collect()
    }

    /// Start a round and wait until the feed button is live
    fn to_awaiting_feed(s: &mut Session<FixedDice>) {
        s.start_recording();
        s.stop_recording();
        s.recording_complete();
        s.run_until_settled(10.0);
        assert_eq!(s.state().phase, GamePhase::AwaitingFeed);
    }

    #[test]
    fn test_confirm_timing_follows_sway() {
        for sway in [2.0, 3.3, 4.99] {
            let mut s = session(Target::TissueSide, sway);
            s.recording_complete();
            let start = s.now();

            s.advance(sway * CONFIRM_RATIO - 0.01);
            assert_eq!(s.state().phase, GamePhase::Pointing);
            s.advance(0.01 + EPS);
            assert_eq!(s.state().phase, GamePhase::Confirming);

            s.advance(CONFIRM_SETTLE_SECS - 0.01);
            assert!(s.state().is_animating);
            s.advance(0.01);
            assert_eq!(s.state().phase, GamePhase::AwaitingFeed);
            assert!(!s.state().is_animating);

            let emitted = s.take_commands();
            let enabled = times_of(&emitted, &Command::SetFeedEnabled(true));
            assert_eq!(enabled.len(), 1);
            let expected = start + sway * CONFIRM_RATIO + CONFIRM_SETTLE_SECS;
            assert!((enabled[0] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_long_frames_keep_real_time() {
        let mut s = session(Target::TissueSide, 2.0);
        s.recording_complete();
        let expected = 2.0 * CONFIRM_RATIO + CONFIRM_SETTLE_SECS;

        let mut frames = 0;
        while s.state().phase != GamePhase::AwaitingFeed && frames < 40 {
            s.advance(0.25);
            frames += 1;
        }
        assert_eq!(frames, 9);
        assert!((s.now() - 2.25).abs() < 1e-6);

        let enabled = times_of(&s.take_commands(), &Command::SetFeedEnabled(true));
        assert_eq!(enabled.len(), 1);
        assert!((enabled[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bad_frame_delta_ignored() {
        let mut s = session(Target::TissueSide, 2.0);
        s.recording_complete();
        s.advance(0.5);
        s.advance(-1.0);
        s.advance(f64::NAN);
        s.advance(f64::INFINITY);
        assert!((s.now() - 0.5).abs() < EPS);
        assert_eq!(s.state().phase, GamePhase::Pointing);
    }

    #[test]
    fn test_tissue_scenario() {
        let mut s = session(Target::TissueSide, 2.5);
        s.start_recording();
        s.stop_recording();
        s.take_commands();

        s.recording_complete();
        let emitted = s.take_commands();
        assert!(emitted
            .iter()
            .any(|e| e.command == Command::SetStatus(StatusText::Pointing(Target::TissueSide))));
        assert!(emitted
            .iter()
            .any(|e| e.command == Command::HighlightTarget(Some(Target::TissueSide))));
        assert!(!emitted
            .iter()
            .any(|e| e.command == Command::SetFeedEnabled(true)));
        assert!(!s.state().feed_enabled);

        s.run_until_settled(10.0);
        assert!(s.state().feed_enabled);
        assert_eq!(s.state().status, StatusText::Pointing(Target::TissueSide));
    }

    #[test]
    fn test_feed_scenario_timeline() {
        let mut s = session(Target::CarrotSide, 3.0);
        to_awaiting_feed(&mut s);
        s.take_commands();

        let t0 = s.now();
        assert!(s.feed());
        assert!(s.treat_sprite().is_some());
        s.run_until_settled(10.0);

        let emitted = s.take_commands();
        let success = times_of(&emitted, &Command::PlaySound(SoundKey::Success));
        assert_eq!(success.len(), 1);
        assert!((success[0] - (t0 + FEED_FLIGHT_SECS + CHEW_SECS)).abs() < 1e-6);

        let eat = times_of(&emitted, &Command::PlaySound(SoundKey::Eat));
        assert!((eat[0] - (t0 + FEED_FLIGHT_SECS)).abs() < 1e-6);

        let reset = times_of(&emitted, &Command::SetStatus(StatusText::TapMic));
        assert_eq!(reset.len(), 1);
        assert!(
            (reset[0] - (t0 + FEED_FLIGHT_SECS + CHEW_SECS + HAPPY_HOLD_SECS)).abs() < 1e-6
        );

        assert!(emitted.iter().any(|e| matches!(
            e.command,
            Command::Burst { count: SUCCESS_PARTICLES, .. }
        )));
        assert_eq!(s.state().pending_target, None);
        assert_eq!(s.state().phase, GamePhase::Idle);
        assert!(s.treat_sprite().is_none());
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn test_animating_windows() {
        let mut s = session(Target::TissueSide, 2.0);
        to_awaiting_feed(&mut s);
        assert!(!s.state().is_animating);

        s.feed();
        let t0 = s.now();
        let end = t0 + FEED_FLIGHT_SECS + CHEW_SECS + HAPPY_HOLD_SECS;
        let mut t = t0;
        while t + 0.05 < end - 1e-6 {
            t += 0.05;
            s.advance_to(t);
            assert!(s.state().is_animating, "not animating at {t}");
        }
        s.advance_to(end + EPS);
        assert!(!s.state().is_animating);
        assert_eq!(s.state().phase, GamePhase::Idle);
    }

    #[test]
    fn test_second_feed_rejected_until_reset() {
        let mut s = session(Target::TissueSide, 2.0);
        to_awaiting_feed(&mut s);
        assert!(s.feed());
        for _ in 0..12 {
            s.advance(0.2);
            assert!(!s.feed());
        }
        assert_eq!(s.state().phase, GamePhase::Idle);
        assert!(!s.feed());
    }

    #[test]
    fn test_custom_feed_flight() {
        let mut s = Session::new(Sequencer::new(
            FixedDice::new(Target::CarrotSide, 2.0),
            Timings::with_feed_flight(1.5),
            false,
        ));
        to_awaiting_feed(&mut s);
        s.feed();
        s.advance(1.4);
        assert_eq!(s.state().phase, GamePhase::Feeding);
        s.advance(0.1 + EPS);
        assert_eq!(s.state().phase, GamePhase::Eating);
    }

    #[test]
    fn test_treat_sprite_moves_toward_cat() {
        let mut s = session(Target::TissueSide, 2.0);
        to_awaiting_feed(&mut s);
        let layout = *s.sequencer().layout();
        s.feed();

        let (start, rot0) = s.treat_sprite().expect("flying");
        assert_eq!(start, layout.treat_button);
        assert_eq!(rot0, 0.0);

        s.advance(FEED_FLIGHT_SECS / 2.0);
        let (mid, _) = s.treat_sprite().expect("flying");
        let expected = (layout.treat_button + layout.cat_mouth()) / 2.0;
        assert!((mid - expected).length() < 1e-2);
    }

    #[test]
    fn test_teardown_cancels_in_flight_round() {
        let mut s = session(Target::TissueSide, 2.0);
        to_awaiting_feed(&mut s);
        s.feed();
        s.advance(0.3);
        s.teardown();

        assert_eq!(s.pending_timers(), 0);
        assert!(s.treat_sprite().is_none());
        assert_eq!(s.state().phase, GamePhase::Idle);
        assert!(!s.state().is_animating);

        s.take_commands();
        s.advance(10.0);
        assert!(s.take_commands().is_empty());

        // Next round works normally
        s.start_recording();
        s.stop_recording();
        assert!(s.recording_complete());
        assert_eq!(s.state().round, 2);
    }

    #[test]
    fn test_teardown_while_recording() {
        let mut s = session(Target::TissueSide, 2.0);
        s.start_recording();
        s.take_commands();
        s.teardown();
        assert!(!s.state().is_recording);
        assert_eq!(s.state().phase, GamePhase::Idle);
        let emitted = s.take_commands();
        assert_eq!(times_of(&emitted, &Command::SetRecording(false)).len(), 1);
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn test_reset_twice_same_state() {
        let mut s = session(Target::TissueSide, 2.0);
        to_awaiting_feed(&mut s);
        s.feed();
        s.run_until_settled(10.0);
        let once = s.state().clone();
        s.reset();
        assert_eq!(s.state(), &once);
    }

    #[test]
    fn test_seeded_sessions_reproducible() {
        let mut a = Session::seeded(99, Timings::default(), false);
        let mut b = Session::seeded(99, Timings::default(), false);
        for _ in 0..5 {
            for s in [&mut a, &mut b] {
                s.start_recording();
                s.stop_recording();
                s.recording_complete();
                s.run_until_settled(10.0);
                s.feed();
                s.run_until_settled(10.0);
            }
        }
        assert_eq!(a.take_commands(), b.take_commands());
        assert_eq!(a.now(), b.now());
    }

    #[test]
    fn test_mute_toggle_emits() {
        let mut s = session(Target::TissueSide, 2.0);
        assert!(s.toggle_muted());
        assert_eq!(
            s.take_commands(),
            vec![Emitted {
                at: 0.0,
                command: Command::MuteChanged(true)
            }]
        );
        assert!(!s.toggle_muted());
    }
}
