//! Receiver-side replay: decoded events in, OS input out.
//!
//! Two layers:
//!
//! - [`InputReplayer`] is synchronous and single-owner.  It routes each
//!   event (mouse motion and clicks to the [`InputInjector`], gamepad input
//!   to the [`KeyboardEmitter`]) and coalesces pointer motion until
//!   [`InputReplayer::flush_motion`] is called.
//! - [`ReceiverPump`] owns a replayer on a dedicated lane task.  Inbound
//!   chunks are queued on an unbounded channel, decoded and routed in
//!   receipt order; the same task runs the motion-flush interval, so every
//!   OS call is issued from one place.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use padlink_core::keymap::is_gamepad_code;
use padlink_core::{decode, ConnectionState, Event};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::application::inject_input::{InputInjector, MouseButton};
use crate::application::keyboard_emitter::{KeyboardEmitter, SteerParams};

/// Default motion-flush period.
pub const DEFAULT_MOTION_TICK: Duration = Duration::from_millis(8);

/// Splits a pointer delta into at most `max_steps` sub-steps.
///
/// The number of steps is `ceil(max(|dx|, |dy|) / step_threshold)` clamped
/// to `1..=max_steps`.  Every step but the last carries the truncated share;
/// the last carries the remainder, so the steps always sum to `(dx, dy)`.
/// `(0, 0)` yields no steps.
///
/// ```
/// use padlink_receiver::application::replay_input::split_move;
///
/// assert_eq!(split_move(100, 0, 12, 4), vec![(25, 0); 4]);
/// assert!(split_move(0, 0, 12, 4).is_empty());
/// ```
pub fn split_move(dx: i32, dy: i32, step_threshold: i32, max_steps: usize) -> Vec<(i32, i32)> {
    if (dx, dy) == (0, 0) {
        return Vec::new();
    }
    let threshold = i64::from(step_threshold.max(1));
    let span = i64::from(dx).abs().max(i64::from(dy).abs());
    let max_steps = max_steps.max(1) as i64;
    let steps = ((span + threshold - 1) / threshold).clamp(1, max_steps);

    let (dx, dy) = (i64::from(dx), i64::from(dy));
    let (share_x, share_y) = (dx / steps, dy / steps);
    let mut out: Vec<(i32, i32)> = (0..steps - 1)
        .map(|_| (share_x as i32, share_y as i32))
        .collect();
    out.push((
        (dx - share_x * (steps - 1)) as i32,
        (dy - share_y * (steps - 1)) as i32,
    ));
    out
}

/// Tuning for [`InputReplayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySettings {
    /// Largest per-axis delta injected in one sub-step before splitting.
    pub step_threshold: i32,
    /// Upper bound on sub-steps per flush.
    pub max_substeps: usize,
    /// Stick deadzone on the `[-1000, 1000]` axis scale.
    pub stick_deadzone: i32,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            step_threshold: 12,
            max_substeps: 4,
            stick_deadzone: 250,
        }
    }
}

/// Routes decoded events to the OS and coalesces pointer motion.
pub struct InputReplayer {
    injector: Arc<dyn InputInjector>,
    emitter: KeyboardEmitter,
    settings: ReplaySettings,
    pending_move: (i32, i32),
    pending_scroll: (i32, i32),
}

impl InputReplayer {
    pub fn new(
        injector: Arc<dyn InputInjector>,
        emitter: KeyboardEmitter,
        settings: ReplaySettings,
    ) -> Self {
        Self {
            injector,
            emitter,
            settings,
            pending_move: (0, 0),
            pending_scroll: (0, 0),
        }
    }

    /// The emitter gamepad input is routed to.
    pub fn emitter(&self) -> &KeyboardEmitter {
        &self.emitter
    }

    /// Whether motion or scroll is waiting for the next flush.
    pub fn has_pending_motion(&self) -> bool {
        self.pending_move != (0, 0) || self.pending_scroll != (0, 0)
    }

    /// Routes one event.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::PointerMove { dx, dy } => {
                self.pending_move = saturating_add(self.pending_move, (dx, dy));
            }
            Event::Scroll { dx, dy } => {
                self.pending_scroll = saturating_add(self.pending_scroll, (dx, dy));
            }
            Event::Button {
                code,
                down,
                key_hint,
            } => {
                if let Some(button) = MouseButton::from_code(code) {
                    // the click must land where the pointer already is
                    self.flush_motion();
                    if let Err(e) = self.injector.click_button(button, down) {
                        warn!(?button, down, "click injection failed: {e}");
                    }
                } else if is_gamepad_code(code) {
                    self.emitter.press(code, down, key_hint);
                } else {
                    debug!(code, "reserved button code ignored");
                }
            }
            Event::Axis { id, x, y } => {
                self.emitter.apply_stick(id, x, y, self.settings.stick_deadzone);
            }
            Event::SteerState {
                steer,
                deadzone,
                hold_threshold,
                tap_rate,
            } => {
                self.emitter.apply_steer(SteerParams {
                    steer,
                    deadzone,
                    hold_threshold,
                    tap_rate,
                });
            }
        }
    }

    /// Injects the pending pointer delta (split into sub-steps) and the
    /// pending scroll delta, then clears both.
    pub fn flush_motion(&mut self) {
        let (dx, dy) = std::mem::take(&mut self.pending_move);
        for (sx, sy) in split_move(dx, dy, self.settings.step_threshold, self.settings.max_substeps)
        {
            if let Err(e) = self.injector.move_cursor_by(sx, sy) {
                warn!("cursor move injection failed: {e}");
            }
        }

        let (dx, dy) = std::mem::take(&mut self.pending_scroll);
        if (dx, dy) != (0, 0) {
            if let Err(e) = self.injector.scroll_by(dx, dy) {
                warn!("scroll injection failed: {e}");
            }
        }
    }

    /// Drops pending motion and releases every held key.
    pub fn release_all(&mut self) {
        self.pending_move = (0, 0);
        self.pending_scroll = (0, 0);
        self.emitter.release_all();
    }
}

fn saturating_add(a: (i32, i32), b: (i32, i32)) -> (i32, i32) {
    (a.0.saturating_add(b.0), a.1.saturating_add(b.1))
}

// ── Async lane ────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum LaneMessage {
    Bytes(Vec<u8>),
    ReleaseAll,
}

/// Runs an [`InputReplayer`] on its own task.
pub struct ReceiverPump {
    tx: mpsc::UnboundedSender<LaneMessage>,
    lane: Mutex<Option<JoinHandle<()>>>,
    emitter: KeyboardEmitter,
}

impl ReceiverPump {
    /// Spawns the lane task on `runtime` and hands it `replayer`.
    pub fn start(replayer: InputReplayer, motion_tick: Duration, runtime: &Handle) -> Self {
        let emitter = replayer.emitter().clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let lane = runtime.spawn(run_lane(replayer, rx, motion_tick));
        info!(
            motion_tick_ms = motion_tick.as_millis() as u64,
            "receiver pump started"
        );
        Self {
            tx,
            lane: Mutex::new(Some(lane)),
            emitter,
        }
    }

    /// Queues a copy of an inbound chunk.  Never blocks.
    pub fn on_bytes_received(&self, bytes: &[u8]) {
        if self.tx.send(LaneMessage::Bytes(bytes.to_vec())).is_err() {
            trace!(len = bytes.len(), "chunk dropped: pump stopped");
        }
    }

    /// Releases every held key when the connection drops.
    pub fn on_connection_state_changed(&self, state: ConnectionState) {
        match state {
            ConnectionState::Disconnected => {
                info!("connection lost; releasing held input");
                if self.tx.send(LaneMessage::ReleaseAll).is_err() {
                    self.emitter.release_all();
                }
            }
            ConnectionState::Connecting => debug!("connecting"),
            ConnectionState::Connected => info!("connected"),
        }
    }

    /// Aborts the lane, discarding pending motion, and releases every held
    /// key before returning.
    ///
    /// The emitter is closed as well, so a chunk the lane is still replaying
    /// when the abort lands cannot press anything new.
    pub fn stop(&self) {
        if let Some(lane) = self.lock_lane().take() {
            lane.abort();
            info!("receiver pump stopped");
        }
        self.emitter.shutdown();
    }

    /// Whether the lane task is alive.
    pub fn is_running(&self) -> bool {
        self.lock_lane()
            .as_ref()
            .is_some_and(|lane| !lane.is_finished())
    }

    fn lock_lane(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.lane.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ReceiverPump {
    fn drop(&mut self) {
        if let Some(lane) = self.lock_lane().take() {
            lane.abort();
        }
    }
}

async fn run_lane(
    mut replayer: InputReplayer,
    mut rx: mpsc::UnboundedReceiver<LaneMessage>,
    motion_tick: Duration,
) {
    let mut interval = tokio::time::interval(motion_tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(LaneMessage::Bytes(bytes)) => {
                    for event in decode(&bytes) {
                        trace!(kind = event.kind(), "replaying");
                        replayer.handle(event);
                    }
                }
                Some(LaneMessage::ReleaseAll) => replayer.release_all(),
                None => break,
            },
            _ = interval.tick() => replayer.flush_motion(),
        }
    }
    replayer.release_all();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
