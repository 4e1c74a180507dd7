//! Sender-side coalescing pump.
//!
//! Touch and gamepad sources can produce hundreds of events per second.  The
//! pump folds the high-frequency ones into per-tick aggregates and lets the
//! discrete ones through as soon as they arrive:
//!
//! | Event          | Handling                                   | Channel    |
//! |----------------|--------------------------------------------|------------|
//! | `PointerMove`  | summed into one delta per tick             | unreliable |
//! | `Scroll`       | summed into one delta per tick             | unreliable |
//! | `Axis`         | latest value per stick id wins             | unreliable |
//! | `Button`       | queued in order, flushed immediately       | reliable   |
//! | `SteerState`   | queued in order, flushed immediately       | reliable   |
//!
//! All aggregate state lives behind one mutex, held only while events are
//! folded in or drained.  [`CoalescingPump::tick`] additionally holds a send
//! lock across drain and send, so two concurrent flushes hand their batches
//! to the transport in drain order.  Motion producers never wait on it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use padlink_core::protocol::encode_into;
use padlink_core::transport::send_classified;
use padlink_core::{ConnectionState, DeliveryClass, Event, TransportChannel};
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Default flush period of the tick task.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(3);

/// Error type for pump lifecycle operations.
#[derive(Debug, Error)]
pub enum PumpError {
    /// `start` was called outside a Tokio runtime.
    #[error("no Tokio runtime available to drive the tick task: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

/// Aggregates accumulated between two ticks.
#[derive(Debug, Default)]
struct PumpState {
    move_accum: (i32, i32),
    scroll_accum: (i32, i32),
    latest_axis_by_id: BTreeMap<i32, (i32, i32)>,
    pending_one_off: Vec<u8>,
}

impl PumpState {
    fn clear(&mut self) {
        self.move_accum = (0, 0);
        self.scroll_accum = (0, 0);
        self.latest_axis_by_id.clear();
        self.pending_one_off.clear();
    }
}

/// Encoded output of one drain, split by delivery class.
#[derive(Debug, Default)]
struct Drained {
    unreliable: Vec<u8>,
    reliable: Vec<u8>,
}

/// Folds an event stream into per-tick batches and hands them to a
/// [`TransportChannel`].
pub struct CoalescingPump {
    transport: Arc<dyn TransportChannel>,
    tick_interval: Duration,
    state: Mutex<PumpState>,
    send_lock: Mutex<()>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl CoalescingPump {
    /// Creates a stopped pump with the default 3 ms tick.
    pub fn new(transport: Arc<dyn TransportChannel>) -> Self {
        Self::with_tick_interval(transport, DEFAULT_TICK_INTERVAL)
    }

    /// Creates a stopped pump with a custom tick period.
    pub fn with_tick_interval(transport: Arc<dyn TransportChannel>, tick_interval: Duration) -> Self {
        Self {
            transport,
            tick_interval,
            state: Mutex::new(PumpState::default()),
            send_lock: Mutex::new(()),
            ticker: Mutex::new(None),
        }
    }

    /// Period between two automatic flushes.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Accepts one event from the UI layer.  Callable from any thread.
    ///
    /// Discrete events (`Button`, `SteerState`) trigger an immediate flush of
    /// everything pending, including accumulated motion.
    pub fn enqueue(&self, event: Event) {
        let flush_now = {
            let mut state = self.lock_state();
            match event {
                Event::PointerMove { dx, dy } => {
                    state.move_accum = saturating_add(state.move_accum, (dx, dy));
                    false
                }
                Event::Scroll { dx, dy } => {
                    state.scroll_accum = saturating_add(state.scroll_accum, (dx, dy));
                    false
                }
                Event::Axis { id, x, y } => {
                    state.latest_axis_by_id.insert(id, (x, y));
                    false
                }
                Event::Button { .. } | Event::SteerState { .. } => {
                    encode_into(&mut state.pending_one_off, &event);
                    true
                }
            }
        };
        trace!(kind = event.kind(), "enqueued");

        if flush_now {
            self.tick();
        }
    }

    /// Drains everything accumulated so far and sends it.
    ///
    /// At most one send per delivery class; the unreliable batch goes first.
    /// Failures are logged and dropped.  Concurrent callers are serialised,
    /// so batches reach the transport in the order they were drained.
    pub fn tick(&self) {
        let _sending = self.send_lock.lock().unwrap_or_else(|e| e.into_inner());
        let drained = self.drain();

        for (class, bytes) in [
            (DeliveryClass::Unreliable, drained.unreliable),
            (DeliveryClass::Reliable, drained.reliable),
        ] {
            if bytes.is_empty() {
                continue;
            }
            if let Err(e) = send_classified(self.transport.as_ref(), class, bytes) {
                warn!(?class, "send failed: {e}");
            }
        }
    }

    fn drain(&self) -> Drained {
        let mut state = self.lock_state();
        let mut out = Drained::default();

        let (dx, dy) = std::mem::take(&mut state.move_accum);
        if (dx, dy) != (0, 0) {
            encode_into(&mut out.unreliable, &Event::PointerMove { dx, dy });
        }
        let (dx, dy) = std::mem::take(&mut state.scroll_accum);
        if (dx, dy) != (0, 0) {
            encode_into(&mut out.unreliable, &Event::Scroll { dx, dy });
        }
        for (id, (x, y)) in std::mem::take(&mut state.latest_axis_by_id) {
            encode_into(&mut out.unreliable, &Event::Axis { id, x, y });
        }
        out.reliable = std::mem::take(&mut state.pending_one_off);
        out
    }

    /// Spawns the periodic tick task on the current Tokio runtime.
    ///
    /// Calling `start` on a running pump is a no-op.  The task only holds a
    /// weak reference, so dropping the last `Arc` also ends it.
    ///
    /// # Errors
    ///
    /// Returns [`PumpError::NoRuntime`] when called outside a runtime.
    pub fn start(self: &Arc<Self>) -> Result<(), PumpError> {
        let handle = Handle::try_current()?;
        let mut ticker = self.lock_ticker();
        if ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("pump already running");
            return Ok(());
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.tick_interval;
        *ticker = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match weak.upgrade() {
                    Some(pump) => pump.tick(),
                    None => break,
                }
            }
        }));
        info!(period_ms = period.as_millis() as u64, "sender pump started");
        Ok(())
    }

    /// Cancels the tick task and discards anything not yet flushed.
    pub fn stop(&self) {
        if let Some(task) = self.lock_ticker().take() {
            task.abort();
            info!("sender pump stopped");
        }
        self.lock_state().clear();
    }

    /// Whether the periodic tick task is alive.
    pub fn is_running(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Connection-state hook.  The pump keeps accumulating while
    /// disconnected; the transport rejects the sends.
    pub fn on_connection_state_changed(&self, state: ConnectionState) {
        match state {
            ConnectionState::Connected => info!("transport connected"),
            ConnectionState::Connecting => debug!("transport connecting"),
            ConnectionState::Disconnected => info!("transport disconnected"),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PumpState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for CoalescingPump {
    fn drop(&mut self) {
        if let Some(task) = self.lock_ticker().take() {
            task.abort();
        }
    }
}

fn saturating_add(a: (i32, i32), b: (i32, i32)) -> (i32, i32) {
    (a.0.saturating_add(b.0), a.1.saturating_add(b.1))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
