//! Keyboard emitter and key-repeat engine.
//!
//! Turns gamepad-style input (buttons, sticks, steering) into key edges and
//! keeps exactly one logical state per key:
//!
//! ```text
//!            press                 initial delay              release
//!   Up ───────────────▶ Down ─────────────────────▶ Repeating ───────▶ Up
//!    ▲    (key-down)      │   (timer armed)          (key-down,         │
//!    │                    │                           is_repeat, at     │
//!    └────────────────────┴──── release (key-up) ─── fixed rate) ◀──────┘
//! ```
//!
//! Every transition bumps the key's generation and aborts its previous timer.
//! A repeat tick only posts while the key is still down *and* its generation
//! matches the one it was armed with, so a stale timer can never resurrect a
//! released key.
//!
//! The key map sits behind one `std::sync::Mutex`.  It is held only while a
//! transition is checked and committed, never across an injector call.  The
//! state is committed first; an injection failure is logged and leaves the
//! state as committed.
//!
//! [`KeyboardEmitter::shutdown`] releases everything and closes the emitter:
//! any edge that arrives afterwards, from a caller or a timer, is ignored.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use padlink_core::keymap::{code_is_repeatable, AXIS_FULL_SCALE, LEFT_STICK_ID};
use padlink_core::{ButtonMap, KeyCode};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::application::inject_input::InputInjector;

/// Delay between a key-down and its first auto-repeat.
pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_millis(200);

/// Auto-repeat rate once repeating.
pub const DEFAULT_REPEAT_RATE_HZ: u32 = 30;

/// Shortest auto-repeat period; faster rates are clamped to it.
pub const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Auto-repeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl RepeatTiming {
    /// Builds a timing from a delay in milliseconds and a rate in Hz.
    /// A rate of zero is treated as 1 Hz; rates above 1 kHz repeat every
    /// [`MIN_REPEAT_INTERVAL`].
    pub fn new(initial_delay_ms: u64, rate_hz: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
        Self {
            initial_delay: Duration::from_millis(initial_delay_ms),
            interval: interval.max(MIN_REPEAT_INTERVAL),
        }
    }
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_REPEAT_DELAY,
            interval: Duration::from_secs_f64(1.0 / f64::from(DEFAULT_REPEAT_RATE_HZ)),
        }
    }
}

// ── Steering ──────────────────────────────────────────────────────────────────

/// Steering input as carried by a `SteerState` event.
///
/// `steer` is in `[-1000, 1000]`; the three tuning values are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteerParams {
    pub steer: i32,
    pub deadzone: i32,
    pub hold_threshold: i32,
    pub tap_rate: i32,
}

/// What the steering keys are doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteerMode {
    /// Both steering keys up.
    Released,
    /// One direction key held continuously.
    Hold(KeyCode),
    /// One direction key pulsed: down for `on`, then up for the rest of `period`.
    Tap {
        key: KeyCode,
        period: Duration,
        on: Duration,
    },
}

/// Maps a steering value to a [`SteerMode`].
///
/// With `m = |steer|`, `dz = deadzone * 10` and
/// `hold = max(hold_threshold * 10, dz + 1)`:
/// `m <= dz` releases, `m >= hold` holds, anything in between taps at
/// `2 + tap_rate * 18 / 100` Hz with duty cycle `(m - dz) / (hold - dz)`.
pub fn steer_mode(params: SteerParams, left: KeyCode, right: KeyCode) -> SteerMode {
    let full_scale = AXIS_FULL_SCALE.unsigned_abs();
    let m = params.steer.unsigned_abs().min(full_scale) as i32;
    let dz = params.deadzone.clamp(0, 100) * 10;
    let hold = (params.hold_threshold.clamp(0, 100) * 10).max(dz + 1);
    let key = if params.steer < 0 { left } else { right };

    if m <= dz {
        SteerMode::Released
    } else if m >= hold {
        SteerMode::Hold(key)
    } else {
        let hz = 2.0 + f64::from(params.tap_rate.clamp(0, 100)) * 18.0 / 100.0;
        let period = Duration::from_secs_f64(1.0 / hz);
        let duty = f64::from(m - dz) / f64::from(hold - dz);
        SteerMode::Tap {
            key,
            period,
            on: period.mul_f64(duty),
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct KeyState {
    down: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Keys a stick currently holds, one per axis.
#[derive(Debug, Default, Clone, Copy)]
struct StickHold {
    x: Option<KeyCode>,
    y: Option<KeyCode>,
}

#[derive(Debug)]
struct SteerRuntime {
    mode: SteerMode,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Default for SteerRuntime {
    fn default() -> Self {
        Self {
            mode: SteerMode::Released,
            generation: 0,
            task: None,
        }
    }
}

#[derive(Debug, Default)]
struct EmitterState {
    keys: BTreeMap<KeyCode, KeyState>,
    sticks: BTreeMap<i32, StickHold>,
    steer: SteerRuntime,
    closed: bool,
}

struct Inner {
    injector: Arc<dyn InputInjector>,
    button_map: ButtonMap,
    timing: RepeatTiming,
    runtime: Handle,
    state: Mutex<EmitterState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, EmitterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn post(&self, key: KeyCode, down: bool, is_repeat: bool) {
        if let Err(e) = self.injector.post_key_event(key, down, is_repeat) {
            warn!(?key, down, is_repeat, "key injection failed: {e}");
        }
    }

    /// Applies one edge to the key map.  Returns the key's new generation,
    /// or `None` when the key is already in the requested state or the
    /// emitter is closed.
    fn commit(
        self: &Arc<Self>,
        state: &mut EmitterState,
        key: KeyCode,
        down: bool,
        repeatable: bool,
    ) -> Option<u64> {
        if state.closed {
            return None;
        }
        let entry = state.keys.entry(key).or_default();
        if entry.down == down {
            return None;
        }
        entry.down = down;
        entry.generation += 1;
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        if down && repeatable {
            entry.timer = Some(self.spawn_repeat(key, entry.generation));
        }
        Some(entry.generation)
    }

    fn set_key(self: &Arc<Self>, key: KeyCode, down: bool, repeatable: bool) {
        let committed = {
            let mut state = self.lock();
            self.commit(&mut state, key, down, repeatable)
        };
        match committed {
            Some(generation) => self.post_edge(key, down, false, generation),
            None => trace!(?key, down, "redundant edge ignored"),
        }
    }

    /// Posts an edge committed at `generation`.  If the key was released
    /// while a key-down was being posted, the key-up is posted again so the
    /// OS never ends on a down.
    fn post_edge(&self, key: KeyCode, down: bool, is_repeat: bool, generation: u64) {
        self.post(key, down, is_repeat);
        if down && self.released_since(key, generation) {
            debug!(?key, "release raced a key-down; re-posting key-up");
            self.post(key, false, false);
        }
    }

    fn released_since(&self, key: KeyCode, generation: u64) -> bool {
        self.lock()
            .keys
            .get(&key)
            .is_some_and(|k| !k.down && k.generation != generation)
    }

    fn is_current(&self, key: KeyCode, generation: u64) -> bool {
        self.lock()
            .keys
            .get(&key)
            .is_some_and(|k| k.down && k.generation == generation)
    }

    fn spawn_repeat(self: &Arc<Self>, key: KeyCode, generation: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let timing = self.timing;
        self.runtime.spawn(async move {
            tokio::time::sleep(timing.initial_delay).await;
            let mut interval = tokio::time::interval(timing.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                if !inner.is_current(key, generation) {
                    break;
                }
                inner.post_edge(key, true, true, generation);
            }
        })
    }

    fn spawn_tap(self: &Arc<Self>, key: KeyCode, generation: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            loop {
                let Some((period, on)) = Self::tap_edge(&weak, key, generation, true) else {
                    break;
                };
                tokio::time::sleep(on).await;
                if Self::tap_edge(&weak, key, generation, false).is_none() {
                    break;
                }
                tokio::time::sleep(period.saturating_sub(on)).await;
            }
        })
    }

    /// Commits one steering pulse edge if the tap task is still current and
    /// returns the tap timing in effect.
    fn tap_edge(
        weak: &Weak<Self>,
        key: KeyCode,
        generation: u64,
        down: bool,
    ) -> Option<(Duration, Duration)> {
        let inner = weak.upgrade()?;
        let (timing, committed) = {
            let mut state = inner.lock();
            if state.steer.generation != generation {
                return None;
            }
            let SteerMode::Tap { period, on, .. } = state.steer.mode else {
                return None;
            };
            let committed = inner.commit(&mut state, key, down, false);
            ((period, on), committed)
        };
        if let Some(g) = committed {
            inner.post_edge(key, down, false, g);
        }
        Some(timing)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        for key in state.keys.values_mut() {
            if let Some(timer) = key.timer.take() {
                timer.abort();
            }
        }
        if let Some(task) = state.steer.task.take() {
            task.abort();
        }
    }
}

// ── Emitter ───────────────────────────────────────────────────────────────────

/// Emits key edges for buttons, sticks and steering, with auto-repeat.
///
/// Cheap to clone; all clones share one key map.  Timers are spawned on the
/// runtime passed at construction, so every method is callable from plain
/// (non-async) code.
#[derive(Clone)]
pub struct KeyboardEmitter {
    inner: Arc<Inner>,
}

impl KeyboardEmitter {
    /// Creates an emitter with the default button map and repeat timing.
    pub fn new(injector: Arc<dyn InputInjector>, runtime: Handle) -> Self {
        Self::with_settings(injector, ButtonMap::default(), RepeatTiming::default(), runtime)
    }

    pub fn with_settings(
        injector: Arc<dyn InputInjector>,
        button_map: ButtonMap,
        timing: RepeatTiming,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                injector,
                button_map,
                timing,
                runtime,
                state: Mutex::new(EmitterState::default()),
            }),
        }
    }

    /// Applies a logical button edge.
    ///
    /// The key comes from `key_hint` when it names a known key code and from
    /// the button map otherwise.  Unmapped buttons and edges that do not
    /// change the key's state are ignored.
    pub fn press(&self, button_id: i32, is_down: bool, key_hint: Option<i32>) {
        let Some(key) = self.inner.button_map.resolve(button_id, key_hint) else {
            debug!(button_id, ?key_hint, "unmapped button ignored");
            return;
        };
        self.inner
            .set_key(key, is_down, code_is_repeatable(button_id));
    }

    /// Left-stick shorthand for [`apply_stick`](Self::apply_stick).
    pub fn smooth_left_stick(&self, x: i32, y: i32, threshold: i32) {
        self.apply_stick(LEFT_STICK_ID, x, y, threshold);
    }

    /// Translates a stick position into at most two held direction keys.
    ///
    /// Negative `y` is up.  A component with `|v| <= threshold` releases
    /// that axis's key without touching the other axis.
    pub fn apply_stick(&self, id: i32, x: i32, y: i32, threshold: i32) {
        let Some(keys) = self.inner.button_map.stick(id) else {
            debug!(id, "unmapped stick ignored");
            return;
        };
        let threshold = threshold.max(0);
        let want_x = axis_key(x, threshold, keys.left, keys.right);
        let want_y = axis_key(y, threshold, keys.up, keys.down);

        let mut releases = Vec::new();
        let mut presses = Vec::new();
        {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            let hold = state.sticks.entry(id).or_default();
            for (held, want) in [(&mut hold.x, want_x), (&mut hold.y, want_y)] {
                if *held != want {
                    releases.extend(*held);
                    presses.extend(want);
                    *held = want;
                }
            }
        }
        for key in releases {
            self.inner.set_key(key, false, true);
        }
        for key in presses {
            self.inner.set_key(key, true, true);
        }
    }

    /// Drives the steering keys from a steering value.
    ///
    /// A new state only takes effect when the resulting [`SteerMode`]
    /// changes; a tap that stays on the same key keeps its pulse task and
    /// picks up the new timing on its next cycle.  Steering keys never
    /// auto-repeat.
    pub fn apply_steer(&self, params: SteerParams) {
        let keys = self.inner.button_map.steering;
        let next = steer_mode(params, keys.left, keys.right);
        let other = |key: KeyCode| if key == keys.left { keys.right } else { keys.left };

        {
            let mut state = self.inner.lock();
            let prev = state.steer.mode;
            if prev == next || state.closed {
                return;
            }
            state.steer.mode = next;
            let same_tap_key = matches!(
                (prev, next),
                (SteerMode::Tap { key: a, .. }, SteerMode::Tap { key: b, .. }) if a == b
            );
            if same_tap_key {
                return;
            }
            state.steer.generation += 1;
            if let Some(task) = state.steer.task.take() {
                task.abort();
            }
            if let SteerMode::Tap { key, .. } = next {
                let generation = state.steer.generation;
                state.steer.task = Some(self.inner.spawn_tap(key, generation));
            }
            debug!(?prev, ?next, "steering mode changed");
        }

        match next {
            SteerMode::Released => {
                self.inner.set_key(keys.left, false, false);
                self.inner.set_key(keys.right, false, false);
            }
            SteerMode::Hold(key) => {
                self.inner.set_key(other(key), false, false);
                self.inner.set_key(key, true, false);
            }
            SteerMode::Tap { key, .. } => {
                self.inner.set_key(other(key), false, false);
            }
        }
    }

    /// Cancels every timer and releases every key that is down.
    ///
    /// Posts exactly one key-up per held key, synchronously.  Stick and
    /// steering state are reset as well.
    pub fn release_all(&self) {
        self.release_held(false);
    }

    /// Releases every key like [`release_all`](Self::release_all) and
    /// closes the emitter.  Later presses, stick and steering updates are
    /// ignored, so nothing can be held once this returns.
    pub fn shutdown(&self) {
        self.release_held(true);
        debug!("keyboard emitter closed");
    }

    fn release_held(&self, close: bool) {
        let released: Vec<KeyCode> = {
            let mut state = self.inner.lock();
            state.closed |= close;
            state.steer.generation += 1;
            state.steer.mode = SteerMode::Released;
            if let Some(task) = state.steer.task.take() {
                task.abort();
            }
            state.sticks.clear();
            state
                .keys
                .iter_mut()
                .filter_map(|(key, entry)| {
                    if let Some(timer) = entry.timer.take() {
                        timer.abort();
                    }
                    if entry.down {
                        entry.down = false;
                        entry.generation += 1;
                        Some(*key)
                    } else {
                        None
                    }
                })
                .collect()
        };

        if !released.is_empty() {
            info!(count = released.len(), "releasing held keys");
        }
        for key in released {
            self.inner.post(key, false, false);
        }
    }

    /// Number of live auto-repeat timers.
    pub fn active_repeat_timers(&self) -> usize {
        self.inner
            .lock()
            .keys
            .values()
            .filter(|k| k.timer.as_ref().is_some_and(|t| !t.is_finished()))
            .count()
    }

    /// Whether `key` is logically down.
    pub fn is_down(&self, key: KeyCode) -> bool {
        self.inner.lock().keys.get(&key).is_some_and(|k| k.down)
    }

    /// Current steering mode.
    pub fn steer_mode(&self) -> SteerMode {
        self.inner.lock().steer.mode
    }
}

fn axis_key(value: i32, threshold: i32, negative: KeyCode, positive: KeyCode) -> Option<KeyCode> {
    if value > threshold {
        Some(positive)
    } else if value < -threshold {
        Some(negative)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_injection::RecordingInjector;
    use padlink_core::keymap::RIGHT_STICK_ID;

    const A: i32 = 10;
    const B: i32 = 11;
    const START: i32 = 16;
    const STICK_THRESHOLD: i32 = 250;

    fn make_emitter() -> (KeyboardEmitter, Arc<RecordingInjector>) {
        let injector = Arc::new(RecordingInjector::new());
        let emitter = KeyboardEmitter::new(injector.clone(), Handle::current());
        (emitter, injector)
    }

    fn steer(steer: i32) -> SteerParams {
        SteerParams {
            steer,
            deadzone: 10,
            hold_threshold: 80,
            tap_rate: 50,
        }
    }

    // ── Press / release ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_press_and_release_posts_one_down_and_one_up() {
        // Arrange
        let (emitter, injector) = make_emitter();

        // Act
        emitter.press(A, true, None);
        let timers_while_down = emitter.active_repeat_timers();
        emitter.press(A, false, None);

        // Assert
        assert_eq!(timers_while_down, 1);
        assert_eq!(
            injector.key_events(),
            vec![(KeyCode::KeyJ, true, false), (KeyCode::KeyJ, false, false)]
        );
        assert_eq!(emitter.active_repeat_timers(), 0);
        assert!(!emitter.is_down(KeyCode::KeyJ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_down_is_ignored_and_keeps_one_timer() {
        // Arrange
        let (emitter, injector) = make_emitter();

        // Act
        emitter.press(A, true, None);
        emitter.press(A, true, None);

        // Assert
        assert_eq!(injector.key_downs(KeyCode::KeyJ), 1);
        assert_eq!(emitter.active_repeat_timers(), 1);

        // Act
        emitter.press(A, false, None);
        emitter.press(A, false, None);

        // Assert
        assert_eq!(injector.key_ups(KeyCode::KeyJ), 1);
        assert_eq!(emitter.active_repeat_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_of_key_never_pressed_posts_nothing() {
        let (emitter, injector) = make_emitter();
        emitter.press(B, false, None);
        assert!(injector.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_hint_overrides_default_mapping() {
        let (emitter, injector) = make_emitter();

        emitter.press(A, true, Some(KeyCode::Space.as_u16() as i32));

        assert_eq!(injector.key_events(), vec![(KeyCode::Space, true, false)]);
        assert!(!emitter.is_down(KeyCode::KeyJ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_key_hint_falls_back_to_default_mapping() {
        let (emitter, injector) = make_emitter();

        emitter.press(B, true, Some(0x7FFF));

        assert_eq!(injector.key_events(), vec![(KeyCode::KeyK, true, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmapped_button_is_ignored() {
        let (emitter, injector) = make_emitter();
        emitter.press(99, true, None);
        assert!(injector.events().is_empty());
        assert_eq!(emitter.active_repeat_timers(), 0);
    }

    // ── Auto-repeat ───────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_held_key_repeats_after_delay_at_fixed_rate() {
        // Arrange
        let (emitter, injector) = make_emitter();

        // Act
        emitter.press(A, true, None);
        tokio::time::sleep(Duration::from_millis(190)).await;
        let before_delay = injector.repeats(KeyCode::KeyJ);
        // repeats land at ~200, ~233 and ~267 ms
        tokio::time::sleep(Duration::from_millis(90)).await;

        // Assert
        assert_eq!(before_delay, 0);
        assert_eq!(injector.repeats(KeyCode::KeyJ), 3);
        assert!(emitter.is_down(KeyCode::KeyJ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_stops_repeats() {
        // Arrange
        let (emitter, injector) = make_emitter();
        emitter.press(A, true, None);
        tokio::time::sleep(Duration::from_millis(250)).await;

        // Act
        emitter.press(A, false, None);
        let repeats_at_release = injector.repeats(KeyCode::KeyJ);
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert_eq!(repeats_at_release, 2);
        assert_eq!(injector.repeats(KeyCode::KeyJ), 2);
        assert_eq!(
            injector.key_events().last(),
            Some(&(KeyCode::KeyJ, false, false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repress_restarts_initial_delay() {
        let (emitter, injector) = make_emitter();

        emitter.press(A, true, None);
        tokio::time::sleep(Duration::from_millis(150)).await;
        emitter.press(A, false, None);
        emitter.press(A, true, None);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(injector.repeats(KeyCode::KeyJ), 0);
        assert_eq!(emitter.active_repeat_timers(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_repeatable_button_never_repeats() {
        // Arrange
        let (emitter, injector) = make_emitter();

        // Act
        emitter.press(START, true, None);
        let timers = emitter.active_repeat_timers();
        tokio::time::sleep(Duration::from_secs(1)).await;
        emitter.press(START, false, None);

        // Assert
        assert_eq!(timers, 0);
        assert_eq!(
            injector.key_events(),
            vec![(KeyCode::Escape, true, false), (KeyCode::Escape, false, false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timing_is_honoured() {
        let injector = Arc::new(RecordingInjector::new());
        let emitter = KeyboardEmitter::with_settings(
            injector.clone(),
            ButtonMap::default(),
            RepeatTiming::new(50, 10),
            Handle::current(),
        );

        emitter.press(A, true, None);
        tokio::time::sleep(Duration::from_millis(260)).await;

        // 50, 150, 250 ms
        assert_eq!(injector.repeats(KeyCode::KeyJ), 3);
    }

    #[test]
    fn test_repeat_rate_is_clamped_to_minimum_interval() {
        assert_eq!(RepeatTiming::new(200, u32::MAX).interval, MIN_REPEAT_INTERVAL);
        assert_eq!(RepeatTiming::new(200, 1000).interval, MIN_REPEAT_INTERVAL);
        assert_eq!(RepeatTiming::new(200, 0).interval, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_repeat_rate_still_repeats() {
        // Arrange
        let injector = Arc::new(RecordingInjector::new());
        let emitter = KeyboardEmitter::with_settings(
            injector.clone(),
            ButtonMap::default(),
            RepeatTiming::new(200, u32::MAX),
            Handle::current(),
        );

        // Act
        emitter.press(A, true, None);
        tokio::time::sleep(Duration::from_millis(205)).await;
        emitter.press(A, false, None);

        // Assert: one repeat per millisecond from 200 ms on
        let repeats = injector.repeats(KeyCode::KeyJ);
        assert!((5..=6).contains(&repeats), "got {repeats} repeats");
        assert!(!emitter.is_down(KeyCode::KeyJ));
        assert_eq!(emitter.active_repeat_timers(), 0);
    }

    // ── Release all ───────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_release_all_posts_one_up_per_held_key_and_cancels_timers() {
        // Arrange
        let (emitter, injector) = make_emitter();
        emitter.press(A, true, None);
        emitter.press(B, true, None);
        injector.clear();

        // Act
        emitter.release_all();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Assert
        assert_eq!(injector.total_key_ups(), 2);
        assert_eq!(injector.key_ups(KeyCode::KeyJ), 1);
        assert_eq!(injector.key_ups(KeyCode::KeyK), 1);
        assert_eq!(injector.repeats(KeyCode::KeyJ), 0);
        assert_eq!(emitter.active_repeat_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_all_with_nothing_held_posts_nothing() {
        let (emitter, injector) = make_emitter();
        emitter.press(A, true, None);
        emitter.press(A, false, None);
        injector.clear();

        emitter.release_all();

        assert!(injector.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_injection_failure_does_not_desync_state() {
        // Arrange
        let (emitter, injector) = make_emitter();
        injector.set_failing(true);

        // Act
        emitter.press(A, true, None);
        injector.set_failing(false);
        emitter.press(A, false, None);

        // Assert: the down was lost, but the key is not stuck logically
        assert!(!emitter.is_down(KeyCode::KeyJ));
        assert_eq!(injector.key_events(), vec![(KeyCode::KeyJ, false, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_and_ignores_later_input() {
        // Arrange
        let (emitter, injector) = make_emitter();
        emitter.press(A, true, None);
        injector.clear();

        // Act
        emitter.shutdown();
        emitter.press(B, true, None);
        emitter.smooth_left_stick(900, 900, STICK_THRESHOLD);
        emitter.apply_steer(steer(1000));
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Assert
        assert_eq!(injector.key_events(), vec![(KeyCode::KeyJ, false, false)]);
        assert!(!emitter.is_down(KeyCode::KeyK));
        assert_eq!(emitter.steer_mode(), SteerMode::Released);
        assert_eq!(emitter.active_repeat_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_all_keeps_emitter_usable() {
        let (emitter, injector) = make_emitter();
        emitter.press(A, true, None);

        emitter.release_all();
        emitter.press(B, true, None);

        assert!(emitter.is_down(KeyCode::KeyK));
        assert_eq!(injector.key_downs(KeyCode::KeyK), 1);
    }

    // ── Sticks ────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_stick_holds_up_to_two_directions() {
        // Arrange
        let (emitter, _injector) = make_emitter();

        // Act: up-right
        emitter.smooth_left_stick(800, -800, STICK_THRESHOLD);

        // Assert
        assert!(emitter.is_down(KeyCode::KeyD));
        assert!(emitter.is_down(KeyCode::KeyW));
        assert!(!emitter.is_down(KeyCode::KeyA));
        assert!(!emitter.is_down(KeyCode::KeyS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stick_deadzone_releases_only_that_axis() {
        // Arrange
        let (emitter, injector) = make_emitter();
        emitter.smooth_left_stick(800, 800, STICK_THRESHOLD);

        // Act: x back into the deadzone, y still pushed down
        emitter.smooth_left_stick(STICK_THRESHOLD, 800, STICK_THRESHOLD);

        // Assert
        assert!(!emitter.is_down(KeyCode::KeyD));
        assert!(emitter.is_down(KeyCode::KeyS));
        assert_eq!(injector.key_ups(KeyCode::KeyD), 1);
        assert_eq!(injector.key_ups(KeyCode::KeyS), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stick_direction_flip_releases_before_pressing() {
        let (emitter, injector) = make_emitter();
        emitter.smooth_left_stick(900, 0, STICK_THRESHOLD);

        emitter.smooth_left_stick(-900, 0, STICK_THRESHOLD);

        assert_eq!(
            injector.key_events(),
            vec![
                (KeyCode::KeyD, true, false),
                (KeyCode::KeyD, false, false),
                (KeyCode::KeyA, true, false),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_right_stick_uses_numpad_and_unknown_stick_is_ignored() {
        let (emitter, injector) = make_emitter();

        emitter.apply_stick(RIGHT_STICK_ID, 0, 1000, STICK_THRESHOLD);
        emitter.apply_stick(7, 1000, 1000, STICK_THRESHOLD);

        assert_eq!(injector.key_events(), vec![(KeyCode::Numpad2, true, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_stick_position_is_deduplicated() {
        let (emitter, injector) = make_emitter();

        emitter.smooth_left_stick(-600, 0, STICK_THRESHOLD);
        emitter.smooth_left_stick(-700, 10, STICK_THRESHOLD);
        emitter.smooth_left_stick(-999, -3, STICK_THRESHOLD);

        assert_eq!(injector.key_downs(KeyCode::KeyA), 1);
        assert_eq!(emitter.active_repeat_timers(), 1);
    }

    // ── Steering ──────────────────────────────────────────────────────────────

    #[test]
    fn test_steer_mode_thresholds() {
        let (l, r) = (KeyCode::ArrowLeft, KeyCode::ArrowRight);

        assert_eq!(steer_mode(steer(0), l, r), SteerMode::Released);
        assert_eq!(steer_mode(steer(100), l, r), SteerMode::Released);
        assert_eq!(steer_mode(steer(800), l, r), SteerMode::Hold(r));
        assert_eq!(steer_mode(steer(-1000), l, r), SteerMode::Hold(l));
        assert!(matches!(
            steer_mode(steer(-450), l, r),
            SteerMode::Tap { key, .. } if key == l
        ));
    }

    #[test]
    fn test_steer_mode_tap_frequency_and_duty() {
        // tap_rate 50 → 11 Hz; m = 450, dz = 100, hold = 800 → duty 0.5
        let mode = steer_mode(steer(450), KeyCode::ArrowLeft, KeyCode::ArrowRight);

        let SteerMode::Tap { period, on, .. } = mode else {
            panic!("expected tap, got {mode:?}");
        };
        assert!((period.as_secs_f64() - 1.0 / 11.0).abs() < 1e-6);
        assert!((on.as_secs_f64() - 0.5 / 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_steer_mode_hold_threshold_never_below_deadzone() {
        // hold_threshold 5 (50) is below deadzone 30 (300): hold starts at 301
        let params = SteerParams {
            steer: 301,
            deadzone: 30,
            hold_threshold: 5,
            tap_rate: 0,
        };
        assert_eq!(
            steer_mode(params, KeyCode::ArrowLeft, KeyCode::ArrowRight),
            SteerMode::Hold(KeyCode::ArrowRight)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_steer_hold_then_release() {
        // Arrange
        let (emitter, injector) = make_emitter();

        // Act
        emitter.apply_steer(steer(900));
        tokio::time::sleep(Duration::from_secs(1)).await;
        emitter.apply_steer(steer(0));

        // Assert: held without auto-repeat, then released
        assert_eq!(
            injector.key_events(),
            vec![
                (KeyCode::ArrowRight, true, false),
                (KeyCode::ArrowRight, false, false)
            ]
        );
        assert_eq!(emitter.steer_mode(), SteerMode::Released);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steer_tap_pulses_key_and_stops_cleanly() {
        // Arrange
        let (emitter, injector) = make_emitter();

        // Act: ~11 Hz pulses for one second
        emitter.apply_steer(steer(-450));
        tokio::time::sleep(Duration::from_secs(1)).await;
        emitter.apply_steer(steer(0));
        let downs = injector.key_downs(KeyCode::ArrowLeft);
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Assert
        assert!((9..=12).contains(&downs), "got {downs} pulses");
        assert_eq!(injector.key_downs(KeyCode::ArrowLeft), downs);
        assert_eq!(injector.key_ups(KeyCode::ArrowLeft), downs);
        assert_eq!(injector.repeats(KeyCode::ArrowLeft), 0);
        assert!(!emitter.is_down(KeyCode::ArrowLeft));
    }

    #[tokio::test(start_paused = true)]
    async fn test_steer_direction_change_releases_previous_key() {
        let (emitter, injector) = make_emitter();

        emitter.apply_steer(steer(-1000));
        emitter.apply_steer(steer(1000));

        assert!(!emitter.is_down(KeyCode::ArrowLeft));
        assert!(emitter.is_down(KeyCode::ArrowRight));
        assert_eq!(injector.key_ups(KeyCode::ArrowLeft), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_all_stops_steering_pulses() {
        let (emitter, injector) = make_emitter();
        emitter.apply_steer(steer(450));
        tokio::time::sleep(Duration::from_millis(20)).await;

        emitter.release_all();
        let snapshot = injector.events().len();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(injector.events().len(), snapshot);
        assert!(!emitter.is_down(KeyCode::ArrowRight));
        assert_eq!(emitter.steer_mode(), SteerMode::Released);
    }
}
