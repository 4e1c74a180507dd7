//! In-memory injector for tests.
//!
//! Every call is appended to a single ordered log so tests can assert both
//! what reached the "OS" and in which order (e.g. motion flushed before a
//! click).  Switch [`RecordingInjector::set_failing`] on to make every call
//! return [`InjectionError::Platform`] without recording anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use padlink_core::KeyCode;

use crate::application::inject_input::{InjectionError, InputInjector, MouseButton};

/// One recorded injector call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedInput {
    Key {
        key: KeyCode,
        down: bool,
        is_repeat: bool,
    },
    Move {
        dx: i32,
        dy: i32,
    },
    Click {
        button: MouseButton,
        down: bool,
    },
    Scroll {
        dx: i32,
        dy: i32,
    },
}

/// Injector that records calls instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    log: Mutex<Vec<InjectedInput>>,
    failing: AtomicBool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<InjectedInput> {
        self.lock().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Recorded key edges only, as `(key, down, is_repeat)`.
    pub fn key_events(&self) -> Vec<(KeyCode, bool, bool)> {
        self.lock()
            .iter()
            .filter_map(|e| match *e {
                InjectedInput::Key {
                    key,
                    down,
                    is_repeat,
                } => Some((key, down, is_repeat)),
                _ => None,
            })
            .collect()
    }

    /// Number of non-repeat key-downs recorded for `key`.
    pub fn key_downs(&self, key: KeyCode) -> usize {
        self.count_keys(key, true, false)
    }

    /// Number of key-ups recorded for `key`.
    pub fn key_ups(&self, key: KeyCode) -> usize {
        self.count_keys(key, false, false)
    }

    /// Number of auto-repeat downs recorded for `key`.
    pub fn repeats(&self, key: KeyCode) -> usize {
        self.count_keys(key, true, true)
    }

    /// Total key-ups across all keys.
    pub fn total_key_ups(&self) -> usize {
        self.key_events().iter().filter(|(_, down, _)| !down).count()
    }

    /// Recorded cursor moves, in order.
    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.lock()
            .iter()
            .filter_map(|e| match *e {
                InjectedInput::Move { dx, dy } => Some((dx, dy)),
                _ => None,
            })
            .collect()
    }

    fn count_keys(&self, key: KeyCode, down: bool, is_repeat: bool) -> usize {
        self.key_events()
            .iter()
            .filter(|e| **e == (key, down, is_repeat))
            .count()
    }

    fn record(&self, input: InjectedInput) -> Result<(), InjectionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        self.lock().push(input);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InjectedInput>> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl InputInjector for RecordingInjector {
    fn post_key_event(&self, key: KeyCode, down: bool, is_repeat: bool) -> Result<(), InjectionError> {
        self.record(InjectedInput::Key {
            key,
            down,
            is_repeat,
        })
    }

    fn move_cursor_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(InjectedInput::Move { dx, dy })
    }

    fn click_button(&self, button: MouseButton, down: bool) -> Result<(), InjectionError> {
        self.record(InjectedInput::Click { button, down })
    }

    fn scroll_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(InjectedInput::Scroll { dx, dy })
    }
}
