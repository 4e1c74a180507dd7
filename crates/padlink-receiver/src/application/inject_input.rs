//! The seam between Padlink and the desktop's input system.
//!
//! Every OS effect the receiver produces goes through one [`InputInjector`]:
//! relative cursor moves, mouse clicks, scroll steps and key edges.  The
//! concrete implementations live in the infrastructure layer.

use padlink_core::keymap::{MOUSE_LEFT_CODE, MOUSE_RIGHT_CODE};
use padlink_core::KeyCode;
use thiserror::Error;

/// Error type for input injection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("injector unavailable")]
    Unavailable,
}

/// Mouse buttons reachable from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Maps a wire button code (0 or 1) to a mouse button.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            MOUSE_LEFT_CODE => Some(Self::Left),
            MOUSE_RIGHT_CODE => Some(Self::Right),
            _ => None,
        }
    }
}

/// Platform-agnostic input injection.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    /// Posts one key edge.  `is_repeat` marks synthesized auto-repeat downs.
    fn post_key_event(&self, key: KeyCode, down: bool, is_repeat: bool) -> Result<(), InjectionError>;

    /// Moves the cursor by a relative delta.
    fn move_cursor_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError>;

    /// Presses or releases a mouse button at the current cursor position.
    fn click_button(&self, button: MouseButton, down: bool) -> Result<(), InjectionError>;

    /// Scrolls by a relative delta.
    fn scroll_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_from_code() {
        assert_eq!(MouseButton::from_code(0), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_code(1), Some(MouseButton::Right));
        assert_eq!(MouseButton::from_code(2), None);
        assert_eq!(MouseButton::from_code(10), None);
    }
}
