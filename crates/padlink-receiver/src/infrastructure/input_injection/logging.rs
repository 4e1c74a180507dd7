//! Injector that reports every input through `tracing` instead of the OS.

use padlink_core::KeyCode;
use tracing::{debug, info, trace};

use crate::application::inject_input::{InjectionError, InputInjector, MouseButton};

/// Writes each injected input as a log event.
///
/// Key edges and clicks log at `info`, repeats at `debug` and pointer or
/// scroll motion at `trace`, so the default filter shows the discrete input
/// only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInjector;

impl LoggingInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for LoggingInjector {
    fn post_key_event(&self, key: KeyCode, down: bool, is_repeat: bool) -> Result<(), InjectionError> {
        if is_repeat {
            debug!(?key, "key repeat");
        } else {
            info!(?key, down, "key");
        }
        Ok(())
    }

    fn move_cursor_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        trace!(dx, dy, "cursor move");
        Ok(())
    }

    fn click_button(&self, button: MouseButton, down: bool) -> Result<(), InjectionError> {
        info!(?button, down, "mouse button");
        Ok(())
    }

    fn scroll_by(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        trace!(dx, dy, "scroll");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_injector_never_fails() {
        let injector = LoggingInjector::new();
        assert!(injector.post_key_event(KeyCode::KeyJ, true, false).is_ok());
        assert!(injector.post_key_event(KeyCode::KeyJ, true, true).is_ok());
        assert!(injector.move_cursor_by(3, -4).is_ok());
        assert!(injector.click_button(MouseButton::Right, false).is_ok());
        assert!(injector.scroll_by(0, 1).is_ok());
    }
}
