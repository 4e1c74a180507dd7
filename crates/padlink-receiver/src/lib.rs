//! padlink-receiver library entry point.
//!
//! The receiver is the desktop side of Padlink.  It accepts one sender at a
//! time, decodes the newline-delimited event stream, and replays it:
//!
//! 1. Pointer motion and scroll are summed and flushed on a short timer,
//!    split into a few sub-steps so large jumps stay smooth.
//! 2. Mouse buttons flush pending motion first, then click.
//! 3. Gamepad buttons, sticks and steering become keyboard keys through the
//!    [`KeyboardEmitter`](application::keyboard_emitter::KeyboardEmitter),
//!    which also owns auto-repeat.
//! 4. A disconnect releases every held key.

/// Application layer: replay, key emission and the injector seam.
pub mod application;

/// Infrastructure layer: injectors, network listener and configuration.
pub mod infrastructure;
