//! # padlink-core
//!
//! Shared library for Padlink containing the input event model, its
//! line-delimited wire codec, the logical-button key map, and the transport
//! channel abstraction.
//!
//! This crate is used by both the sender (mobile client side) and the
//! receiver (desktop side).  It has no dependency on OS input APIs or real
//! sockets; the only runtime piece is the in-memory loopback transport.
//!
//! # Architecture overview
//!
//! Padlink turns a phone into a remote pointer and gamepad.  The phone
//! produces a high-frequency stream of small deltas; the desktop replays
//! them as native mouse and keyboard input.
//!
//! - **`protocol`** – The [`Event`] enum and the codec that frames events as
//!   newline-terminated JSON objects.
//!
//! - **`keymap`** – Logical gamepad buttons, sticks and steering, and the
//!   default table that binds them to USB HID key codes.
//!
//! - **`transport`** – The [`TransportChannel`] trait both pumps talk to,
//!   the [`TransportEvent`] stream the receiver consumes, and an in-memory
//!   [`LoopbackTransport`].
//!
//! - **`paths`** – Where the binaries look for their configuration files.

pub mod keymap;
pub mod paths;
pub mod protocol;
pub mod transport;

pub use keymap::{ButtonMap, KeyCode, LogicalButton, StickKeys};
pub use protocol::{decode, encode, DeliveryClass, Event};
pub use transport::{
    ConnectionState, LoopbackTransport, TransportChannel, TransportError, TransportEvent,
};
