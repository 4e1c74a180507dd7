//! Application layer for the sender.
//!
//! Holds the use cases that sit between the UI event sources and the
//! transport.  Nothing here opens a socket or reads a file; the transport is
//! reached only through [`padlink_core::TransportChannel`], so every use case
//! can be driven from a unit test with an in-memory channel.
//!
//! # Sub-modules
//!
//! - **`coalesce_input`** – The coalescing pump: folds pointer, scroll and
//!   stick deltas into one batch per tick and flushes button edges as soon as
//!   they arrive.

pub mod coalesce_input;

pub use coalesce_input::{CoalescingPump, PumpError};
