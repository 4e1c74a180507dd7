//! Infrastructure layer for the sender.
//!
//! OS-facing adapters: the line-oriented event source, the TCP/UDP
//! transport and the read-only configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padlink_core`, but MUST NOT be imported by the `application` layer.

pub mod event_source;
pub mod network;
pub mod storage;
