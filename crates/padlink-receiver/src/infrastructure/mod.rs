//! Infrastructure layer for the receiver.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padlink_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.
//!
//! - **`input_injection`** – `InputInjector` implementations: a tracing-only
//!   injector and a recording one for tests.
//! - **`network`** – TCP + UDP listener producing `TransportEvent`s.
//! - **`storage`** – `receiver.toml` loading.

pub mod input_injection;
pub mod network;
pub mod storage;
