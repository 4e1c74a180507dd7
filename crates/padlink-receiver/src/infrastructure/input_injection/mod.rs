//! [`InputInjector`](crate::application::inject_input::InputInjector)
//! implementations.
//!
//! - **`mock`** – `RecordingInjector`, an in-memory log used by tests and by
//!   anything that needs to observe exactly what would reach the OS.
//! - **`logging`** – `LoggingInjector`, the headless binary's default: every
//!   injected input becomes a `tracing` event.
//!
//! Native backends (SendInput, XTest, CGEvent) plug in behind the same trait.

pub mod logging;
pub mod mock;

pub use logging::LoggingInjector;
pub use mock::{InjectedInput, RecordingInjector};
