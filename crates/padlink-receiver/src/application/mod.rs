//! Application layer use cases for the receiver.
//!
//! - **`inject_input`** – The [`InputInjector`](inject_input::InputInjector)
//!   trait every OS effect goes through.
//! - **`keyboard_emitter`** – Turns gamepad buttons, sticks and steering into
//!   key edges with per-key auto-repeat.
//! - **`replay_input`** – Routes decoded events and coalesces pointer motion;
//!   [`ReceiverPump`](replay_input::ReceiverPump) runs it on its own task.
//! - **`session`** – Feeds a transport event stream into a pump.

pub mod inject_input;
pub mod keyboard_emitter;
pub mod replay_input;
pub mod session;

pub use replay_input::{InputReplayer, ReceiverPump, ReplaySettings};
