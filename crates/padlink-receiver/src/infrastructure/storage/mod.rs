//! Storage infrastructure: the receiver's read-only `receiver.toml`.

pub mod config;
