//! Storage infrastructure: read-only configuration.
//!
//! The `config` sub-module locates `sender.toml`, parses it, and falls back
//! to defaults when the file does not exist yet.  The sender never writes
//! its configuration back.

pub mod config;
