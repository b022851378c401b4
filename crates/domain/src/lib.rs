//! Shared types for the kvsession workspace: the error type, TOML
//! configuration and structured trace events.

pub mod config;
pub mod error;
pub mod trace;
