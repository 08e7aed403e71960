//! Storage layer for the Lingo mobile client
//!
//! This crate provides the durable key-value store used to keep session
//! credentials and device settings across restarts.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::{KvConfig, KvError, KvStore};
