#![deny(missing_docs)]
//! The single-consumer event loop (C5) and the public [`Agent`] API
//! that wraps it.

mod agent;
mod convert;
mod processor;

pub use agent::{Agent, AgentConfig, AgentStopped};
pub use processor::MIN_CHANNEL_CAPACITY;
