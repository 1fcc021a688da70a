#![deny(missing_docs)]
//! Core types shared across the memory-manager crates: the message
//! model, typed session/call ids, and the error taxonomy.

pub mod error;
pub mod id;
pub mod message;

pub use error::{MemoryError, StorageError};
pub use id::{CallId, SessionId};
pub use message::{Message, Part, Role};
