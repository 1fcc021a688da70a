#![deny(missing_docs)]
//! Persistence contract for the memory manager, plus two concrete
//! backends: an in-memory store for tests and a filesystem store for
//! single-process persistence across restarts.
//!
//! The trait says nothing about *which* session it serves — an
//! implementation is constructed already scoped to one session.
//! Multi-session use is a trivial extension: run one [`Storage`]
//! handle per session id.

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use mnemo_core::{MemoryError, Message, StorageError};

/// Persistent key-value + append-only store backing one session's
/// core and archive memory.
///
/// Ordering guarantee: within a session, writes are linearizable —
/// readers observe the effect of every prior acknowledged write. A
/// single-writer backend (this crate's two implementations included)
/// satisfies this trivially.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Current messages, insertion order ascending. Excludes the
    /// primer, which the caller reconstitutes on load.
    async fn load_messages(&self) -> Result<Vec<Message>, StorageError>;

    /// Idempotent: entries already present (keyed by role + payload)
    /// are not duplicated. A leading system primer, if present, is
    /// dropped before writing.
    async fn save_messages(&self, messages: &[Message]) -> Result<(), StorageError>;

    /// The working-context scratchpad text.
    async fn load_working_context(&self) -> Result<String, StorageError>;

    /// Overwrite the working-context scratchpad text.
    async fn save_working_context(&self, text: &str) -> Result<(), StorageError>;

    /// Promote `messages` from current to archived, retaining the
    /// most recent `retain` (by `created_at`) as current. Older
    /// entries are marked archived and remain queryable via
    /// [`Storage::recall_messages`].
    async fn archive_messages(&self, messages: &[Message], retain: usize) -> Result<(), StorageError>;

    /// Substring search over archived `human` and `ai` messages.
    /// Returns newline-joined `timestamp: role - content` lines,
    /// newest first. Fails with [`MemoryError::NotFound`] when the
    /// match set is empty.
    async fn recall_messages(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<String, MemoryError>;
}
