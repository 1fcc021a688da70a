#![deny(missing_docs)]
//! # mnemo — umbrella crate
//!
//! A single import surface for the tiered virtual-memory system:
//! in-context core memory (message queue + working context) backed
//! by an unbounded external archive, with pressure-driven eviction
//! and a single-consumer processing loop that turns model tool calls
//! into memory operations.
//!
//! Re-exports the sub-crates behind feature flags, plus a `prelude`
//! for the common path: build a [`mnemo_storage::Storage`], wrap it
//! in an [`mnemo_processor::Agent`], and call it.

#[cfg(feature = "core")]
pub use mnemo_core;
#[cfg(feature = "core")]
pub use mnemo_context;
#[cfg(feature = "core")]
pub use mnemo_pressure;
#[cfg(feature = "core")]
pub use mnemo_processor;
#[cfg(feature = "core")]
pub use mnemo_provider;
#[cfg(feature = "storage")]
pub use mnemo_storage;
#[cfg(feature = "core")]
pub use mnemo_tool;

/// Happy-path imports for composing a memory-managed agent.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use mnemo_core::{MemoryError, Message, Part, Role, StorageError};

    #[cfg(feature = "core")]
    pub use mnemo_context::{Budgets, Tokenizer, WhitespaceTokenizer};

    #[cfg(feature = "core")]
    pub use mnemo_pressure::Instructions;

    #[cfg(feature = "core")]
    pub use mnemo_provider::{Provider, ProviderError, ProviderRequest, ProviderResponse};

    #[cfg(feature = "core")]
    pub use mnemo_processor::{Agent, AgentConfig, AgentStopped};

    #[cfg(feature = "storage")]
    pub use mnemo_storage::{FsStorage, MemoryStorage, Storage};
}
