#![deny(missing_docs)]
//! In-memory tiered state (C2): the FIFO message queue and the
//! working-context scratchpad, plus token-budget accounting.

pub mod budgets;
pub mod context;
pub mod tokenizer;

pub use budgets::Budgets;
pub use context::MemoryContext;
pub use tokenizer::{Tokenizer, WhitespaceTokenizer};
