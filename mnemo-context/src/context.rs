//! The tiered core-memory state: message queue + working-context
//! scratchpad, backed by [`Storage`].

use std::sync::Arc;

use mnemo_core::{Message, StorageError};
use mnemo_storage::Storage;

use crate::budgets::Budgets;
use crate::tokenizer::Tokenizer;

/// In-memory tiered state for one session.
///
/// Owned exclusively by the single consumer that drives a session's
/// turns — nothing here is behind a lock, by design (see the
/// concurrency notes on the processor).
pub struct MemoryContext {
    /// The FIFO message queue the model sees. Index 0 is reserved for
    /// the primer once the pressure layer has installed it; `load`
    /// never populates it.
    messages: Vec<Message>,
    /// Unstructured scratchpad text, mutated only by tool calls.
    working_context: String,
    storage: Arc<dyn Storage>,
    tokenizer: Arc<dyn Tokenizer>,
    budgets: Budgets,
}

impl MemoryContext {
    /// Build an empty context over `storage`. Call [`MemoryContext::load`]
    /// to populate it from persisted state.
    pub fn new(storage: Arc<dyn Storage>, tokenizer: Arc<dyn Tokenizer>, budgets: Budgets) -> Self {
        Self {
            messages: Vec::new(),
            working_context: String::new(),
            storage,
            tokenizer,
            budgets,
        }
    }

    /// The configured budgets.
    pub fn budgets(&self) -> Budgets {
        self.budgets
    }

    /// Current message queue.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Mutable access to the message queue, for the pressure layer's
    /// primer maintenance and the executor's tool handlers.
    pub fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    /// Replace the message queue wholesale (used after `Memorize`
    /// reloads from storage).
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Current working-context text.
    pub fn working_context(&self) -> &str {
        &self.working_context
    }

    /// Overwrite the working-context text.
    pub fn set_working_context(&mut self, text: impl Into<String>) {
        self.working_context = text.into();
    }

    /// A handle to the backing store, for components that need it
    /// directly (the executor's `Memorize`/`Recall` handlers).
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Populate `messages` and `working_context` from storage. Does
    /// **not** install the primer — the pressure layer does that on
    /// the first append.
    pub async fn load(&mut self) -> Result<(), StorageError> {
        self.messages = self.storage.load_messages().await?;
        self.working_context = self.storage.load_working_context().await?;
        Ok(())
    }

    /// Write both fields through storage. Called opportunistically
    /// after state mutations; it is the only persistence path.
    pub async fn save(&self) -> Result<(), StorageError> {
        self.storage.save_messages(&self.messages).await?;
        self.storage
            .save_working_context(&self.working_context)
            .await
    }

    /// Sum of each message's encoded length, tokenized, plus 2 for
    /// per-call framing overhead.
    pub fn token_size_messages(&self) -> usize {
        let sum: usize = self
            .messages
            .iter()
            .map(|m| self.tokenizer.count(&m.encoded_len_source()))
            .sum();
        sum + 2
    }

    /// Token count of the raw working-context string.
    pub fn token_size_working_context(&self) -> usize {
        self.tokenizer.count(&self.working_context)
    }

    /// Tokenize an arbitrary string through this context's tokenizer
    /// — used by the executor to size a recalled block before
    /// deciding whether it fits the remaining message budget.
    pub fn token_count(&self, text: &str) -> usize {
        self.tokenizer.count(text)
    }

    /// The message queue with the primer (if installed) stripped —
    /// what gets persisted or archived, since the primer is never
    /// written to storage.
    pub fn messages_excluding_primer(&self) -> &[Message] {
        match self.messages.first() {
            Some(m) if m.role == mnemo_core::Role::System => &self.messages[1..],
            _ => &self.messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;
    use mnemo_core::Role;
    use mnemo_storage::MemoryStorage;

    fn ctx() -> MemoryContext {
        MemoryContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(WhitespaceTokenizer),
            Budgets::default(),
        )
    }

    #[test]
    fn token_size_messages_adds_framing_overhead() {
        let mut c = ctx();
        c.messages_mut().push(Message::text(Role::Human, "hi there"));
        // "human: hi there" -> 3 words + 2 framing tokens
        assert_eq!(c.token_size_messages(), 5);
    }

    #[tokio::test]
    async fn load_does_not_install_primer() {
        let mut c = ctx();
        c.load().await.unwrap();
        assert!(c.messages().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips_working_context() {
        let mut c = ctx();
        c.set_working_context("summary");
        c.save().await.unwrap();
        c.set_working_context("");
        c.load().await.unwrap();
        assert_eq!(c.working_context(), "summary");
    }
}
