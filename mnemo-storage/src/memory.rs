//! In-memory [`Storage`] backend — a single `RwLock`-guarded record.
//! Suitable for tests and single-process use; nothing survives past
//! the process.

use async_trait::async_trait;
use mnemo_core::{MemoryError, Message, Role, StorageError};
use tokio::sync::RwLock;

use crate::Storage;

struct Inner {
    current: Vec<Message>,
    archived: Vec<Message>,
    working_context: String,
}

/// In-memory store backed by a `RwLock<Inner>`.
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    /// Build an empty store — no current messages, no archive, empty
    /// working context.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                current: Vec::new(),
                archived: Vec::new(),
                working_context: String::new(),
            }),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedup key for idempotent saves: same role and same payload means
/// the same message.
fn dedup_key(msg: &Message) -> (Role, String) {
    let payload = serde_json::to_string(&msg.parts).unwrap_or_default();
    (msg.role, payload)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_messages(&self) -> Result<Vec<Message>, StorageError> {
        Ok(self.inner.read().await.current.clone())
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<(), StorageError> {
        let mut guard = self.inner.write().await;
        let to_write = match messages.first() {
            Some(m) if m.role == Role::System => &messages[1..],
            _ => messages,
        };
        let existing: std::collections::HashSet<_> =
            guard.current.iter().map(dedup_key).collect();
        for msg in to_write {
            if !existing.contains(&dedup_key(msg)) {
                guard.current.push(msg.clone());
            }
        }
        Ok(())
    }

    async fn load_working_context(&self) -> Result<String, StorageError> {
        Ok(self.inner.read().await.working_context.clone())
    }

    async fn save_working_context(&self, text: &str) -> Result<(), StorageError> {
        self.inner.write().await.working_context = text.to_string();
        Ok(())
    }

    async fn archive_messages(
        &self,
        messages: &[Message],
        retain: usize,
    ) -> Result<(), StorageError> {
        let mut sorted = messages.to_vec();
        sorted.sort_by_key(|m| m.created_at);
        let keep = retain.min(sorted.len());
        let split_at = sorted.len() - keep;
        let (to_archive, to_keep) = sorted.split_at(split_at);

        let mut guard = self.inner.write().await;
        guard.archived.extend(to_archive.iter().cloned());
        guard.current = to_keep.to_vec();
        Ok(())
    }

    async fn recall_messages(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<String, MemoryError> {
        let guard = self.inner.read().await;
        let mut matches: Vec<&Message> = guard
            .archived
            .iter()
            .filter(|m| matches!(m.role, Role::Human | Role::Ai))
            .filter(|m| m.text_content().contains(query))
            .collect();
        matches.sort_by_key(|m| std::cmp::Reverse(m.created_at));

        let page: Vec<&Message> = matches.into_iter().skip(offset).take(limit).collect();
        if page.is_empty() {
            return Err(MemoryError::NotFound);
        }

        let lines: Vec<String> = page
            .iter()
            .map(|m| format!("{}: {} - {}", m.created_at.to_rfc3339(), m.role.as_str(), m.text_content()))
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::Role;

    #[tokio::test]
    async fn save_is_idempotent() {
        let store = MemoryStorage::new();
        let msgs = vec![Message::text(Role::Human, "hi")];
        store.save_messages(&msgs).await.unwrap();
        store.save_messages(&msgs).await.unwrap();
        assert_eq!(store.load_messages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_drops_leading_primer() {
        let store = MemoryStorage::new();
        let msgs = vec![
            Message::text(Role::System, "primer"),
            Message::text(Role::Human, "hi"),
        ];
        store.save_messages(&msgs).await.unwrap();
        let loaded = store.load_messages().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].role, Role::Human);
    }

    #[tokio::test]
    async fn archive_retains_most_recent() {
        let store = MemoryStorage::new();
        let mut msgs = Vec::new();
        for i in 0..5 {
            let mut m = Message::text(Role::Human, format!("msg{i}"));
            m.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
            msgs.push(m);
        }
        store.archive_messages(&msgs, 3).await.unwrap();
        assert_eq!(store.load_messages().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn recall_returns_not_found_when_empty() {
        let store = MemoryStorage::new();
        let err = store.recall_messages("x", 10, 0).await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound));
    }

    #[tokio::test]
    async fn recall_finds_substring_newest_first() {
        let store = MemoryStorage::new();
        let mut older = Message::text(Role::Human, "remember the rocket");
        older.created_at = chrono::Utc::now();
        let mut newer = Message::text(Role::Ai, "the rocket launched fine");
        newer.created_at = chrono::Utc::now() + chrono::Duration::seconds(10);
        store.archive_messages(&[older, newer], 0).await.unwrap();

        let result = store.recall_messages("rocket", 10, 0).await.unwrap();
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("launched"));
        assert!(lines[1].contains("remember"));
    }
}
