//! Filesystem-backed [`Storage`] backend. Three files under a root
//! directory: `current.json`, `archived.json`, `working_context.txt`.
//! Provides persistence across process restarts without a database.

use async_trait::async_trait;
use mnemo_core::{MemoryError, Message, Role, StorageError};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::Storage;

/// Filesystem-backed store rooted at one directory per session.
pub struct FsStorage {
    root: PathBuf,
    // Serializes read-modify-write sequences; the trait requires
    // linearizable writes and plain file I/O gives us no atomicity
    // otherwise.
    lock: Mutex<()>,
}

impl FsStorage {
    /// Build a store rooted at `root`. The directory is created
    /// lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn current_path(&self) -> PathBuf {
        self.root.join("current.json")
    }

    fn archived_path(&self) -> PathBuf {
        self.root.join("archived.json")
    }

    fn working_context_path(&self) -> PathBuf {
        self.root.join("working_context.txt")
    }

    async fn read_messages(path: &Path) -> Result<Vec<Message>, StorageError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StorageError::Decode(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn write_messages(path: &Path, messages: &[Message]) -> Result<(), StorageError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let contents =
            serde_json::to_string_pretty(messages).map_err(|e| StorageError::Decode(e.to_string()))?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn load_messages(&self) -> Result<Vec<Message>, StorageError> {
        Self::read_messages(&self.current_path()).await
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let to_write = match messages.first() {
            Some(m) if m.role == Role::System => &messages[1..],
            _ => messages,
        };
        let mut current = Self::read_messages(&self.current_path()).await?;
        let dedup_key = |m: &Message| (m.role, serde_json::to_string(&m.parts).unwrap_or_default());
        let existing: std::collections::HashSet<_> = current.iter().map(dedup_key).collect();
        for msg in to_write {
            if !existing.contains(&dedup_key(msg)) {
                current.push(msg.clone());
            }
        }
        Self::write_messages(&self.current_path(), &current).await
    }

    async fn load_working_context(&self) -> Result<String, StorageError> {
        match tokio::fs::read_to_string(self.working_context_path()).await {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn save_working_context(&self, text: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        if let Some(dir) = self.working_context_path().parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        tokio::fs::write(self.working_context_path(), text)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn archive_messages(
        &self,
        messages: &[Message],
        retain: usize,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut sorted = messages.to_vec();
        sorted.sort_by_key(|m| m.created_at);
        let keep = retain.min(sorted.len());
        let split_at = sorted.len() - keep;
        let (to_archive, to_keep) = sorted.split_at(split_at);

        let mut archived = Self::read_messages(&self.archived_path()).await?;
        archived.extend(to_archive.iter().cloned());
        Self::write_messages(&self.archived_path(), &archived).await?;
        Self::write_messages(&self.current_path(), to_keep).await
    }

    async fn recall_messages(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<String, MemoryError> {
        let archived = Self::read_messages(&self.archived_path())
            .await
            .map_err(MemoryError::Storage)?;
        let mut matches: Vec<&Message> = archived
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
    async fn write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());
        store
            .save_messages(&[Message::text(Role::Human, "hi")])
            .await
            .unwrap();
        let loaded = store.load_messages().await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn save_is_idempotent_across_process_restarts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsStorage::new(dir.path());
            store
                .save_messages(&[Message::text(Role::Human, "hi")])
                .await
                .unwrap();
        }
        let store = FsStorage::new(dir.path());
        store
            .save_messages(&[Message::text(Role::Human, "hi")])
            .await
            .unwrap();
        assert_eq!(store.load_messages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn working_context_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());
        store.save_working_context("summary text").await.unwrap();
        assert_eq!(
            store.load_working_context().await.unwrap(),
            "summary text"
        );
    }

    #[tokio::test]
    async fn recall_not_found_on_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path());
        let err = store.recall_messages("x", 10, 0).await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound));
    }
}
