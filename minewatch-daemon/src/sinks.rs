//! Concrete collaborator adapters.
//!
//! - [`JournalStatStore`]: appends every [`StatUpdate`] as one JSON line to
//!   `storage.journal_path`. A downstream loader applies the journal to the
//!   statistics table; `set` lines carry absolute values so replays are idempotent.
//! - [`TracingNotifier`]: emits every [`Notification`] as a structured `info`
//!   event on the `minewatch::notify` target, addressed to `notify.channel`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use minewatch_core::error::{MinewatchError, SinkError};
use minewatch_core::{Notification, Notifier, StatStore, StatUpdate};

use crate::logging::NOTIFY_TARGET;

/// One journal line.
#[derive(Serialize)]
struct JournalRecord<'a> {
    /// Unix seconds at which the update was handed to the store.
    ts: u64,
    #[serde(flatten)]
    update: &'a StatUpdate,
}

/// Append-only JSONL statistics journal.
pub struct JournalStatStore {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JournalStatStore {
    /// Open (or create) the journal in append mode, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MinewatchError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tracing::info!(path = %path.display(), "statistics journal opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatStore for JournalStatStore {
    async fn apply(&self, update: &StatUpdate) -> Result<(), MinewatchError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut line = serde_json::to_vec(&JournalRecord { ts, update })
            .map_err(|e| SinkError::Store(format!("failed to encode update: {e}")))?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|e| SinkError::Store(format!("{}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| SinkError::Store(format!("{}: {e}", self.path.display())))?;

        tracing::debug!(update = %update, "statistics update journaled");
        Ok(())
    }
}

/// Notifier that writes messages to the log stream.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), MinewatchError> {
        tracing::info!(
            target: NOTIFY_TARGET,
            channel = %notification.channel,
            text = %notification.text,
            "notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn journal_appends_one_line_per_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/stats.jsonl");
        let store = JournalStatStore::open(&path).await.unwrap();

        store
            .apply(&StatUpdate::Increment {
                player: "Steve".to_owned(),
                counter: "deaths".to_owned(),
            })
            .await
            .unwrap();
        store
            .apply(&StatUpdate::Set {
                player: "Bob".to_owned(),
                counter: "diamonds_mined".to_owned(),
                value: 15,
            })
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["op"], "increment");
        assert_eq!(lines[0]["player"], "Steve");
        assert_eq!(lines[1]["op"], "set");
        assert_eq!(lines[1]["value"], 15);
        assert!(lines[1]["ts"].as_u64().is_some());
    }

    #[tokio::test]
    async fn journal_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.jsonl");
        let update = StatUpdate::Touch {
            player: "Alex".to_owned(),
            column: "last_login".to_owned(),
        };

        JournalStatStore::open(&path).await.unwrap().apply(&update).await.unwrap();
        JournalStatStore::open(&path).await.unwrap().apply(&update).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn tracing_notifier_never_fails() {
        let notifier = TracingNotifier::new();
        notifier
            .send(&Notification::new("minecraft-events", "**Steve** joined the server"))
            .await
            .unwrap();
    }
}
