/// Persistence for per-channel game documents. Each channel owns one JSON
/// document holding its current session (if any) and its running stats.
/// Loads and saves are whole-document; the app layer serializes access per
/// channel, so a document is never written by two events at once.
use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
    sync::RwLock,
};

use crate::session::Session;

/// Stats is a channel's running record across games.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub games: u32,
    pub solved: u32,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.games == 0 {
            return write!(f, "no games played");
        }
        write!(
            f,
            "{:.0}% ({}/{})",
            self.solved as f32 / self.games as f32 * 100.0,
            self.solved,
            self.games
        )
    }
}

/// ChannelRecord is the persisted document for one channel.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub stats: Stats,
}

/// SessionStore reads and writes channel documents. A failed save leaves
/// the caller's merged state intact: retry the save, never the merge.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, channel_id: &str) -> Result<Option<ChannelRecord>>;
    async fn save(&self, channel_id: &str, record: &ChannelRecord) -> Result<()>;
}

/// FileStore keeps one `<channel>.json` document per channel in a
/// directory. Data is saved in JSON format.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> FileStore {
        FileStore { dir: dir.into() }
    }

    fn document_path(&self, channel_id: &str) -> PathBuf {
        // Channel ids are opaque platform strings; keep filenames tame.
        let safe: String = channel_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, channel_id: &str) -> Result<Option<ChannelRecord>> {
        let path = self.document_path(channel_id);

        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).context(format!("Error opening file {}", path.display()));
            }
        };

        let mut contents = vec![];
        file.read_to_end(&mut contents)
            .await
            .context(format!("Error reading file {}", path.display()))?;

        let record: ChannelRecord = serde_json::from_slice(&contents).context(format!(
            "Error deserializing game state from {}",
            path.display()
        ))?;

        Ok(Some(record))
    }

    async fn save(&self, channel_id: &str, record: &ChannelRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .context(format!("Error creating save dir {}", self.dir.display()))?;

        let path = self.document_path(channel_id);
        let mut file = File::create(&path)
            .await
            .context(format!("Error creating file {}", path.display()))?;

        file.write_all(
            serde_json::to_vec(record)
                .context("Error serializing game state")?
                .as_ref(),
        )
        .await
        .context(format!("Error writing file {}", path.display()))
    }
}

/// MemoryStore holds channel documents in memory. Used when no save
/// directory is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ChannelRecord>>,
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, channel_id: &str) -> Result<Option<ChannelRecord>> {
        Ok(self.records.read().await.get(channel_id).cloned())
    }

    async fn save(&self, channel_id: &str, record: &ChannelRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(channel_id.to_string(), record.clone());
        Ok(())
    }
}
