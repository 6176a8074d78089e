//! Conversation transcripts
//!
//! A [`Conversation`] is owned by the caller and handed to the agent on each
//! turn. [`ConversationStore`] persists them as JSON files.

use chrono::{DateTime, Local};
use pokeagent_config::safe_filename;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default maximum number of entries kept in a conversation
pub const DEFAULT_MAX_ENTRIES: usize = 100;

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

/// Speaker of a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Capitalized, as shown in transcripts
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Entry {
    pub fn to_message(&self) -> pokeagent_provider::Message {
        match self.role {
            Role::User => pokeagent_provider::Message::user(&self.content),
            Role::Assistant => pokeagent_provider::Message::assistant(&self.content),
            Role::System => pokeagent_provider::Message::system(&self.content),
        }
    }
}

/// An ordered conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub entries: Vec<Entry>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    /// Oldest entries are dropped beyond this
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_max_entries(id, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(id: impl Into<String>, max_entries: usize) -> Self {
        let now = Local::now();
        Self {
            id: id.into(),
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
            max_entries,
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.entries.push(Entry {
            role,
            content: content.into(),
            timestamp: Local::now(),
        });
        self.updated_at = Local::now();
        self.truncate();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    fn truncate(&mut self) {
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
            debug!(
                "Conversation {} truncated to {} entries",
                self.id,
                self.entries.len()
            );
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The most recent `max` entries as chat messages
    pub fn history(&self, max: usize) -> Vec<pokeagent_provider::Message> {
        self.entries
            .iter()
            .skip(self.entries.len().saturating_sub(max))
            .map(Entry::to_message)
            .collect()
    }

    /// One `Role: content` line per entry
    pub fn transcript(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.role, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.updated_at = Local::now();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        self.truncate();
    }
}

/// JSON files, one per conversation
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_filename(id)))
    }

    pub async fn save(&self, conversation: &Conversation) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(conversation)?;
        tokio::fs::write(self.path_for(&conversation.id), content).await?;
        debug!("Saved conversation: {}", conversation.id);
        Ok(())
    }

    /// `None` when absent, unreadable, or corrupt
    pub async fn load(&self, id: &str) -> Option<Conversation> {
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read conversation {}: {}", id, e);
                return None;
            }
        };

        match serde_json::from_str::<Conversation>(&content) {
            Ok(conversation) => {
                debug!("Loaded conversation: {}", id);
                Some(conversation)
            }
            Err(e) => {
                warn!("Failed to parse conversation {}: {}", id, e);
                None
            }
        }
    }

    /// Load, or start a fresh conversation capped at `max_entries`
    pub async fn load_or_new(&self, id: &str, max_entries: usize) -> Conversation {
        match self.load(id).await {
            Some(mut conversation) => {
                conversation.set_max_entries(max_entries);
                conversation
            }
            None => Conversation::with_max_entries(id, max_entries),
        }
    }

    /// Stored file stems, sorted
    pub async fn list(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stem) = name.strip_suffix(".json") {
                        ids.push(stem.to_string());
                    }
                }
            }
        }
        ids.sort();
        ids
    }

    pub async fn delete(&self, id: &str) -> std::io::Result<bool> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
