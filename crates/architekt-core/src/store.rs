//! Persistence gateway: named, timestamped design snapshots kept per owner.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Diagram;

/// Maximum number of designs returned by `list`.
pub const LIST_LIMIT: usize = 50;

/// A stored design document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub diagram: Diagram,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DesignSummary {
    pub id: String,
    pub name: String,
    pub updated_at: u64,
}

impl From<&DesignRecord> for DesignSummary {
    fn from(record: &DesignRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("design '{id}' not found")]
    NotFound { id: String },

    #[error("'{0}' is not a valid owner or design key")]
    InvalidKey(String),

    #[error("design '{id}' is corrupt: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("could not encode design: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A document store keyed by owner and design id. Implementations receive and return
/// copies; they never see the live diagram.
#[async_trait]
pub trait DesignStore: Send + Sync {
    /// Write a new snapshot under `owner` and return its id.
    async fn save(&self, owner: &str, name: &str, diagram: &Diagram) -> Result<String, StoreError>;

    /// Designs of `owner`, newest `updated_at` first, at most `LIST_LIMIT`.
    async fn list(&self, owner: &str) -> Result<Vec<DesignSummary>, StoreError>;

    async fn load(&self, owner: &str, id: &str) -> Result<Diagram, StoreError>;

    /// Remove a design. Removing a missing design is not an error.
    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Owners and design ids become path components, so they must be plain names.
fn check_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key != "."
        && key != ".."
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// The `attempt`th id tried for a save at `now`: `design_<millis>`, then `design_<millis>_2`, ...
fn candidate_id(now: u64, attempt: u32) -> String {
    match attempt {
        1 => format!("design_{now}"),
        n => format!("design_{now}_{n}"),
    }
}

/// Pick `design_<millis>`, suffixed until it does not collide.
fn unique_id(now: u64, taken: impl Fn(&str) -> bool) -> String {
    let mut attempt = 1;
    loop {
        let candidate = candidate_id(now, attempt);
        if !taken(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

fn newest_first(summaries: &mut Vec<DesignSummary>) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
    summaries.truncate(LIST_LIMIT);
}

// --- File-backed store ---

/// Stores each design as pretty JSON at `<root>/users/<owner>/designs/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the architekt directory (see `settings::architekt_dir`).
    pub fn open_default() -> Self {
        Self::new(crate::settings::architekt_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn designs_dir(&self, owner: &str) -> Result<PathBuf, StoreError> {
        check_key(owner)?;
        Ok(self.root.join("users").join(owner).join("designs"))
    }

    fn design_path(&self, owner: &str, id: &str) -> Result<PathBuf, StoreError> {
        check_key(id)?;
        Ok(self.designs_dir(owner)?.join(format!("{id}.json")))
    }

    /// Claim an id by creating its file exclusively. Concurrent saves within the same
    /// millisecond each get their own id.
    async fn claim_id(dir: &Path, now: u64) -> Result<(String, PathBuf), StoreError> {
        let mut attempt = 1;
        loop {
            let id = candidate_id(now, attempt);
            let path = dir.join(format!("{id}.json"));
            let created = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match created {
                Ok(_) => return Ok((id, path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn read_record(path: &Path, id: &str) -> Result<DesignRecord, StoreError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            id: id.to_string(),
            source,
        })
    }
}

#[async_trait]
impl DesignStore for FileStore {
    /// Uses atomic write (temp file + rename) so readers never see a half-written design.
    async fn save(&self, owner: &str, name: &str, diagram: &Diagram) -> Result<String, StoreError> {
        let dir = self.designs_dir(owner)?;
        tokio::fs::create_dir_all(&dir).await?;

        let now = now_millis();
        let (id, path) = Self::claim_id(&dir, now).await?;
        let record = DesignRecord {
            id: id.clone(),
            name: name.to_string(),
            diagram: diagram.clone(),
            created_at: now,
            updated_at: now,
        };

        let tmp = dir.join(format!(".{id}.json.tmp"));
        let written = async {
            let json = serde_json::to_string_pretty(&record).map_err(StoreError::Encode)?;
            tokio::fs::write(&tmp, json).await?;
            tokio::fs::rename(&tmp, &path).await?;
            Ok::<_, StoreError>(())
        }
        .await;
        if let Err(e) = written {
            // Release the claimed id.
            let _ = tokio::fs::remove_file(&tmp).await;
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
        debug!(owner, %id, path = %path.display(), "saved design");
        Ok(id)
    }

    async fn list(&self, owner: &str) -> Result<Vec<DesignSummary>, StoreError> {
        let dir = self.designs_dir(owner)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.starts_with('.') {
                continue;
            }
            let Some(id) = file_name.strip_suffix(".json") else {
                continue;
            };
            match Self::read_record(&entry.path(), id).await {
                Ok(record) => summaries.push(DesignSummary::from(&record)),
                Err(e) => warn!(owner, id, error = %e, "skipping unreadable design"),
            }
        }
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn load(&self, owner: &str, id: &str) -> Result<Diagram, StoreError> {
        let path = self.design_path(owner, id)?;
        Ok(Self::read_record(&path, id).await?.diagram)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        let path = self.design_path(owner, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// --- In-memory store ---

/// Keeps designs in process memory. Used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    designs: Mutex<HashMap<String, Vec<DesignRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn designs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<DesignRecord>>> {
        self.designs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DesignStore for MemoryStore {
    async fn save(&self, owner: &str, name: &str, diagram: &Diagram) -> Result<String, StoreError> {
        check_key(owner)?;
        let mut designs = self.designs();
        let records = designs.entry(owner.to_string()).or_default();
        let now = now_millis();
        let id = unique_id(now, |candidate| records.iter().any(|r| r.id == candidate));
        records.push(DesignRecord {
            id: id.clone(),
            name: name.to_string(),
            diagram: diagram.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn list(&self, owner: &str) -> Result<Vec<DesignSummary>, StoreError> {
        check_key(owner)?;
        let mut summaries: Vec<DesignSummary> = self
            .designs()
            .get(owner)
            .map(|records| records.iter().map(DesignSummary::from).collect())
            .unwrap_or_default();
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn load(&self, owner: &str, id: &str) -> Result<Diagram, StoreError> {
        check_key(owner)?;
        self.designs()
            .get(owner)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .map(|r| r.diagram.clone())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        check_key(owner)?;
        if let Some(records) = self.designs().get_mut(owner) {
            records.retain(|r| r.id != id);
        }
        Ok(())
    }
}
