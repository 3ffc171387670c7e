//! Flat-file JSON store.
//!
//! Every file is read and rewritten whole. `load` never fails: a missing or
//! unparseable file yields the file's empty default. Writes go to a sibling
//! temp file that is then renamed over the target, so readers never observe a
//! half-written document.
//!
//! Mutations of `provocations.json` must go through [`JsonStore::mutate_collection`],
//! which serializes load → mutate → save within this process. There is no
//! cross-process locking: run a single writer process per data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::provocation::Provocation;
use crate::models::score::ScoreEntry;
use crate::models::thinker::{Thinker, ThinkersFile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not in the expected shape: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("{} not found", .0.display())]
    Missing(PathBuf),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The files the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    Thinkers,
    Seeds,
    Prompt,
    Config,
    Provocations,
}

impl DataFile {
    pub fn file_name(self) -> &'static str {
        match self {
            DataFile::Thinkers => "thinkers.json",
            DataFile::Seeds => "seeds.json",
            DataFile::Prompt => "prompt.json",
            DataFile::Config => "config.json",
            DataFile::Provocations => "provocations.json",
        }
    }

    /// Empty list for the provocations collection, empty mapping otherwise.
    pub fn empty_default(self) -> Value {
        match self {
            DataFile::Provocations => Value::Array(Vec::new()),
            _ => Value::Object(Default::default()),
        }
    }
}

/// Narrow persistence seam for the provocations collection.
///
/// Implementations replace the whole collection on save. Callers that mutate
/// concurrently must serialize their load → save sequences themselves.
#[async_trait]
pub trait ProvocationStore: Send + Sync {
    async fn load_collection(&self) -> Result<Vec<Provocation>, StoreError>;
    async fn save_collection(&self, provocations: &[Provocation]) -> Result<(), StoreError>;
}

pub struct JsonStore {
    data_dir: PathBuf,
    scores_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>, scores_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            scores_path: scores_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self, file: DataFile) -> PathBuf {
        self.data_dir.join(file.file_name())
    }

    pub fn scores_path(&self) -> &Path {
        &self.scores_path
    }

    /// Parsed contents of `file`, or its empty default.
    pub async fn load(&self, file: DataFile) -> Value {
        read_json_or(&self.path(file), file.empty_default()).await
    }

    /// Replaces the full contents of `file`.
    pub async fn save(&self, file: DataFile, value: &Value) -> Result<(), StoreError> {
        write_json_atomic(&self.path(file), value).await
    }

    /// Strict thinker load for the batch driver: a missing or malformed
    /// `thinkers.json` is an error rather than an empty list.
    pub async fn load_thinkers(&self) -> Result<Vec<Thinker>, StoreError> {
        let path = self.path(DataFile::Thinkers);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(path))
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let file: ThinkersFile =
            serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(file.thinkers)
    }

    /// Runs `mutate` against the current collection under the process-wide
    /// write lock, saving only if it returns `Ok`.
    pub async fn mutate_collection<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Provocation>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut provocations = self.load_collection().await?;
        let out = mutate(&mut provocations)?;
        self.save_collection(&provocations).await?;
        Ok(out)
    }

    pub async fn load_scores(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        let value = read_json_or(&self.scores_path, Value::Array(Vec::new())).await;
        decode(&self.scores_path, value)
    }

    pub async fn append_score(&self, entry: ScoreEntry) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut scores = self.load_scores().await?;
        scores.push(entry);
        write_json_atomic(&self.scores_path, &scores).await?;
        Ok(scores.len())
    }
}

#[async_trait]
impl ProvocationStore for JsonStore {
    async fn load_collection(&self) -> Result<Vec<Provocation>, StoreError> {
        let path = self.path(DataFile::Provocations);
        let value = read_json_or(&path, DataFile::Provocations.empty_default()).await;
        decode(&path, value)
    }

    async fn save_collection(&self, provocations: &[Provocation]) -> Result<(), StoreError> {
        write_json_atomic(&self.path(DataFile::Provocations), &provocations).await
    }
}

fn decode<T: DeserializeOwned>(path: &Path, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

async fn read_json_or(path: &Path, default: Value) -> Value {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            debug!("{} unreadable ({e}); using empty default", path.display());
            return default;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!("{} is not valid JSON ({e}); using empty default", path.display());
            default
        }
    }
}

async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}
