//! Merge store
//!
//! A single JSON object on disk mapping record keys to submissions. Each
//! merge reads the whole document, adds exactly one new key and replaces
//! the file through a temporary file and a rename, so readers never see a
//! half-written document.

use chrono::Local;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{RelayError, Result};
use crate::logger;
use crate::relay::SubmissionRecord;

/// In-memory form of the store file
pub type StoreDocument = Map<String, Value>;

const KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// JSON-backed submission store with serialized merges
pub struct MergeStore {
    path: PathBuf,
    /// Held for the whole read-modify-write cycle of a merge
    write_lock: Mutex<()>,
}

impl MergeStore {
    /// Open the store, creating an empty document if the file is missing.
    /// An existing file is left as it is, even if it is corrupt.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        let exists = fs::try_exists(&store.path)
            .await
            .map_err(|e| store.io_error(e))?;
        if !exists {
            store.write_document(&StoreDocument::new()).await?;
            logger::log_info(&format!(
                "Created empty data file {}",
                store.path.display()
            ));
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record under a fresh key and return that key.
    ///
    /// A missing or corrupt file counts as an empty document. If the
    /// write fails the record is dropped and the error returned; the
    /// previous file stays in place.
    pub async fn merge_one(&self, record: &SubmissionRecord) -> Result<String> {
        let _guard = self.write_lock.lock().await;

        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(err @ RelayError::StoreCorrupt { .. }) => {
                logger::log_warning(&format!("{err}; starting from an empty document"));
                StoreDocument::new()
            }
            Err(err) => return Err(err),
        };

        let value = serde_json::to_value(record).map_err(|source| RelayError::StoreEncode {
            path: self.path.clone(),
            what: "record",
            source,
        })?;

        let stamp = Local::now().format(KEY_FORMAT).to_string();
        let key = unique_key(&document, stamp);
        document.insert(key.clone(), value);

        self.write_document(&document).await?;
        Ok(key)
    }

    /// Read the current document without modifying it
    pub async fn load(&self) -> Result<StoreDocument> {
        self.read_document().await
    }

    async fn read_document(&self) -> Result<StoreDocument> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::log_warning(&format!(
                    "Data file {} is missing, starting a new document",
                    self.path.display()
                ));
                return Ok(StoreDocument::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(RelayError::StoreCorrupt {
                path: self.path.clone(),
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(RelayError::StoreCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    async fn write_document(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(document).map_err(|source| RelayError::StoreEncode {
            path: self.path.clone(),
            what: "document",
            source,
        })?;

        let tmp_path = self.tmp_path();
        if let Err(e) = write_and_sync(&tmp_path, &bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.io_error(e));
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.io_error(e));
        }
        Ok(())
    }

    /// Sibling of the data file, so the rename stays on one filesystem
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> RelayError {
        RelayError::StoreIo {
            path: self.path.clone(),
            source,
        }
    }
}

async fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Pick a key not yet present in `document`: the timestamp itself, or the
/// timestamp with the first free `#n` suffix.
pub fn unique_key(document: &StoreDocument, stamp: String) -> String {
    if !document.contains_key(&stamp) {
        return stamp;
    }
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{stamp}#{n}");
        if !document.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
