use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No saved data found")]
    NotFound,
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Cache encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cache write error: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Last-fetched aggregates, keyed by name. Advisory only: a fresh live
/// fetch always overwrites the whole entry.
pub trait AggregateCache: Send + Sync {
    fn save(&self, name: &str, aggregate: &Value) -> Result<(), CacheError>;
    fn load(&self, name: &str) -> Result<Value, CacheError>;
}

/// One indented `<name>.json` file per aggregate.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl AggregateCache for FileCache {
    fn save(&self, name: &str, aggregate: &Value) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);

        // Written beside the target and renamed over it, so readers never see a partial file.
        let mut file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut serializer =
                Serializer::with_formatter(&mut file, PrettyFormatter::with_indent(b"    "));
            aggregate.serialize(&mut serializer)?;
        }
        file.write_all(b"\n")?;
        file.flush()?;
        file.persist(&path)?;

        tracing::info!(path = %path.display(), "aggregate saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Value, CacheError> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CacheError::NotFound),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AggregateCache for MemoryCache {
    fn save(&self, name: &str, aggregate: &Value) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), aggregate.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Value, CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or(CacheError::NotFound)
    }
}
