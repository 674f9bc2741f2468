use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::traits::{BlobStore, KeyValueStore, RecordStore, StoreFuture};
use crate::types::{StoredSubmission, SubmissionRecord, SubmissionRow};

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write through a sibling temp file so readers never see half a document
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Blob store backed by a directory
#[derive(Debug, Clone)]
pub struct DirectoryBlobStore {
    root: PathBuf,
}

impl DirectoryBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob path below the root; rejects absolute and `..` paths
    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::unavailable(format!("invalid blob path '{path}'")));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for DirectoryBlobStore {
    fn upload<'a>(&'a self, path: &'a str, bytes: &'a [u8], content_type: &'a str) -> StoreFuture<'a, ()> {
        async move {
            let target = self.resolve(path)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, bytes)?;
            log::debug!("stored {} ({}, {} bytes)", target.display(), content_type, bytes.len());
            Ok(())
        }
        .boxed_local()
    }

    fn public_reference(&self, path: &str) -> String {
        format!("file://{}", self.root.join(path).display())
    }
}

type Tables = HashMap<String, Vec<StoredSubmission>>;

/// Record store kept in one JSON document, `{ table: [rows] }`
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonRecordStore {
    fn insert<'a>(&'a self, table: &'a str, record: &'a SubmissionRecord) -> StoreFuture<'a, ()> {
        async move {
            let mut tables: Tables = read_json(&self.path)?;
            tables
                .entry(table.to_string())
                .or_default()
                .push(StoredSubmission::new(record.clone()));
            write_json(&self.path, &tables)
        }
        .boxed_local()
    }

    fn select<'a>(&'a self, table: &'a str) -> StoreFuture<'a, Vec<SubmissionRow>> {
        async move {
            let tables: Tables = read_json(&self.path)?;
            Ok(tables
                .get(table)
                .map(|rows| rows.iter().map(StoredSubmission::row).collect())
                .unwrap_or_default())
        }
        .boxed_local()
    }

    fn increment_votes<'a>(&'a self, table: &'a str, user_id: &'a str) -> StoreFuture<'a, ()> {
        async move {
            let mut tables: Tables = read_json(&self.path)?;
            let mut matched = false;
            let rows = tables.get_mut(table).into_iter().flatten();
            for row in rows.filter(|r| r.record.user == user_id) {
                row.vote += 1;
                matched = true;
            }
            if !matched {
                return Err(StoreError::not_found(format!("no submission by '{user_id}'")));
            }
            write_json(&self.path, &tables)
        }
        .boxed_local()
    }
}

/// Key-value flags kept in a JSON object on disk
#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        match read_json::<HashMap<String, String>>(&self.path) {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                log::warn!("unreadable flag file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values: HashMap<String, String> = read_json(&self.path)?;
        values.insert(key.to_string(), value.to_string());
        write_json(&self.path, &values)
    }
}
