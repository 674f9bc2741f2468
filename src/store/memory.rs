use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use futures::FutureExt;

use crate::error::StoreError;
use crate::traits::{BlobStore, KeyValueStore, RecordStore, StoreFuture};
use crate::types::{StoredSubmission, SubmissionRecord, SubmissionRow};

/// In-process blob store with switchable failure
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: RefCell<HashMap<String, (String, Vec<u8>)>>,
    fail_uploads: Cell<bool>,
    upload_calls: Cell<usize>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.set(fail);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.get()
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.borrow().get(path).map(|(_, bytes)| bytes.clone())
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.borrow().get(path).map(|(ct, _)| ct.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.objects.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl BlobStore for MemoryBlobStore {
    fn upload<'a>(&'a self, path: &'a str, bytes: &'a [u8], content_type: &'a str) -> StoreFuture<'a, ()> {
        async move {
            self.upload_calls.set(self.upload_calls.get() + 1);
            if self.fail_uploads.get() {
                return Err(StoreError::unavailable("blob store rejected the upload"));
            }
            self.objects
                .borrow_mut()
                .insert(path.to_string(), (content_type.to_string(), bytes.to_vec()));
            Ok(())
        }
        .boxed_local()
    }

    fn public_reference(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// In-process record store; `increment_votes` is a single in-place update
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RefCell<HashMap<String, Vec<StoredSubmission>>>,
    fail_inserts: Cell<bool>,
    fail_selects: Cell<bool>,
    fail_votes: Cell<bool>,
    calls: Cell<usize>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row with an existing vote count
    pub fn seed(&self, table: &str, record: SubmissionRecord, vote: i64) {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .push(StoredSubmission { record, vote });
    }

    pub fn rows(&self, table: &str) -> Vec<StoredSubmission> {
        self.tables.borrow().get(table).cloned().unwrap_or_default()
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.set(fail);
    }

    pub fn set_fail_selects(&self, fail: bool) {
        self.fail_selects.set(fail);
    }

    pub fn set_fail_votes(&self, fail: bool) {
        self.fail_votes.set(fail);
    }

    /// Every call that reached the store, failed or not
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn count_call(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert<'a>(&'a self, table: &'a str, record: &'a SubmissionRecord) -> StoreFuture<'a, ()> {
        async move {
            self.count_call();
            if self.fail_inserts.get() {
                return Err(StoreError::unavailable("record store rejected the insert"));
            }
            self.tables
                .borrow_mut()
                .entry(table.to_string())
                .or_default()
                .push(StoredSubmission::new(record.clone()));
            Ok(())
        }
        .boxed_local()
    }

    fn select<'a>(&'a self, table: &'a str) -> StoreFuture<'a, Vec<SubmissionRow>> {
        async move {
            self.count_call();
            if self.fail_selects.get() {
                return Err(StoreError::unavailable("record store select failed"));
            }
            Ok(self
                .tables
                .borrow()
                .get(table)
                .map(|rows| rows.iter().map(StoredSubmission::row).collect())
                .unwrap_or_default())
        }
        .boxed_local()
    }

    fn increment_votes<'a>(&'a self, table: &'a str, user_id: &'a str) -> StoreFuture<'a, ()> {
        async move {
            self.count_call();
            if self.fail_votes.get() {
                return Err(StoreError::unavailable("increment_votes failed"));
            }
            let mut tables = self.tables.borrow_mut();
            let mut matched = false;
            let rows = tables.get_mut(table).into_iter().flatten();
            for row in rows.filter(|r| r.record.user == user_id) {
                row.vote += 1;
                matched = true;
            }
            if matched {
                Ok(())
            } else {
                Err(StoreError::not_found(format!("no submission by '{user_id}'")))
            }
        }
        .boxed_local()
    }
}

/// In-process key-value flags
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.values.borrow_mut().clear();
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::unavailable("storage is read-only"));
        }
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SUBMISSIONS_TABLE;
    use pollster::block_on;

    fn record(user: &str) -> SubmissionRecord {
        SubmissionRecord {
            user: user.into(),
            code: "code".into(),
            video_url: format!("https://cdn/{user}"),
        }
    }

    #[test]
    fn test_blob_upload_and_reference() {
        let store = MemoryBlobStore::new("https://cdn.example/clips/");
        block_on(store.upload("a/b.mjpeg", &[1, 2, 3], "video/x-motion-jpeg")).unwrap();

        assert_eq!(store.object("a/b.mjpeg"), Some(vec![1, 2, 3]));
        assert_eq!(store.content_type("a/b.mjpeg").as_deref(), Some("video/x-motion-jpeg"));
        assert_eq!(store.public_reference("a/b.mjpeg"), "https://cdn.example/clips/a/b.mjpeg");
    }

    #[test]
    fn test_blob_failure_stores_nothing() {
        let store = MemoryBlobStore::new("x");
        store.set_fail_uploads(true);
        assert!(block_on(store.upload("p", &[0], "t")).is_err());
        assert!(store.paths().is_empty());
        assert_eq!(store.upload_calls(), 1);
    }

    #[test]
    fn test_insert_then_select_projects_columns() {
        let store = MemoryRecordStore::new();
        block_on(store.insert(SUBMISSIONS_TABLE, &record("ada"))).unwrap();

        let rows = block_on(store.select(SUBMISSIONS_TABLE)).unwrap();
        assert_eq!(
            rows,
            vec![SubmissionRow {
                user: "ada".into(),
                video_url: "https://cdn/ada".into(),
                vote: 0
            }]
        );
    }

    #[test]
    fn test_increment_votes_unknown_user() {
        let store = MemoryRecordStore::new();
        let err = block_on(store.increment_votes(SUBMISSIONS_TABLE, "ghost")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_kv_roundtrip_and_failure() {
        let kv = MemoryKv::new();
        kv.set("k", "true").unwrap();
        assert_eq!(kv.get("k").as_deref(), Some("true"));

        kv.set_fail_writes(true);
        assert!(kv.set("k", "false").is_err());
        assert_eq!(kv.get("k").as_deref(), Some("true"));
    }
}
