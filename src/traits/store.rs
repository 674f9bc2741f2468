use futures::future::LocalBoxFuture;

use crate::error::StoreError;
use crate::types::{SubmissionRecord, SubmissionRow};

pub type StoreFuture<'a, T> = LocalBoxFuture<'a, Result<T, StoreError>>;

/// Remote object storage for recorded clips
pub trait BlobStore {
    /// Store `bytes` under `path`
    fn upload<'a>(&'a self, path: &'a str, bytes: &'a [u8], content_type: &'a str) -> StoreFuture<'a, ()>;

    /// Public reference (URL) under which an uploaded path is served
    fn public_reference(&self, path: &str) -> String;
}

/// Remote table storage for submissions and votes
pub trait RecordStore {
    fn insert<'a>(&'a self, table: &'a str, record: &'a SubmissionRecord) -> StoreFuture<'a, ()>;

    /// Gallery projection of a table: `user, video_url, vote`
    fn select<'a>(&'a self, table: &'a str) -> StoreFuture<'a, Vec<SubmissionRow>>;

    /// Atomic server-side `vote = vote + 1` for one submission in `table`
    fn increment_votes<'a>(&'a self, table: &'a str, user_id: &'a str) -> StoreFuture<'a, ()>;
}

/// Small per-client key-value capability (the "has voted" flag)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
