pub mod local;
pub mod memory;

pub use local::{DirectoryBlobStore, FileKv, JsonRecordStore};
pub use memory::{MemoryBlobStore, MemoryKv, MemoryRecordStore};
