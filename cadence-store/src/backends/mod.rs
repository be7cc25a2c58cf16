//! Backend storage implementations for campaign records
//!
//! - `memory`: In-memory storage for tests and single-process use
//! - `test`: Memory storage with write counting and fault injection
//! - `file`: JSON files in a directory, for production use

pub mod file;
pub mod memory;

pub use file::{FileStore, FileStoreBuilder};
pub use memory::MemoryStore;
pub use test::TestStore;
