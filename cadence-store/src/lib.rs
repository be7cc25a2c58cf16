pub mod backends;
pub mod config;
pub mod error;
pub mod store;

pub use backends::{FileStore, FileStoreBuilder, MemoryStore, TestStore};
pub use config::{MemoryConfig, StoreConfig};
pub use error::{Result, SerializationError, StoreError, ValidationError};
pub use store::CampaignStore;
