//! Persistent key/value store seam.
//!
//! - [`MemoryStore`]: process-local map, for tests and ephemeral hosts
//! - [`JsonFileStore`]: a single JSON object on disk

pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, StoreError};
