// Shared helpers

pub mod constants;
pub mod jwt;
pub mod storage;
pub mod validation;

pub use constants::*;
pub use storage::{BrowserStorage, KeyValueStore, MemoryStorage};
