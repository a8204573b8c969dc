pub mod migrations;
pub mod registry;
pub mod sqlite;

pub use sqlite::{Storage, StorageStats};
