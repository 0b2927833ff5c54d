//! Persistence for users and audit entries.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryConsoleStore;
pub use json_file::JsonFileStore;
pub use r#trait::{ConsoleStore, StoreError, StoredState};
