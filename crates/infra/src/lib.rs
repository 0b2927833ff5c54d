//! Infrastructure layer: storage adapters and configuration.

pub mod config;
pub mod store;

pub use config::{ConsoleConfig, DEFAULT_AUDIT_DISPLAY_LIMIT};
pub use store::{ConsoleStore, InMemoryConsoleStore, JsonFileStore, StoreError, StoredState};
