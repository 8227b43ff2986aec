//! Chat session engine: configuration, transcript storage, markdown cleanup,
//! and the turn loop that ties them to the provider adapter.

pub mod config;
pub mod markdown;
pub mod session;
pub mod storage;
pub mod transcript;

pub use config::Config;
pub use markdown::clean_markdown;
pub use session::{ChatSession, ChatSettings, MISSING_SETTINGS_NOTICE, TurnOutcome};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
