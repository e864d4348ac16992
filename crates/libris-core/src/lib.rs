pub mod config;
pub mod covers;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, CoreConfig, CoverConfig};
pub use covers::Covers;
pub use error::{ExitCode, LibrisError, Result};
pub use models::*;

pub use storage::{
    open_backend, open_store, transfer, Backend, BookStore, JsonFileStore, SqliteStore,
};
