//! Storage errors and the in-process stores used by the API service and tests.

mod memory;

pub use memory::{InMemoryCatalog, InMemoryNotifications, InMemoryWatchlist};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub(crate) fn poisoned(store: &str) -> Self {
        RepositoryError::Unavailable(format!("{store} lock poisoned"))
    }
}
