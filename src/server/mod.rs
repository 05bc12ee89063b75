//! Server-side modules for the FilmDeck sync server.

pub mod hub;
pub mod storage;

pub use hub::FeedHub;
pub use storage::{ServerStorage, ServerStorageError};
