/// The SQLite-backed idea store.
pub mod database;

/// External mirrors of the store.
pub mod sink;

/// The idea itself and helpers around it.
pub mod types;

pub use database::IdeaStore;
pub use types::Idea;
