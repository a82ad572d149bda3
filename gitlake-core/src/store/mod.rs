//! Durable record storage — the write surface behind the batched writer.

pub mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{RecordStore, StoreStats};
