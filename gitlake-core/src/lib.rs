//! gitlake core library — repository acquisition, domain records, and the
//! batched ingestion writer.
//!
//! The main entry points are [`acquire::acquire`], which resolves a
//! repository locator into a handle, and [`writer::BatchedWriter`], which
//! an extractor drives to persist domain records through a
//! [`store::RecordStore`].

pub mod acquire;
pub mod config;
pub mod error;
pub mod extract;
pub mod store;
pub mod types;
pub mod writer;
