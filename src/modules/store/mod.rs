//! Record store access.
//!
//! The remote film store speaks a PostgREST-style HTTP contract; the
//! `RecordStore` trait is the seam services depend on, `PostgrestClient`
//! the production implementation.

mod postgrest_client;
mod record_store;

pub use postgrest_client::{classify_store_failure, PostgrestClient};
pub use record_store::{Filter, RecordStore};
