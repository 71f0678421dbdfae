//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for the remote record store and the
//! S3-compatible image storage.

pub mod storage;
pub mod store;
