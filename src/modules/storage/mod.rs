//! Storage module for film image assets
//!
//! Provides an S3-compatible storage client for public image uploads
//! and best-effort deletion.

mod storage_client;

pub use storage_client::StorageClient;
