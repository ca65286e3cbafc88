//! Storage module for image uploads.
//!
//! MinIO/S3-compatible client used by the files feature to hold
//! publicly served profile images.

mod storage_client;

pub use storage_client::StorageClient;
