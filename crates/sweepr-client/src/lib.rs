//! Sweepr Client - HTTP clients for external services
//!
//! This crate provides:
//!
//! - [`storage`] - hosted object storage for sweepstake images and testimonial avatars
//!
//! The client validates uploads locally, names objects by timestamp and
//! content hash, and retries transient failures with backoff.

pub mod storage;

pub use storage::StorageClient;
