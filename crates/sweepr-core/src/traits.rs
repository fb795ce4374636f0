//! Collaborator seams: persistence and object storage.
//!
//! Services in this crate are generic over these traits so they can run
//! against PostgreSQL and HTTP storage in production and in-memory fakes in
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Listing, ListingPatch, SortUpdate};

/// Persistence for one listing kind.
#[async_trait]
pub trait ListingStore<T: Listing>: Send + Sync {
    /// All listings ordered by `sort_order`, then `id`.
    async fn list(&self, include_inactive: bool) -> Result<Vec<T>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, AppError>;

    /// Inserts a new row with the given `sort_order`.
    async fn insert(&self, new: &T::New, sort_order: i32) -> Result<T, AppError>;

    /// Full-field replace. `sort_order` is left alone.
    ///
    /// Returns `AppError::ListingNotFound` if no row has this id.
    async fn replace(&self, id: Uuid, new: &T::New) -> Result<T, AppError>;

    /// Applies a partial update.
    ///
    /// Returns `AppError::ListingNotFound` if no row has this id.
    async fn update_fields(&self, id: Uuid, patch: &ListingPatch) -> Result<T, AppError>;

    /// Returns `AppError::ListingNotFound` if no row has this id.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    /// Writes a reorder batch.
    ///
    /// The default applies updates one by one and stops at the first
    /// failure. Stores with transactions should override this so the batch
    /// lands atomically.
    async fn apply_sort_orders(&self, updates: &[SortUpdate]) -> Result<(), AppError> {
        for update in updates {
            self.update_fields(update.id, &ListingPatch::sort_order(update.sort_order))
                .await?;
        }
        Ok(())
    }
}

/// Where an uploaded file lands: a bucket and a folder inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadScope {
    pub bucket: String,
    pub folder: String,
}

impl UploadScope {
    pub fn new(bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            folder: folder.into(),
        }
    }
}

/// Hosted object storage for listing images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `bytes` and returns a publicly retrievable URL.
    ///
    /// Implementations must reject non-image content types and files larger
    /// than [`MAX_IMAGE_BYTES`](crate::validation::MAX_IMAGE_BYTES) before
    /// any network I/O.
    async fn upload(
        &self,
        scope: &UploadScope,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError>;
}
