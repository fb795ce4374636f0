//! Admin console operations over one listing kind.
//!
//! [`AdminService`] ties the pure ordering functions to a [`ListingStore`]:
//! it validates input, assigns sort orders on create, closes gaps on delete,
//! and persists reorder batches under a write timeout.

use std::marker::PhantomData;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::WriteConfig;
use crate::error::AppError;
use crate::models::{
    DashboardStats, Listing, ListingPatch, SortUpdate, Sweepstake, Testimonial,
};
use crate::ordering::{densify, move_item, next_sort_order, Direction, Reordered};
use crate::traits::ListingStore;
use crate::validation::Validate;

/// Result of a reorder, or of the renumbering that follows a delete.
#[derive(Debug)]
pub enum ReorderOutcome<T> {
    /// The new order was computed and persisted.
    Applied(Reordered<T>),
    /// The item was already at the boundary; nothing was written.
    Unchanged(Vec<T>),
    /// Persisting failed or timed out. `items` is a fresh reload from the
    /// store and is what the caller should display.
    Resynced { items: Vec<T>, error: AppError },
}

impl<T> ReorderOutcome<T> {
    /// The sequence the caller should show after this request.
    pub fn items(&self) -> &[T] {
        match self {
            ReorderOutcome::Applied(reordered) => &reordered.items,
            ReorderOutcome::Unchanged(items) => items,
            ReorderOutcome::Resynced { items, .. } => items,
        }
    }

    /// Turns a resync into `AppError::ReorderFailed`.
    pub fn into_result(self) -> Result<Vec<T>, AppError> {
        match self {
            ReorderOutcome::Applied(reordered) => Ok(reordered.items),
            ReorderOutcome::Unchanged(items) => Ok(items),
            ReorderOutcome::Resynced { error, .. } => {
                Err(AppError::ReorderFailed(Box::new(error)))
            }
        }
    }
}

/// Create, edit, delete, reorder and activation for one listing kind.
pub struct AdminService<T, S> {
    store: S,
    write: WriteConfig,
    _listing: PhantomData<fn() -> T>,
}

impl<T, S> AdminService<T, S>
where
    T: Listing,
    S: ListingStore<T>,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, WriteConfig::default())
    }

    pub fn with_config(store: S, write: WriteConfig) -> Self {
        Self {
            store,
            write,
            _listing: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every listing, inactive included, in display order.
    pub async fn list(&self) -> Result<Vec<T>, AppError> {
        self.store.list(true).await
    }

    pub async fn get(&self, id: Uuid) -> Result<T, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or(AppError::ListingNotFound(id))
    }

    /// Validates and inserts at the end of the list.
    ///
    /// The position is read before the insert, so two concurrent creates can
    /// share a `sort_order`. The next move or delete renumbers densely.
    pub async fn create(&self, new: &T::New) -> Result<T, AppError> {
        new.validate()?;

        let existing = self.store.list(true).await?;
        let sort_order = next_sort_order(&existing);
        let created = self.store.insert(new, sort_order).await?;

        info!(
            "Created {} '{}' ({}) at position {}",
            T::KIND.singular(),
            created.title(),
            created.id(),
            sort_order
        );
        Ok(created)
    }

    /// Validates and replaces every editable field. Position is kept.
    pub async fn edit(&self, id: Uuid, new: &T::New) -> Result<T, AppError> {
        new.validate()?;

        let updated = self.store.replace(id, new).await?;
        info!("Updated {} {}", T::KIND.singular(), id);
        Ok(updated)
    }

    /// Flips `active`. Inactive listings stay in the admin list.
    pub async fn toggle_active(&self, id: Uuid) -> Result<T, AppError> {
        let current = self.get(id).await?;
        let updated = self
            .store
            .update_fields(id, &ListingPatch::active(!current.is_active()))
            .await?;

        info!(
            "{} {} is now {}",
            T::KIND.singular(),
            id,
            if updated.is_active() { "active" } else { "inactive" }
        );
        Ok(updated)
    }

    /// Deletes a listing and renumbers the rest so the order stays dense.
    ///
    /// The outcome carries the remaining listings. If the renumbering cannot
    /// be saved the delete still stands: the outcome is
    /// [`ReorderOutcome::Resynced`] with the reloaded (gapped) list.
    ///
    /// # Errors
    ///
    /// `AppError::ListingNotFound` if nothing was deleted.
    /// `AppError::ReorderFailed` if renumbering and the reload both failed.
    pub async fn delete(&self, id: Uuid) -> Result<ReorderOutcome<T>, AppError> {
        self.store.delete(id).await?;
        info!("Deleted {} {}", T::KIND.singular(), id);

        let remaining = self.store.list(true).await?;
        let densified = densify(&remaining);
        if densified.is_noop() {
            return Ok(ReorderOutcome::Unchanged(densified.items));
        }

        debug!(
            "Closing sort order gap: {} rows renumbered",
            densified.updates.len()
        );
        self.persist_or_resync(densified).await
    }

    /// Moves a listing one step and persists the change as one batch.
    ///
    /// # Errors
    ///
    /// `AppError::ListingNotFound` if the id is not in the current list (no
    /// writes happen). Persistence failures are reported through
    /// [`ReorderOutcome::Resynced`]; only if the reload also fails is
    /// `AppError::ReorderFailed` returned directly.
    pub async fn reorder(
        &self,
        id: Uuid,
        direction: Direction,
    ) -> Result<ReorderOutcome<T>, AppError> {
        let items = self.store.list(true).await?;
        let reordered = move_item(&items, id, direction)?;

        if reordered.is_noop() {
            debug!("Move {} of {} is a no-op", direction, id);
            return Ok(ReorderOutcome::Unchanged(reordered.items));
        }

        let moved = reordered.updates.len();
        let outcome = self.persist_or_resync(reordered).await?;
        if matches!(outcome, ReorderOutcome::Applied(_)) {
            info!(
                "Moved {} {} {} ({} rows updated)",
                T::KIND.singular(),
                id,
                direction,
                moved
            );
        }
        Ok(outcome)
    }

    /// Persists `reordered`; on failure reloads so the caller never keeps a
    /// sequence the store does not have.
    async fn persist_or_resync(
        &self,
        reordered: Reordered<T>,
    ) -> Result<ReorderOutcome<T>, AppError> {
        match self.persist(&reordered.updates).await {
            Ok(()) => Ok(ReorderOutcome::Applied(reordered)),
            Err(e) => {
                warn!("Saving {} order failed, reloading: {}", T::KIND.singular(), e);
                match self.store.list(true).await {
                    Ok(items) => Ok(ReorderOutcome::Resynced { items, error: e }),
                    Err(reload_err) => {
                        error!("Reload after failed save also failed: {}", reload_err);
                        Err(AppError::ReorderFailed(Box::new(e)))
                    }
                }
            }
        }
    }

    async fn persist(&self, updates: &[SortUpdate]) -> Result<(), AppError> {
        match tokio::time::timeout(self.write.timeout, self.store.apply_sort_orders(updates)).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.write.timeout.as_secs())),
        }
    }
}

/// Record counts for the admin dashboard.
pub async fn dashboard_stats<S, U>(sweepstakes: &S, testimonials: &U) -> Result<DashboardStats, AppError>
where
    S: ListingStore<Sweepstake>,
    U: ListingStore<Testimonial>,
{
    let (sweepstakes, testimonials) = tokio::try_join!(sweepstakes.count(), testimonials.count())?;
    Ok(DashboardStats {
        sweepstakes,
        testimonials,
    })
}
