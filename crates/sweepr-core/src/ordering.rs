//! Dense sort-order maintenance for admin list screens.
//!
//! Every function here is pure: inputs are borrowed, results are fresh
//! vectors, and nothing talks to a store. Callers persist the returned
//! [`SortUpdate`]s through a [`ListingStore`](crate::traits::ListingStore).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Listing, SortUpdate};

/// Direction of a single-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward index 0.
    Up,
    /// Toward the end of the list.
    Down,
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(AppError::Validation(format!(
                "Invalid direction '{other}'. Must be 'up' or 'down'"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// A recomputed ordering and the writes needed to persist it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reordered<T> {
    /// Final sequence with `sort_order == position` for every item.
    pub items: Vec<T>,
    /// Only the pairs whose `sort_order` actually changed.
    pub updates: Vec<SortUpdate>,
}

impl<T: Clone> Reordered<T> {
    fn unchanged(items: &[T]) -> Self {
        Self {
            items: items.to_vec(),
            updates: Vec::new(),
        }
    }

    /// Returns true if nothing needs to be written.
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Moves the listing `id` one step in `direction` and renumbers the result.
///
/// `items` must already be ordered ascending by `sort_order`; the given order
/// is authoritative, so equal `sort_order` values keep their relative order.
///
/// Moving the first item up or the last item down is a no-op, not an error.
///
/// # Errors
///
/// Returns `AppError::ListingNotFound` if `id` is not in `items`.
///
/// # Examples
///
/// ```ignore
/// let reordered = move_item(&items, c_id, Direction::Up)?;
/// // [A, B, C, D] -> [A, C, B, D], updates = {C: 1, B: 2}
/// ```
pub fn move_item<T: Listing>(
    items: &[T],
    id: Uuid,
    direction: Direction,
) -> Result<Reordered<T>, AppError> {
    let index = items
        .iter()
        .position(|item| item.id() == id)
        .ok_or(AppError::ListingNotFound(id))?;

    let target = match direction {
        Direction::Up if index == 0 => return Ok(Reordered::unchanged(items)),
        Direction::Up => index - 1,
        Direction::Down if index + 1 == items.len() => return Ok(Reordered::unchanged(items)),
        Direction::Down => index + 1,
    };

    let mut next = items.to_vec();
    let moved = next.remove(index);
    next.insert(target, moved);

    Ok(resequence(next))
}

/// Renumbers `items` to `0..n-1` by position.
///
/// Used after a delete to close the gap the removed row left behind.
pub fn densify<T: Listing>(items: &[T]) -> Reordered<T> {
    resequence(items.to_vec())
}

/// The `sort_order` a newly created listing should take.
pub fn next_sort_order<T: Listing>(items: &[T]) -> i32 {
    items
        .iter()
        .map(Listing::sort_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Returns true if the `sort_order` values are exactly `0..n-1`, in any order.
pub fn is_dense<T: Listing>(items: &[T]) -> bool {
    let mut orders: Vec<i32> = items.iter().map(Listing::sort_order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(position, order)| *order == position as i32)
}

fn resequence<T: Listing>(mut items: Vec<T>) -> Reordered<T> {
    let mut updates = Vec::new();

    for (position, item) in items.iter_mut().enumerate() {
        let sort_order = position as i32;
        if item.sort_order() != sort_order {
            item.set_sort_order(sort_order);
            updates.push(SortUpdate {
                id: item.id(),
                sort_order,
            });
        }
    }

    Reordered { items, updates }
}
