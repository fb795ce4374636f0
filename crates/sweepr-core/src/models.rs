//! Listing records and the DTOs used to create and patch them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::validation::Validate;

/// The two record kinds that share ordering and region filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Sweepstakes,
    Testimonials,
}

impl ListingKind {
    /// Database table backing this kind.
    pub fn table(self) -> &'static str {
        match self {
            ListingKind::Sweepstakes => "sweepstakes",
            ListingKind::Testimonials => "testimonials",
        }
    }

    /// Singular, human-readable label.
    pub fn singular(self) -> &'static str {
        match self {
            ListingKind::Sweepstakes => "sweepstake",
            ListingKind::Testimonials => "testimonial",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Shared surface of every orderable, region-tagged record.
///
/// Ordering and filtering only ever look at these accessors; the rest of a
/// record is display payload.
pub trait Listing: Clone + Send + Sync + 'static {
    /// Input accepted for create and full-field edit.
    type New: Validate + Send + Sync;

    const KIND: ListingKind;

    fn id(&self) -> Uuid;
    fn sort_order(&self) -> i32;
    fn set_sort_order(&mut self, sort_order: i32);
    fn countries(&self) -> &[String];
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    /// Short label for logs and tables.
    fn title(&self) -> &str;
}

/// A row from the `sweepstakes` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Sweepstake {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    /// Entry link; the public card is not clickable without it.
    pub url: Option<String>,
    pub countries: Vec<String>,
    pub sort_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `testimonials` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: Uuid,
    pub quote: String,
    pub name: String,
    pub location: String,
    /// Star rating, 1 to 5.
    pub rating: i16,
    pub avatar_url: Option<String>,
    pub countries: Vec<String>,
    pub sort_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating or fully replacing a sweepstake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSweepstake {
    pub name: String,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub countries: Vec<String>,
    pub active: bool,
}

/// DTO for creating or fully replacing a testimonial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTestimonial {
    pub quote: String,
    pub name: String,
    pub location: String,
    pub rating: i16,
    pub avatar_url: Option<String>,
    pub countries: Vec<String>,
    pub active: bool,
}

/// Partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPatch {
    pub sort_order: Option<i32>,
    pub active: Option<bool>,
}

impl ListingPatch {
    pub fn sort_order(sort_order: i32) -> Self {
        Self {
            sort_order: Some(sort_order),
            active: None,
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            sort_order: None,
            active: Some(active),
        }
    }
}

/// One `(id, new sort_order)` pair produced by a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortUpdate {
    pub id: Uuid,
    pub sort_order: i32,
}

/// Record counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub sweepstakes: i64,
    pub testimonials: i64,
}

impl Listing for Sweepstake {
    type New = NewSweepstake;

    const KIND: ListingKind = ListingKind::Sweepstakes;

    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: i32) {
        self.sort_order = sort_order;
    }

    fn countries(&self) -> &[String] {
        &self.countries
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn title(&self) -> &str {
        &self.name
    }
}

impl Listing for Testimonial {
    type New = NewTestimonial;

    const KIND: ListingKind = ListingKind::Testimonials;

    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: i32) {
        self.sort_order = sort_order;
    }

    fn countries(&self) -> &[String] {
        &self.countries
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn title(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sweepstake() -> Sweepstake {
        let now = Utc::now();
        Sweepstake {
            id: Uuid::new_v4(),
            name: "$500 Visa Gift Card".to_string(),
            image_url: None,
            url: Some("https://example.com/enter".to_string()),
            countries: vec!["AU".to_string(), "UK".to_string()],
            sort_order: 3,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(ListingKind::Sweepstakes.table(), "sweepstakes");
        assert_eq!(ListingKind::Testimonials.table(), "testimonials");
        assert_eq!(ListingKind::Testimonials.to_string(), "testimonials");
    }

    #[test]
    fn test_listing_accessors() {
        let mut s = sample_sweepstake();
        assert_eq!(s.sort_order(), 3);
        assert_eq!(s.countries(), ["AU".to_string(), "UK".to_string()]);
        assert_eq!(s.title(), "$500 Visa Gift Card");

        s.set_sort_order(0);
        s.set_active(false);
        assert_eq!(s.sort_order, 0);
        assert!(!s.is_active());
        assert_eq!(Sweepstake::KIND, ListingKind::Sweepstakes);
    }

    #[test]
    fn test_patch_constructors() {
        assert_eq!(
            ListingPatch::sort_order(2),
            ListingPatch {
                sort_order: Some(2),
                active: None
            }
        );
        assert_eq!(ListingPatch::active(false).active, Some(false));
        assert_eq!(ListingPatch::default().sort_order, None);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ListingKind::Sweepstakes).unwrap();
        assert_eq!(json, "\"sweepstakes\"");
    }
}
