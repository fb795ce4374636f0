//! Sweepr DB - PostgreSQL persistence for sweepstakes and testimonials.
//!
//! Each repository implements [`sweepr_core::ListingStore`] for one table.
//! The schema lives in `migrations/0001_listings.sql`.

pub mod repository;

pub use repository::{SweepstakeRepository, TestimonialRepository};
