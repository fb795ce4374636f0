//! Sweepr Core - Domain types, ordering, region filtering, and error handling.

pub mod admin;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod ordering;
pub mod public;
pub mod region;
pub mod traits;
pub mod validation;

pub use admin::{dashboard_stats, AdminService, ReorderOutcome};
pub use config::{
    default_config_path, load_site_config, DbConfig, HttpConfig, SiteConfig, UploadConfig,
    WriteConfig,
};
pub use error::AppError;
pub use geo::{resolve_region, GEO_HEADER};
pub use models::{
    DashboardStats, Listing, ListingKind, ListingPatch, NewSweepstake, NewTestimonial,
    SortUpdate, Sweepstake, Testimonial,
};
pub use ordering::{densify, is_dense, move_item, next_sort_order, Direction, Reordered};
pub use public::HomePage;
pub use region::{
    filter_for_region, region_name, ContentTable, RegionContent, DEFAULT_REGION,
    SUPPORTED_REGIONS,
};
pub use traits::{ListingStore, ObjectStore, UploadScope};
pub use validation::{validate_image_upload, Validate, MAX_IMAGE_BYTES};
