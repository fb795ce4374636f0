//! Sweepr CLI - Command-line admin console for the Sweepr sweepstakes site
//!
//! This crate wires the core admin operations to PostgreSQL and object storage.

pub mod config;

pub use config::{
    Command, Config, DirectionArg, KindArg, ListingAction, OutputFormat, SweepstakeAction,
    SweepstakeFields, TestimonialAction, TestimonialFields,
};
