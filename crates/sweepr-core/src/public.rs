//! Assembles what a visitor from one region sees on the home page.

use serde::Serialize;

use crate::models::{Listing, Sweepstake, Testimonial};
use crate::region::{filter_for_region, ContentTable, RegionContent};

/// The region-specific home page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomePage {
    pub region: String,
    pub content: RegionContent,
    pub sweepstakes: Vec<Sweepstake>,
    pub testimonials: Vec<Testimonial>,
}

impl HomePage {
    /// Builds the page for `region` from active listings in display order.
    ///
    /// Inactive listings are dropped even if the caller passed them in.
    pub fn build(
        region: &str,
        content: &ContentTable,
        sweepstakes: &[Sweepstake],
        testimonials: &[Testimonial],
    ) -> Self {
        Self {
            region: region.to_string(),
            content: content.content_for(region).clone(),
            sweepstakes: visible(sweepstakes, region),
            testimonials: visible(testimonials, region),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sweepstakes.is_empty() && self.testimonials.is_empty()
    }
}

fn visible<T: Listing>(items: &[T], region: &str) -> Vec<T> {
    filter_for_region(items, region)
        .into_iter()
        .filter(|item| item.is_active())
        .cloned()
        .collect()
}
