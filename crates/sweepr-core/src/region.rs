//! Region filtering and per-region marketing copy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::resolve_region;
use crate::models::Listing;

/// Built-in default region. `sweepr.toml` may name another one.
pub const DEFAULT_REGION: &str = "AU";

/// Region codes an admin may tag a listing with.
pub const SUPPORTED_REGIONS: &[&str] = &["AU", "US", "UK"];

/// Display name for a supported region code.
pub fn region_name(code: &str) -> Option<&'static str> {
    match code {
        "AU" => Some("Australia"),
        "US" => Some("United States"),
        "UK" => Some("United Kingdom"),
        _ => None,
    }
}

/// Returns the listings tagged with `region`, preserving input order.
///
/// Matching is exact string equality: no trimming, no case-folding. A listing
/// with no countries is never shown. Unknown regions simply match nothing.
pub fn filter_for_region<'a, T: Listing>(items: &'a [T], region: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| item.countries().iter().any(|code| code == region))
        .collect()
}

/// Display strings for one region's home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionContent {
    pub hero_heading: String,
    pub hero_paragraph: String,
    pub about_paragraph: String,
    pub testimonial_subheading: String,
    pub footer_tagline: String,
}

/// Region code to [`RegionContent`] mapping with a guaranteed default entry.
#[derive(Debug, Clone)]
pub struct ContentTable {
    default_region: String,
    default_content: RegionContent,
    bundles: HashMap<String, RegionContent>,
}

impl ContentTable {
    /// Builds a table, failing if `default_region` has no bundle.
    pub fn new(
        bundles: HashMap<String, RegionContent>,
        default_region: &str,
    ) -> Result<Self, AppError> {
        let default_content = bundles.get(default_region).cloned().ok_or_else(|| {
            AppError::ConfigError(format!(
                "Default region '{default_region}' has no content bundle"
            ))
        })?;

        Ok(Self {
            default_region: default_region.to_string(),
            default_content,
            bundles,
        })
    }

    /// The shipped AU / US / UK copy with AU as default.
    pub fn builtin() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
            default_content: au_content(),
            bundles: builtin_bundles(),
        }
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    /// Content for `region`, or the default region's content.
    pub fn content_for(&self, region: &str) -> &RegionContent {
        self.bundles.get(region).unwrap_or(&self.default_content)
    }

    /// Resolves a raw geo header value, falling back to this table's default.
    pub fn resolve_country(&self, raw_country: Option<&str>) -> &str {
        resolve_region(raw_country, &self.default_region)
    }

    /// Returns true if `region` has its own bundle.
    pub fn has_region(&self, region: &str) -> bool {
        self.bundles.contains_key(region)
    }

    /// Region codes with a bundle, sorted.
    pub fn regions(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for ContentTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The shipped bundles, keyed by region code.
pub fn builtin_bundles() -> HashMap<String, RegionContent> {
    [
        ("AU", au_content()),
        ("US", us_content()),
        ("UK", uk_content()),
    ]
    .into_iter()
    .map(|(code, content)| (code.to_string(), content))
    .collect()
}

fn au_content() -> RegionContent {
    RegionContent {
        hero_heading: "Australians' favourite sweepstakes".to_string(),
        hero_paragraph: "Discover verified giveaways tailored to you. Enter in minutes, win prizes that matter, and join thousands of Australians winning every day.".to_string(),
        about_paragraph: "Sweepr works with sweepstake holders all across Australia and beyond to find and promote the best sweepstakes and giveaways currently available. Our team verifies each opportunity to ensure legitimacy, so you can enter with confidence. We personalise recommendations based on your location and preferences, giving you access to relevant prizes with higher odds of winning.".to_string(),
        testimonial_subheading: "Join thousands of happy winners across Australia".to_string(),
        footer_tagline: "Australia's trusted sweepstakes platform".to_string(),
    }
}

fn us_content() -> RegionContent {
    RegionContent {
        hero_heading: "Americans' favorite sweepstakes".to_string(),
        hero_paragraph: "Discover verified giveaways tailored to you. Enter in minutes, win prizes that matter, and join thousands of Americans winning every day.".to_string(),
        about_paragraph: "Sweepr works with sweepstake holders all across the USA and beyond to find and promote the best sweepstakes and giveaways currently available. Our team verifies each opportunity to ensure legitimacy, so you can enter with confidence. We personalize recommendations based on your location and preferences, giving you access to relevant prizes with higher odds of winning.".to_string(),
        testimonial_subheading: "Join thousands of happy winners across the USA".to_string(),
        footer_tagline: "America's trusted sweepstakes platform".to_string(),
    }
}

fn uk_content() -> RegionContent {
    RegionContent {
        hero_heading: "Great Britain's favourite sweepstakes".to_string(),
        hero_paragraph: "Discover verified giveaways tailored to you. Enter in minutes, win prizes that matter, and join thousands of Brits winning every day.".to_string(),
        about_paragraph: "Sweepr works with sweepstake holders all across Great Britain and beyond to find and promote the best sweepstakes and giveaways currently available. Our team verifies each opportunity to ensure legitimacy, so you can enter with confidence. We personalise recommendations based on your location and preferences, giving you access to relevant prizes with higher odds of winning.".to_string(),
        testimonial_subheading: "Join thousands of happy winners across Great Britain".to_string(),
        footer_tagline: "Great Britain's trusted sweepstakes platform".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sweepstake;
    use chrono::Utc;
    use uuid::Uuid;

    fn listing(name: &str, countries: &[&str]) -> Sweepstake {
        let now = Utc::now();
        Sweepstake {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: None,
            url: None,
            countries: countries.iter().map(|c| c.to_string()).collect(),
            sort_order: 0,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn fixture() -> Vec<Sweepstake> {
        vec![
            listing("L1", &["AU", "UK"]),
            listing("L2", &["US"]),
            listing("L3", &[]),
        ]
    }

    fn names(items: &[&Sweepstake]) -> Vec<String> {
        items.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_filter_exact_region() {
        let items = fixture();
        assert_eq!(names(&filter_for_region(&items, "AU")), ["L1"]);
        assert_eq!(names(&filter_for_region(&items, "UK")), ["L1"]);
        assert_eq!(names(&filter_for_region(&items, "US")), ["L2"]);
        assert!(filter_for_region(&items, "FR").is_empty());
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let items = fixture();
        assert!(filter_for_region(&items, "au").is_empty());
        assert!(filter_for_region(&items, " AU").is_empty());
    }

    #[test]
    fn test_filter_preserves_order_and_is_idempotent() {
        let items = vec![
            listing("first", &["AU"]),
            listing("skip", &["US"]),
            listing("second", &["UK", "AU"]),
            listing("third", &["AU"]),
        ];

        let once = filter_for_region(&items, "AU");
        let twice = filter_for_region(&items, "AU");

        assert_eq!(names(&once), ["first", "second", "third"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_empty_input() {
        let items: Vec<Sweepstake> = Vec::new();
        assert!(filter_for_region(&items, "AU").is_empty());
    }

    #[test]
    fn test_content_for_known_region() {
        let table = ContentTable::builtin();
        assert_eq!(
            table.content_for("US").hero_heading,
            "Americans' favorite sweepstakes"
        );
        assert_eq!(
            table.content_for("UK").footer_tagline,
            "Great Britain's trusted sweepstakes platform"
        );
    }

    #[test]
    fn test_content_falls_back_to_default() {
        let table = ContentTable::builtin();
        let default = table.content_for(DEFAULT_REGION);

        for region in ["FR", "", "au", "NZ"] {
            assert_eq!(table.content_for(region), default);
        }
    }

    #[test]
    fn test_fallback_matches_geo_default() {
        let table = ContentTable::builtin();
        let resolved = table.resolve_country(Some("FR"));

        assert_eq!(resolved, table.default_region());
        assert!(table.has_region(resolved));
        assert_eq!(table.content_for(resolved), table.content_for("FR"));
    }

    #[test]
    fn test_new_requires_default_bundle() {
        let mut bundles = HashMap::new();
        bundles.insert("US".to_string(), us_content());

        let result = ContentTable::new(bundles.clone(), "AU");
        assert!(matches!(result, Err(AppError::ConfigError(_))));

        let table = ContentTable::new(bundles, "US").unwrap();
        assert_eq!(table.default_region(), "US");
        assert_eq!(table.content_for("AU"), &us_content());
        assert_eq!(table.resolve_country(Some("DE")), "US");
        assert_eq!(table.resolve_country(None), "US");
    }

    #[test]
    fn test_builtin_covers_supported_regions() {
        let table = ContentTable::default();
        assert_eq!(table.regions(), ["AU", "UK", "US"]);
        for code in SUPPORTED_REGIONS {
            assert!(table.has_region(code));
            assert!(region_name(code).is_some());
        }
    }
}
