//! Maps a raw visitor country code onto a supported region.

/// Header set by the edge network with the visitor's ISO country code.
pub const GEO_HEADER: &str = "x-vercel-ip-country";

/// Raw country code to supported region. GB and UK both land on UK.
const COUNTRY_MAPPING: &[(&str, &str)] = &[("AU", "AU"), ("US", "US"), ("GB", "UK"), ("UK", "UK")];

/// Resolves a raw country header value to a region code.
///
/// Absent, blank and unmapped values all resolve to `fallback`. Callers pass
/// the content table's default region so that an unknown visitor lands on
/// the same region whose copy they would be shown; see
/// [`ContentTable::resolve_country`](crate::region::ContentTable::resolve_country).
///
/// # Examples
///
/// ```
/// use sweepr_core::geo::resolve_region;
///
/// assert_eq!(resolve_region(Some("GB"), "AU"), "UK");
/// assert_eq!(resolve_region(Some("DE"), "AU"), "AU");
/// assert_eq!(resolve_region(None, "US"), "US");
/// ```
pub fn resolve_region<'a>(raw_country: Option<&str>, fallback: &'a str) -> &'a str {
    let Some(raw) = raw_country else {
        return fallback;
    };
    let code = raw.trim().to_ascii_uppercase();

    COUNTRY_MAPPING
        .iter()
        .find(|(country, _)| *country == code)
        .map_or(fallback, |(_, region)| *region)
}
