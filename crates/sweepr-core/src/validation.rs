//! Field validation shared by the sweepstake and testimonial forms.

use std::collections::HashSet;

use url::Url;

use crate::error::AppError;
use crate::models::{NewSweepstake, NewTestimonial};
use crate::region::SUPPORTED_REGIONS;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest image accepted for upload (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Lowest star rating.
pub const MIN_RATING: i16 = 1;

/// Highest star rating.
pub const MAX_RATING: i16 = 5;

/// Input that can check itself before it is written.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Validate that a required text field is not blank.
pub fn validate_required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Validate that every code is a supported region and none repeats.
///
/// An empty list is allowed; such a listing is simply shown nowhere.
pub fn validate_countries(countries: &[String]) -> Result<(), AppError> {
    let mut seen = HashSet::new();

    for code in countries {
        if !SUPPORTED_REGIONS.contains(&code.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported country '{code}'. Must be one of: {SUPPORTED_REGIONS:?}"
            )));
        }
        if !seen.insert(code.as_str()) {
            return Err(AppError::Validation(format!(
                "Country '{code}' is listed more than once"
            )));
        }
    }

    Ok(())
}

/// Validate a star rating.
pub fn validate_rating(rating: i16) -> Result<(), AppError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

/// Validate that an optional link, when present, is an absolute http(s) URL.
pub fn validate_optional_url(field: &str, value: Option<&str>) -> Result<(), AppError> {
    let Some(raw) = value else {
        return Ok(());
    };

    let parsed =
        Url::parse(raw).map_err(|e| AppError::Validation(format!("{field} is not a valid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Validation(format!(
            "{field} must use http or https, got '{other}'"
        ))),
    }
}

/// Validate an image before upload: `image/*` content type, at most
/// `max_bytes` (normally [`MAX_IMAGE_BYTES`]).
pub fn validate_image_upload(content_type: &str, size: u64, max_bytes: u64) -> Result<(), AppError> {
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation(
            "Please upload an image file".to_string(),
        ));
    }
    if size > max_bytes {
        return Err(AppError::Validation(format!(
            "Image must be less than {}",
            human_size(max_bytes)
        )));
    }
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

// ---------------------------------------------------------------------------
// Form validation
// ---------------------------------------------------------------------------

impl Validate for NewSweepstake {
    fn validate(&self) -> Result<(), AppError> {
        validate_required("Name", &self.name)?;
        validate_optional_url("Image URL", self.image_url.as_deref())?;
        validate_optional_url("Entry URL", self.url.as_deref())?;
        validate_countries(&self.countries)
    }
}

impl Validate for NewTestimonial {
    fn validate(&self) -> Result<(), AppError> {
        validate_required("Quote", &self.quote)?;
        validate_required("Name", &self.name)?;
        validate_required("Location", &self.location)?;
        validate_rating(self.rating)?;
        validate_optional_url("Avatar URL", self.avatar_url.as_deref())?;
        validate_countries(&self.countries)
    }
}
