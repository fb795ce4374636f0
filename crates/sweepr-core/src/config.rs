//! Configuration types for Sweepr components.
//!
//! Connection settings come from the CLI and environment. Region copy and
//! write timeouts can additionally be set in an optional TOML file, by
//! default `~/.config/sweepr/sweepr.toml`:
//!
//! ```toml
//! default_region = "AU"
//! write_timeout_secs = 10
//!
//! [regions.US]
//! hero_heading = "Americans' favorite sweepstakes"
//! hero_paragraph = "..."
//! about_paragraph = "..."
//! testimonial_subheading = "..."
//! footer_tagline = "..."
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;
use crate::models::ListingKind;
use crate::region::{builtin_bundles, ContentTable, RegionContent, DEFAULT_REGION};
use crate::traits::UploadScope;
use crate::validation::MAX_IMAGE_BYTES;

/// Database connection pool configuration.
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client configuration for external API calls.
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Bound on how long a reorder batch may take before it counts as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfig {
    pub timeout: Duration,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Image upload limits and destinations.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub sweepstakes: UploadScope,
    pub testimonials: UploadScope,
}

impl UploadConfig {
    /// Destination for images of the given listing kind.
    pub fn scope_for(&self, kind: ListingKind) -> &UploadScope {
        match kind {
            ListingKind::Sweepstakes => &self.sweepstakes,
            ListingKind::Testimonials => &self.testimonials,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_BYTES,
            sweepstakes: UploadScope::new("images", "sweepstakes"),
            testimonials: UploadScope::new("images", "avatars"),
        }
    }
}

/// Contents of `sweepr.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_region")]
    pub default_region: String,
    /// Per-region copy, layered over the built-in bundles.
    #[serde(default)]
    pub regions: HashMap<String, RegionContent>,
    #[serde(default)]
    pub write_timeout_secs: Option<u64>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            regions: HashMap::new(),
            write_timeout_secs: None,
        }
    }
}

impl SiteConfig {
    /// Builds the content table, validating that the default region has copy.
    pub fn content_table(&self) -> Result<ContentTable, AppError> {
        let mut bundles = builtin_bundles();
        bundles.extend(self.regions.clone());
        ContentTable::new(bundles, &self.default_region)
    }

    pub fn write_config(&self) -> WriteConfig {
        self.write_timeout_secs
            .map(|secs| WriteConfig {
                timeout: Duration::from_secs(secs),
            })
            .unwrap_or_default()
    }
}

/// `~/.config/sweepr/sweepr.toml`, or `None` if there is no config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sweepr").join("sweepr.toml"))
}

/// Loads and validates the site configuration.
///
/// A missing file yields the built-in defaults; an unreadable or invalid one
/// is an error. The returned config is guaranteed to produce a content table.
pub fn load_site_config(path: Option<&Path>) -> Result<SiteConfig, AppError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(SiteConfig::default()),
        },
    };

    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(SiteConfig::default());
    }

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        AppError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let config: SiteConfig = toml::from_str(&raw).map_err(|e| {
        AppError::ConfigError(format!("Invalid config {}: {}", path.display(), e))
    })?;

    config.content_table()?;
    tracing::info!("Loaded site config from {}", path.display());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_upload_config_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(
            config.scope_for(ListingKind::Sweepstakes),
            &UploadScope::new("images", "sweepstakes")
        );
        assert_eq!(config.scope_for(ListingKind::Testimonials).folder, "avatars");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_site_config(Some(&dir.path().join("absent.toml"))).unwrap();

        assert_eq!(config.default_region, "AU");
        assert_eq!(config.write_config(), WriteConfig::default());
        assert_eq!(config.content_table().unwrap().regions(), ["AU", "UK", "US"]);
    }

    #[test]
    fn test_load_overrides_and_new_region() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_region = "NZ"
write_timeout_secs = 3

[regions.NZ]
hero_heading = "Kiwis' favourite sweepstakes"
hero_paragraph = "p"
about_paragraph = "a"
testimonial_subheading = "s"
footer_tagline = "t"
"#
        )
        .unwrap();

        let config = load_site_config(Some(file.path())).unwrap();
        let table = config.content_table().unwrap();

        assert_eq!(config.write_config().timeout, Duration::from_secs(3));
        assert_eq!(table.default_region(), "NZ");
        assert_eq!(table.content_for("FR").hero_heading, "Kiwis' favourite sweepstakes");
        assert_eq!(table.content_for("US").hero_heading, "Americans' favorite sweepstakes");
    }

    #[test]
    fn test_configured_default_drives_geo_and_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_region = \"US\"").unwrap();

        let config = load_site_config(Some(file.path())).unwrap();
        let table = config.content_table().unwrap();
        let resolved = table.resolve_country(Some("DE"));

        assert_eq!(table.default_region(), "US");
        assert_eq!(resolved, table.default_region());
        assert_eq!(table.content_for(resolved), table.content_for("DE"));
        assert_eq!(table.resolve_country(None), "US");
        assert_eq!(table.resolve_country(Some("GB")), "UK");
    }

    #[test]
    fn test_default_without_bundle_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_region = \"FR\"").unwrap();

        let result = load_site_config(Some(file.path()));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "default_region = [").unwrap();

        let result = load_site_config(Some(file.path()));
        assert!(matches!(result, Err(AppError::ConfigError(msg)) if msg.contains("Invalid config")));
    }
}
