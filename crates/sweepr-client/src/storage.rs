use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use sweepr_core::config::HttpConfig;
use sweepr_core::error::AppError;
use sweepr_core::traits::{ObjectStore, UploadScope};
use sweepr_core::validation::{validate_image_upload, MAX_IMAGE_BYTES};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Length of the content-hash prefix used in object names.
const HASH_PREFIX_LEN: usize = 12;

/// Upper bound on a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Error body returned by the storage API.
///
/// ```json
/// { "statusCode": "409", "error": "Duplicate", "message": "The resource already exists" }
/// ```
#[derive(Deserialize, Debug)]
struct StorageErrorBody {
    message: String,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for a hosted object store with a Supabase-compatible REST API.
///
/// Objects are written with `POST {base}/storage/v1/object/{bucket}/{path}`
/// and served from `{base}/storage/v1/object/public/{bucket}/{path}`.
///
/// # Examples
///
/// ```no_run
/// use sweepr_client::StorageClient;
/// use sweepr_core::traits::{ObjectStore, UploadScope};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StorageClient::new("https://project.supabase.co", "service-key")?;
/// let scope = UploadScope::new("images", "sweepstakes");
/// let png = std::fs::read("prize.png")?;
/// let url = client.upload(&scope, "prize.png", "image/png", png).await?;
/// println!("Uploaded to {}", url);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
    retry_base_delay: Duration,
    timeout: Duration,
    max_bytes: u64,
}

impl StorageClient {
    /// Creates a client with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str, api_key: &str) -> Result<Self, AppError> {
        Self::with_config(base_url_str, api_key, HttpConfig::default())
    }

    pub fn with_config(
        base_url_str: &str,
        api_key: &str,
        config: HttpConfig,
    ) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url_str)
            .map_err(|_| AppError::InvalidUrl(base_url_str.to_string()))?;
        // `join` would drop the last path segment without this.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent("Sweepr/0.1 (admin-upload)")
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay,
            timeout: config.timeout,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Sets the largest upload accepted, usually `UploadConfig::max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Endpoint that accepts the object bytes.
    pub fn upload_url(&self, bucket: &str, object_path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(&format!("storage/v1/object/{}/{}", bucket, object_path))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    /// Publicly retrievable URL of an uploaded object.
    pub fn public_url(&self, bucket: &str, object_path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(&format!("storage/v1/object/public/{}/{}", bucket, object_path))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    /// Builds a collision-resistant object path inside `folder`.
    ///
    /// The name is `{unix_millis}-{sha256 prefix}.{ext}`. The extension comes
    /// from the original file name, falling back to the content subtype.
    ///
    /// # Examples
    ///
    /// ```
    /// use sweepr_client::StorageClient;
    ///
    /// let path = StorageClient::object_path("avatars", "Me.JPG", "image/jpeg", b"abc", 1700000000000);
    /// assert!(path.starts_with("avatars/1700000000000-"));
    /// assert!(path.ends_with(".jpg"));
    /// ```
    pub fn object_path(
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
        unix_millis: i64,
    ) -> String {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| {
                content_type
                    .split('/')
                    .nth(1)
                    .unwrap_or("bin")
                    .split(['+', ';'])
                    .next()
                    .unwrap_or("bin")
                    .to_string()
            });

        let digest = format!("{:x}", Sha256::digest(bytes));
        let folder = folder.trim_matches('/');

        format!(
            "{}/{}-{}.{}",
            folder,
            unix_millis,
            &digest[..HASH_PREFIX_LEN],
            extension
        )
    }

    /// POSTs the object with automatic retry on transient failures.
    ///
    /// Errors for which [`AppError::is_retryable`] holds (network errors,
    /// timeouts, server errors and rate limiting) are retried with
    /// exponential backoff. Other 4xx responses fail immediately. The object
    /// path is derived from the content, so a 409 on a retry means an
    /// earlier attempt already stored it.
    async fn post_with_retry(
        &self,
        url: &Url,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), AppError> {
        let mut last_error = AppError::Generic("No attempts made".to_string());

        for attempt in 1..=self.max_retries {
            let result = self
                .client
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .header("apikey", &self.api_key)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .header("x-upsert", "false")
                .body(bytes.to_vec())
                .send()
                .await;

            let error = match result {
                Ok(resp) => match classify_status(resp.status(), attempt) {
                    UploadStatus::Stored => return Ok(()),
                    UploadStatus::AlreadyStored => {
                        info!("Object already stored by an earlier attempt: {}", url);
                        return Ok(());
                    }
                    UploadStatus::Transient(error) => error,
                    UploadStatus::Rejected => {
                        let status = resp.status();
                        let body = resp.text().await.unwrap_or_default();
                        return Err(storage_error(status, &body));
                    }
                },
                Err(e) if e.is_timeout() => AppError::Timeout(self.timeout.as_secs()),
                Err(e) if e.is_connect() => {
                    AppError::NetworkError(format!("Connection failed: {}", e))
                }
                Err(e) => AppError::ClientError(e.to_string()),
            };

            if !error.is_retryable() || attempt >= self.max_retries {
                return Err(error);
            }

            warn!("Upload attempt {} failed: {}", attempt, error);
            sleep(backoff(self.retry_base_delay, attempt)).await;
            last_error = error;
        }

        Err(last_error)
    }
}

/// What one storage response means for the upload in progress.
#[derive(Debug)]
enum UploadStatus {
    Stored,
    /// 409 on a retry: the first attempt landed before its response was lost.
    AlreadyStored,
    Transient(AppError),
    Rejected,
}

fn classify_status(status: StatusCode, attempt: u32) -> UploadStatus {
    if status.is_success() {
        UploadStatus::Stored
    } else if status == StatusCode::CONFLICT && attempt > 1 {
        UploadStatus::AlreadyStored
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        UploadStatus::Transient(AppError::RateLimitExceeded)
    } else if status.is_server_error() {
        UploadStatus::Transient(AppError::ClientError(format!(
            "Server error: HTTP {}",
            status.as_u16()
        )))
    } else {
        UploadStatus::Rejected
    }
}

/// Exponential delay for retry `attempt` (1-based), capped at [`MAX_BACKOFF`].
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}

/// Maps a non-retryable error response to `AppError::StorageError`.
fn storage_error(status: StatusCode, body: &str) -> AppError {
    match serde_json::from_str::<StorageErrorBody>(body) {
        Ok(parsed) => {
            let kind = parsed.error.unwrap_or_else(|| "error".to_string());
            AppError::StorageError(format!(
                "HTTP {} {}: {}",
                status.as_u16(),
                kind,
                parsed.message
            ))
        }
        Err(_) => AppError::StorageError(format!("HTTP {} from storage", status.as_u16())),
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(
        &self,
        scope: &UploadScope,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        validate_image_upload(content_type, bytes.len() as u64, self.max_bytes)?;

        let object_path = Self::object_path(
            &scope.folder,
            file_name,
            content_type,
            &bytes,
            chrono::Utc::now().timestamp_millis(),
        );
        let url = self.upload_url(&scope.bucket, &object_path)?;

        debug!("Uploading {} bytes to {}", bytes.len(), url);
        self.post_with_retry(&url, content_type, &bytes).await?;

        let public_url = self.public_url(&scope.bucket, &object_path)?;
        info!("Uploaded {} as {}", file_name, public_url);
        Ok(public_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_valid_url() {
        let client = StorageClient::new("https://project.supabase.co", "key").unwrap();
        assert_eq!(client.base_url.as_str(), "https://project.supabase.co/");
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = StorageClient::new("not-a-valid-url", "key");
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[test]
    fn test_urls_keep_base_path() {
        let client = StorageClient::new("https://example.com/proxy", "key").unwrap();

        let upload = client.upload_url("images", "avatars/1-abc.png").unwrap();
        let public = client.public_url("images", "avatars/1-abc.png").unwrap();

        assert_eq!(
            upload.as_str(),
            "https://example.com/proxy/storage/v1/object/images/avatars/1-abc.png"
        );
        assert_eq!(
            public.as_str(),
            "https://example.com/proxy/storage/v1/object/public/images/avatars/1-abc.png"
        );
    }

    #[test]
    fn test_object_path_uses_file_extension() {
        let path = StorageClient::object_path("sweepstakes", "Prize.PNG", "image/png", b"x", 42);
        let digest = format!("{:x}", Sha256::digest(b"x"));
        assert_eq!(path, format!("sweepstakes/42-{}.png", &digest[..HASH_PREFIX_LEN]));
    }

    #[test]
    fn test_object_path_falls_back_to_content_type() {
        let path = StorageClient::object_path("/avatars/", "upload", "image/svg+xml", b"x", 1);
        assert!(path.starts_with("avatars/1-"));
        assert!(path.ends_with(".svg"));
    }

    #[test]
    fn test_object_path_differs_by_content() {
        let a = StorageClient::object_path("f", "a.png", "image/png", b"one", 1);
        let b = StorageClient::object_path("f", "a.png", "image/png", b"two", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_storage_error_parses_body() {
        let body = r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#;
        let err = storage_error(StatusCode::CONFLICT, body);
        assert_eq!(
            err.to_string(),
            "Storage error: HTTP 409 Duplicate: The resource already exists"
        );
    }

    #[test]
    fn test_conflict_on_retry_counts_as_stored() {
        assert!(matches!(
            classify_status(StatusCode::CONFLICT, 1),
            UploadStatus::Rejected
        ));
        assert!(matches!(
            classify_status(StatusCode::CONFLICT, 2),
            UploadStatus::AlreadyStored
        ));
        assert!(matches!(
            classify_status(StatusCode::OK, 1),
            UploadStatus::Stored
        ));
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            match classify_status(status, 1) {
                UploadStatus::Transient(error) => assert!(error.is_retryable()),
                other => panic!("expected Transient for {}, got {:?}", status, other),
            }
        }
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, 2),
            UploadStatus::Rejected
        ));
        assert!(matches!(
            classify_status(StatusCode::PAYLOAD_TOO_LARGE, 1),
            UploadStatus::Rejected
        ));
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 1), Duration::from_secs(1));
        assert_eq!(backoff(base, 2), Duration::from_secs(2));
        assert_eq!(backoff(base, 40), MAX_BACKOFF);
        assert_eq!(backoff(base, u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_storage_error_unparseable_body() {
        let err = storage_error(StatusCode::UNAUTHORIZED, "<html>");
        assert_eq!(err.to_string(), "Storage error: HTTP 401 from storage");
        assert!(err.user_message().contains("SWEEPR_STORAGE_KEY"));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image_before_network() {
        // Unroutable base URL: reaching the network would fail differently.
        let client = StorageClient::new("http://127.0.0.1:9", "key").unwrap();
        let scope = UploadScope::new("images", "sweepstakes");

        let result = client
            .upload(&scope, "doc.pdf", "application/pdf", vec![1, 2, 3])
            .await;

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "Please upload an image file"));
    }

    #[tokio::test]
    async fn test_upload_honours_configured_limit() {
        let client = StorageClient::new("http://127.0.0.1:9", "key")
            .unwrap()
            .with_max_bytes(1024);
        let scope = UploadScope::new("images", "avatars");

        let result = client.upload(&scope, "a.png", "image/png", vec![0_u8; 1025]).await;

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "Image must be less than 1KB"));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_image() {
        let client = StorageClient::new("http://127.0.0.1:9", "key").unwrap();
        let scope = UploadScope::new("images", "avatars");
        let too_big = vec![0_u8; (sweepr_core::MAX_IMAGE_BYTES + 1) as usize];

        let result = client.upload(&scope, "big.png", "image/png", too_big).await;

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "Image must be less than 5MB"));
    }
}
