use thiserror::Error;
use uuid::Uuid;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur in Sweepr, from the
/// pure ordering code up to the persistence and object-storage collaborators.
///
/// # Error Conversion
///
/// Some errors automatically convert from their source types using the `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// # Examples
///
/// ```no_run
/// use sweepr_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Validation("Name is required".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Wraps all errors from SQLx, including connection failures, query errors,
    /// and constraint violations.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// HTTP client request failed.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// The object store rejected an upload or returned an unusable response.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration file could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The listing id does not exist in the collection or the store.
    #[error("Listing not found: {0}")]
    ListingNotFound(Uuid),

    /// A field failed validation before reaching the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A reorder batch could not be persisted.
    ///
    /// The in-memory order has already been discarded and reloaded from the
    /// store when this is returned.
    #[error("Reorder was not saved: {0}")]
    ReorderFailed(#[source] Box<AppError>),

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request or write timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to database. Is PostgreSQL running?\n   Check DATABASE_URL."
                        .to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The storage service may be slow or unreachable.".to_string()
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::StorageError(msg) => {
                if msg.contains("401") || msg.contains("403") {
                    "Storage rejected the upload.\n   Check your SWEEPR_STORAGE_KEY environment variable.".to_string()
                } else {
                    format!("Upload failed: {}", msg)
                }
            }
            AppError::ListingNotFound(id) => {
                format!(
                    "Listing {} no longer exists.\n   It may have been removed; list again to refresh.",
                    id
                )
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::ReorderFailed(source) => {
                format!(
                    "The new order could not be saved ({}).\n   The list was reloaded from the database; try again.",
                    source.user_message()
                )
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The server may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use sweepr_core::error::AppError;
    /// use uuid::Uuid;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::ListingNotFound(Uuid::nil());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Uuid::nil();
        let err = AppError::ListingNotFound(id);
        assert_eq!(
            err.to_string(),
            "Listing not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_generic_error() {
        let err = AppError::Generic("Something went wrong".to_string());
        assert_eq!(err.to_string(), "Error: Something went wrong");
    }

    #[test]
    fn test_validation_user_message_is_plain() {
        let err = AppError::Validation("Quote is required".to_string());
        assert_eq!(err.user_message(), "Quote is required");
        assert_eq!(err.to_string(), "Validation failed: Quote is required");
    }

    #[test]
    fn test_reorder_failed_wraps_source() {
        let err = AppError::ReorderFailed(Box::new(AppError::Timeout(10)));
        assert_eq!(
            err.to_string(),
            "Reorder was not saved: Request timed out after 10 seconds"
        );
        assert!(err.user_message().contains("reloaded from the database"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_user_message_storage_auth() {
        let err = AppError::StorageError("HTTP 401 from storage".to_string());
        assert!(err.user_message().contains("SWEEPR_STORAGE_KEY"));
    }

    #[test]
    fn test_error_from_serde() {
        let json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(json);
        let serde_err = result.unwrap_err();
        let app_err: AppError = serde_err.into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
    }

    #[test]
    fn test_user_message_database_connection() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        let msg = err.user_message();
        assert!(msg.contains("Cannot connect to database") || msg.contains("Database error"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(AppError::NetworkError("timeout".to_string()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(AppError::RateLimitExceeded.is_retryable());
        assert!(!AppError::Validation("bad".to_string()).is_retryable());
        assert!(!AppError::ListingNotFound(Uuid::nil()).is_retryable());
    }
}
