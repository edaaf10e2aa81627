use thiserror::Error;

/// Errors that can occur while harvesting instance details
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Failed to launch the browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to an existing browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Tab operation failed (create, activate, close, etc.)
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// Navigation to a URL failed or timed out
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Failed to evaluate JavaScript in the page
    #[error("Script evaluation failed: {0}")]
    EvalFailed(String),

    /// Failed to parse the DOM snapshot returned by the page
    #[error("DOM parse failed: {0}")]
    DomParseFailed(String),

    /// The operator did not complete the console login in time
    #[error("Login not detected within {0} seconds")]
    LoginTimeout(u64),

    /// No instance identifier could be resolved for a detail page.
    /// Fatal for that single instance only; batch runs record it and move on.
    #[error("No instance identifier found on {0}")]
    InstanceIdNotFound(String),

    /// Failed to write the output file
    #[error("Output write failed: {0}")]
    OutputFailed(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("Serialization failed: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarvestError::LoginTimeout(300);
        assert_eq!(err.to_string(), "Login not detected within 300 seconds");

        let err = HarvestError::InstanceIdNotFound("https://example.com".to_string());
        assert!(err.to_string().contains("https://example.com"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: HarvestError = io_err.into();
        assert!(matches!(err, HarvestError::OutputFailed(_)));
    }
}
