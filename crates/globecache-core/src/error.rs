use thiserror::Error;

/// Result type alias for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failure of a single network request.
///
/// Any HTTP status counts as a completed fetch; only transport-level problems
/// end up here.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {0} failed")]
    Unreachable(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to cache {url}: status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Installation failed: {0}")]
    Install(#[source] Box<WorkerError>),

    #[error("Cache storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Maximum length for URLs echoed into log lines and error messages
const MAX_LOGGED_URL_LENGTH: usize = 200;

impl WorkerError {
    /// Whether this error came from the network rather than storage
    pub fn is_network(&self) -> bool {
        match self {
            WorkerError::Fetch(_) => true,
            WorkerError::Install(inner) => inner.is_network(),
            _ => false,
        }
    }
}

/// Truncate a URL to avoid logging excessive data (data: URLs, long queries)
pub(crate) fn truncate_url(url: &str) -> String {
    if url.len() <= MAX_LOGGED_URL_LENGTH {
        url.to_string()
    } else {
        let cut: String = url.chars().take(MAX_LOGGED_URL_LENGTH).collect();
        format!("{}... ({} total bytes)", cut, url.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_url_short() {
        assert_eq!(truncate_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_truncate_url_long() {
        let long = format!("https://example.com/{}", "a".repeat(500));
        let truncated = truncate_url(&long);
        assert!(truncated.starts_with("https://example.com/aaa"));
        assert!(truncated.ends_with(&format!("({} total bytes)", long.len())));
    }

    #[test]
    fn test_install_error_is_network() {
        let err = WorkerError::Install(Box::new(WorkerError::Fetch(FetchError::Unreachable(
            "https://example.com/".to_string(),
        ))));
        assert!(err.is_network());

        let err = WorkerError::Install(Box::new(WorkerError::BadStatus {
            url: "https://example.com/".to_string(),
            status: 404,
        }));
        assert!(!err.is_network());
    }
}
