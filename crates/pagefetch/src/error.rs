//! Error types for PageFetch

use thiserror::Error;

/// Errors that can occur during a fetch invocation
///
/// Every variant is terminal for the invocation: nothing is retried
/// internally, and there is no partial-success mode.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is not an absolute http(s) URL
    #[error("Invalid URL {0}: must be an absolute http:// or https:// URL")]
    InvalidUrl(String),

    /// Transport or server failure while retrieving robots.txt
    ///
    /// A plumbing failure, not a policy verdict.
    #[error("Failed to fetch robots.txt {url}: {reason}")]
    RobotsFetch { url: String, reason: String },

    /// robots.txt policy forbids fetching this page autonomously
    #[error("Autonomous fetching of this page is not allowed: {reason}. The page may still be retrieved with a manual, user-initiated fetch")]
    RobotsDisallowed { reason: String },

    /// Network failure fetching the target URL
    #[error("Failed to fetch {url}: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    /// Target responded with a non-2xx status
    #[error("Failed to fetch {url} - status code {status}: {excerpt}")]
    Status {
        url: String,
        status: u16,
        excerpt: String,
    },

    /// Reading the response body exceeded the deadline
    #[error("Timed out reading the response body from {url}")]
    BodyTimeout { url: String },

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// HTML was present but no readable main content could be extracted
    #[error("Page failed to be simplified from HTML")]
    Simplify,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message() {
        assert_eq!(
            FetchError::InvalidUrl("ftp://x".to_string()).to_string(),
            "Invalid URL ftp://x: must be an absolute http:// or https:// URL"
        );
    }

    #[test]
    fn test_robots_fetch_message_names_robots_txt() {
        let err = FetchError::RobotsFetch {
            url: "https://example.com/robots.txt".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to fetch robots.txt"));
        assert!(msg.contains("https://example.com/robots.txt"));
    }

    #[test]
    fn test_robots_disallowed_suggests_manual_fetch() {
        let err = FetchError::RobotsDisallowed {
            reason: "the site's robots.txt disallows this page".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fetching of this page is not allowed"));
        assert!(msg.contains("manual, user-initiated fetch"));
    }

    #[test]
    fn test_status_message() {
        let err = FetchError::Status {
            url: "https://example.com/page".to_string(),
            status: 500,
            excerpt: "Internal Server Error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("status code 500"));
        assert!(msg.contains("Internal Server Error"));
    }

    #[test]
    fn test_simplify_message() {
        assert_eq!(
            FetchError::Simplify.to_string(),
            "Page failed to be simplified from HTML"
        );
    }
}
