//! robots.txt policy gate for autonomous fetches
//!
//! One probe per invocation: derive the robots.txt URL, fetch it, answer
//! a single allow/disallow query, discard the rules. Nothing is cached
//! across calls.

use crate::client::build_client;
use crate::error::FetchError;
use robotstxt::DefaultMatcher;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Timeout for the robots.txt probe
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Derive the robots.txt URL for a target URL
///
/// Replaces path, query, and fragment with `/robots.txt`, preserving
/// scheme, host, and port.
pub fn robots_txt_url(url: &Url) -> String {
    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    robots.to_string()
}

/// Check whether `user_agent` may fetch `url` autonomously
///
/// Absence of robots.txt (a 404-class response) means the site imposes no
/// restrictions. A 401/403 means the site gates even its robots.txt, so
/// autonomous fetching is assumed forbidden. Transport failures and 5xx
/// responses are hard errors, never a silent allow.
pub async fn check_autonomous_fetch_allowed(
    url: &Url,
    user_agent: &str,
    proxy_url: Option<&str>,
) -> Result<(), FetchError> {
    let robots_url = robots_txt_url(url);
    let client = build_client(user_agent, proxy_url)?;

    let response = client
        .get(&robots_url)
        .timeout(ROBOTS_TIMEOUT)
        .send()
        .await
        .map_err(|e| FetchError::RobotsFetch {
            url: robots_url.clone(),
            reason: format!("connection issue ({})", e),
        })?;

    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(FetchError::RobotsDisallowed {
            reason: format!(
                "robots.txt ({}) returned status {}, so the site is assumed to forbid tool-driven access",
                robots_url,
                status.as_u16()
            ),
        });
    }
    if status.is_client_error() {
        debug!(%robots_url, status = status.as_u16(), "no robots.txt, fetch allowed");
        return Ok(());
    }
    if !status.is_success() {
        return Err(FetchError::RobotsFetch {
            url: robots_url,
            reason: format!("status code {}", status.as_u16()),
        });
    }

    let body = response.text().await.map_err(|e| FetchError::RobotsFetch {
        url: robots_url.clone(),
        reason: format!("unreadable body ({})", e),
    })?;

    let mut matcher = DefaultMatcher::default();
    if !matcher.one_agent_allowed_by_robots(&body, user_agent, url.as_str()) {
        return Err(FetchError::RobotsDisallowed {
            reason: format!(
                "the site's robots.txt ({}) disallows user agent {:?} for this page\n<robots>\n{}\n</robots>",
                robots_url, user_agent, body
            ),
        });
    }

    debug!(%robots_url, "robots.txt allows fetch");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(input: &str) -> String {
        robots_txt_url(&Url::parse(input).unwrap())
    }

    #[test]
    fn test_robots_url_strips_path() {
        assert_eq!(
            derive("https://example.com/page"),
            "https://example.com/robots.txt"
        );
    }

    #[test]
    fn test_robots_url_bare_host() {
        assert_eq!(
            derive("https://example.com"),
            "https://example.com/robots.txt"
        );
    }

    #[test]
    fn test_robots_url_strips_query() {
        assert_eq!(
            derive("http://test.org/path?query=1"),
            "http://test.org/robots.txt"
        );
    }

    #[test]
    fn test_robots_url_strips_fragment() {
        assert_eq!(
            derive("https://sub.domain.com/path#fragment"),
            "https://sub.domain.com/robots.txt"
        );
    }

    #[test]
    fn test_robots_url_strips_query_and_fragment() {
        assert_eq!(
            derive("https://h/p?q=1#f"),
            "https://h/robots.txt"
        );
    }

    #[test]
    fn test_robots_url_keeps_port() {
        assert_eq!(
            derive("http://127.0.0.1:8080/deep/path"),
            "http://127.0.0.1:8080/robots.txt"
        );
    }
}
