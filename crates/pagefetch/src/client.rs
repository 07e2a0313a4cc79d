//! HTTP client for PageFetch
//!
//! One GET per call, bounded timeouts, redirects followed. The response
//! branches on content type: HTML-like pages are simplified to markdown
//! unless raw content was requested; everything else passes through with
//! an advisory prefix naming the content type.

use crate::convert::{is_html_like, simplify_html};
use crate::error::FetchError;
use crate::types::Page;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Connect timeout for the target fetch
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout (headers received)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for reading the full response body
const BODY_DEADLINE: Duration = Duration::from_secs(30);

/// Longest body excerpt included in a status error
const STATUS_EXCERPT_CHARS: usize = 200;

/// Build a client for a single fetch
///
/// Stateless by design: a fresh client per invocation, no connection
/// state shared across calls.
pub(crate) fn build_client(
    user_agent: &str,
    proxy_url: Option<&str>,
) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(crate::USER_AGENT_AUTONOMOUS)),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT);

    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(FetchError::ClientBuild)?);
    }

    builder.build().map_err(FetchError::ClientBuild)
}

/// Fetch a URL and prepare its content for the caller
///
/// Returns the page content paired with an advisory prefix. The prefix is
/// empty when the page was simplified; when simplification was bypassed
/// (non-HTML content type, or `force_raw`) it names the detected content
/// type so the caller knows why raw content follows.
pub async fn fetch_url(
    url: &Url,
    user_agent: &str,
    force_raw: bool,
    proxy_url: Option<&str>,
) -> Result<Page, FetchError> {
    let client = build_client(user_agent, proxy_url)?;

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(STATUS_EXCERPT_CHARS).collect();
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            excerpt,
        });
    }

    let body = read_body_with_deadline(url, response, BODY_DEADLINE).await?;
    let page_raw = String::from_utf8_lossy(&body).to_string();

    if is_html_like(content_type.as_deref(), &page_raw) && !force_raw {
        debug!(%url, "simplifying HTML page");
        let content = simplify_html(&page_raw, url)?;
        return Ok(Page {
            content,
            prefix: String::new(),
            content_type,
        });
    }

    let ct = content_type.as_deref().unwrap_or("unknown");
    Ok(Page {
        prefix: format!(
            "Content type {} cannot be simplified to markdown, but here is the raw content:\n",
            ct
        ),
        content: page_raw,
        content_type,
    })
}

/// Read the full response body against a hard deadline
///
/// Exceeding the deadline is a terminal error; no partial payload ever
/// reaches the caller.
async fn read_body_with_deadline(
    url: &Url,
    response: reqwest::Response,
    deadline: Duration,
) -> Result<Bytes, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    let cutoff = tokio::time::Instant::now() + deadline;

    loop {
        tokio::select! {
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => body.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
                None => return Ok(Bytes::from(body)),
            },
            _ = tokio::time::sleep_until(cutoff) => {
                warn!(%url, "body deadline exceeded");
                return Err(FetchError::BodyTimeout {
                    url: url.to_string(),
                });
            }
        }
    }
}
