//! Fetch orchestration
//!
//! Composes the policy gate, the fetcher, and the simplifier into one
//! invocation: autonomous fetches are checked against robots.txt first,
//! manual fetches go straight to the network. The final payload is the
//! advisory prefix (if any) plus a window of the content selected by
//! `start_index`/`max_length`.

use crate::client::fetch_url;
use crate::error::FetchError;
use crate::robots::check_autonomous_fetch_allowed;
use crate::types::{FetchIntent, FetchRequest, Page};
use crate::TOOL_DESCRIPTION;
use schemars::schema_for;
use tracing::debug;
use url::Url;

/// Body returned when `start_index` points past the end of the content
const NO_MORE_CONTENT: &str = "<error>No more content available.</error>";

/// Builder for configuring the fetch tool
#[derive(Debug, Clone, Default)]
pub struct ToolBuilder {
    user_agent: Option<String>,
    ignore_robots_txt: bool,
    proxy_url: Option<String>,
}

impl ToolBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the user agent for both intents
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Skip the robots.txt gate even for autonomous fetches
    pub fn ignore_robots_txt(mut self, ignore: bool) -> Self {
        self.ignore_robots_txt = ignore;
        self
    }

    /// Route requests through a proxy
    pub fn proxy_url(mut self, proxy: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy.into());
        self
    }

    /// Build the tool
    pub fn build(self) -> Tool {
        Tool {
            user_agent: self.user_agent,
            ignore_robots_txt: self.ignore_robots_txt,
            proxy_url: self.proxy_url,
        }
    }
}

/// Configured fetch tool
///
/// Holds only startup configuration; every invocation is independent and
/// stateless.
#[derive(Debug, Clone, Default)]
pub struct Tool {
    user_agent: Option<String>,
    ignore_robots_txt: bool,
    proxy_url: Option<String>,
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Get the tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get the input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FetchRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    fn user_agent_for(&self, intent: FetchIntent) -> &str {
        self.user_agent.as_deref().unwrap_or(intent.user_agent())
    }

    /// Execute one fetch invocation
    ///
    /// Autonomous intent runs the robots.txt gate before touching the
    /// target (unless the tool was configured to ignore it); manual
    /// intent does not. Every failure along the way is terminal and
    /// surfaced verbatim.
    pub async fn execute(
        &self,
        req: &FetchRequest,
        intent: FetchIntent,
    ) -> Result<String, FetchError> {
        let url = parse_target_url(&req.url)?;
        let user_agent = self.user_agent_for(intent);

        if intent == FetchIntent::Autonomous && !self.ignore_robots_txt {
            check_autonomous_fetch_allowed(&url, user_agent, self.proxy_url.as_deref()).await?;
        } else {
            debug!(%url, "robots.txt check skipped");
        }

        let page = fetch_url(&url, user_agent, req.raw, self.proxy_url.as_deref()).await?;

        Ok(assemble_payload(&url, &page, req.start_index, req.max_length))
    }
}

/// Validate and parse the target URL
fn parse_target_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(FetchError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

/// Assemble the final payload: prefix, framing line, windowed content
fn assemble_payload(url: &Url, page: &Page, start_index: usize, max_length: usize) -> String {
    let body = window_content(&page.content, start_index, max_length);
    format!("{}Contents of {}:\n{}", page.prefix, url, body)
}

/// Select a character window of the content
///
/// Pure string slicing on character boundaries. A full window with
/// content remaining gets a continuation hint naming the next start
/// index; a start index past the end gets a no-more-content note.
fn window_content(content: &str, start_index: usize, max_length: usize) -> String {
    let total = content.chars().count();
    if start_index >= total {
        return NO_MORE_CONTENT.to_string();
    }

    let window: String = content.chars().skip(start_index).take(max_length).collect();
    if window.is_empty() {
        return NO_MORE_CONTENT.to_string();
    }

    let taken = window.chars().count();
    let remaining = total - start_index - taken;
    if taken == max_length && remaining > 0 {
        format!(
            "{}\n\n<error>Content truncated. Call the fetch tool with a start_index of {} to get more content.</error>",
            window,
            start_index + taken
        )
    } else {
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let tool = Tool::builder()
            .user_agent("TestAgent/1.0")
            .ignore_robots_txt(true)
            .proxy_url("http://proxy:8080")
            .build();

        assert_eq!(tool.user_agent, Some("TestAgent/1.0".to_string()));
        assert!(tool.ignore_robots_txt);
        assert_eq!(tool.proxy_url, Some("http://proxy:8080".to_string()));
    }

    #[test]
    fn test_user_agent_override_applies_to_both_intents() {
        let tool = Tool::builder().user_agent("Custom/2.0").build();
        assert_eq!(tool.user_agent_for(FetchIntent::Autonomous), "Custom/2.0");
        assert_eq!(tool.user_agent_for(FetchIntent::Manual), "Custom/2.0");

        let tool = Tool::default();
        assert_ne!(
            tool.user_agent_for(FetchIntent::Autonomous),
            tool.user_agent_for(FetchIntent::Manual)
        );
    }

    #[test]
    fn test_parse_target_url() {
        assert!(parse_target_url("https://example.com/page?q=1").is_ok());
        assert!(parse_target_url("http://127.0.0.1:8080/").is_ok());

        assert!(matches!(
            parse_target_url("ftp://example.com/file"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_target_url("/relative/path"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_target_url(""),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_window_within_bounds() {
        assert_eq!(window_content("0123456789", 0, 100), "0123456789");
        assert_eq!(window_content("0123456789", 4, 3), "456");
    }

    #[test]
    fn test_window_start_past_end() {
        assert_eq!(window_content("short", 100, 50), NO_MORE_CONTENT);
        assert_eq!(window_content("short", 5, 50), NO_MORE_CONTENT);
    }

    #[test]
    fn test_window_continuation_hint() {
        let out = window_content("0123456789", 0, 4);
        assert!(out.starts_with("0123"));
        assert!(out.contains("Content truncated"));
        assert!(out.contains("start_index of 4"));
    }

    #[test]
    fn test_window_exact_end_has_no_hint() {
        // Window ends exactly at the content end: nothing remains
        assert_eq!(window_content("0123456789", 6, 4), "6789");
    }

    #[test]
    fn test_window_is_character_based() {
        let content = "héllo wörld";
        let out = window_content(content, 1, 4);
        assert_eq!(out, "éllo");
    }

    #[test]
    fn test_window_zero_length() {
        assert_eq!(window_content("abc", 0, 0), NO_MORE_CONTENT);
    }

    #[test]
    fn test_assemble_payload_framing() {
        let url = Url::parse("https://example.com/doc").unwrap();
        let page = Page {
            content: "Raw content".to_string(),
            prefix: "Content type text/plain cannot be simplified to markdown, but here is the raw content:\n".to_string(),
            content_type: Some("text/plain".to_string()),
        };
        let payload = assemble_payload(&url, &page, 0, 5000);
        assert!(payload.starts_with("Content type text/plain"));
        assert!(payload.contains("Contents of https://example.com/doc:\nRaw content"));
    }

    #[test]
    fn test_assemble_payload_no_prefix() {
        let url = Url::parse("https://example.com/").unwrap();
        let page = Page {
            content: "# Title".to_string(),
            ..Default::default()
        };
        let payload = assemble_payload(&url, &page, 0, 5000);
        assert!(payload.starts_with("Contents of https://example.com/:\n# Title"));
    }

    #[test]
    fn test_input_schema_has_fields() {
        let schema = Tool::default().input_schema();
        let props = &schema["properties"];
        assert!(props["url"].is_object());
        assert!(props["max_length"].is_object());
        assert!(props["start_index"].is_object());
        assert!(props["raw"].is_object());
    }
}
