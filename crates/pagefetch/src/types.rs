//! Core types for PageFetch

use crate::{USER_AGENT_AUTONOMOUS, USER_AGENT_MANUAL};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_max_length() -> usize {
    5000
}

/// Who asked for this fetch
///
/// Autonomous fetches are performed by the tool acting on its own and are
/// subject to robots.txt. Manual fetches are explicitly requested by a
/// human operator and bypass the policy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchIntent {
    /// Tool-initiated fetch, gated by robots.txt
    Autonomous,
    /// Human-directed fetch, exempt from robots.txt
    Manual,
}

impl FetchIntent {
    /// The fixed user-agent string identifying this intent
    pub fn user_agent(&self) -> &'static str {
        match self {
            FetchIntent::Autonomous => USER_AGENT_AUTONOMOUS,
            FetchIntent::Manual => USER_AGENT_MANUAL,
        }
    }
}

/// Request to fetch a URL
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchRequest {
    /// The URL to fetch (required, must be an absolute http:// or https:// URL)
    pub url: String,

    /// Maximum number of characters to return
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Start the returned content at this character index, for paging
    /// through a previously truncated response
    #[serde(default)]
    pub start_index: usize,

    /// Return the raw page body without HTML simplification
    #[serde(default)]
    pub raw: bool,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_length: default_max_length(),
            start_index: 0,
            raw: false,
        }
    }
}

impl FetchRequest {
    /// Create a new request with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the maximum content length
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the start index for paged retrieval
    pub fn start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    /// Request raw content, bypassing simplification
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }
}

/// Result of fetching one URL
///
/// `content` is either the raw response body or simplified markdown.
/// `prefix` is empty when the page was simplified, otherwise a note
/// explaining why raw content follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Raw body or simplified markdown
    pub content: String,
    /// Advisory note prepended to the payload, empty for simplified pages
    pub prefix: String,
    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,
}
