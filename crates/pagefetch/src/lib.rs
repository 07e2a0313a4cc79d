//! PageFetch - web content fetching with robots.txt policy enforcement
//!
//! This crate fetches a web resource on behalf of an automated caller,
//! converts HTML to readable markdown, and enforces robots.txt-based
//! access policy before autonomous fetches. Each invocation is one
//! independent, stateless fetch: policy check (when autonomous), GET,
//! then either simplification or raw passthrough with an advisory note.

mod client;
mod convert;
mod error;
mod robots;
mod tool;
mod types;

pub use client::fetch_url;
pub use convert::{html_to_markdown, is_html_like, simplify_html};
pub use error::FetchError;
pub use robots::{check_autonomous_fetch_allowed, robots_txt_url};
pub use tool::{Tool, ToolBuilder};
pub use types::{FetchIntent, FetchRequest, Page};

/// User agent for tool-initiated fetches, subject to robots.txt
pub const USER_AGENT_AUTONOMOUS: &str = "PageFetch/0.1 (Autonomous)";

/// User agent for human-directed fetches, exempt from robots.txt
pub const USER_AGENT_MANUAL: &str = "PageFetch/0.1 (User-Specified)";

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Fetches a URL from the internet and extracts its contents as markdown.

- Checks robots.txt before autonomous fetches
- Converts HTML to simplified, readable markdown
- Returns raw content for non-HTML types, with a note naming the content type
- Supports windowed retrieval via start_index and max_length"#;
