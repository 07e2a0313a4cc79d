//! HTML simplification
//!
//! The main content block is located with the `readability` extractor,
//! then rendered to markdown-like text: headings, paragraphs, links,
//! lists, and emphasis survive; scripts, styles, and navigation chrome
//! do not.

use crate::error::FetchError;
use std::iter::Peekable;
use std::str::Chars;
use tracing::debug;
use url::Url;

/// Elements whose entire subtree is dropped during conversion
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "head", "nav"];

/// Check whether a response should be treated as an HTML page
///
/// A missing Content-Type header counts as HTML (legacy browser
/// assumption). Otherwise the header must mention html or xml, or the
/// first 100 characters of the body must contain an `<html` tag.
pub fn is_html_like(content_type: Option<&str>, body: &str) -> bool {
    let ct = match content_type {
        None => return true,
        Some(ct) => ct.to_lowercase(),
    };
    if ct.contains("html") || ct.contains("xml") {
        return true;
    }
    let head: String = body.chars().take(100).collect();
    head.contains("<html")
}

/// Extract the readable main content of an HTML page as markdown
///
/// Simplification failure is signaled only through
/// [`FetchError::Simplify`]; the returned string is always real content.
pub fn simplify_html(html: &str, url: &Url) -> Result<String, FetchError> {
    let extracted = match readability::extractor::extract(&mut html.as_bytes(), url) {
        Ok(product) => product.content,
        Err(e) => {
            debug!(%url, error = %e, "readability extraction failed");
            String::new()
        }
    };

    let mut markdown = html_to_markdown(&extracted);
    if markdown.trim().is_empty() {
        // Tiny documents give the extractor nothing to score; render the
        // whole page rather than failing outright.
        markdown = html_to_markdown(html);
    }
    if markdown.trim().is_empty() {
        return Err(FetchError::Simplify);
    }
    Ok(markdown)
}

/// Render an HTML fragment as markdown-like text
pub fn html_to_markdown(html: &str) -> String {
    let mut out = String::new();
    let mut skip_stack: Vec<String> = Vec::new();
    let mut link_hrefs: Vec<Option<String>> = Vec::new();
    let mut list_depth: usize = 0;
    let mut in_pre = false;
    let mut in_blockquote = false;

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            if chars.peek() == Some(&'!') {
                skip_declaration(&mut chars);
                continue;
            }

            let tag = read_tag(&mut chars);
            let tag_lower = tag.to_lowercase();
            let is_closing = tag_lower.starts_with('/');
            let tag_name = tag_lower
                .trim_start_matches('/')
                .split_whitespace()
                .next()
                .unwrap_or("");

            if SKIP_TAGS.contains(&tag_name) {
                if is_closing {
                    if let Some(pos) = skip_stack.iter().rposition(|t| t == tag_name) {
                        skip_stack.remove(pos);
                    }
                } else if !tag.ends_with('/') {
                    skip_stack.push(tag_name.to_string());
                }
                continue;
            }

            if !skip_stack.is_empty() {
                continue;
            }

            match tag_name {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    if is_closing {
                        out.push_str("\n\n");
                    } else {
                        let level = tag_name[1..].parse::<usize>().unwrap_or(1);
                        out.push_str("\n\n");
                        for _ in 0..level {
                            out.push('#');
                        }
                        out.push(' ');
                    }
                }
                "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "tr" => {
                    if is_closing {
                        out.push_str("\n\n");
                    }
                }
                "br" => out.push('\n'),
                "hr" => out.push_str("\n\n---\n\n"),
                "ul" | "ol" => {
                    if is_closing {
                        list_depth = list_depth.saturating_sub(1);
                        if list_depth == 0 {
                            out.push('\n');
                        }
                    } else {
                        list_depth += 1;
                    }
                }
                "li" => {
                    if !is_closing {
                        out.push('\n');
                        for _ in 0..list_depth.saturating_sub(1) {
                            out.push_str("  ");
                        }
                        out.push_str("- ");
                    }
                }
                "strong" | "b" => out.push_str("**"),
                "em" | "i" => out.push('*'),
                "pre" => {
                    out.push_str("\n```\n");
                    in_pre = !is_closing;
                }
                "code" => {
                    if !in_pre {
                        out.push('`');
                    }
                }
                "blockquote" => {
                    if is_closing {
                        in_blockquote = false;
                        out.push('\n');
                    } else {
                        in_blockquote = true;
                        out.push_str("\n> ");
                    }
                }
                "a" => {
                    if is_closing {
                        if let Some(Some(href)) = link_hrefs.pop() {
                            out.push_str("](");
                            out.push_str(&href);
                            out.push(')');
                        }
                    } else if !tag.ends_with('/') {
                        match attribute_value(&tag, "href") {
                            Some(href) => {
                                out.push('[');
                                link_hrefs.push(Some(href));
                            }
                            None => link_hrefs.push(None),
                        }
                    }
                }
                _ => {}
            }
        } else if skip_stack.is_empty() {
            if c == '&' {
                push_entity(&mut out, &mut chars);
            } else if c == '\n' && in_blockquote {
                out.push_str("\n> ");
            } else {
                out.push(c);
            }
        }
    }

    collapse_whitespace(&out)
}

/// Consume a tag's text after `<`, up to and including the closing `>`
fn read_tag(chars: &mut Peekable<Chars>) -> String {
    let mut tag = String::new();
    for c in chars.by_ref() {
        if c == '>' {
            break;
        }
        tag.push(c);
    }
    tag
}

/// Skip a comment or doctype declaration after seeing `<!`
fn skip_declaration(chars: &mut Peekable<Chars>) {
    let mut seen = String::new();
    for c in chars.by_ref() {
        seen.push(c);
        if seen.starts_with("!--") {
            if seen.ends_with("-->") {
                return;
            }
        } else if c == '>' {
            return;
        }
    }
}

/// Pull an attribute value out of a raw tag string
fn attribute_value(tag: &str, attr: &str) -> Option<String> {
    let needle = format!("{}=", attr);
    let start = tag.to_lowercase().find(&needle)?;
    let rest = tag[start + needle.len()..].trim_start();

    for quote in ['"', '\''] {
        if let Some(inner) = rest.strip_prefix(quote) {
            return inner.find(quote).map(|end| inner[..end].to_string());
        }
    }

    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}

/// Decode an HTML entity after seeing `&`, emitting the original text
/// verbatim when the entity is not recognized
fn push_entity(out: &mut String, chars: &mut Peekable<Chars>) {
    let mut name = String::new();
    let mut terminated = false;
    while let Some(&n) = chars.peek() {
        if n == ';' {
            chars.next();
            terminated = true;
            break;
        }
        if n.is_whitespace() || n == '<' || n == '&' || name.len() > 10 {
            break;
        }
        name.push(n);
        chars.next();
    }

    match entity_char(&name) {
        Some(ch) if terminated => out.push(ch),
        _ => {
            out.push('&');
            out.push_str(&name);
            if terminated {
                out.push(';');
            }
        }
    }
}

/// Resolve an entity name (without `&`/`;`) to its character
fn entity_char(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse().ok()?
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        "copy" => Some('\u{00a9}'),
        "reg" => Some('\u{00ae}'),
        _ => None,
    }
}

/// Collapse space runs to one space and newline runs to at most two
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut newlines = 0usize;
    let mut pending_space = false;

    for c in s.chars() {
        if c == '\n' {
            pending_space = false;
            if newlines < 2 {
                out.push('\n');
            }
            newlines += 1;
        } else if c.is_whitespace() {
            if newlines == 0 {
                pending_space = true;
            }
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            newlines = 0;
            out.push(c);
        }
    }

    out.trim().to_string()
}
