//! HTTP content provider.
//!
//! Fetches the target URL and recovers a plain-text rendition of the page.
//! This is intentionally minimal: no readability scoring, just markup removal.

use async_trait::async_trait;
use reqwest::Client;

use super::{ContentError, ContentProvider, PageContent, PageTarget};

/// Longest page text passed on to prompts; anything beyond is cut.
const MAX_TEXT_LEN: usize = 60_000;

pub struct HttpContentProvider {
    client: Client,
}

impl HttpContentProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    async fn extract(&self, target: &PageTarget) -> Result<PageContent, ContentError> {
        let response = self.client.get(&target.url).send().await?;

        if !response.status().is_success() {
            return Err(ContentError::Status(response.status().as_u16()));
        }

        let html = response.text().await?;
        let text = html_to_text(&html);
        if text.is_empty() {
            return Err(ContentError::Unreadable(format!(
                "no readable text at {}",
                target.url
            )));
        }

        let title = find_title(&html)
            .or_else(|| target.title.clone())
            .unwrap_or_else(|| target.url.clone());

        Ok(PageContent {
            title,
            text,
            url: target.url.clone(),
        })
    }
}

/// Strip markup from an HTML document and collapse whitespace.
fn html_to_text(html: &str) -> String {
    let without_scripts = remove_blocks(html, "script");
    let without_styles = remove_blocks(&without_scripts, "style");

    let mut out = String::with_capacity(without_styles.len());
    let mut in_tag = false;
    for ch in without_styles.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    let decoded = decode_entities(&out);
    let mut text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.len() > MAX_TEXT_LEN {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < MAX_TEXT_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        text.truncate(cut);
    }
    text
}

/// Remove `<tag ...>...</tag>` blocks, matching tag names case-insensitively.
fn remove_blocks(html: &str, tag: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open).map(|i| i + pos) {
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close).map(|i| i + start) {
            Some(end) => pos = end + close.len(),
            None => return out, // unterminated block: drop the rest
        }
    }
    out.push_str(&html[pos..]);
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn find_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = lower[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title>")? + open_end;
    let title = decode_entities(html[open_end..close].trim());
    if title.is_empty() { None } else { Some(title) }
}
