//! Any other web page

use super::SourceContext;
use crate::html::{extract_main_html, html_to_markdown};
use concord_domain::Fetch;
use tracing::debug;

/// Render the page and reduce its main content to markdown-like text
pub async fn fetch(ctx: &SourceContext<'_>, url: &str) -> Fetch<String> {
    let target = rewrite_url(url);
    debug!("Extracting generic content from {}", target);

    let html = match ctx.renderer.render(&target).await {
        Ok(html) => html,
        Err(e) => return Fetch::Failed(e.to_string()),
    };
    page_text(&html).map_or(Fetch::Absent, Fetch::Found)
}

/// Main text of a page, `None` when nothing readable remains
pub fn page_text(html: &str) -> Option<String> {
    let main = extract_main_html(html)?;
    let text = html_to_markdown(&main);
    (!text.is_empty()).then_some(text)
}

/// Percent-decode the URL and apply known host rewrites
pub fn rewrite_url(url: &str) -> String {
    let decoded = urlencoding::decode(url)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| url.to_string());
    decoded.replace("galaxy.bi.uni-freiburg.de/tool_runner", "usegalaxy.eu/root")
}
