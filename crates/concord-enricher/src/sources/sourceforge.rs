//! SourceForge project pages
//!
//! Project pages are assembled client-side, so they go through the
//! renderer before parsing.

use super::SourceContext;
use concord_domain::Fetch;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// One `psp-section` block of a project page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// Section text, one text node per line, followed by the text of each
    /// direct child `div`
    pub text: String,
    /// Outbound links, first occurrence order
    pub hrefs: Vec<String>,
}

/// Parsed project page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectInfo {
    /// Project description paragraph
    pub description: Option<String>,
    /// Named page sections
    pub sections: Vec<Section>,
}

/// Render the project page and extract its description and sections
pub async fn fetch(ctx: &SourceContext<'_>, url: &str) -> Fetch<Value> {
    let html = match ctx.renderer.render(url).await {
        Ok(html) => html,
        Err(e) => return Fetch::Failed(e.to_string()),
    };
    match serde_json::to_value(parse_project_page(&html)) {
        Ok(value) => Fetch::Found(value),
        Err(e) => {
            warn!("Failed to serialize SourceForge info for {}: {}", url, e);
            Fetch::Failed(e.to_string())
        }
    }
}

fn stripped_lines(elem: ElementRef<'_>) -> String {
    elem.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract description and `psp-section` blocks from project page HTML
pub fn parse_project_page(html: &str) -> ProjectInfo {
    let document = Html::parse_document(html);
    let mut info = ProjectInfo::default();

    if let Ok(sel) = Selector::parse("p.description") {
        info.description = document
            .select(&sel)
            .next()
            .map(stripped_lines)
            .filter(|d| !d.is_empty());
    }

    let (Ok(anchor_sel), Ok(div_sel), Ok(section_sel)) = (
        Selector::parse("a[href]"),
        Selector::parse("div.psp-section"),
        Selector::parse("section.psp-section"),
    ) else {
        return info;
    };

    for section in document.select(&div_sel).chain(document.select(&section_sel)) {
        let mut hrefs: Vec<String> = Vec::new();
        for anchor in section.select(&anchor_sel) {
            if let Some(href) = anchor.value().attr("href") {
                if !hrefs.iter().any(|h| h == href) {
                    hrefs.push(href.to_string());
                }
            }
        }
        // Direct child containers are repeated after the section's own text
        let mut text = stripped_lines(section);
        for inner in section
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "div")
        {
            text.push('\n');
            text.push_str(&stripped_lines(inner));
        }
        info.sections.push(Section {
            text: text.trim().to_string(),
            hrefs,
        });
    }

    info
}
