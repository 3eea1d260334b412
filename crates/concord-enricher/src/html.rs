//! Main-content extraction and HTML → markdown-like text

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

/// Containers shorter than this are not trusted as the main content
const MIN_CONTENT_CHARS: usize = 200;

/// Paragraphs shorter than this do not contribute to scoring
const MIN_PARAGRAPH_CHARS: usize = 25;

const DROPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "noscript", "head", "template", "svg",
];

static POSITIVE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|content|entry|main|page|post|text|blog|story|readme|markdown")
        .unwrap()
});

static NEGATIVE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)comment|footer|footnote|sidebar|sponsor|social|nav|menu|banner|masthead|popup|cookie",
    )
    .unwrap()
});

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

fn text_content(elem: ElementRef<'_>) -> String {
    elem.text().collect::<Vec<_>>().join(" ")
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_len(elem: ElementRef<'_>) -> usize {
    compact_ws(&text_content(elem)).chars().count()
}

fn class_weight(elem: ElementRef<'_>) -> f64 {
    let mut weight = 0.0;
    for attr in [elem.value().attr("class"), elem.value().attr("id")]
        .into_iter()
        .flatten()
    {
        if NEGATIVE_HINTS.is_match(attr) {
            weight -= 25.0;
        }
        if POSITIVE_HINTS.is_match(attr) {
            weight += 25.0;
        }
    }
    weight
}

/// Outer HTML of the element most likely to hold the page's main content
///
/// Semantic containers (`article`, `main`, `[role=main]`) win when they hold
/// enough text. Otherwise paragraphs vote for their parent (full score) and
/// grandparent (half score), weighted by class/id hints. Falls back to
/// `body`; `None` only for documents with no body at all.
pub fn extract_main_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector in ["article", "main", "[role=main]"] {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(elem) = document.select(&sel).max_by_key(|e| text_len(*e)) {
            if text_len(elem) >= MIN_CONTENT_CHARS {
                return Some(elem.html());
            }
        }
    }

    let mut scores = HashMap::new();
    if let Ok(p_sel) = Selector::parse("p") {
        for paragraph in document.select(&p_sel) {
            let text = compact_ws(&text_content(paragraph));
            let len = text.chars().count();
            if len < MIN_PARAGRAPH_CHARS {
                continue;
            }
            let score = 1.0 + text.matches(',').count() as f64 + (len / 100).min(3) as f64;

            let parent = paragraph.parent().and_then(ElementRef::wrap);
            let grandparent = parent
                .and_then(|p| p.parent())
                .and_then(ElementRef::wrap);

            if let Some(parent) = parent {
                scores
                    .entry(parent.id())
                    .or_insert_with(|| (parent, class_weight(parent)))
                    .1 += score;
            }
            if let Some(grandparent) = grandparent {
                scores
                    .entry(grandparent.id())
                    .or_insert_with(|| (grandparent, class_weight(grandparent)))
                    .1 += score / 2.0;
            }
        }
    }

    let best = scores
        .into_values()
        .filter(|(_, score)| *score > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(elem, _)| elem);

    if let Some(elem) = best {
        return Some(elem.html());
    }

    Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|body| body.html())
}

/// Convert an HTML fragment into compact markdown-like text
///
/// Links become `[text](href)` (or `<href>` when the anchor has no text),
/// bold becomes `**text**`, italic `_text_`, headings `#`-prefixed lines and
/// list items `* ` bullets. Script, style, nav and footer subtrees are
/// dropped before any text is taken.
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.root_element(), &mut out, false);

    let lines: Vec<String> = out
        .lines()
        .map(|line| SPACE_RUNS.replace_all(line.trim(), " ").into_owned())
        .collect();
    normalize_linebreaks(&lines.join("\n"))
}

/// Normalize line endings and collapse runs of blank lines
///
/// Literal `\n` escape sequences become real newlines, `\r\n` becomes `\n`
/// and three or more consecutive newlines collapse to one blank line.
pub fn normalize_linebreaks(text: &str) -> String {
    let text = text.replace("\\n", "\n").replace("\r\n", "\n");
    BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

fn render_children(elem: ElementRef<'_>, out: &mut String, preformatted: bool) {
    for child in elem.children() {
        match child.value() {
            Node::Text(text) => {
                if preformatted {
                    out.push_str(text);
                } else {
                    push_inline_text(out, text);
                }
            }
            Node::Element(_) => {
                if let Some(child_elem) = ElementRef::wrap(child) {
                    render_element(child_elem, out, preformatted);
                }
            }
            _ => {}
        }
    }
}

fn push_inline_text(out: &mut String, text: &str) {
    let collapsed = compact_ws(text);
    if collapsed.is_empty() {
        if text.chars().any(char::is_whitespace) && !out.ends_with([' ', '\n']) {
            out.push(' ');
        }
        return;
    }
    if text.starts_with(char::is_whitespace) && !out.ends_with([' ', '\n']) && !out.is_empty() {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn render_inner(elem: ElementRef<'_>, preformatted: bool) -> String {
    let mut inner = String::new();
    render_children(elem, &mut inner, preformatted);
    inner.trim().to_string()
}

fn render_element(elem: ElementRef<'_>, out: &mut String, preformatted: bool) {
    let tag = elem.value().name();
    if DROPPED_TAGS.contains(&tag) {
        return;
    }

    match tag {
        "a" => {
            let text = render_inner(elem, preformatted);
            match elem.value().attr("href").map(str::trim) {
                Some(href) if !href.is_empty() && text.is_empty() => {
                    out.push('<');
                    out.push_str(href);
                    out.push('>');
                }
                Some(href) if !href.is_empty() => {
                    out.push_str(&format!("[{}]({})", text, href));
                }
                _ => out.push_str(&text),
            }
        }
        "strong" | "b" => wrap_inline(elem, out, "**", preformatted),
        "em" | "i" => wrap_inline(elem, out, "_", preformatted),
        "code" if !preformatted => wrap_inline(elem, out, "`", preformatted),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            let text = render_inner(elem, preformatted);
            if !text.is_empty() {
                out.push_str("\n\n");
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(&text.replace('\n', " "));
                out.push_str("\n\n");
            }
        }
        "li" => {
            let text = render_inner(elem, preformatted);
            if !text.is_empty() {
                out.push_str("\n* ");
                out.push_str(&text);
                out.push('\n');
            }
        }
        "br" => out.push('\n'),
        "pre" => {
            out.push_str("\n\n");
            render_children(elem, out, true);
            out.push_str("\n\n");
        }
        "p" | "div" | "section" | "article" | "main" | "header" | "aside" | "ul" | "ol"
        | "table" | "tr" | "blockquote" | "dl" | "dt" | "dd" | "figure" | "form" => {
            out.push_str("\n\n");
            render_children(elem, out, preformatted);
            out.push_str("\n\n");
        }
        "td" | "th" => {
            render_children(elem, out, preformatted);
            out.push(' ');
        }
        _ => render_children(elem, out, preformatted),
    }
}

fn wrap_inline(elem: ElementRef<'_>, out: &mut String, marker: &str, preformatted: bool) {
    let text = render_inner(elem, preformatted);
    if text.is_empty() {
        return;
    }
    out.push_str(marker);
    out.push_str(&text);
    out.push_str(marker);
}
