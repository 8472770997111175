use std::sync::LazyLock;

use regex::Regex;

use super::markup::{self, heading_level, Tag};

static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s*").unwrap());

/// Elements whose closing tag ends a section that started inside them.
const CONTAINERS: &[&str] = &["div", "section", "article", "main", "body", "html"];

/// A heading found in the document, with its visible title normalized.
#[derive(Debug, Clone)]
pub struct Heading {
    pub level: u8,
    pub title: String,
    /// Byte offset just past the closing heading tag.
    pub end: usize,
}

/// Every `<h1>`..`<h6>` in document order.
pub fn headings(document: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some((tag, level)) = next_heading_open(document, from) {
        let Some(el) = markup::find_element(document, &tag.name, tag.span.start) else {
            break;
        };
        found.push(Heading {
            level,
            title: heading_title(&document[el.inner]),
            end: el.outer.end,
        });
        from = el.outer.end;
    }
    found
}

/// The span following the heading titled `title` (case-insensitive, numeric
/// prefix ignored) up to the next heading of the same level, the end of the
/// enclosing container, or the end of the document. Empty when no heading
/// carries that title.
pub fn extract_section<'a>(document: &'a str, title: &str) -> &'a str {
    find_section(document, title).unwrap_or("")
}

/// Like [`extract_section`], but tells a missing heading apart from a heading
/// with nothing under it.
pub fn find_section<'a>(document: &'a str, title: &str) -> Option<&'a str> {
    let wanted = title.trim();
    let heading = headings(document)
        .into_iter()
        .find(|h| h.title.eq_ignore_ascii_case(wanted))?;

    let start = heading.end;
    let end = section_end(&document[start..], heading.level) + start;
    Some(&document[start..end])
}

/// Offset within `rest` where a section at `level` stops.
fn section_end(rest: &str, level: u8) -> usize {
    let mut depth = 0usize;
    for tag in markup::tags(rest) {
        if !tag.closing && heading_level(&tag.name) == Some(level) {
            return tag.span.start;
        }
        if !CONTAINERS.contains(&tag.name.as_str()) || tag.self_closing {
            continue;
        }
        if !tag.closing {
            depth += 1;
        } else if depth == 0 {
            return tag.span.start;
        } else {
            depth -= 1;
        }
    }
    rest.len()
}

fn next_heading_open(document: &str, from: usize) -> Option<(Tag<'_>, u8)> {
    markup::tags(&document[from..]).find_map(|tag| {
        let level = heading_level(&tag.name)?;
        if tag.closing || tag.self_closing {
            return None;
        }
        let span = tag.span.start + from..tag.span.end + from;
        Some((Tag { span, ..tag }, level))
    })
}

/// Visible heading text without anchor glyphs (¶, #) or a numeric prefix
/// such as "7.2.5.1.3".
fn heading_title(inner: &str) -> String {
    let text = markup::visible_text(inner);
    let text = text.trim_matches(|c: char| !c.is_alphanumeric());
    let text = NUMBER_PREFIX_RE.replace(text, "");
    text.trim_matches(|c: char| !c.is_alphanumeric()).to_string()
}

// ── Tests ──
