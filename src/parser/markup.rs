use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

// Comments match the first alternative so tags inside them are never reported.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)\b[^>]*?(/?)>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap());

/// One opening or closing tag found in raw markup.
#[derive(Debug, Clone)]
pub struct Tag<'a> {
    /// Lowercased element name.
    pub name: String,
    pub closing: bool,
    pub self_closing: bool,
    /// Byte span of the whole tag, `<` through `>`.
    pub span: Range<usize>,
    pub raw: &'a str,
}

impl Tag<'_> {
    pub fn is_open(&self, name: &str) -> bool {
        !self.closing && self.name == name
    }

    pub fn is_close(&self, name: &str) -> bool {
        self.closing && self.name == name
    }

    pub fn has_class(&self, class: &str) -> bool {
        CLASS_RE.captures(self.raw).is_some_and(|caps| {
            let value = caps.get(1).or(caps.get(2)).or(caps.get(3)).map_or("", |m| m.as_str());
            value.split_whitespace().any(|c| c.eq_ignore_ascii_case(class))
        })
    }
}

/// Heading level for `h1`..`h6`.
pub fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', d @ b'1'..=b'6'] => Some(d - b'0'),
        _ => None,
    }
}

/// All tags in `markup`, in document order. Tags inside comments are skipped.
pub fn tags(markup: &str) -> impl Iterator<Item = Tag<'_>> {
    TAG_RE.captures_iter(markup).filter_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(2)?;
        Some(Tag {
            name: name.as_str().to_ascii_lowercase(),
            closing: caps.get(1).is_some_and(|m| !m.is_empty()),
            self_closing: caps.get(3).is_some_and(|m| !m.is_empty()),
            span: whole.range(),
            raw: whole.as_str(),
        })
    })
}

/// An element located in raw markup. Ranges index into the scanned string.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    pub open: Tag<'a>,
    pub inner: Range<usize>,
    pub outer: Range<usize>,
}

/// First `<name>` element at or after `from`, matched against its closing
/// tag with nesting taken into account. An element that is never closed runs
/// to the end of the input.
pub fn find_element<'a>(markup: &'a str, name: &str, from: usize) -> Option<Element<'a>> {
    let mut open: Option<Tag<'a>> = None;
    let mut depth = 0usize;

    for tag in tags(&markup[from..]) {
        let tag = Tag {
            span: tag.span.start + from..tag.span.end + from,
            ..tag
        };
        if tag.name != name {
            continue;
        }
        if open.is_none() {
            if tag.closing {
                continue;
            }
            if tag.self_closing {
                let at = tag.span.end;
                return Some(Element {
                    inner: at..at,
                    outer: tag.span.clone(),
                    open: tag,
                });
            }
            depth = 1;
            open = Some(tag);
            continue;
        }
        if tag.self_closing {
            continue;
        }
        if !tag.closing {
            depth += 1;
            continue;
        }
        depth -= 1;
        if depth == 0 {
            let start = open?;
            return Some(Element {
                inner: start.span.end..tag.span.start,
                outer: start.span.start..tag.span.end,
                open: start,
            });
        }
    }

    open.map(|start| Element {
        inner: start.span.end..markup.len(),
        outer: start.span.start..markup.len(),
        open: start,
    })
}

/// Every top-level `<name>` element in `markup`, in order.
pub fn find_elements<'a>(markup: &'a str, name: &str) -> Vec<Element<'a>> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(el) = find_element(markup, name, from) {
        from = el.outer.end;
        found.push(el);
        if from >= markup.len() {
            break;
        }
    }
    found
}

/// Visible text: tags and comments removed, entities decoded, whitespace
/// (non-breaking spaces included) collapsed and trimmed.
pub fn visible_text(markup: &str) -> String {
    let no_comments = COMMENT_RE.replace_all(markup, "");
    let no_tags = ANY_TAG_RE.replace_all(&no_comments, " ");
    let decoded = decode_entities(&no_tags).replace('\u{a0}', " ");
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Decode character references. Entities XML does not know are kept as-is,
/// except `&nbsp;`, which becomes a plain space.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let text = text.replace("&nbsp;", " ");
    match quick_xml::escape::unescape(&text) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(text),
    }
}

// ── Tests ──
