use std::sync::LazyLock;

use regex::Regex;

use super::markup;
use crate::error::{ParseError, Result};

pub const IFC2X2: &str = "IFC2X2";
pub const IFC2X3: &str = "IFC2X3";
pub const IFC4X3: &str = "IFC4X3";

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^()]*)\)").unwrap());

/// Map a raw version tag onto the schema family it belongs to.
///
/// `2X`, `2X2` and `2.X` are IFC2x2 pages, anything starting with `IFC2X3`
/// or `IFC4X3` collapses to that release, other `IFC4…` tags pass through
/// uppercased. Matching is case-insensitive.
pub fn normalize_version(raw: &str) -> Result<String> {
    let tag = raw.trim().to_ascii_uppercase();
    let normalized = match tag.as_str() {
        "2X" | "2X2" | "2.X" => IFC2X2.to_string(),
        t if t.starts_with(IFC2X3) => IFC2X3.to_string(),
        t if t.starts_with(IFC4X3) => IFC4X3.to_string(),
        t if t.starts_with("IFC4") => t.to_string(),
        _ => return Err(ParseError::UnrecognizedVersion(raw.trim().to_string())),
    };
    Ok(normalized)
}

/// Raw version tag from the page's header block (a `<header>` element or any
/// element with class `header`): the first parenthesised text that
/// normalizes, else the first non-empty one.
pub fn find_version_tag(document: &str) -> Option<String> {
    let header = markup::tags(document)
        .find(|tag| !tag.closing && (tag.name == "header" || tag.has_class("header")))?;
    let el = markup::find_element(document, &header.name, header.span.start)?;
    let text = markup::visible_text(&document[el.inner]);
    let candidates: Vec<&str> = PAREN_RE
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|tag| !tag.is_empty())
        .collect();
    candidates
        .iter()
        .find(|tag| normalize_version(tag).is_ok())
        .or(candidates.first())
        .map(|tag| tag.to_string())
}

/// Locate and normalize the version of a documentation page.
pub fn extract_version(document: &str) -> Result<String> {
    let raw = find_version_tag(document).ok_or(ParseError::VersionNotFound)?;
    normalize_version(&raw)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_two_part_forms() {
        for raw in ["2X", "2x2", "2.x", " 2X2 "] {
            assert_eq!(normalize_version(raw).unwrap(), IFC2X2, "{raw}");
        }
    }

    #[test]
    fn release_families() {
        assert_eq!(normalize_version("IFC2X3_TC1").unwrap(), IFC2X3);
        assert_eq!(normalize_version("ifc2x3").unwrap(), IFC2X3);
        assert_eq!(normalize_version("IFC4X3_ADD2").unwrap(), IFC4X3);
        assert_eq!(normalize_version("ifc4_add2_tc1").unwrap(), "IFC4_ADD2_TC1");
        assert_eq!(normalize_version("IFC4").unwrap(), "IFC4");
    }

    #[test]
    fn unrecognized() {
        for raw in ["IFC5", "2X4", "IFC2X2", "", "Release 4"] {
            assert!(
                matches!(normalize_version(raw), Err(ParseError::UnrecognizedVersion(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn idempotent_on_valid_outputs() {
        for raw in ["IFC2X3_TC1", "IFC4X3_ADD1", "ifc4_add1", "IFC4"] {
            let once = normalize_version(raw).unwrap();
            assert_eq!(normalize_version(&once).unwrap(), once);
        }
    }

    #[test]
    fn header_block_tag() {
        let doc = r#"<div class="header top">Industry Foundation Classes <b>(IFC4)</b></div><p>(IFC2X3)</p>"#;
        assert_eq!(find_version_tag(doc).as_deref(), Some("IFC4"));
        assert_eq!(extract_version(doc).unwrap(), "IFC4");
    }

    #[test]
    fn skips_parenthesised_text_that_is_not_a_version() {
        let doc = "<div class='header'>Industry Foundation Classes (IFC) release (IFC4_ADD2)</div>";
        assert_eq!(find_version_tag(doc).as_deref(), Some("IFC4_ADD2"));
        assert_eq!(extract_version(doc).unwrap(), "IFC4_ADD2");

        let doc = "<div class='header'>Industry Foundation Classes (IFC) (draft)</div>";
        let err = extract_version(doc).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedVersion(v) if v == "IFC"));
    }

    #[test]
    fn header_element() {
        let doc = "<header>\n  IFC Documentation\n  (IFC4X3_ADD2)\n</header>";
        assert_eq!(extract_version(doc).unwrap(), IFC4X3);
    }

    #[test]
    fn missing_header() {
        let err = extract_version("<p>(IFC4)</p>").unwrap_err();
        assert!(matches!(err, ParseError::VersionNotFound));
        let err = extract_version("<div class='header'>no tag</div>").unwrap_err();
        assert!(matches!(err, ParseError::VersionNotFound));
    }

    #[test]
    fn header_with_bad_tag() {
        let err = extract_version("<div class='header'>(IFC9)</div>").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedVersion(v) if v == "IFC9"));
    }
}
