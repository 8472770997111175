use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;

use super::markup;
use crate::error::{ParseError, Result};
use crate::model::EnumLiteral;
use crate::sink::LogSink;

/// Extension of enumeration pages in the documentation tree.
pub const DEFAULT_EXTENSION: &str = "htm";

/// Inline elements that mark a cell as a code-styled literal.
const CODE_ELEMENTS: &[&str] = &["code", "tt", "samp", "kbd"];
const CODE_CLASSES: &[&str] = &["code", "monospace", "literal"];

type Slot = Arc<Mutex<Option<Arc<[EnumLiteral]>>>>;

/// Enumeration literals by enumeration name, shared across documents.
///
/// Entries are insert-only. The outer lock only guards slot lookup; each name
/// has its own lock, so one slow enumeration file never blocks lookups of
/// another, and a given file is read at most once. Failed loads leave the slot
/// empty so a later caller retries.
#[derive(Debug, Default)]
pub struct EnumerationCache {
    slots: Mutex<HashMap<String, Slot>>,
    loads: AtomicUsize,
    hits: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CacheStats {
    /// Enumeration files read and parsed.
    pub loads: usize,
    /// Lookups answered from the cache.
    pub hits: usize,
}

impl EnumerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached literals for `name`, without touching the filesystem.
    pub fn get(&self, name: &str) -> Option<Arc<[EnumLiteral]>> {
        let slot = self.slots.lock().unwrap_or_else(PoisonError::into_inner).get(name).cloned()?;
        let value = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        value
    }

    /// Literals of `name`, loading `<dir>/<name>.<extension>` on first use.
    pub fn resolve(
        &self,
        name: &str,
        dir: &Path,
        extension: &str,
        sink: &dyn LogSink,
    ) -> Result<Arc<[EnumLiteral]>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(name.to_string()).or_default())
        };

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(literals) = entry.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            sink.log(Level::TRACE, &format!("enumeration {name}: cache hit"));
            return Ok(Arc::clone(literals));
        }

        let literals: Arc<[EnumLiteral]> = load_enumeration(name, dir, extension)?.into();
        self.loads.fetch_add(1, Ordering::Relaxed);
        sink.log(
            Level::DEBUG,
            &format!("enumeration {name}: loaded {} literals from {}", literals.len(), dir.display()),
        );
        *entry = Some(Arc::clone(&literals));
        Ok(literals)
    }

    /// Number of enumerations resolved so far.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            loads: self.loads.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

/// Read and parse one enumeration page.
pub fn load_enumeration(name: &str, dir: &Path, extension: &str) -> Result<Vec<EnumLiteral>> {
    let path = dir.join(format!("{name}.{extension}"));
    let text = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ParseError::EnumerationFileMissing {
            name: name.to_string(),
            path: path.clone(),
        },
        _ => ParseError::Io {
            path: path.clone(),
            source,
        },
    })?;

    let literals = parse_literals(&text);
    if literals.is_empty() {
        return Err(ParseError::EmptyEnumeration {
            name: name.to_string(),
            path,
        });
    }
    Ok(literals)
}

/// Literals marked as code-styled table cells, in document order.
pub fn parse_literals(page: &str) -> Vec<EnumLiteral> {
    markup::find_elements(page, "td")
        .into_iter()
        .filter(|cell| is_code_cell(cell, page))
        .map(|cell| markup::visible_text(&page[cell.inner]))
        .filter(|name| !name.is_empty())
        .map(EnumLiteral::new)
        .collect()
}

fn is_code_cell(cell: &markup::Element<'_>, page: &str) -> bool {
    if CODE_CLASSES.iter().any(|class| cell.open.has_class(class)) {
        return true;
    }
    let inner = page[cell.inner.clone()].trim_start();
    markup::tags(inner)
        .next()
        .is_some_and(|tag| tag.span.start == 0 && !tag.closing && CODE_ELEMENTS.contains(&tag.name.as_str()))
}

// ── Tests ──
