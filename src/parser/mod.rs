pub mod enums;
pub mod markup;
pub mod refs;
pub mod sections;
pub mod table;
pub mod version;

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::Level;

use crate::error::{ParseError, Result};
use crate::model::{EnumLiteral, ItemKind, PropertyDataType, PropertyEntry, SchemaDefinition};
use crate::sink::{LogSink, TracingSink};
use enums::EnumerationCache;
use refs::PropertyKind;

pub const APPLICABLE_ENTITIES: &str = "Applicable entities";
pub const PROPERTIES: &str = "Properties";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?i:pset|qto)_[A-Za-z0-9_]+)").unwrap());

/// Parsing context shared by every document of one run: the enumeration
/// cache, the enumeration file extension and the diagnostic sink.
///
/// Cloning is cheap and clones share the cache. Tests that need isolation
/// build a fresh session.
#[derive(Clone)]
pub struct ParserSession {
    cache: Arc<EnumerationCache>,
    enum_extension: String,
    sink: Arc<dyn LogSink>,
}

impl Default for ParserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserSession")
            .field("cache", &self.cache)
            .field("enum_extension", &self.enum_extension)
            .finish_non_exhaustive()
    }
}

/// What the "Applicable entities" section says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applicability {
    pub classes: Vec<String>,
    /// First listed entity only.
    pub applicable_type: Option<String>,
    /// Qualifier of the last entry that had one.
    pub predefined_type_hint: Option<String>,
}

impl ParserSession {
    pub fn new() -> Self {
        ParserSession {
            cache: Arc::new(EnumerationCache::new()),
            enum_extension: enums::DEFAULT_EXTENSION.to_string(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_cache(mut self, cache: Arc<EnumerationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_enum_extension(mut self, extension: &str) -> Self {
        self.enum_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn cache(&self) -> &Arc<EnumerationCache> {
        &self.cache
    }

    /// Read `path` and parse it, resolving enumerations next to it.
    pub fn parse_file(&self, path: &Path, kind: ItemKind) -> Result<SchemaDefinition> {
        let parse = || -> Result<SchemaDefinition> {
            let document = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            self.parse(&document, directory, kind)
        };
        parse().map_err(|e| e.in_document(path))
    }

    /// Assemble one schema definition. Any failure aborts the whole document.
    pub fn parse(&self, document: &str, directory: &Path, kind: ItemKind) -> Result<SchemaDefinition> {
        let name = extract_name(document)?;
        let schema_version = version::extract_version(document)?;
        let applicability = extract_applicability(document)?;
        if applicability.classes.is_empty() {
            self.log(Level::DEBUG, format!("{name}: no applicable entities listed"));
        }
        let properties = self.extract_properties(document, directory, kind, &name)?;

        self.log(
            Level::DEBUG,
            format!("{name} ({schema_version}): {} entries", properties.len()),
        );
        Ok(SchemaDefinition {
            name,
            schema_version,
            applicable_classes: applicability.classes,
            applicable_type: applicability.applicable_type,
            predefined_type_hint: applicability.predefined_type_hint,
            properties,
        })
    }

    fn extract_properties(
        &self,
        document: &str,
        directory: &Path,
        kind: ItemKind,
        schema: &str,
    ) -> Result<HashSet<PropertyEntry>> {
        let section = sections::find_section(document, PROPERTIES).ok_or(ParseError::PropertiesNotFound)?;
        let table = table::find_table(section).ok_or(ParseError::TableNotFound)?;

        let mut entries = HashSet::new();
        for (i, row) in table::extract_rows(table).into_iter().enumerate() {
            let index = i + 1;
            if table::is_header_row(row) {
                self.log(Level::DEBUG, format!("{schema}: skipping header row {index}"));
                continue;
            }
            let cells = table::extract_cells(row);
            let name = cells.first().map(|c| markup::visible_text(c));

            let entry = self
                .parse_row(&cells, directory, kind)
                .map_err(|e| e.in_row(index, name.as_deref().filter(|n| !n.is_empty())))?;

            if let Some(duplicate) = entries.replace(entry) {
                self.log(
                    Level::DEBUG,
                    format!("{schema}: duplicate entry {} collapsed", duplicate.name),
                );
            }
        }
        Ok(entries)
    }

    fn parse_row(&self, cells: &[&str], directory: &Path, kind: ItemKind) -> Result<PropertyEntry> {
        let expected = kind.expected_columns();
        if cells.len() != expected {
            return Err(ParseError::MalformedRow {
                expected,
                found: cells.len(),
            });
        }

        let name = markup::visible_text(cells[0]);
        if name.is_empty() {
            return Err(ParseError::UnnamedRow);
        }

        let data_type = match kind {
            ItemKind::QuantitySet => self.quantity_data_type(&name, cells[1])?,
            ItemKind::PropertySet => {
                let kind = PropertyKind::from_label(&markup::visible_text(cells[1]))?;
                refs::property_data_type(kind, cells[2], self.sink.as_ref(), |enum_name| {
                    self.resolve_enum(enum_name, directory)
                })?
            }
        };
        Ok(PropertyEntry { name, data_type })
    }

    /// Quantity kinds map onto fixed measures; an unknown kind keeps its own
    /// label as measure type.
    fn quantity_data_type(&self, name: &str, type_cell: &str) -> Result<PropertyDataType> {
        let label = refs::extract_type_ref(type_cell)?;
        let measure_type = match refs::quantity_measure(&label) {
            Some(measure) => measure.to_string(),
            None => {
                self.log(
                    Level::WARN,
                    format!("quantity {name}: unknown quantity kind {label}, keeping label as measure"),
                );
                label
            }
        };
        Ok(PropertyDataType::SingleValue { measure_type })
    }

    /// Enumeration literals for `name`, through the session cache.
    pub fn resolve_enum(&self, name: &str, directory: &Path) -> Result<Arc<[EnumLiteral]>> {
        self.cache
            .resolve(name, directory, &self.enum_extension, self.sink.as_ref())
    }

    fn log(&self, level: Level, line: String) {
        self.sink.log(level, &line);
    }
}

/// Schema name from the primary heading (first `<h1>`, else the first
/// heading of any level). Must carry a `Pset_` or `Qto_` name.
pub fn extract_name(document: &str) -> Result<String> {
    let headings = sections::headings(document);
    let primary = headings
        .iter()
        .find(|h| h.level == 1)
        .or_else(|| headings.first())
        .ok_or(ParseError::NameNotFound)?;
    NAME_RE
        .captures(&primary.title)
        .map(|caps| caps[1].to_string())
        .ok_or(ParseError::NameNotFound)
}

/// Parse the "Applicable entities" list. A missing section is an error, an
/// empty one is not.
pub fn extract_applicability(document: &str) -> Result<Applicability> {
    let section =
        sections::find_section(document, APPLICABLE_ENTITIES).ok_or(ParseError::ApplicableEntitiesNotFound)?;

    let mut applicability = Applicability::default();
    for item in markup::find_elements(section, "li") {
        let text = markup::visible_text(&section[item.inner]);
        let mut parts = text.splitn(2, '/').map(str::trim);
        let Some(entity) = parts.next().filter(|e| !e.is_empty()) else {
            continue;
        };
        if let Some(qualifier) = parts.next().filter(|q| !q.is_empty()) {
            applicability.predefined_type_hint = Some(qualifier.to_string());
        }
        if applicability.applicable_type.is_none() {
            applicability.applicable_type = Some(entity.to_string());
        }
        applicability.classes.push(entity.to_string());
    }
    Ok(applicability)
}

// ── Tests ──
