use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Failures raised while turning one documentation page into a schema.
///
/// Every variant aborts the enclosing document. `Row` and `Document` only
/// add context around an inner cause; use [`ParseError::root`] to match on
/// the originating failure.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("schema name heading not found (expected a Pset_ or Qto_ heading)")]
    NameNotFound,

    #[error("version header not found")]
    VersionNotFound,

    #[error("unrecognized schema version: {0:?}")]
    UnrecognizedVersion(String),

    #[error("\"Applicable entities\" section not found")]
    ApplicableEntitiesNotFound,

    #[error("\"Properties\" section not found")]
    PropertiesNotFound,

    #[error("properties table not found")]
    TableNotFound,

    #[error("malformed row: expected {expected} cells, found {found}")]
    MalformedRow { expected: usize, found: usize },

    #[error("row has no property name")]
    UnnamedRow,

    #[error("no type reference found in cell {cell:?}")]
    ReferenceNotFound { cell: String },

    #[error("unknown property kind: {0:?}")]
    UnknownPropertyKind(String),

    #[error("enumeration file for {name} not found at {}", path.display())]
    EnumerationFileMissing { name: String, path: PathBuf },

    #[error("enumeration {name} in {} has no literals", path.display())]
    EmptyEnumeration { name: String, path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {index}{}", property.as_deref().map(|p| format!(" ({p})")).unwrap_or_default())]
    Row {
        index: usize,
        property: Option<String>,
        #[source]
        source: Box<ParseError>,
    },

    #[error("failed to parse {}", path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Innermost failure, skipping row/document context.
    pub fn root(&self) -> &ParseError {
        match self {
            ParseError::Row { source, .. } | ParseError::Document { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for the "expected structure is missing" family.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.root(),
            ParseError::NameNotFound
                | ParseError::VersionNotFound
                | ParseError::ApplicableEntitiesNotFound
                | ParseError::PropertiesNotFound
                | ParseError::TableNotFound
        )
    }

    pub(crate) fn in_row(self, index: usize, property: Option<&str>) -> ParseError {
        ParseError::Row {
            index,
            property: property.map(str::to_string),
            source: Box::new(self),
        }
    }

    pub(crate) fn in_document(self, path: impl Into<PathBuf>) -> ParseError {
        ParseError::Document {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Render the full cause chain on one line, outermost first.
    pub fn chain(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut cur: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(self);
        while let Some(err) = cur {
            parts.push(err.to_string());
            cur = err.source();
        }
        parts.join(": ")
    }
}

// ── Tests ──
