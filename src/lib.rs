//! Extraction of IFC property set (`Pset_*`) and quantity set (`Qto_*`)
//! definitions from the published HTML documentation.
//!
//! Each page goes through the same pipeline: the "Applicable entities" and
//! "Properties" sections are cut out by heading, the properties table is
//! split into rows and cells, and every row is resolved into a typed
//! [`PropertyEntry`]. Enumerated properties pull their literals from the
//! sibling `PEnum_*` page, memoized in an [`EnumerationCache`] that a
//! [`ParserSession`] shares across documents.
//!
//! ```rust,ignore
//! use psetdoc::{ItemKind, ParserSession};
//!
//! let session = ParserSession::new();
//! let schema = session.parse_file("docs/Pset_WallCommon.htm".as_ref(), ItemKind::PropertySet)?;
//! println!("{} has {} properties", schema.name, schema.properties.len());
//! ```

pub mod error;
pub mod model;
pub mod parser;
pub mod settings;
pub mod sink;

pub use error::{ParseError, Result};
pub use model::{EnumLiteral, ItemKind, LiteralAlias, PropertyDataType, PropertyEntry, SchemaDefinition};
pub use parser::enums::{CacheStats, EnumerationCache};
pub use parser::version::normalize_version;
pub use parser::ParserSession;
pub use settings::Settings;
pub use sink::{LogSink, NullSink, TracingSink};
