use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::Level;

use super::markup;
use crate::error::{ParseError, Result};
use crate::model::{EnumLiteral, PropertyDataType};
use crate::sink::LogSink;

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a\s*>").unwrap());

/// Cell text kept in error messages is cut to this many chars.
const CELL_SNIPPET: usize = 120;

/// Property kinds named in the kind column of a property set table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    SingleValue,
    EnumeratedValue,
    TableValue,
    BoundedValue,
    ListValue,
    ReferenceValue,
}

const KIND_LABELS: &[(&str, PropertyKind)] = &[
    ("IfcPropertySingleValue", PropertyKind::SingleValue),
    ("IfcPropertyEnumeratedValue", PropertyKind::EnumeratedValue),
    ("IfcPropertyTableValue", PropertyKind::TableValue),
    ("IfcPropertyBoundedValue", PropertyKind::BoundedValue),
    ("IfcPropertyListValue", PropertyKind::ListValue),
    ("IfcPropertyReferenceValue", PropertyKind::ReferenceValue),
    // IFC2x3-era pages
    ("P_SINGLEVALUE", PropertyKind::SingleValue),
    ("P_ENUMERATEDVALUE", PropertyKind::EnumeratedValue),
    ("P_TABLEVALUE", PropertyKind::TableValue),
    ("P_BOUNDEDVALUE", PropertyKind::BoundedValue),
    ("P_LISTVALUE", PropertyKind::ListValue),
    ("P_REFERENCEVALUE", PropertyKind::ReferenceValue),
];

const QUANTITY_MEASURES: &[(&str, &str)] = &[
    ("IfcQuantityLength", "IfcLengthMeasure"),
    ("IfcQuantityArea", "IfcAreaMeasure"),
    ("IfcQuantityVolume", "IfcVolumeMeasure"),
    ("IfcQuantityWeight", "IfcMassMeasure"),
    ("IfcQuantityCount", "IfcCountMeasure"),
    ("IfcQuantityTime", "IfcTimeMeasure"),
];

impl PropertyKind {
    pub fn from_label(label: &str) -> Result<PropertyKind> {
        let label = label.trim();
        KIND_LABELS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ParseError::UnknownPropertyKind(label.to_string()))
    }
}

/// Measure type for a quantity kind label, `None` when the label is unknown.
pub fn quantity_measure(label: &str) -> Option<&'static str> {
    let label = label.trim();
    QUANTITY_MEASURES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, measure)| *measure)
}

/// Label of the first link in `cell`.
pub fn extract_type_ref(cell: &str) -> Result<String> {
    link_labels(cell)
        .next()
        .ok_or_else(|| not_found(cell))
}

/// Labels of every link in `cell`, with `A/B` labels split into two. At
/// least one is required.
pub fn extract_type_refs(cell: &str) -> Result<Vec<String>> {
    let refs: Vec<String> = link_labels(cell)
        .flat_map(|label| {
            label
                .split('/')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    if refs.is_empty() {
        return Err(not_found(cell));
    }
    Ok(refs)
}

/// Build the descriptor for a property row. `resolve_enum` is only called for
/// enumerated properties, with the enumeration name from `type_cell`.
///
/// A table value takes the first two references of a compound cell; any
/// further reference is reported to `sink` and left out.
pub fn property_data_type<F>(
    kind: PropertyKind,
    type_cell: &str,
    sink: &dyn LogSink,
    resolve_enum: F,
) -> Result<PropertyDataType>
where
    F: FnOnce(&str) -> Result<Arc<[EnumLiteral]>>,
{
    let data_type = match kind {
        PropertyKind::SingleValue => PropertyDataType::SingleValue {
            measure_type: extract_type_ref(type_cell)?,
        },
        PropertyKind::BoundedValue => PropertyDataType::BoundedValue {
            measure_type: extract_type_ref(type_cell)?,
        },
        PropertyKind::ListValue => PropertyDataType::ListValue {
            measure_type: extract_type_ref(type_cell)?,
        },
        PropertyKind::ReferenceValue => PropertyDataType::ReferenceValue {
            referenced_entity: extract_type_ref(type_cell)?,
        },
        PropertyKind::EnumeratedValue => {
            let enum_name = extract_type_ref(type_cell)?;
            let literals = resolve_enum(&enum_name)?;
            PropertyDataType::EnumeratedValue { enum_name, literals }
        }
        PropertyKind::TableValue => {
            let mut refs = extract_type_refs(type_cell)?.into_iter();
            let defined_type = refs.next().unwrap_or_default();
            let defining_type = refs.next().unwrap_or_else(|| defined_type.clone());
            let extra: Vec<String> = refs.collect();
            if !extra.is_empty() {
                sink.log(
                    Level::WARN,
                    &format!(
                        "table value {defined_type}/{defining_type}: ignoring extra references {}",
                        extra.join(", ")
                    ),
                );
            }
            PropertyDataType::TableValue {
                defined_type,
                defining_type,
            }
        }
    };
    Ok(data_type)
}

fn link_labels(cell: &str) -> impl Iterator<Item = String> + '_ {
    LINK_RE
        .captures_iter(cell)
        .map(|caps| markup::visible_text(&caps[1]))
        .filter(|label| !label.is_empty())
}

fn not_found(cell: &str) -> ParseError {
    let text = markup::visible_text(cell);
    ParseError::ReferenceNotFound {
        cell: text.chars().take(CELL_SNIPPET).collect(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;

    fn no_enums(name: &str) -> Result<Arc<[EnumLiteral]>> {
        panic!("unexpected enumeration lookup for {name}")
    }

    #[test]
    fn single_ref_is_label_not_target() {
        let cell = r#"<a href="../../ifcmeasureresource/lexical/ifclabel.htm">IfcLabel</a>"#;
        assert_eq!(extract_type_ref(cell).unwrap(), "IfcLabel");
    }

    #[test]
    fn anchors_without_label_are_skipped() {
        let cell = r#"<a name="top"></a><a href="x.htm"> IfcReal </a>"#;
        assert_eq!(extract_type_ref(cell).unwrap(), "IfcReal");
    }

    #[test]
    fn missing_ref() {
        let err = extract_type_ref("plain IfcLabel").unwrap_err();
        assert!(matches!(err, ParseError::ReferenceNotFound { cell } if cell == "plain IfcLabel"));
        assert!(extract_type_refs("").is_err());
    }

    #[test]
    fn compound_refs_two_links() {
        let cell = "<a href='a.htm'>IfcPowerMeasure</a>/<a href='b.htm'>IfcThermodynamicTemperatureMeasure</a>";
        assert_eq!(
            extract_type_refs(cell).unwrap(),
            ["IfcPowerMeasure", "IfcThermodynamicTemperatureMeasure"]
        );
    }

    #[test]
    fn compound_refs_in_one_label() {
        let cell = "<a href='a.htm'>IfcPowerMeasure / IfcThermodynamicTemperatureMeasure</a>";
        assert_eq!(extract_type_refs(cell).unwrap().len(), 2);
    }

    #[test]
    fn multiline_link() {
        let cell = "<a\n href=\"x.htm\">\n  IfcLengthMeasure\n</a>";
        assert_eq!(extract_type_ref(cell).unwrap(), "IfcLengthMeasure");
    }

    #[test]
    fn table_value_compound() {
        let cell = "<a href='a.htm'>IfcPowerMeasure</a>/<a href='b.htm'>IfcThermodynamicTemperatureMeasure</a>";
        let dt = property_data_type(PropertyKind::TableValue, cell, &NullSink, no_enums).unwrap();
        assert_eq!(
            dt,
            PropertyDataType::TableValue {
                defined_type: "IfcPowerMeasure".into(),
                defining_type: "IfcThermodynamicTemperatureMeasure".into(),
            }
        );
    }

    #[test]
    fn table_value_extra_refs_reported() {
        struct Lines(std::sync::Mutex<Vec<(Level, String)>>);
        impl LogSink for Lines {
            fn log(&self, level: Level, line: &str) {
                self.0.lock().unwrap().push((level, line.to_string()));
            }
        }

        let sink = Lines(Default::default());
        let cell = "<a>IfcPowerMeasure</a>/<a>IfcThermodynamicTemperatureMeasure</a>/<a>IfcTimeMeasure</a>";
        let dt = property_data_type(PropertyKind::TableValue, cell, &sink, no_enums).unwrap();
        assert_eq!(
            dt,
            PropertyDataType::TableValue {
                defined_type: "IfcPowerMeasure".into(),
                defining_type: "IfcThermodynamicTemperatureMeasure".into(),
            }
        );
        let lines = sink.0.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.contains("IfcTimeMeasure"));
    }

    #[test]
    fn table_value_single() {
        let dt = property_data_type(PropertyKind::TableValue, "<a href='x'>IfcLengthMeasure</a>", &NullSink, no_enums).unwrap();
        assert_eq!(
            dt,
            PropertyDataType::TableValue {
                defined_type: "IfcLengthMeasure".into(),
                defining_type: "IfcLengthMeasure".into(),
            }
        );
    }

    #[test]
    fn kind_dispatch() {
        let cell = "<a href='x'>IfcLabel</a>";
        let cases = [
            ("IfcPropertySingleValue", PropertyDataType::SingleValue { measure_type: "IfcLabel".into() }),
            ("ifcpropertyboundedvalue", PropertyDataType::BoundedValue { measure_type: "IfcLabel".into() }),
            ("IFCPROPERTYLISTVALUE", PropertyDataType::ListValue { measure_type: "IfcLabel".into() }),
            ("P_REFERENCEVALUE", PropertyDataType::ReferenceValue { referenced_entity: "IfcLabel".into() }),
        ];
        for (label, expected) in cases {
            let kind = PropertyKind::from_label(label).unwrap();
            assert_eq!(property_data_type(kind, cell, &NullSink, no_enums).unwrap(), expected, "{label}");
        }
    }

    #[test]
    fn enumerated_uses_resolver() {
        let cell = "<a href='PEnum_ElementStatus.htm'>PEnum_ElementStatus</a>";
        let literals: Arc<[EnumLiteral]> = vec![EnumLiteral::new("NEW"), EnumLiteral::new("EXISTING")].into();
        let shared = Arc::clone(&literals);
        let dt = property_data_type(PropertyKind::EnumeratedValue, cell, &NullSink, |name| {
            assert_eq!(name, "PEnum_ElementStatus");
            Ok(shared)
        })
        .unwrap();
        match dt {
            PropertyDataType::EnumeratedValue { enum_name, literals: got } => {
                assert_eq!(enum_name, "PEnum_ElementStatus");
                assert!(Arc::ptr_eq(&got, &literals));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_kind() {
        let err = PropertyKind::from_label(" IfcComplexProperty ").unwrap_err();
        assert!(matches!(err, ParseError::UnknownPropertyKind(l) if l == "IfcComplexProperty"));
    }

    #[test]
    fn quantity_labels() {
        assert_eq!(quantity_measure("IfcQuantityLength"), Some("IfcLengthMeasure"));
        assert_eq!(quantity_measure("ifcquantityweight"), Some("IfcMassMeasure"));
        assert_eq!(quantity_measure("IfcQuantityTime"), Some("IfcTimeMeasure"));
        assert_eq!(quantity_measure("IfcQuantityFoo"), None);
    }
}
