use std::collections::HashSet;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Whether a document defines a property set or a quantity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    PropertySet,
    QuantitySet,
}

impl ItemKind {
    /// Cells per row in the properties table.
    pub fn expected_columns(self) -> usize {
        match self {
            ItemKind::PropertySet => 4,
            ItemKind::QuantitySet => 3,
        }
    }

    /// Infer the kind from a schema or file name (`Qto_…` / `Pset_…`).
    pub fn from_name(name: &str) -> Option<ItemKind> {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("qto_") {
            Some(ItemKind::QuantitySet)
        } else if lower.starts_with("pset_") {
            Some(ItemKind::PropertySet)
        } else {
            None
        }
    }
}

/// One literal of an enumerated property type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumLiteral {
    pub name: String,
    /// Localized aliases; never filled by the page parser.
    pub aliases: Vec<LiteralAlias>,
}

impl EnumLiteral {
    pub fn new(name: impl Into<String>) -> Self {
        EnumLiteral {
            name: name.into(),
            aliases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LiteralAlias {
    pub lang: String,
    pub label: String,
}

/// Shape of a property's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind")]
pub enum PropertyDataType {
    SingleValue {
        measure_type: String,
    },
    BoundedValue {
        measure_type: String,
    },
    ListValue {
        measure_type: String,
    },
    ReferenceValue {
        referenced_entity: String,
    },
    EnumeratedValue {
        enum_name: String,
        /// Shared with the enumeration cache and every other user of `enum_name`.
        literals: Arc<[EnumLiteral]>,
    },
    TableValue {
        defined_type: String,
        defining_type: String,
    },
}

/// A named property or quantity. Equality (and hashing) covers the name and
/// the full descriptor, which is what collapses duplicate rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyEntry {
    pub name: String,
    pub data_type: PropertyDataType,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDefinition {
    pub name: String,
    pub schema_version: String,
    pub applicable_classes: Vec<String>,
    pub applicable_type: Option<String>,
    pub predefined_type_hint: Option<String>,
    #[serde(serialize_with = "serialize_sorted")]
    pub properties: HashSet<PropertyEntry>,
}

impl SchemaDefinition {
    /// Properties ordered by name, then by descriptor debug form for ties.
    pub fn sorted_properties(&self) -> Vec<&PropertyEntry> {
        sorted(&self.properties)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn sorted(properties: &HashSet<PropertyEntry>) -> Vec<&PropertyEntry> {
    let mut props: Vec<&PropertyEntry> = properties.iter().collect();
    props.sort_by_cached_key(|p| (p.name.clone(), format!("{:?}", p.data_type)));
    props
}

fn serialize_sorted<S: Serializer>(properties: &HashSet<PropertyEntry>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(sorted(properties))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_name() {
        assert_eq!(ItemKind::from_name("Qto_WallBaseQuantities"), Some(ItemKind::QuantitySet));
        assert_eq!(ItemKind::from_name("PSET_WallCommon.htm"), Some(ItemKind::PropertySet));
        assert_eq!(ItemKind::from_name("PEnum_ElementStatus"), None);
    }

    #[test]
    fn identical_entries_collapse() {
        let entry = || PropertyEntry {
            name: "IsExternal".into(),
            data_type: PropertyDataType::SingleValue {
                measure_type: "IfcBoolean".into(),
            },
        };
        let mut set = HashSet::new();
        set.insert(entry());
        set.insert(entry());
        set.insert(PropertyEntry {
            name: "IsExternal".into(),
            data_type: PropertyDataType::ListValue {
                measure_type: "IfcBoolean".into(),
            },
        });
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn sorted_by_name() {
        let single = |n: &str| PropertyEntry {
            name: n.into(),
            data_type: PropertyDataType::SingleValue {
                measure_type: "IfcLabel".into(),
            },
        };
        let schema = SchemaDefinition {
            name: "Pset_Test".into(),
            schema_version: "IFC4".into(),
            applicable_classes: vec![],
            applicable_type: None,
            predefined_type_hint: None,
            properties: [single("Zeta"), single("Alpha"), single("Mid")].into_iter().collect(),
        };
        let names: Vec<&str> = schema.sorted_properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Mid", "Zeta"]);
        assert!(schema.property("Mid").is_some());

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["properties"][0]["name"], "Alpha");
        assert_eq!(json["properties"][2]["data_type"]["kind"], "SingleValue");
        assert_eq!(json["properties"][2]["data_type"]["measure_type"], "IfcLabel");
    }
}
