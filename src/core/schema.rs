//! Class and property schema.
//!
//! A compiled XUR file is not self-describing: which property a mask bit
//! selects, and how its value is encoded, comes from the class schema. The
//! order of definitions within a class is therefore part of the format.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Declared value type of a property definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Bool,
    Integer,
    Unsigned,
    Float,
    String,
    Color,
    Vector,
    Quaternion,
    /// Compound value: a nested property list over the definition's children.
    Object,
    /// Opaque custom data. No codec exists for it.
    Custom,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Definition of one property at one class level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub kind: PropertyKind,
    /// Nested definitions of an `Object` property, in mask order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<PropertyDefinition>>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self { name: name.into(), kind, children: Vec::new() }
    }

    /// Create an `Object` definition with nested definitions.
    pub fn object(name: impl Into<String>, children: Vec<PropertyDefinition>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Object,
            children: children.into_iter().map(Arc::new).collect(),
        }
    }
}

/// Property definitions contributed by one class of a hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassSchema {
    pub name: String,
    /// Direct base class, `None` for a hierarchy root.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub properties: Vec<Arc<PropertyDefinition>>,
}

impl ClassSchema {
    pub fn new(name: impl Into<String>, base: Option<&str>) -> Self {
        Self { name: name.into(), base: base.map(str::to_string), properties: Vec::new() }
    }

    /// Append a property definition.
    pub fn with_property(mut self, definition: PropertyDefinition) -> Self {
        self.properties.push(Arc::new(definition));
        self
    }

    /// Find a definition declared by this class (not its bases).
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyDefinition>> {
        self.properties.iter().find(|d| d.name == name)
    }
}

/// Ordered ancestor-to-self chain: root class first, target class last.
pub type Hierarchy = Vec<Arc<ClassSchema>>;

/// Source of class hierarchies, read-only for the duration of an operation.
///
/// Implementations are shared across concurrent reads, hence `Send + Sync`.
pub trait ClassSchemaProvider: Send + Sync {
    /// Hierarchy for an exact class name, or `None` if the class is unknown.
    fn hierarchy_for(&self, class_name: &str) -> Option<Hierarchy>;

    /// Like [`hierarchy_for`](Self::hierarchy_for) but unknown classes are an error.
    fn require_hierarchy(&self, class_name: &str) -> Result<Hierarchy> {
        self.hierarchy_for(class_name)
            .ok_or_else(|| Error::ClassNotFound(class_name.to_string()))
    }
}

/// Find a property definition anywhere in a hierarchy by name.
pub fn find_definition(hierarchy: &[Arc<ClassSchema>], name: &str) -> Option<Arc<PropertyDefinition>> {
    hierarchy.iter().find_map(|class| class.property(name).cloned())
}

#[derive(Deserialize)]
struct SchemaDocument {
    classes: Vec<ClassSchema>,
}

/// In-memory schema provider keyed by class name.
#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    classes: HashMap<String, Arc<ClassSchema>>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any previous class of the same name.
    pub fn insert(&mut self, class: ClassSchema) -> &mut Self {
        self.classes.insert(class.name.clone(), Arc::new(class));
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_class(mut self, class: ClassSchema) -> Self {
        self.insert(class);
        self
    }

    /// Look up a single class.
    pub fn class(&self, name: &str) -> Option<&Arc<ClassSchema>> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Parse a JSON document of the form `{"classes": [ ... ]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        let mut set = Self::new();
        for class in doc.classes {
            if set.classes.contains_key(&class.name) {
                return Err(Error::InvalidSchema(format!("class {} declared twice", class.name)));
            }
            set.insert(class);
        }
        Ok(set)
    }

    /// Load a JSON schema document from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json_str(&text)
    }
}

impl ClassSchemaProvider for SchemaSet {
    fn hierarchy_for(&self, class_name: &str) -> Option<Hierarchy> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(class_name);

        while let Some(name) = current {
            // A base cycle has no root, so the class cannot be resolved.
            if !seen.insert(name) {
                return None;
            }
            let class = self.classes.get(name)?;
            chain.push(class.clone());
            current = class.base.as_deref();
        }

        chain.reverse();
        Some(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> SchemaSet {
        SchemaSet::new()
            .with_class(
                ClassSchema::new("XuiElement", None)
                    .with_property(PropertyDefinition::new("Id", PropertyKind::String))
                    .with_property(PropertyDefinition::new("Position", PropertyKind::Vector)),
            )
            .with_class(
                ClassSchema::new("XuiControl", Some("XuiElement"))
                    .with_property(PropertyDefinition::new("Enabled", PropertyKind::Bool)),
            )
            .with_class(ClassSchema::new("XuiButton", Some("XuiControl")))
    }

    #[test]
    fn test_hierarchy_root_first() {
        let set = sample_set();
        let hierarchy = set.hierarchy_for("XuiButton").unwrap();
        let names: Vec<&str> = hierarchy.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["XuiElement", "XuiControl", "XuiButton"]);
    }

    #[test]
    fn test_unknown_class() {
        let set = sample_set();
        assert!(set.hierarchy_for("XuiSlider").is_none());
        let err = set.require_hierarchy("XuiSlider").unwrap_err();
        assert!(matches!(err, Error::ClassNotFound(name) if name == "XuiSlider"));
    }

    #[test]
    fn test_missing_base_and_cycle() {
        let set = SchemaSet::new()
            .with_class(ClassSchema::new("Orphan", Some("Nowhere")))
            .with_class(ClassSchema::new("A", Some("B")))
            .with_class(ClassSchema::new("B", Some("A")));
        assert!(set.hierarchy_for("Orphan").is_none());
        assert!(set.hierarchy_for("A").is_none());
    }

    #[test]
    fn test_find_definition() {
        let set = sample_set();
        let hierarchy = set.hierarchy_for("XuiButton").unwrap();
        let def = find_definition(&hierarchy, "Enabled").unwrap();
        assert_eq!(def.kind, PropertyKind::Bool);
        assert!(find_definition(&hierarchy, "Text").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "classes": [
                { "name": "XuiElement", "properties": [
                    { "name": "Id", "kind": "String" },
                    { "name": "Fill", "kind": "Object", "children": [
                        { "name": "FillType", "kind": "Integer" },
                        { "name": "FillColor", "kind": "Color" }
                    ] }
                ] },
                { "name": "XuiText", "base": "XuiElement" }
            ]
        }"#;
        let set = SchemaSet::from_json_str(json).unwrap();
        assert_eq!(set.len(), 2);
        let hierarchy = set.hierarchy_for("XuiText").unwrap();
        assert_eq!(hierarchy.len(), 2);
        let fill = find_definition(&hierarchy, "Fill").unwrap();
        assert_eq!(fill.children.len(), 2);
        assert_eq!(fill.children[1].kind, PropertyKind::Color);
    }

    #[test]
    fn test_from_json_duplicate_class() {
        let json = r#"{ "classes": [ { "name": "A" }, { "name": "A" } ] }"#;
        assert!(matches!(SchemaSet::from_json_str(json), Err(Error::InvalidSchema(_))));
    }
}
