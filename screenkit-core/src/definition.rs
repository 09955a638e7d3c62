//! Parsed screen definitions.
//!
//! Widget files are parsed elsewhere; this crate receives their action
//! sections as generic elements, loadable from YAML or JSON:
//!
//! ```yaml
//! name: FindOrders
//! actions:
//!   - tag: set
//!     attributes: { field: viewSize, value: "20", type: Integer }
//!   - tag: entity-one
//!     attributes: { entity-name: OrderHeader, value-name: orderHeader }
//! ```

use crate::error::DefinitionError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A generic definition element: tag, attributes and child elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,

    #[serde(default, deserialize_with = "scalar_attributes")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<Element>,
}

/// Attribute values may be written as plain YAML scalars (`global: true`)
fn scalar_attributes<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Scalar::Str(s) => s,
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
            };
            (k, v)
        })
        .collect())
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute value, or the empty string when absent
    pub fn attr(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn has_attr(&self, name: &str) -> bool {
        !self.attr(name).is_empty()
    }

    /// Attribute value, failing when absent or empty
    pub fn require_attr(&self, name: &str) -> Result<&str, DefinitionError> {
        match self.attr(name) {
            "" => Err(DefinitionError::MissingAttribute {
                tag: self.tag.clone(),
                attribute: name.to_string(),
            }),
            value => Ok(value),
        }
    }

    /// `"true"` or `"false"` attribute with a default when absent
    pub fn bool_attr(&self, name: &str, default: bool) -> Result<bool, DefinitionError> {
        match self.attr(name) {
            "" => Ok(default),
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(DefinitionError::InvalidAttribute {
                tag: self.tag.clone(),
                attribute: name.to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn first_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

/// The action section of one screen
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenDefinition {
    pub name: String,

    #[serde(default)]
    pub actions: Vec<Element>,
}

impl ScreenDefinition {
    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&contents)?)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, DefinitionError> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Split `resource#name` at the last `#`; without one the whole string is
/// the resource and the name is empty.
pub fn split_combined(location: &str) -> (&str, &str) {
    match location.rfind('#') {
        Some(idx) => (&location[..idx], &location[idx + 1..]),
        None => (location, ""),
    }
}
