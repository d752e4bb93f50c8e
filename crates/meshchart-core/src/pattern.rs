//! Design (pattern) files
//!
//! Only the parts of a design the conversion needs are modelled: its name,
//! version and components. Unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{ConvertError, Result};

/// A loaded design
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Display name, free text
    #[serde(default)]
    pub name: String,

    /// Design version, free text
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: String,

    #[serde(default)]
    pub components: Vec<PatternComponent>,
}

/// One component of a design
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternComponent {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub component: ComponentDefinition,

    #[serde(default)]
    pub model: Option<ModelReference>,

    /// Resource fields (metadata, spec, data, ...)
    #[serde(default)]
    pub configuration: Option<serde_yaml::Mapping>,
}

impl PatternComponent {
    /// Name used in messages: display name, then id, then kind
    pub fn label(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            id
        } else {
            &self.component.kind
        }
    }
}

/// Kind and API version of a component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentDefinition {
    #[serde(default)]
    pub kind: String,

    /// Kubernetes apiVersion, e.g. `apps/v1`
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelReference {
    #[serde(default)]
    pub name: String,
}

impl Pattern {
    /// Parse a design from YAML (or JSON) text
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load a design file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| ConvertError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Accept unquoted numbers (`version: 1.0`) as their text
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(String::new()),
        Some(serde_yaml::Value::String(s)) => Ok(s),
        Some(serde_yaml::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}
