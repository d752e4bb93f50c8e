//! Manifest rendering
//!
//! A [`Renderer`] turns a design into Kubernetes manifest text. The
//! pipeline writes that text verbatim into the chart's templates.

use serde_yaml::{Mapping, Value};

use crate::error::{ConvertError, Result};
use crate::pattern::{Pattern, PatternComponent};
use crate::sanitize::sanitize_name;

/// Renders a design to manifest text
pub trait Renderer: Send + Sync {
    fn render(&self, pattern: &Pattern) -> Result<String>;
}

/// Renders each component as one Kubernetes object
///
/// The object is `apiVersion`/`kind` from the component definition followed
/// by the component's configuration. `metadata.name` falls back to the
/// sanitized display name. Documents are separated with `---`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubernetesRenderer;

impl KubernetesRenderer {
    pub fn new() -> Self {
        Self
    }

    fn render_component(pattern: &Pattern, component: &PatternComponent) -> Result<String> {
        let definition = &component.component;
        if definition.kind.is_empty() {
            return Err(ConvertError::render(
                &pattern.name,
                format!("component '{}' has no kind", component.label()),
            ));
        }
        if definition.version.is_empty() {
            return Err(ConvertError::render(
                &pattern.name,
                format!("component '{}' has no apiVersion", component.label()),
            ));
        }

        let configuration = component.configuration.clone().unwrap_or_default();

        let mut metadata = match configuration.get("metadata") {
            Some(Value::Mapping(m)) => m.clone(),
            _ => Mapping::new(),
        };
        if !metadata.contains_key("name") {
            metadata.insert(
                Value::from("name"),
                Value::from(sanitize_name(&component.display_name)),
            );
        }

        let mut object = Mapping::new();
        object.insert(Value::from("apiVersion"), Value::from(definition.version.clone()));
        object.insert(Value::from("kind"), Value::from(definition.kind.clone()));
        object.insert(Value::from("metadata"), Value::Mapping(metadata));
        for (key, value) in configuration {
            let reserved = matches!(key.as_str(), Some("apiVersion" | "kind" | "metadata"));
            if !reserved {
                object.insert(key, value);
            }
        }

        serde_yaml::to_string(&Value::Mapping(object)).map_err(|e| {
            ConvertError::render(
                &pattern.name,
                format!("component '{}' could not be serialized: {}", component.label(), e),
            )
        })
    }
}

impl Renderer for KubernetesRenderer {
    fn render(&self, pattern: &Pattern) -> Result<String> {
        let documents = pattern
            .components
            .iter()
            .map(|c| Self::render_component(pattern, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(documents.join("---\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Pattern {
        Pattern::parse(yaml).unwrap()
    }

    #[test]
    fn test_render_single_component() {
        let pattern = parse(
            r#"
name: shop
version: 1.0.0
components:
  - displayName: Web Frontend
    component:
      kind: Deployment
      version: apps/v1
    configuration:
      spec:
        replicas: 2
"#,
        );

        let manifest = KubernetesRenderer::new().render(&pattern).unwrap();
        assert_eq!(
            manifest,
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web-frontend\nspec:\n  replicas: 2\n"
        );
    }

    #[test]
    fn test_configured_metadata_wins() {
        let pattern = parse(
            r#"
name: shop
components:
  - displayName: ignored
    component:
      kind: ConfigMap
      version: v1
    configuration:
      metadata:
        name: settings
        namespace: shop
      data:
        mode: prod
"#,
        );

        let manifest = KubernetesRenderer::new().render(&pattern).unwrap();
        let object: Value = serde_yaml::from_str(&manifest).unwrap();
        assert_eq!(object["metadata"]["name"], Value::from("settings"));
        assert_eq!(object["metadata"]["namespace"], Value::from("shop"));
        assert_eq!(object["data"]["mode"], Value::from("prod"));
    }

    #[test]
    fn test_multiple_components_are_separate_documents() {
        let pattern = parse(
            r#"
name: shop
components:
  - displayName: web
    component: { kind: Deployment, version: apps/v1 }
  - displayName: web
    component: { kind: Service, version: v1 }
"#,
        );

        let manifest = KubernetesRenderer::new().render(&pattern).unwrap();
        assert_eq!(manifest.matches("---\n").count(), 1);
        assert!(manifest.contains("kind: Deployment"));
        assert!(manifest.contains("kind: Service"));
    }

    #[test]
    fn test_empty_pattern_renders_empty_manifest() {
        let manifest = KubernetesRenderer::new().render(&Pattern::default()).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_missing_kind_is_render_error() {
        let pattern = parse(
            r#"
name: shop
components:
  - displayName: mystery
    component: { version: v1 }
"#,
        );

        let err = KubernetesRenderer::new().render(&pattern).unwrap_err();
        assert!(matches!(err, ConvertError::Render { .. }));
        assert!(err.to_string().contains("component 'mystery' has no kind"));
    }

    #[test]
    fn test_missing_api_version_is_render_error() {
        let pattern = parse(
            r#"
name: shop
components:
  - displayName: web
    component: { kind: Deployment }
"#,
        );

        let err = KubernetesRenderer::new().render(&pattern).unwrap_err();
        assert!(err.to_string().contains("has no apiVersion"));
    }
}
