//! Helm chart source tree
//!
//! Fills a build workspace with the files `helm package` expects:
//! `Chart.yaml`, `values.yaml` and the rendered manifest under
//! `templates/`, plus any extra files named by the [`ChartLayout`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::ChartLayout;
use crate::error::{ConvertError, Result};
use crate::sanitize::sanitize_name;
use crate::workspace::BuildWorkspace;

/// Name of the chart metadata file
pub const CHART_FILE: &str = "Chart.yaml";

/// Name of the default values file
pub const VALUES_FILE: &str = "values.yaml";

/// Chart API version written to Chart.yaml
pub const CHART_API_VERSION: &str = "v2";

/// Name and version a design is packaged under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
}

impl PackageIdentity {
    /// Derive the chart identity from a design's display name and version
    ///
    /// The name is sanitized; an unusable name becomes
    /// [`FALLBACK_NAME`](crate::sanitize::FALLBACK_NAME). The version is
    /// taken as is.
    pub fn derive(display_name: &str, version: &str) -> Self {
        Self {
            name: sanitize_name(display_name),
            version: version.to_string(),
        }
    }

    /// `<name>-<version>.tgz`, the file name Helm gives the archive
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

/// Chart.yaml contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
}

impl ChartMetadata {
    /// Metadata for a generated application chart
    pub fn for_identity(identity: &PackageIdentity) -> Self {
        Self {
            api_version: CHART_API_VERSION.to_string(),
            name: identity.name.clone(),
            version: identity.version.clone(),
            description: Some(format!(
                "Helm chart for '{}' generated by Meshery",
                identity.name
            )),
            chart_type: Some("application".to_string()),
        }
    }

    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Default values.yaml contents
pub fn default_values(chart_name: &str, namespace: &str) -> String {
    format!(
        "# Default values for {}\nglobal:\n  namespace: {}\n",
        chart_name, namespace
    )
}

/// Write the chart files into the workspace
///
/// The layout is checked before anything is written. Any failed write
/// aborts; the caller's workspace guard still cleans up.
pub fn populate(
    workspace: &BuildWorkspace,
    identity: &PackageIdentity,
    manifest: &str,
    layout: &ChartLayout,
) -> Result<()> {
    let chart_dir = workspace.chart_dir();
    layout.validate(chart_dir)?;

    let metadata = ChartMetadata::for_identity(identity);
    let chart_yaml = metadata.to_yaml().map_err(|e| {
        ConvertError::packaging(
            chart_dir.join(CHART_FILE),
            format!("failed to marshal Chart.yaml metadata: {}", e),
        )
    })?;
    write_file(&chart_dir.join(CHART_FILE), chart_yaml.as_bytes())?;

    let values = default_values(&identity.name, &layout.values_namespace);
    write_file(&chart_dir.join(VALUES_FILE), values.as_bytes())?;

    write_file(
        &workspace.templates_dir().join(&layout.manifest_file),
        manifest.as_bytes(),
    )?;

    for extra in &layout.extra_files {
        let path = chart_dir.join(&extra.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConvertError::io("create chart subdirectory", parent, e))?;
        }
        let contents = extra
            .contents
            .replace("{{name}}", &identity.name)
            .replace("{{version}}", &identity.version);
        write_file(&path, contents.as_bytes())?;
    }

    Ok(())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let action = match path.file_name() {
        Some(name) => format!("write {}", name.to_string_lossy()),
        None => "write chart file".to_string(),
    };
    fs::write(path, contents).map_err(|e| ConvertError::io(action, path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConvertConfig, ExtraFile};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn identity() -> PackageIdentity {
        PackageIdentity::derive("My Service!", "1.0.0")
    }

    #[test]
    fn test_derive_identity() {
        let id = identity();
        assert_eq!(id.name, "my-service");
        assert_eq!(id.version, "1.0.0");
        assert_eq!(id.archive_name(), "my-service-1.0.0.tgz");
    }

    #[test]
    fn test_empty_name_uses_fallback() {
        let id = PackageIdentity::derive("", "0.1.0");
        assert_eq!(id.name, "meshery-design");
    }

    #[test]
    fn test_metadata_yaml() {
        let yaml = ChartMetadata::for_identity(&identity()).to_yaml().unwrap();
        assert!(yaml.contains("apiVersion: v2"));
        assert!(yaml.contains("name: my-service"));
        assert!(yaml.contains("type: application"));

        let parsed = ChartMetadata::parse(&yaml).unwrap();
        assert_eq!(parsed.name, "my-service");
        assert_eq!(parsed.version, "1.0.0");
        assert_eq!(
            parsed.description.as_deref(),
            Some("Helm chart for 'my-service' generated by Meshery")
        );
    }

    #[test]
    fn test_numeric_looking_version_stays_a_string() {
        let id = PackageIdentity::derive("app", "1.0");
        let yaml = ChartMetadata::for_identity(&id).to_yaml().unwrap();
        let parsed = ChartMetadata::parse(&yaml).unwrap();
        assert_eq!(parsed.version, "1.0");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(
            default_values("my-app", "default"),
            "# Default values for my-app\nglobal:\n  namespace: default\n"
        );
    }

    #[test]
    fn test_populate_writes_three_files() {
        let temp = TempDir::new().unwrap();
        let config = ConvertConfig::with_root(temp.path());
        let id = identity();
        let ws = BuildWorkspace::open(&config, &id.name).unwrap();

        let manifest = "kind: Deployment\nmetadata:\n  name: web\n";
        populate(&ws, &id, manifest, &config.layout).unwrap();

        let chart = fs::read_to_string(ws.chart_dir().join(CHART_FILE)).unwrap();
        assert_eq!(ChartMetadata::parse(&chart).unwrap().name, "my-service");

        let values = fs::read_to_string(ws.chart_dir().join(VALUES_FILE)).unwrap();
        assert!(values.contains("namespace: default"));

        let written = fs::read_to_string(ws.templates_dir().join("manifest.yaml")).unwrap();
        assert_eq!(written, manifest);

        let mut entries: Vec<_> = fs::read_dir(ws.chart_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["Chart.yaml", "templates", "values.yaml"]);
    }

    #[test]
    fn test_populate_writes_extra_files() {
        let temp = TempDir::new().unwrap();
        let mut config = ConvertConfig::with_root(temp.path());
        config.layout.extra_files.push(ExtraFile {
            path: PathBuf::from("templates/NOTES.txt"),
            contents: "Chart {{name}} ({{version}}) was generated by Meshery.\n".to_string(),
        });
        config.layout.extra_files.push(ExtraFile {
            path: PathBuf::from("docs/README.md"),
            contents: "# {{name}}\n".to_string(),
        });

        let id = identity();
        let ws = BuildWorkspace::open(&config, &id.name).unwrap();
        populate(&ws, &id, "", &config.layout).unwrap();

        let notes = fs::read_to_string(ws.templates_dir().join("NOTES.txt")).unwrap();
        assert_eq!(notes, "Chart my-service (1.0.0) was generated by Meshery.\n");
        let readme = fs::read_to_string(ws.chart_dir().join("docs/README.md")).unwrap();
        assert_eq!(readme, "# my-service\n");
    }

    #[test]
    fn test_populate_write_failure_is_io_error() {
        let temp = TempDir::new().unwrap();
        let config = ConvertConfig::with_root(temp.path());
        let id = identity();
        let ws = BuildWorkspace::open(&config, &id.name).unwrap();

        // A directory where the manifest file should go
        fs::create_dir(ws.templates_dir().join("manifest.yaml")).unwrap();

        let err = populate(&ws, &id, "kind: Pod", &config.layout).unwrap_err();
        match err {
            ConvertError::Io { action, path, .. } => {
                assert_eq!(action, "write manifest.yaml");
                assert!(path.ends_with("templates/manifest.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_populate_rejects_escaping_layout_before_writing() {
        let temp = TempDir::new().unwrap();
        let mut config = ConvertConfig::with_root(temp.path());
        config.layout.extra_files.push(ExtraFile {
            path: PathBuf::from("../../../escaped.txt"),
            contents: "outside".to_string(),
        });
        let id = identity();
        let ws = BuildWorkspace::open(&config, &id.name).unwrap();

        let err = populate(&ws, &id, "kind: Pod", &config.layout).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
        assert!(!ws.chart_dir().join(CHART_FILE).exists());
        assert!(!temp.path().join("tmp/escaped.txt").exists());
    }
}
