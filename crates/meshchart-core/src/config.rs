//! Conversion configuration
//!
//! All fixed directories hang off a single root (by default `~/.meshery`):
//!
//! ```text
//! <root>/helm-packages/<build-id>/<chart>-<version>.tgz  archive drop point
//! <root>/tmp/helm/<build-id>/<chart>/Chart.yaml          chart metadata
//! <root>/tmp/helm/<build-id>/<chart>/values.yaml         default values
//! <root>/tmp/helm/<build-id>/<chart>/templates/manifest.yaml
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::chart::{CHART_FILE, VALUES_FILE};
use crate::error::{ConvertError, Result};

/// Directory name of the application data root under the home directory
pub const DEFAULT_ROOT_DIR: &str = ".meshery";

/// Where converted archives are dropped before being read back
pub const DEFAULT_PACKAGE_DIR: &str = "helm-packages";

/// Temporary build area, relative to the root
pub const DEFAULT_TEMP_DIR: &str = "tmp/helm";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertConfig {
    /// Application data root; `~/.meshery` when left empty
    #[serde(default)]
    pub root: PathBuf,

    /// Archive output directory, relative to `root`
    #[serde(default = "default_package_dir")]
    pub package_dir: PathBuf,

    /// Build workspace parent directory, relative to `root`
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Files written into every chart
    #[serde(default)]
    pub layout: ChartLayout,
}

fn default_package_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PACKAGE_DIR)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMP_DIR)
}

impl ConvertConfig {
    /// Configuration rooted at an explicit directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            package_dir: default_package_dir(),
            temp_dir: default_temp_dir(),
            layout: ChartLayout::default(),
        }
    }

    /// Configuration rooted at `~/.meshery`
    pub fn from_home() -> Result<Self> {
        Ok(Self::with_root(Self::default_root()?))
    }

    /// Resolve `~/.meshery`
    pub fn default_root() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            ConvertError::io(
                "resolve user home directory",
                "~",
                std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not set"),
            )
        })?;
        Ok(home.join(DEFAULT_ROOT_DIR))
    }

    /// Load configuration from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_root(path, None)
    }

    /// Load configuration from a YAML file, with `root` taking precedence
    /// over the file's root and the home directory
    pub fn load_with_root(path: &Path, root: Option<&Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::io("read configuration", path, e))?;
        let mut config: Self = serde_yaml::from_str(&content).map_err(|e| {
            ConvertError::io(
                "parse configuration",
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            )
        })?;
        if let Some(root) = root {
            config.root = root.to_path_buf();
        } else if config.root.as_os_str().is_empty() {
            config.root = Self::default_root()?;
        }
        config.layout.validate(path)?;
        Ok(config)
    }

    /// Absolute archive output directory
    pub fn package_path(&self) -> PathBuf {
        self.root.join(&self.package_dir)
    }

    /// Absolute parent of all build workspaces
    pub fn temp_path(&self) -> PathBuf {
        self.root.join(&self.temp_dir)
    }
}

/// The set of files the tree builder writes into a chart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    /// Namespace placed in the generated values.yaml
    #[serde(default = "default_namespace")]
    pub values_namespace: String,

    /// File name of the rendered manifest inside `templates/`
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Additional files, relative to the chart root
    #[serde(default)]
    pub extra_files: Vec<ExtraFile>,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_manifest_file() -> String {
    "manifest.yaml".to_string()
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            values_namespace: default_namespace(),
            manifest_file: default_manifest_file(),
            extra_files: Vec::new(),
        }
    }
}

impl ChartLayout {
    /// Check that every file lands inside the chart without replacing a
    /// generated one
    ///
    /// The manifest must be a plain file name inside `templates/`. Extra
    /// files must be relative, stay below the chart root and not collide
    /// with Chart.yaml, values.yaml or the manifest.
    pub fn validate(&self, source: &Path) -> Result<()> {
        let manifest = Path::new(&self.manifest_file);
        let Some(manifest_name) =
            normalize(manifest).filter(|p| p.components().count() == 1)
        else {
            return Err(layout_error(
                source,
                manifest,
                "the manifest file must be a single file name inside templates/",
            ));
        };

        let generated = [
            PathBuf::from(CHART_FILE),
            PathBuf::from(VALUES_FILE),
            Path::new("templates").join(manifest_name),
        ];
        for extra in &self.extra_files {
            let Some(path) = normalize(&extra.path) else {
                return Err(layout_error(
                    source,
                    &extra.path,
                    "chart file paths must be relative and stay inside the chart",
                ));
            };
            if generated.contains(&path) {
                return Err(layout_error(
                    source,
                    &extra.path,
                    "extra files must not replace a generated chart file",
                ));
            }
        }
        Ok(())
    }
}

/// A configured file to add to every chart
///
/// `{{name}}` and `{{version}}` in the contents are replaced with the
/// chart identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraFile {
    pub path: PathBuf,
    pub contents: String,
}

/// The path without `.` components, or `None` when it is empty or leaves
/// the directory it is joined to
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!normalized.as_os_str().is_empty()).then_some(normalized)
}

fn layout_error(source: &Path, path: &Path, reason: &str) -> ConvertError {
    ConvertError::io(
        format!("accept chart file path '{}'", path.display()),
        source,
        std::io::Error::new(std::io::ErrorKind::InvalidInput, reason),
    )
}
