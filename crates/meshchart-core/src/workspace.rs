//! Isolated build workspaces
//!
//! Each conversion assembles its chart under
//! `<temp>/<build-id>/<chart>/` and has the packager drop the archive into
//! `<packages>/<build-id>/`, where the build id is a fresh random token.
//! Concurrent conversions therefore never share files, even for identical
//! chart names and versions. The workspace removes both build id
//! directories when dropped, whichever way the conversion ended.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};

/// Random identifier scoping one conversion's temporary files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(String);

impl BuildId {
    /// 128 random bits as 32 lowercase hex characters
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A uniquely named temporary chart source tree
#[derive(Debug)]
pub struct BuildWorkspace {
    build_id: BuildId,
    build_dir: PathBuf,
    chart_dir: PathBuf,
    templates_dir: PathBuf,
    output_dir: PathBuf,
    released: bool,
}

impl BuildWorkspace {
    /// Create `<temp>/<build-id>/<chart_name>/templates` and `<packages>/<build-id>`
    ///
    /// Parents that already exist are reused; the build id directories
    /// themselves are always new.
    pub fn open(config: &ConvertConfig, chart_name: &str) -> Result<Self> {
        if !is_single_component(chart_name) {
            return Err(ConvertError::io(
                "use chart name as a directory",
                chart_name,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "chart name must be a single path component",
                ),
            ));
        }

        let temp_root = config.temp_path();
        fs::create_dir_all(&temp_root)
            .map_err(|e| ConvertError::io("create temp directory", &temp_root, e))?;

        let build_id = BuildId::generate();
        let build_dir = temp_root.join(build_id.as_str());
        fs::create_dir(&build_dir)
            .map_err(|e| ConvertError::io("create build directory", &build_dir, e))?;

        let chart_dir = build_dir.join(chart_name);
        let templates_dir = chart_dir.join("templates");
        let output_dir = config.package_path().join(build_id.as_str());

        // Owned from here on: an early return drops the workspace and cleans up
        let workspace = Self {
            build_id,
            build_dir,
            chart_dir,
            templates_dir,
            output_dir,
            released: false,
        };

        fs::create_dir_all(&workspace.templates_dir).map_err(|e| {
            ConvertError::io("create templates directory", &workspace.templates_dir, e)
        })?;

        let package_root = config.package_path();
        fs::create_dir_all(&package_root)
            .map_err(|e| ConvertError::io("create package directory", &package_root, e))?;
        fs::create_dir(&workspace.output_dir).map_err(|e| {
            ConvertError::io("create package output directory", &workspace.output_dir, e)
        })?;

        tracing::debug!(
            build_id = %workspace.build_id,
            path = %workspace.chart_dir.display(),
            "Opened build workspace"
        );

        Ok(workspace)
    }

    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// `<temp>/<build-id>`, the directory removed on release
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Chart source root, containing Chart.yaml
    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// `<packages>/<build-id>`, where this build's archive is written
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Remove the workspace now instead of at drop
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        remove_tree(&self.build_dir, "build directory");
        remove_tree(&self.output_dir, "package output directory");
        tracing::debug!(build_id = %self.build_id, "Released build workspace");
    }
}

impl Drop for BuildWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Cleanup failures only leak temporary files, so they are logged
fn remove_tree(path: &Path, what: &str) {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!("Failed to clean up {} {}: {}", what, path.display(), e);
        }
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
