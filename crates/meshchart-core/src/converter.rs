//! Design to Helm chart conversion
//!
//! Sequences the pipeline: render the manifest, derive the chart identity,
//! open a build workspace, write the chart tree, package it, read the
//! archive back and remove every file the conversion created.

use std::fs;
use std::path::Path;

use crate::chart::{self, PackageIdentity};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::packager::{ArchivePackager, Packager};
use crate::pattern::Pattern;
use crate::renderer::{KubernetesRenderer, Renderer};
use crate::workspace::BuildWorkspace;

/// Archive bytes of a converted design
#[derive(Debug, Clone)]
pub struct PackagedChart {
    /// Chart name and version the archive was built under
    pub identity: PackageIdentity,
    /// Archive contents, exactly as the packager wrote them
    pub archive: Vec<u8>,
}

impl PackagedChart {
    /// `<name>-<version>.tgz`
    pub fn file_name(&self) -> String {
        self.identity.archive_name()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.archive
    }
}

/// Converts designs into packaged Helm charts
pub struct Converter {
    config: ConvertConfig,
    renderer: Box<dyn Renderer>,
    packager: Box<dyn Packager>,
}

impl Converter {
    /// A converter using the Kubernetes renderer and the in-process packager
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            renderer: Box::new(KubernetesRenderer::new()),
            packager: Box::new(ArchivePackager::new()),
        }
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_packager(mut self, packager: impl Packager + 'static) -> Self {
        self.packager = Box::new(packager);
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Load a design file and convert it
    pub fn convert(&self, pattern_path: &Path) -> Result<PackagedChart> {
        let pattern = Pattern::load(pattern_path)?;
        self.convert_pattern(&pattern)
    }

    /// Convert an already loaded design
    pub fn convert_pattern(&self, pattern: &Pattern) -> Result<PackagedChart> {
        let manifest = self.renderer.render(pattern)?;
        tracing::info!("K8s manifest generated, size: {} bytes", manifest.len());

        let identity = PackageIdentity::derive(&pattern.name, &pattern.version);
        let archive = self.package_manifest(&identity, &manifest)?;

        Ok(PackagedChart { identity, archive })
    }

    /// Package already rendered manifest text under `identity`
    ///
    /// The build workspace, including this build's drop directory under the
    /// package directory, is removed on every return path. The archive itself
    /// is removed as soon as its bytes are in memory.
    pub fn package_manifest(&self, identity: &PackageIdentity, manifest: &str) -> Result<Vec<u8>> {
        let workspace = BuildWorkspace::open(&self.config, &identity.name)?;

        chart::populate(&workspace, identity, manifest, &self.config.layout)?;

        tracing::info!(
            build_id = %workspace.build_id(),
            "Packaging chart from: {} to: {}",
            workspace.chart_dir().display(),
            workspace.output_dir().display()
        );
        let archive_path = self
            .packager
            .package(workspace.chart_dir(), workspace.output_dir())?;

        let data = fs::read(&archive_path)
            .map_err(|e| ConvertError::io("read packaged chart", &archive_path, e))?;
        tracing::info!("Packaged chart size: {} bytes", data.len());

        if let Err(e) = fs::remove_file(&archive_path) {
            tracing::warn!(
                "Failed to clean up packaged chart {}: {}",
                archive_path.display(),
                e
            );
        }

        workspace.release();
        Ok(data)
    }
}

/// Convert a design file using `~/.meshery` and the default renderer and packager
pub fn convert(pattern_path: &Path) -> Result<PackagedChart> {
    Converter::new(ConvertConfig::from_home()?).convert(pattern_path)
}
