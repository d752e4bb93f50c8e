//! Chart packaging primitives
//!
//! A [`Packager`] turns a chart source directory into an archive file in a
//! destination directory and reports where it put it. Packaging is
//! deterministic for a given tree, so failures are never retried.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::archive::create_chart_archive;
use crate::chart::{CHART_FILE, ChartMetadata, PackageIdentity};
use crate::error::{ConvertError, Result};

/// Packages a chart source tree into an archive
pub trait Packager: Send + Sync {
    /// Package `chart_dir` into `dest_dir`, returning the archive path
    fn package(&self, chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf>;
}

/// Builds Helm chart archives in-process
///
/// Chart.yaml is checked the way `helm package` checks it before anything
/// is written: an apiVersion, a name usable as a directory, and a version
/// Helm can read as SemVer. The archive keeps the version exactly as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchivePackager;

impl ArchivePackager {
    pub fn new() -> Self {
        Self
    }

    fn load_metadata(chart_dir: &Path) -> Result<ChartMetadata> {
        let chart_path = chart_dir.join(CHART_FILE);
        let content = fs::read_to_string(&chart_path).map_err(|e| {
            ConvertError::packaging(chart_dir, format!("unable to read {}: {}", CHART_FILE, e))
        })?;
        let metadata = ChartMetadata::parse(&content).map_err(|e| {
            ConvertError::packaging(chart_dir, format!("invalid {}: {}", CHART_FILE, e))
        })?;
        validate_metadata(&metadata).map_err(|message| ConvertError::packaging(chart_dir, message))?;
        Ok(metadata)
    }
}

impl Packager for ArchivePackager {
    fn package(&self, chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let metadata = Self::load_metadata(chart_dir)?;
        let identity = PackageIdentity {
            name: metadata.name,
            version: metadata.version,
        };

        let output = dest_dir.join(identity.archive_name());
        create_chart_archive(chart_dir, &identity.name, &output).map_err(|e| {
            // Never leave a truncated archive in the drop point
            match fs::remove_file(&output) {
                Ok(()) => {}
                Err(remove_err) if remove_err.kind() == std::io::ErrorKind::NotFound => {}
                Err(remove_err) => tracing::warn!(
                    "Failed to remove partial archive {}: {}",
                    output.display(),
                    remove_err
                ),
            }
            ConvertError::packaging(chart_dir, format!("failed to write {}: {}", output.display(), e))
        })
    }
}

fn validate_metadata(metadata: &ChartMetadata) -> std::result::Result<(), String> {
    if metadata.api_version.is_empty() {
        return Err("validation: chart.metadata.apiVersion is required".to_string());
    }
    if metadata.name.is_empty() {
        return Err("validation: chart.metadata.name is required".to_string());
    }
    if metadata.name.contains(['/', '\\']) || metadata.name == "." || metadata.name == ".." {
        return Err(format!(
            "validation: chart.metadata.name \"{}\" is invalid",
            metadata.name
        ));
    }
    if metadata.version.is_empty() {
        return Err("validation: chart.metadata.version is required".to_string());
    }
    if parse_chart_version(&metadata.version).is_none() {
        return Err(format!(
            "validation: chart.metadata.version \"{}\" is invalid",
            metadata.version
        ));
    }
    Ok(())
}

/// Read a chart version the way Helm does
///
/// A leading `v` is dropped and missing minor or patch numbers count as
/// zero, so `1.5` reads as `1.5.0` and `v2` as `2.0.0`.
fn parse_chart_version(raw: &str) -> Option<semver::Version> {
    let version = raw.strip_prefix('v').unwrap_or(raw);
    let (core, suffix) = version.split_at(version.find(['-', '+']).unwrap_or(version.len()));

    let numbers = core
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse::<u64>().ok()
        })
        .collect::<Option<Vec<_>>>()?;
    if numbers.len() > 3 {
        return None;
    }

    let mut padded = numbers.iter().map(u64::to_string).collect::<Vec<_>>();
    padded.resize(3, "0".to_string());
    semver::Version::parse(&format!("{}{}", padded.join("."), suffix)).ok()
}

/// Runs `helm package` from a Helm installation
#[derive(Debug, Clone)]
pub struct HelmCliPackager {
    binary: PathBuf,
}

impl Default for HelmCliPackager {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl HelmCliPackager {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Packager for HelmCliPackager {
    fn package(&self, chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let output = Command::new(&self.binary)
            .arg("package")
            .arg(chart_dir)
            .arg("--destination")
            .arg(dest_dir)
            .output()
            .map_err(|e| {
                ConvertError::packaging(
                    chart_dir,
                    format!("failed to run {}: {}", self.binary.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::packaging(chart_dir, stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_saved_path(&stdout).ok_or_else(|| {
            ConvertError::packaging(
                chart_dir,
                format!("could not find the archive path in helm output: {}", stdout.trim()),
            )
        })
    }
}

/// Extract the path from "Successfully packaged chart and saved it to: <path>"
fn parse_saved_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .find_map(|line| line.split_once("saved it to:"))
        .map(|(_, path)| PathBuf::from(path.trim()))
        .filter(|path| !path.as_os_str().is_empty())
}
