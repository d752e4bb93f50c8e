//! Meshchart Core - package Meshery designs as Helm charts
//!
//! This crate turns a design (pattern) into a Helm chart archive:
//! - `Pattern`: the loaded design, read for its name, version and components
//! - `Renderer`: design → Kubernetes manifest text
//! - `BuildWorkspace`: an isolated temporary chart tree, removed on drop
//! - `Packager`: chart tree → `.tgz` archive
//! - `Converter`: the pipeline tying them together
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use meshchart_core::{ConvertConfig, Converter};
//!
//! let converter = Converter::new(ConvertConfig::from_home().unwrap());
//! let packaged = converter.convert(Path::new("./design.yaml")).unwrap();
//!
//! std::fs::write(packaged.file_name(), &packaged.archive).unwrap();
//! ```

pub mod archive;
pub mod chart;
pub mod config;
pub mod converter;
pub mod error;
pub mod packager;
pub mod pattern;
pub mod renderer;
pub mod sanitize;
pub mod workspace;

pub use archive::{ArchiveEntry, list_archive, read_chart_metadata};
pub use chart::{ChartMetadata, PackageIdentity};
pub use config::{ChartLayout, ConvertConfig, ExtraFile};
pub use converter::{Converter, PackagedChart, convert};
pub use error::{ConvertError, Result};
pub use packager::{ArchivePackager, HelmCliPackager, Packager};
pub use pattern::{Pattern, PatternComponent};
pub use renderer::{KubernetesRenderer, Renderer};
pub use sanitize::{FALLBACK_NAME, sanitize_name};
pub use workspace::{BuildId, BuildWorkspace};
