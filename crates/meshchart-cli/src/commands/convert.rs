//! Convert command - package a design as a Helm chart archive

use console::style;
use meshchart_core::{ConvertConfig, Converter, HelmCliPackager};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

use crate::util::format_size;

pub fn run(
    pattern_path: &Path,
    output: Option<&Path>,
    root: Option<&Path>,
    config_path: Option<&Path>,
    helm_bin: Option<&Path>,
) -> Result<()> {
    let config = load_config(root, config_path)?;

    let mut converter = Converter::new(config);
    if let Some(bin) = helm_bin {
        converter = converter.with_packager(HelmCliPackager::new(bin));
    }

    println!(
        "{} {}",
        style("Converting").cyan().bold(),
        pattern_path.display()
    );

    let packaged = converter
        .convert(pattern_path)
        .into_diagnostic()
        .wrap_err("Conversion failed")?;

    let output_path = resolve_output(output, &packaged.file_name())?;
    std::fs::write(&output_path, &packaged.archive)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;

    println!(
        "  {} {} v{}",
        style("Chart").dim(),
        packaged.identity.name,
        packaged.identity.version
    );
    println!(
        "  {} {}",
        style("Created").green().bold(),
        output_path.display()
    );
    println!(
        "  {} {}",
        style("Size").dim(),
        format_size(packaged.archive.len() as u64)
    );

    Ok(())
}

fn load_config(root: Option<&Path>, config_path: Option<&Path>) -> Result<ConvertConfig> {
    match (config_path, root) {
        (Some(path), root) => ConvertConfig::load_with_root(path, root)
            .into_diagnostic()
            .wrap_err("Failed to load configuration"),
        (None, Some(root)) => Ok(ConvertConfig::with_root(root)),
        (None, None) => ConvertConfig::from_home().into_diagnostic(),
    }
}

/// An existing directory receives `<file_name>`; anything else is the file itself
fn resolve_output(output: Option<&Path>, file_name: &str) -> Result<PathBuf> {
    match output {
        Some(path) if path.is_dir() => Ok(path.join(file_name)),
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir().into_diagnostic()?.join(file_name)),
    }
}
