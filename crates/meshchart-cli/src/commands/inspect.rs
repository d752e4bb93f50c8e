//! Inspect command - view chart archive contents without extracting

use console::style;
use meshchart_core::{list_archive, read_chart_metadata};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::Path;

use crate::util::format_size;

#[derive(Serialize)]
struct InspectReport {
    name: String,
    version: String,
    description: Option<String>,
    files: Vec<FileReport>,
}

#[derive(Serialize)]
struct FileReport {
    path: String,
    size: u64,
}

pub fn run(archive_path: &Path, json: bool) -> Result<()> {
    let metadata = read_chart_metadata(archive_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Not a chart archive: {}", archive_path.display()))?;
    let entries = list_archive(archive_path).into_diagnostic()?;

    if json {
        let report = InspectReport {
            name: metadata.name,
            version: metadata.version,
            description: metadata.description,
            files: entries
                .into_iter()
                .map(|e| FileReport {
                    path: e.path,
                    size: e.size,
                })
                .collect(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).into_diagnostic()?
        );
        return Ok(());
    }

    println!(
        "{} {} v{}",
        style("Chart").cyan().bold(),
        metadata.name,
        metadata.version
    );
    if let Some(description) = &metadata.description {
        println!("  {}", style(description).dim());
    }
    println!();

    println!("{}:", style("Files").bold());
    for entry in &entries {
        println!("  {:48} {:>10}", entry.path, format_size(entry.size));
    }

    let total_size: u64 = entries.iter().map(|e| e.size).sum();
    println!();
    println!("{} files, {} total", entries.len(), format_size(total_size));

    Ok(())
}
