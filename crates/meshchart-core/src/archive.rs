//! Helm chart archives
//!
//! Writes and reads `.tgz` archives laid out the way `helm package` lays
//! them out: every file of the chart stored under a top-level directory
//! named after the chart, no directory entries.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header};
use walkdir::WalkDir;

use crate::chart::{CHART_FILE, ChartMetadata};
use crate::error::{ConvertError, Result};

/// Information about a file in an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Relative path within the archive
    pub path: String,
    /// File size in bytes
    pub size: u64,
}

/// Archive `chart_dir` into `output` as `<chart_name>/<relative path>` entries
pub fn create_chart_archive(chart_dir: &Path, chart_name: &str, output: &Path) -> Result<PathBuf> {
    let file = File::create(output).map_err(|e| ConvertError::archive(output, e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in WalkDir::new(chart_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ConvertError::archive(chart_dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(chart_dir)
            .map_err(|e| ConvertError::archive(entry.path(), e))?;
        let archive_path = Path::new(chart_name).join(rel_path);
        let content = std::fs::read(entry.path())
            .map_err(|e| ConvertError::io("read chart file", entry.path(), e))?;
        add_bytes_to_archive(&mut builder, &archive_path.to_string_lossy(), &content)
            .map_err(|e| ConvertError::archive(output, e))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| ConvertError::archive(output, e))?;
    encoder.finish().map_err(|e| ConvertError::archive(output, e))?;

    Ok(output.to_path_buf())
}

/// List files in an archive
pub fn list_archive(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(archive_path)
        .map_err(|e| ConvertError::io("open archive", archive_path, e))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let invalid = |e: std::io::Error| ConvertError::archive(archive_path, e);

    let mut entries = Vec::new();
    for entry in archive.entries().map_err(invalid)? {
        let entry = entry.map_err(invalid)?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        entries.push(ArchiveEntry {
            path: entry.path().map_err(invalid)?.to_string_lossy().to_string(),
            size: entry.header().size().map_err(invalid)?,
        });
    }

    Ok(entries)
}

/// Read a specific file from an archive
pub fn read_file_from_archive(archive_path: &Path, file_path: &str) -> Result<Vec<u8>> {
    let file = File::open(archive_path)
        .map_err(|e| ConvertError::io("open archive", archive_path, e))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let invalid = |e: std::io::Error| ConvertError::archive(archive_path, e);

    for entry in archive.entries().map_err(invalid)? {
        let mut entry = entry.map_err(invalid)?;
        if entry.path().map_err(invalid)?.to_string_lossy() == file_path {
            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(invalid)?;
            return Ok(content);
        }
    }

    Err(ConvertError::archive(
        archive_path,
        format!("File not found in archive: {}", file_path),
    ))
}

/// Read the top-level `<chart>/Chart.yaml` from a chart archive
pub fn read_chart_metadata(archive_path: &Path) -> Result<ChartMetadata> {
    let chart_file = list_archive(archive_path)?
        .into_iter()
        .map(|e| e.path)
        .find(|p| {
            let mut parts = p.split('/');
            matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(dir), Some(CHART_FILE), None) if !dir.is_empty()
            )
        })
        .ok_or_else(|| ConvertError::archive(archive_path, "Chart.yaml not found in archive"))?;

    let content = read_file_from_archive(archive_path, &chart_file)?;
    let text = String::from_utf8(content).map_err(|e| {
        ConvertError::archive(archive_path, format!("Invalid UTF-8 in Chart.yaml: {}", e))
    })?;
    ChartMetadata::parse(&text).map_err(|e| {
        ConvertError::archive(archive_path, format!("Invalid Chart.yaml: {}", e))
    })
}

fn add_bytes_to_archive<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    content: &[u8],
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0); // Reproducible builds: use epoch time
    header.set_cksum();

    builder.append_data(&mut header, archive_path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_chart(dir: &Path) {
        std::fs::write(
            dir.join("Chart.yaml"),
            "apiVersion: v2\nname: testchart\nversion: 1.2.3\n",
        )
        .unwrap();
        std::fs::write(dir.join("values.yaml"), "replicas: 3\n").unwrap();
        std::fs::create_dir_all(dir.join("templates")).unwrap();
        std::fs::write(
            dir.join("templates/manifest.yaml"),
            "apiVersion: apps/v1\nkind: Deployment\n",
        )
        .unwrap();
    }

    #[test]
    fn test_entries_nested_under_chart_name() {
        let temp = TempDir::new().unwrap();
        let chart_dir = temp.path().join("src");
        std::fs::create_dir_all(&chart_dir).unwrap();
        create_test_chart(&chart_dir);

        let archive = temp.path().join("testchart-1.2.3.tgz");
        create_chart_archive(&chart_dir, "testchart", &archive).unwrap();

        let paths: Vec<_> = list_archive(&archive).unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "testchart/Chart.yaml",
                "testchart/templates/manifest.yaml",
                "testchart/values.yaml",
            ]
        );
    }

    #[test]
    fn test_read_chart_metadata() {
        let temp = TempDir::new().unwrap();
        let chart_dir = temp.path().join("src");
        std::fs::create_dir_all(&chart_dir).unwrap();
        create_test_chart(&chart_dir);

        let archive = temp.path().join("out.tgz");
        create_chart_archive(&chart_dir, "testchart", &archive).unwrap();

        let metadata = read_chart_metadata(&archive).unwrap();
        assert_eq!(metadata.name, "testchart");
        assert_eq!(metadata.version, "1.2.3");

        let manifest = read_file_from_archive(&archive, "testchart/templates/manifest.yaml").unwrap();
        assert_eq!(manifest, b"apiVersion: apps/v1\nkind: Deployment\n");
    }

    #[test]
    fn test_archives_are_reproducible() {
        let temp = TempDir::new().unwrap();
        let chart_dir = temp.path().join("src");
        std::fs::create_dir_all(&chart_dir).unwrap();
        create_test_chart(&chart_dir);

        let first = temp.path().join("a.tgz");
        let second = temp.path().join("b.tgz");
        create_chart_archive(&chart_dir, "testchart", &first).unwrap();
        create_chart_archive(&chart_dir, "testchart", &second).unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn test_missing_file_in_archive() {
        let temp = TempDir::new().unwrap();
        let chart_dir = temp.path().join("src");
        std::fs::create_dir_all(&chart_dir).unwrap();
        create_test_chart(&chart_dir);

        let archive = temp.path().join("out.tgz");
        create_chart_archive(&chart_dir, "testchart", &archive).unwrap();

        let err = read_file_from_archive(&archive, "testchart/NOTES.txt").unwrap_err();
        assert!(matches!(err, ConvertError::Archive { .. }));
        assert!(err.to_string().contains("File not found in archive"));
    }

    #[test]
    fn test_corrupt_archive_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("bogus.tgz");
        std::fs::write(&bogus, "not gzip at all").unwrap();

        let err = list_archive(&bogus).unwrap_err();
        match err {
            ConvertError::Archive { path, .. } => assert_eq!(path, bogus),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_chart_metadata(&temp.path().join("absent.tgz")).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
