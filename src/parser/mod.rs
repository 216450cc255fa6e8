//! Import-file validation and the usage-export parser

pub mod csv;

pub use csv::parse_usage_csv;

use crate::types::{RepbillError, Result};
use std::path::Path;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;

/// Spreadsheet formats the upstream panel can export.
const SPREADSHEET_EXTENSIONS: [&str; 3] = ["ods", "xls", "xlsx"];

/// Converts a spreadsheet export into CSV text.
///
/// Injected collaborator: repbill ships no spreadsheet decoder of its own,
/// so ingesting `.ods`/`.xls`/`.xlsx` uploads requires one. Without it,
/// spreadsheet uploads are rejected as unsupported.
pub trait SheetConverter: Send + Sync {
    fn convert_to_csv(&self, path: &Path) -> Result<String>;
}

/// File kind accepted for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// Parsed directly.
    Csv,
    /// Needs a [`SheetConverter`] pass first.
    Spreadsheet,
}

/// Validate an upload path: size cap plus extension allowlist.
pub fn classify_import_file(path: &Path) -> Result<ImportKind> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_IMPORT_BYTES {
        return Err(RepbillError::Parse(format!(
            "{}: exceeds the {} MiB import limit",
            path.display(),
            MAX_IMPORT_BYTES / (1024 * 1024)
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if extension == "csv" {
        Ok(ImportKind::Csv)
    } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        Ok(ImportKind::Spreadsheet)
    } else {
        Err(RepbillError::UnsupportedFormat(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_classify_csv() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "usage.csv", b"admin_username\n");
        assert_eq!(classify_import_file(&path).unwrap(), ImportKind::Csv);
    }

    #[test]
    fn test_classify_spreadsheet_extensions() {
        let dir = TempDir::new().unwrap();
        for name in ["usage.ods", "usage.xls", "usage.xlsx", "usage.ODS"] {
            let path = touch(&dir, name, b"binary");
            assert_eq!(
                classify_import_file(&path).unwrap(),
                ImportKind::Spreadsheet,
                "{name} should classify as spreadsheet"
            );
        }
    }

    #[test]
    fn test_classify_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "usage.pdf", b"%PDF");
        assert!(matches!(
            classify_import_file(&path),
            Err(RepbillError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_classify_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.csv");
        let file = File::create(&path).unwrap();
        file.set_len(MAX_IMPORT_BYTES + 1).unwrap();

        assert!(matches!(
            classify_import_file(&path),
            Err(RepbillError::Parse(_))
        ));
    }

    #[test]
    fn test_classify_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.csv");
        assert!(matches!(
            classify_import_file(&path),
            Err(RepbillError::Io(_))
        ));
    }
}
