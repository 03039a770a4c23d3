//! Input: read a transcribed statute from disk.
//!
//! OCR exports are not always clean UTF-8. Invalid byte sequences are
//! dropped rather than reported; the only failures are the ones the caller
//! can act on (missing file, permission).

use crate::error::LawTreeError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const BOM: char = '\u{FEFF}';

/// Read `path` and decode it permissively.
pub fn read_document(path: &Path) -> Result<String, LawTreeError> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LawTreeError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => LawTreeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => LawTreeError::ReadFailed {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let text = decode_lossy(&bytes);
    debug!(
        "Read {} bytes from {} ({} chars kept)",
        bytes.len(),
        path.display(),
        text.chars().count()
    );
    Ok(text)
}

/// Decode UTF-8, silently dropping invalid sequences and a leading BOM.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Document title derived from a file name: the stem without a `_clean`
/// suffix, with dashes read as spaces.
pub fn document_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace("_clean", "").replace('-', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_utf8_file() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all("المادة 1 نص.".as_bytes()).unwrap();
        assert_eq!(read_document(f.path()).unwrap(), "المادة 1 نص.");
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, LawTreeError::FileNotFound { .. }));
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        let mut bytes = "باب".as_bytes().to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        bytes.extend_from_slice(" أول".as_bytes());
        assert_eq!(decode_lossy(&bytes), "باب أول");
    }

    #[test]
    fn leading_bom_is_stripped() {
        let bytes = "\u{FEFF}نص".as_bytes();
        assert_eq!(decode_lossy(bytes), "نص");
    }

    #[test]
    fn title_from_file_name() {
        assert_eq!(
            document_title(Path::new("laws/قانون-تنظيمي-112_clean.txt")),
            "قانون تنظيمي 112"
        );
        assert_eq!(document_title(Path::new("plain.txt")), "plain");
        assert_eq!(document_title(Path::new("")), "");
    }
}
