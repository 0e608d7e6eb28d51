//! Content integrity: SHA-256 hashing and filename-bound verification.
//!
//! Both content-addressed stores (disease files and patient sample files)
//! name each file after the SHA-256 digest of its canonical content. Reading
//! a file therefore recomputes the digest and compares it to the file name;
//! a mismatch marks the file corrupt and callers treat it as absent.

use std::fmt::Write as _;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::DomainError;

/// Computes the SHA-256 digest of `text` (UTF-8 bytes) as 64 lowercase hex
/// characters.
#[must_use]
pub fn hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut encoded = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(encoded, "{byte:02x}");
    }
    encoded
}

/// Verifies that the content of `path` hashes to the file's own name with
/// `extension` stripped.
///
/// # Errors
///
/// Returns [`DomainError::CorruptedData`] when the file is missing,
/// unreadable, or empty, or when the recomputed hash disagrees with the file
/// name.
pub fn verify_file(path: &Path, extension: &str) -> Result<(), DomainError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path).map_err(|_| {
        DomainError::CorruptedData(format!(
            "Error al leer archivo: {file_name} en {}",
            path.display()
        ))
    })?;
    if content.trim().is_empty() {
        return Err(DomainError::CorruptedData(format!(
            "Archivo vacío o ilegible: {file_name} en {}",
            path.display()
        )));
    }
    let expected_hash = file_name
        .strip_suffix(extension)
        .unwrap_or(file_name.as_str());
    if expected_hash != hash(&content) {
        return Err(DomainError::CorruptedData(format!(
            "Archivo corrupto o modificado: {file_name} en {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_64_lowercase_hex_chars() {
        let digest = hash("GAGTATGTGAA");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_matches_known_vector() {
        // sha256 of the empty string.
        assert_eq!(
            hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_file_accepts_content_named_by_its_hash() {
        let dir = tempfile::tempdir().unwrap();
        let content = ">ebola|ALTA\nGAGTATGTGAATAGATATATATTAGTAGTAGTAAAGTT";
        let path = dir.path().join(format!("{}.fasta", hash(content)));
        std::fs::write(&path, content).unwrap();
        verify_file(&path, ".fasta").unwrap();
    }

    #[test]
    fn verify_file_rejects_tampered_content() {
        let dir = tempfile::tempdir().unwrap();
        let content = ">ebola|ALTA\nGAGTATGTGAATAGATATATATTAGTAGTAGTAAAGTT";
        let path = dir.path().join(format!("{}.fasta", hash(content)));
        std::fs::write(&path, ">ebola|BAJA\nGAGT").unwrap();
        let err = verify_file(&path, ".fasta").unwrap_err();
        assert!(matches!(err, DomainError::CorruptedData(msg) if msg.contains("corrupto")));
    }

    #[test]
    fn verify_file_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.fasta");
        std::fs::write(&path, "   ").unwrap();
        let err = verify_file(&path, ".fasta").unwrap_err();
        assert!(matches!(err, DomainError::CorruptedData(msg) if msg.contains("vacío")));
    }

    #[test]
    fn verify_file_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.fasta");
        assert!(verify_file(&path, ".fasta").is_err());
    }
}
