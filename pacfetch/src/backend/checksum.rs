//! File checksum calculation for download verification.
//!
//! Pacman metalinks carry SHA-256 and MD5 digests; SHA-256 is preferred
//! whenever both are present.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

use super::error::{BackendError, BackendResult};
use crate::metalink::Checksum;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculate the digest of a file with algorithm `D`, as lowercase hex.
fn digest_file<D: Digest>(path: &Path) -> BackendResult<String> {
    let mut file = File::open(path).map_err(|e| BackendError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| BackendError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex_lower(&hasher.finalize()))
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Calculate the digest of a file using the algorithm of `expected`.
pub fn calculate_file_checksum(path: &Path, expected: &Checksum) -> BackendResult<String> {
    match expected {
        Checksum::Sha256(_) => digest_file::<Sha256>(path),
        Checksum::Md5(_) => digest_file::<Md5>(path),
    }
}

/// Verify that a file matches an expected checksum.
pub fn verify_checksum(path: &Path, expected: &Checksum) -> BackendResult<()> {
    let actual = calculate_file_checksum(path, expected)?;
    if !actual.eq_ignore_ascii_case(expected.value()) {
        return Err(BackendError::ChecksumMismatch {
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            expected: expected.value().to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    fn hello_file(temp: &TempDir) -> std::path::PathBuf {
        let file_path = temp.path().join("test.txt");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"hello world").unwrap();
        file_path
    }

    #[test]
    fn test_calculate_sha256() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);

        let checksum =
            calculate_file_checksum(&path, &Checksum::Sha256(String::new())).unwrap();
        assert_eq!(checksum, HELLO_SHA256);
    }

    #[test]
    fn test_calculate_md5() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);

        let checksum = calculate_file_checksum(&path, &Checksum::Md5(String::new())).unwrap();
        assert_eq!(checksum, HELLO_MD5);
    }

    #[test]
    fn test_calculate_empty_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("empty.txt");
        File::create(&file_path).unwrap();

        let checksum =
            calculate_file_checksum(&file_path, &Checksum::Sha256(String::new())).unwrap();
        assert_eq!(
            checksum,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_calculate_nonexistent_file() {
        let result = calculate_file_checksum(
            Path::new("/nonexistent/file.txt"),
            &Checksum::Md5(String::new()),
        );
        assert!(matches!(result, Err(BackendError::ReadFailed { .. })));
    }

    #[test]
    fn test_verify_checksum_match_ignores_case() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);

        assert!(verify_checksum(&path, &Checksum::Sha256(HELLO_SHA256.to_string())).is_ok());
        assert!(verify_checksum(&path, &Checksum::Md5(HELLO_MD5.to_uppercase())).is_ok());
    }

    #[test]
    fn test_verify_checksum_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);

        match verify_checksum(&path, &Checksum::Sha256("wrong_checksum".to_string())) {
            Err(BackendError::ChecksumMismatch { filename, .. }) => {
                assert_eq!(filename, "test.txt");
            }
            other => panic!("Expected ChecksumMismatch error, got {:?}", other),
        }
    }

    #[test]
    fn test_large_file_checksum_is_stable() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("large.bin");

        // Larger than the read buffer
        let mut file = File::create(&file_path).unwrap();
        file.write_all(&vec![0xABu8; 100_000]).unwrap();

        let sum = Checksum::Sha256(String::new());
        let first = calculate_file_checksum(&file_path, &sum).unwrap();
        let second = calculate_file_checksum(&file_path, &sum).unwrap();
        assert_eq!(first, second);
    }
}
