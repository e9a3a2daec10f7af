//! BLAKE3 prehashing of file heads.
//!
//! # Overview
//!
//! The prehash is the hash of the first [`PREHASH_SIZE`] bytes of a file. Two
//! files of equal size with different prehashes cannot be duplicates, so the
//! prehash stage discards most same-size strangers after reading a single
//! small block from each. Equal prehashes prove nothing; the byte comparison
//! still decides.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::ReadError;

/// Number of leading bytes covered by a prehash.
pub const PREHASH_SIZE: usize = 4096;

/// A BLAKE3 digest.
pub type Hash = [u8; 32];

/// Computes prehashes of files.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown flag checked before each file is opened.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the first [`PREHASH_SIZE`] bytes of the file at `path`.
    ///
    /// Files shorter than [`PREHASH_SIZE`] are hashed in full.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the file cannot be opened or read, or
    /// [`ReadError::Interrupted`] if shutdown was requested.
    pub fn prehash(&self, path: &Path) -> Result<Hash, ReadError> {
        if self.is_shutdown_requested() {
            return Err(ReadError::Interrupted(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| ReadError::from_io(path, e))?;
        let mut head = Vec::with_capacity(PREHASH_SIZE);
        file.take(PREHASH_SIZE as u64)
            .read_to_end(&mut head)
            .map_err(|e| ReadError::from_io(path, e))?;

        Ok(*blake3::hash(&head).as_bytes())
    }
}

/// Format a hash as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_prehash_small_file_is_full_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.txt");
        fs::write(&path, b"hello").unwrap();

        let hash = Hasher::new().prehash(&path).unwrap();
        assert_eq!(hash, *blake3::hash(b"hello").as_bytes());
    }

    #[test]
    fn test_prehash_ignores_bytes_past_head() {
        let dir = TempDir::new().unwrap();
        let mut a = vec![7u8; PREHASH_SIZE + 10];
        let mut b = a.clone();
        a[PREHASH_SIZE + 5] = 1;
        b[PREHASH_SIZE + 5] = 2;

        let path_a = dir.path().join("a.bin");
        let path_b = dir.path().join("b.bin");
        fs::write(&path_a, &a).unwrap();
        fs::write(&path_b, &b).unwrap();

        let hasher = Hasher::new();
        assert_eq!(
            hasher.prehash(&path_a).unwrap(),
            hasher.prehash(&path_b).unwrap()
        );
    }

    #[test]
    fn test_prehash_detects_head_difference() {
        let dir = TempDir::new().unwrap();
        let path_a = dir.path().join("a.bin");
        let path_b = dir.path().join("b.bin");
        fs::write(&path_a, b"AAAA").unwrap();
        fs::write(&path_b, b"AAAB").unwrap();

        let hasher = Hasher::new();
        assert_ne!(
            hasher.prehash(&path_a).unwrap(),
            hasher.prehash(&path_b).unwrap()
        );
    }

    #[test]
    fn test_prehash_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Hasher::new().prehash(&dir.path().join("nope"));
        assert!(matches!(result, Err(ReadError::NotFound(_))));
    }

    #[test]
    fn test_prehash_respects_shutdown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, b"content").unwrap();

        let hasher = Hasher::new().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
        assert!(matches!(
            hasher.prehash(&path),
            Err(ReadError::Interrupted(_))
        ));
    }

    #[test]
    fn test_hash_to_hex() {
        let mut hash = [0u8; 32];
        hash[0] = 0xAB;
        hash[31] = 0xEF;

        let hex = hash_to_hex(&hash);
        assert!(hex.starts_with("ab"));
        assert!(hex.ends_with("ef"));
        assert_eq!(hex.len(), 64);
    }
}
