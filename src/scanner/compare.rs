//! Exact content comparison of two files.
//!
//! [`ByteComparer`] is the equality predicate every duplicate group rests on:
//! two files are equal iff their byte streams have the same length and the
//! same content. Both files are streamed in fixed-size chunks, so memory use
//! does not depend on file size. File handles live on the stack of
//! [`ContentEq::equal`] and are closed on every return path, including length
//! mismatch, read failure and cancellation.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{FileEntry, ReadError};

/// Default chunk size for streaming comparison (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A content equality predicate over files.
///
/// Implementations must behave as an equivalence relation and must never
/// report two files with different content as equal.
pub trait ContentEq: Send + Sync {
    /// Compare the content of two files.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] naming the file that could not be read.
    fn equal(&self, a: &FileEntry, b: &FileEntry) -> Result<bool, ReadError>;
}

/// Streaming byte-for-byte comparer.
#[derive(Debug, Clone)]
pub struct ByteComparer {
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for ByteComparer {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
        }
    }
}

impl ByteComparer {
    /// Create a comparer with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size used for streaming (minimum 1 byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the shutdown flag checked between chunks.
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
}

impl ContentEq for ByteComparer {
    fn equal(&self, a: &FileEntry, b: &FileEntry) -> Result<bool, ReadError> {
        let mut left = open(a)?;
        let mut right = open(b)?;

        let left_len = left
            .metadata()
            .map_err(|e| ReadError::from_io(&a.path, e))?
            .len();
        let right_len = right
            .metadata()
            .map_err(|e| ReadError::from_io(&b.path, e))?
            .len();
        if left_len != right_len {
            log::trace!(
                "Length mismatch: {} ({}) vs {} ({})",
                a.path.display(),
                left_len,
                b.path.display(),
                right_len
            );
            return Ok(false);
        }

        let mut left_buf = vec![0u8; self.chunk_size];
        let mut right_buf = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(ReadError::Interrupted(a.path.clone()));
            }

            let left_read =
                fill(&mut left, &mut left_buf).map_err(|e| ReadError::from_io(&a.path, e))?;
            let right_read =
                fill(&mut right, &mut right_buf).map_err(|e| ReadError::from_io(&b.path, e))?;

            // Length was checked up front, but the files may change underneath us.
            if left_read != right_read || left_buf[..left_read] != right_buf[..right_read] {
                return Ok(false);
            }
            if left_read == 0 {
                return Ok(true);
            }
        }
    }
}

fn open(entry: &FileEntry) -> Result<File, ReadError> {
    File::open(&entry.path).map_err(|e| ReadError::from_io(&entry.path, e))
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
