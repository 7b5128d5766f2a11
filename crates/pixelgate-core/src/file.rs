//! Candidate file abstraction
//!
//! The intake pipeline never owns the files it inspects. Hosts hand it a borrowed
//! [`FileDescriptor`] and keep ownership of the underlying bytes.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io;

/// Read-only handle over a candidate file.
///
/// `size` and `mime_type` are the values *declared* by the host (browser `File`,
/// filesystem metadata, multipart headers). They are not verified against the content;
/// that is the validator's job.
#[async_trait]
pub trait FileDescriptor: Send + Sync {
    /// Display name as reported by the host, unsanitized
    fn name(&self) -> &str;

    /// Declared size in bytes
    fn size(&self) -> u64;

    /// Declared MIME type, `None` when the host could not determine one
    fn mime_type(&self) -> Option<&str>;

    fn last_modified(&self) -> Option<DateTime<Utc>>;

    /// Read up to `len` leading bytes. Shorter files return what they have.
    async fn read_header(&self, len: usize) -> io::Result<Bytes>;

    /// Read the whole file into memory.
    async fn read_all(&self) -> io::Result<Bytes>;
}
