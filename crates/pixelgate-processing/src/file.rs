//! File descriptor adapters
//!
//! [`MemoryFile`] wraps bytes already held in memory (multipart bodies, sanitizer output).
//! [`LocalFile`] reads lazily from disk and is what the CLI hands to the pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use pixelgate_core::{formats, FileDescriptor};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Canonical MIME type for a lowercase extension, standard formats first.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    formats::standard_by_extension(extension)
        .map(|f| f.canonical_mime_type())
        .or_else(|| formats::raw_by_extension(extension).map(|f| f.canonical_mime_type()))
}

#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: Option<String>,
    declared_size: u64,
    data: Bytes,
    last_modified: Option<DateTime<Utc>>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            mime_type: mime_type.map(str::to_string),
            declared_size: data.len() as u64,
            data,
            last_modified: None,
        }
    }

    /// Override the size reported to the pipeline. Hosts report sizes from headers,
    /// which need not match the bytes actually received.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

#[async_trait]
impl FileDescriptor for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.declared_size
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    async fn read_header(&self, len: usize) -> io::Result<Bytes> {
        Ok(self.data.slice(..len.min(self.data.len())))
    }

    async fn read_all(&self) -> io::Result<Bytes> {
        Ok(self.data.clone())
    }
}

/// A file on the local filesystem.
///
/// Size and modification time are captured when the file is opened; the MIME type is
/// inferred from the extension unless the caller overrides it.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

impl LocalFile {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = formats::extension_of(&name)
            .and_then(|ext| content_type_for_extension(&ext))
            .map(str::to_string);

        Ok(Self {
            path,
            name,
            size: metadata.len(),
            mime_type,
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Replace the inferred MIME type; `None` simulates a host that reports none.
    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileDescriptor for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    async fn read_header(&self, len: usize) -> io::Result<Bytes> {
        let file = tokio::fs::File::open(&self.path).await?;
        let expected = usize::try_from(self.size).unwrap_or(usize::MAX);
        let mut buffer = Vec::with_capacity(len.min(expected));
        file.take(len as u64).read_to_end(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }

    async fn read_all(&self) -> io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("jpg"), Some("image/jpeg"));
        assert_eq!(content_type_for_extension("tif"), Some("image/tiff"));
        assert_eq!(content_type_for_extension("nef"), Some("image/x-nikon-nef"));
        assert_eq!(content_type_for_extension("pdf"), None);
    }

    #[tokio::test]
    async fn test_memory_file_header_is_clamped() {
        let file = MemoryFile::new("a.bin", None, vec![1u8, 2, 3]);
        assert_eq!(file.read_header(16).await.unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(file.read_header(2).await.unwrap().as_ref(), &[1, 2]);
        assert_eq!(file.size(), 3);
    }

    #[tokio::test]
    async fn test_memory_file_declared_size() {
        let file = MemoryFile::new("a.jpg", Some("image/jpeg"), vec![0u8; 4])
            .with_declared_size(60 * 1024 * 1024);
        assert_eq!(file.size(), 60 * 1024 * 1024);
        assert_eq!(file.read_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_local_file_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Holiday.PNG");
        let mut handle = std::fs::File::create(&path).unwrap();
        handle.write_all(b"\x89PNG\r\n\x1a\nrest-of-file").unwrap();
        drop(handle);

        let file = LocalFile::open(&path).await.unwrap();
        assert_eq!(file.name(), "Holiday.PNG");
        assert_eq!(file.size(), 20);
        assert_eq!(file.mime_type(), Some("image/png"));
        assert!(file.last_modified().is_some());
        assert_eq!(file.read_header(8).await.unwrap().as_ref(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(file.read_all().await.unwrap().len(), 20);

        let file = file.with_mime_type(None);
        assert_eq!(file.mime_type(), None);
    }

    #[tokio::test]
    async fn test_local_file_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFile::open(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
