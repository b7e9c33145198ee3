use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::name::BlobRef;
use crate::error::StoreError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Photo blob storage.
///
/// Filenames are generated by the implementation; callers hold opaque
/// [`BlobRef`]s and never construct disk paths themselves.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a freshly generated name and return its reference.
    ///
    /// `original_name` only contributes the file extension.
    async fn put(&self, data: &[u8], original_name: &str) -> Result<BlobRef, StoreError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader, original_name).await
    }

    /// Store data from an async reader and return the generated reference.
    async fn put_stream(
        &self,
        reader: BoxReader,
        original_name: &str,
    ) -> Result<BlobRef, StoreError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>, StoreError> {
        let mut reader = self.get_stream(blob).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    ///
    /// Fails with `NotFound` when the file is missing on disk even though a
    /// record still references it.
    async fn get_stream(&self, blob: &BlobRef) -> Result<BoxReader, StoreError>;

    /// Check whether a blob exists on disk.
    async fn exists(&self, blob: &BlobRef) -> Result<bool, StoreError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it was already gone.
    async fn delete(&self, blob: &BlobRef) -> Result<bool, StoreError>;
}
