use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::name::BlobRef;
use super::traits::{BlobStore, BoxReader};
use crate::error::StoreError;

/// Filesystem-backed photo store.
///
/// Files live flat in the managed directory under generated names of the form
/// `<unix-millis>-<sequence><original extension>`. The sequence component is a
/// per-process counter, so two uploads landing in the same millisecond still
/// get distinct names. Writes go through a `.tmp` staging subdirectory and are
/// renamed into place.
pub struct FilesystemBlobStore {
    dir: PathBuf,
    max_size: u64,
    seq: AtomicU64,
}

impl FilesystemBlobStore {
    /// Create a new blob store rooted at `dir`, creating the directory and its
    /// staging subdirectory if needed.
    pub async fn new(dir: PathBuf, max_size: u64) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir).await?;
        fs::create_dir_all(dir.join(".tmp")).await?;
        Ok(Self {
            dir,
            max_size,
            seq: AtomicU64::new(0),
        })
    }

    /// Generate a fresh filename, keeping the upload's extension.
    fn generate_name(&self, original_name: &str) -> Result<BlobRef, StoreError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let millis = Utc::now().timestamp_millis();
        let mut name = format!("{millis}-{seq:04}");
        if let Some(ext) = sanitized_extension(original_name) {
            name.push('.');
            name.push_str(&ext);
        }
        BlobRef::new(name)
    }

    fn blob_path(&self, blob: &BlobRef) -> PathBuf {
        self.dir.join(blob.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.dir.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }
}

/// Extension of the uploaded filename, restricted to a short alphanumeric
/// suffix so it is safe to splice into a generated name.
fn sanitized_extension(original_name: &str) -> Option<String> {
    let ext: String = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())?
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() { None } else { Some(ext) }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(
        &self,
        mut reader: BoxReader,
        original_name: &str,
    ) -> Result<BlobRef, StoreError> {
        let temp_path = self.temp_path();
        let mut temp_file = fs::File::create(&temp_path).await?;
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StoreError::TooLarge {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            if let Err(e) = temp_file.write_all(&buf[..n]).await {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        }

        temp_file.flush().await?;
        drop(temp_file);

        let blob = self.generate_name(original_name)?;
        if let Err(e) = fs::rename(&temp_path, self.blob_path(&blob)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(blob)
    }

    async fn get_stream(&self, blob: &BlobRef) -> Result<BoxReader, StoreError> {
        match fs::File::open(self.blob_path(blob)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(
                format!("photo file '{blob}' is missing from disk"),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, blob: &BlobRef) -> Result<bool, StoreError> {
        Ok(fs::try_exists(self.blob_path(blob)).await?)
    }

    async fn delete(&self, blob: &BlobRef) -> Result<bool, StoreError> {
        match fs::remove_file(self.blob_path(blob)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
