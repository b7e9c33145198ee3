use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use crate::blob::{BlobRef, BlobStore};
use crate::error::StoreError;
use crate::record::InventoryRecord;

/// Parse a raw path segment as a record id.
pub fn parse_id(raw: &str) -> Result<u64, StoreError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| StoreError::InvalidId(raw.to_string()))
}

/// Partial update of a record. `None` leaves the field untouched; an explicit
/// empty string is a valid new value.
#[derive(Debug, Default, Clone)]
pub struct UpdateFields {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// JSON-backed table of inventory records.
///
/// The table file is the source of truth. Every operation re-reads it under a
/// single async mutex, applies its change, and atomically replaces the file
/// (write-temp-then-rename), so concurrent mutations serialize and readers
/// never observe a half-written document.
///
/// The store also decides when a photo becomes orphaned: deletions and photo
/// swaps remove the old blob *after* the table write has committed, as a
/// best-effort step that is logged rather than propagated.
pub struct RecordStore {
    path: PathBuf,
    blobs: Arc<dyn BlobStore>,
    lock: Mutex<()>,
}

impl RecordStore {
    /// Create a store over the table document at `path`. The file itself is
    /// only created by the first successful mutation.
    pub fn new(path: impl Into<PathBuf>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            path: path.into(),
            blobs,
            lock: Mutex::new(()),
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.path
    }

    /// Register a new item and return it with its assigned id.
    ///
    /// An absent table file is treated as an empty table here, not an error.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        photo: Option<BlobRef>,
    ) -> Result<InventoryRecord, StoreError> {
        if name.is_empty() {
            return Err(StoreError::Validation("Missing 'name' field".into()));
        }

        let _guard = self.lock.lock().await;
        let mut records = self.load().await?.unwrap_or_default();

        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = InventoryRecord {
            id,
            name: name.to_string(),
            description: description.to_string(),
            photo,
        };
        records.push(record.clone());
        self.persist(&records).await?;

        Ok(record)
    }

    /// All records in insertion order.
    ///
    /// A table file that has never been created is `NotFound`; a table with
    /// zero records is an empty vector.
    pub async fn list(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load_required().await
    }

    pub async fn get(&self, id: u64) -> Result<InventoryRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let records = self.load_required().await?;
        records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Apply a partial update and return the updated record.
    pub async fn update(
        &self,
        id: u64,
        fields: UpdateFields,
    ) -> Result<InventoryRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load_required().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        if let Some(name) = fields.name {
            record.name = name;
        }
        if let Some(description) = fields.description {
            record.description = description;
        }
        let updated = record.clone();
        self.persist(&records).await?;

        Ok(updated)
    }

    /// Swap in a newly stored photo, then remove the previous one.
    ///
    /// On failure the caller still owns `new_photo` and must remove it so no
    /// orphan is left behind. On success the old blob is deleted best-effort
    /// once the table write has committed.
    pub async fn replace_photo(&self, id: u64, new_photo: BlobRef) -> Result<(), StoreError> {
        let old_photo = {
            let _guard = self.lock.lock().await;
            let mut records = self.load_required().await?;
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| not_found(id))?;
            let old = record.photo.replace(new_photo);
            self.persist(&records).await?;
            old
        };

        if let Some(old) = old_photo {
            self.discard_blob(&old).await;
        }
        Ok(())
    }

    /// Remove a record, then its photo (if any) best-effort.
    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let photo = {
            let _guard = self.lock.lock().await;
            let mut records = self.load_required().await?;
            let idx = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| not_found(id))?;
            let removed = records.remove(idx);
            self.persist(&records).await?;
            removed.photo
        };

        if let Some(photo) = photo {
            self.discard_blob(&photo).await;
        }
        Ok(())
    }

    /// Read the table document. `None` means the file has never been created.
    async fn load(&self) -> Result<Option<Vec<InventoryRecord>>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_required(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        self.load().await?.ok_or_else(|| {
            StoreError::NotFound("inventory table has not been created".into())
        })
    }

    /// Replace the table document atomically: write a sibling temp file, then
    /// rename it over the real one.
    async fn persist(&self, records: &[InventoryRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("table");
        let temp_path = self
            .path
            .with_file_name(format!("{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, &bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Best-effort removal of a blob the table no longer references.
    async fn discard_blob(&self, blob: &BlobRef) {
        if let Err(err) = self.blobs.delete(blob).await {
            warn!(blob = %blob, "failed to remove orphaned photo: {err}");
        }
    }
}

fn not_found(id: u64) -> StoreError {
    StoreError::NotFound(format!("item {id} not found"))
}
