use std::sync::Arc;

use store::{BlobStore, RecordStore};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub config: AppConfig,
}
