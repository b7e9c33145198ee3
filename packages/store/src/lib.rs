pub mod blob;
pub mod error;
pub mod record;
pub mod table;

pub use blob::{BlobRef, BlobStore, BoxReader, filesystem::FilesystemBlobStore};
pub use error::StoreError;
pub use record::InventoryRecord;
pub use table::{RecordStore, UpdateFields, parse_id};
