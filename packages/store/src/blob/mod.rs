mod name;
mod traits;

pub mod filesystem;

pub use name::BlobRef;
pub use traits::{BlobStore, BoxReader};
