use serde::{Deserialize, Serialize};

use crate::blob::BlobRef;

/// One inventory entry as persisted in the table document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Positive, unique within the table, assigned as `max(existing) + 1`.
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Filename of the stored photo, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<BlobRef>,
}
