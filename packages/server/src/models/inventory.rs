use serde::{Deserialize, Serialize};
use store::InventoryRecord;

/// Response DTO for a single inventory item.
///
/// The stored photo filename never leaves the server; a photo is exposed only
/// as a fetch locator.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ItemResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Widget")]
    pub name: String,
    #[schema(example = "A very good widget")]
    pub description: String,
    /// Locator for the item's photo; omitted when the item has none.
    #[schema(example = "/inventory/1/photo")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl From<InventoryRecord> for ItemResponse {
    fn from(record: InventoryRecord) -> Self {
        let photo_url = record
            .photo
            .as_ref()
            .map(|_| format!("/inventory/{}/photo", record.id));
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            photo_url,
        }
    }
}

/// Request body for partial item updates.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateItemRequest {
    /// New name; omit to keep the current one.
    pub name: Option<String>,
    /// New description; an explicit empty string clears it.
    pub description: Option<String>,
}
