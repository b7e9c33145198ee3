use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use store::{BlobRef, BoxReader, UpdateFields};

use crate::error::{AppError, ErrorBody};
use crate::extractors::AppJson;
use crate::models::inventory::{ItemResponse, UpdateItemRequest};
use crate::state::AppState;

pub fn photo_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

#[utoipa::path(
    post,
    path = "/inventory",
    tag = "Inventory",
    operation_id = "registerItem",
    summary = "Register a new inventory item",
    description = "Registers an item from multipart form data. The `name` field is required; \
        `description` defaults to empty. An optional `photo` file field attaches an uploaded \
        photo, which the response exposes as `photo_url`.",
    request_body(content_type = "multipart/form-data", description = "Item fields with optional photo"),
    responses(
        (status = 201, description = "Item registered", body = ItemResponse),
        (status = 400, description = "Missing name or malformed form (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn register_item(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut photo: Option<BlobRef> = None;

    let parsed = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("name") => {
                    name = Some(field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read 'name': {e}"))
                    })?);
                }
                Some("description") => {
                    description = Some(field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read 'description': {e}"))
                    })?);
                }
                Some("photo") => {
                    photo = Some(stream_field_to_blob(field, &state).await?);
                }
                _ => {} // Ignore unknown fields.
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(err) = parsed {
        discard_failed_upload(&state, photo.as_ref()).await;
        return Err(err);
    }

    let created = state
        .records
        .create(
            name.as_deref().unwrap_or(""),
            description.as_deref().unwrap_or(""),
            photo.clone(),
        )
        .await;

    match created {
        Ok(record) => Ok((StatusCode::CREATED, Json(ItemResponse::from(record)))),
        Err(err) => {
            // The upload never attached to a record; do not leave an orphan.
            discard_failed_upload(&state, photo.as_ref()).await;
            Err(err.into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/inventory",
    tag = "Inventory",
    operation_id = "listItems",
    summary = "List all inventory items",
    description = "Returns every item in registration order. 404 until the first item has \
        ever been registered; an inventory that was emptied again returns an empty array.",
    responses(
        (status = 200, description = "Items in table order", body = [ItemResponse]),
        (status = 404, description = "Inventory has never been created (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let records = state.records.list().await?;
    Ok(Json(records.into_iter().map(ItemResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/inventory/{id}",
    tag = "Inventory",
    operation_id = "getItem",
    summary = "Fetch a single item",
    params(("id" = u64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "The item", body = ItemResponse),
        (status = 400, description = "Malformed id (INVALID_ID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ItemResponse>, AppError> {
    let id = store::parse_id(&raw_id)?;
    let record = state.records.get(id).await?;
    Ok(Json(ItemResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/inventory/{id}",
    tag = "Inventory",
    operation_id = "updateItem",
    summary = "Update an item's fields",
    description = "Partial update: omitted fields keep their current value; an explicit \
        empty string is applied as-is.",
    params(("id" = u64, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "The updated item", body = ItemResponse),
        (status = 400, description = "Malformed id or body (INVALID_ID, VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    AppJson(payload): AppJson<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    let id = store::parse_id(&raw_id)?;
    let record = state
        .records
        .update(
            id,
            UpdateFields {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    Ok(Json(ItemResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/inventory/{id}/photo",
    tag = "Inventory",
    operation_id = "replacePhoto",
    summary = "Replace an item's photo",
    description = "Stores the uploaded `photo` file field, swaps it into the record, and \
        removes the previous photo file. If the item does not exist, the upload is discarded.",
    params(("id" = u64, Path, description = "Item ID")),
    request_body(content_type = "multipart/form-data", description = "Photo file upload"),
    responses(
        (status = 200, description = "Photo replaced"),
        (status = 400, description = "Malformed id or missing file (INVALID_ID, VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn replace_photo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let id = store::parse_id(&raw_id)?;

    let mut photo: Option<BlobRef> = None;
    let parsed = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("photo") => {
                    photo = Some(stream_field_to_blob(field, &state).await?);
                }
                _ => {} // Ignore unknown fields.
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(err) = parsed {
        discard_failed_upload(&state, photo.as_ref()).await;
        return Err(err);
    }

    let Some(photo) = photo else {
        return Err(AppError::Validation("Missing 'photo' field".into()));
    };

    match state.records.replace_photo(id, photo.clone()).await {
        Ok(()) => Ok("Photo updated"),
        Err(err) => {
            discard_failed_upload(&state, Some(&photo)).await;
            Err(err.into())
        }
    }
}

#[utoipa::path(
    delete,
    path = "/inventory/{id}",
    tag = "Inventory",
    operation_id = "deleteItem",
    summary = "Delete an item",
    description = "Removes the item from the table and then its photo file, if any.",
    params(("id" = u64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 400, description = "Malformed id (INVALID_ID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = store::parse_id(&raw_id)?;
    state.records.delete(id).await?;
    Ok("Item deleted")
}

#[utoipa::path(
    get,
    path = "/inventory/{id}/photo",
    tag = "Inventory",
    operation_id = "downloadPhoto",
    summary = "Fetch an item's photo bytes",
    params(("id" = u64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Photo content"),
        (status = 400, description = "Malformed id (INVALID_ID)", body = ErrorBody),
        (status = 404, description = "Item, photo, or file missing (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_photo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = store::parse_id(&raw_id)?;
    let record = state.records.get(id).await?;

    let Some(photo) = record.photo else {
        return Err(AppError::NotFound(format!("item {id} has no photo")));
    };

    let reader = state.blobs.get_stream(&photo).await?;
    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    let content_type = mime_guess::from_path(photo.as_str()).first_or_octet_stream();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

/// Stream a multipart file field to the blob store via a temp file.
async fn stream_field_to_blob(
    mut field: axum::extract::multipart::Field<'_>,
    state: &AppState,
) -> Result<BlobRef, AppError> {
    let original_name = field.file_name().unwrap_or("photo").to_string();
    let max_size = state.config.storage.max_photo_size;
    let temp_path = std::env::temp_dir().join(format!("inventory-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "Photo exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        let blob = state
            .blobs
            .put_stream(reader, &original_name)
            .await?;

        Ok(blob)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}

/// Remove an upload that did not end up attached to any record.
async fn discard_failed_upload(state: &AppState, photo: Option<&BlobRef>) {
    if let Some(photo) = photo {
        if let Err(err) = state.blobs.delete(photo).await {
            tracing::warn!(blob = %photo, "failed to remove unattached upload: {err}");
        }
    }
}
