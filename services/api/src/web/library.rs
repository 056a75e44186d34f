//! services/api/src/web/library.rs
//!
//! Endpoints for the signed-in user's library.

use crate::error::port_error_response;
use crate::web::protocol::{LibraryEntryDto, LibraryUpsertRequest, MessageResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use manga_reader_core::library::{sort_recent_first, upsert_entry};
use manga_reader_core::{LibraryUpdate, ReadStatus};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

type HandlerResult<T> = Result<(StatusCode, Json<T>), (StatusCode, String)>;

/// List the library, most recently updated first.
#[utoipa::path(
    get,
    path = "/library",
    responses(
        (status = 200, description = "Library entries", body = [LibraryEntryDto]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_library_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> HandlerResult<Vec<LibraryEntryDto>> {
    let mut entries = app_state.db.list_library(user_id).await.map_err(|e| {
        error!("Failed to list library of {}: {:?}", user_id, e);
        port_error_response(e, "Failed to load library")
    })?;
    sort_recent_first(&mut entries);
    Ok((
        StatusCode::OK,
        Json(entries.into_iter().map(LibraryEntryDto::from).collect()),
    ))
}

/// Add a manga to the library or update its entry.
#[utoipa::path(
    post,
    path = "/library",
    request_body = LibraryUpsertRequest,
    responses(
        (status = 200, description = "Entry updated", body = LibraryEntryDto),
        (status = 201, description = "Entry created", body = LibraryEntryDto),
        (status = 400, description = "Invalid entry"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn upsert_library_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<LibraryUpsertRequest>,
) -> HandlerResult<LibraryEntryDto> {
    let status = match req.status.as_deref() {
        Some(value) => Some(ReadStatus::parse(value).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("Unknown library status '{}'", value),
            )
        })?),
        None => None,
    };
    let update = LibraryUpdate {
        status,
        current_chapter: req.current_chapter,
        is_favorite: req.is_favorite,
    };

    let existing = app_state
        .db
        .find_library_entry(user_id, req.manga_id.trim())
        .await
        .map_err(|e| {
            error!("Failed to look up library entry: {:?}", e);
            port_error_response(e, "Failed to update library")
        })?;

    let (entry, created) = upsert_entry(existing, user_id, &req.manga_id, update, Utc::now())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let saved = app_state.db.save_library_entry(entry).await.map_err(|e| {
        error!("Failed to save library entry: {:?}", e);
        port_error_response(e, "Failed to update library")
    })?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved.into())))
}

/// Remove an entry from the library.
#[utoipa::path(
    delete,
    path = "/library/{entry_id}",
    params(("entry_id" = Uuid, Path, description = "Identifier of the library entry.")),
    responses(
        (status = 200, description = "Entry removed", body = MessageResponse),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Entry belongs to another user"),
        (status = 404, description = "Unknown entry")
    )
)]
pub async fn delete_library_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(entry_id): Path<Uuid>,
) -> HandlerResult<MessageResponse> {
    let entry = app_state.db.get_library_entry(entry_id).await.map_err(|e| {
        error!("Failed to load library entry {}: {:?}", entry_id, e);
        port_error_response(e, "Failed to delete library entry")
    })?;
    if entry.user_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Library entry belongs to another user".to_string(),
        ));
    }

    app_state
        .db
        .delete_library_entry(entry_id)
        .await
        .map_err(|e| {
            error!("Failed to delete library entry {}: {:?}", entry_id, e);
            port_error_response(e, "Failed to delete library entry")
        })?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Library entry removed".to_string(),
        }),
    ))
}
