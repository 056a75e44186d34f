//! services/api/src/web/rest.rs
//!
//! Contains the profile endpoint and the master definition for the OpenAPI
//! specification.

use crate::error::port_error_response;
use crate::web::{
    auth, library,
    protocol::{
        ChapterDto, ChapterListResponse, LayoutModeDto, LibraryEntryDto, LibraryUpsertRequest,
        MessageResponse, ProfileResponse, ProgressionDto, PublishChapterRequest,
        PublishChapterResponse, PublishWorkRequest, PublishWorkResponse, ReaderAction,
        ReaderRequest, ReaderResponse, StepDto, WorkDto,
    },
    publish, reader,
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        profile_handler,
        reader::list_manga_chapters_handler,
        reader::manga_reader_handler,
        reader::list_work_chapters_handler,
        reader::work_reader_handler,
        publish::publish_work_handler,
        publish::publish_chapter_handler,
        library::list_library_handler,
        library::upsert_library_handler,
        library::delete_library_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            ChapterDto,
            ChapterListResponse,
            LayoutModeDto,
            ReaderAction,
            ReaderRequest,
            ReaderResponse,
            StepDto,
            ProgressionDto,
            ProfileResponse,
            WorkDto,
            PublishWorkRequest,
            PublishWorkResponse,
            PublishChapterRequest,
            PublishChapterResponse,
            LibraryUpsertRequest,
            LibraryEntryDto,
            MessageResponse,
        )
    ),
    tags(
        (name = "Manga Reader API", description = "Reading, publishing and library endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// The signed-in user's profile and progression.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "User no longer exists")
    )
)]
pub async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<(StatusCode, Json<ProfileResponse>), (StatusCode, String)> {
    let db = &app_state.db;
    let result = async {
        let user = db.get_user_by_id(user_id).await?;
        let progression = db.get_progression(user_id).await?;
        Ok::<_, manga_reader_core::PortError>((user, progression))
    }
    .await;

    match result {
        Ok((user, progression)) => Ok((
            StatusCode::OK,
            Json(ProfileResponse {
                user_id: user.user_id,
                name: user.name,
                email: user.email,
                progression: progression.into(),
            }),
        )),
        Err(e) => {
            error!("Failed to load profile of {}: {:?}", user_id, e);
            Err(port_error_response(e, "Failed to load profile"))
        }
    }
}
