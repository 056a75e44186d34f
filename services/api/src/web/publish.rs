//! services/api/src/web/publish.rs
//!
//! Content-creation endpoints. Publishing a work or a chapter earns the author
//! experience once the content itself has been stored.

use crate::error::port_error_response;
use crate::web::protocol::{
    ChapterDto, ProgressionDto, PublishChapterRequest, PublishChapterResponse,
    PublishWorkRequest, PublishWorkResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use manga_reader_core::{AwardKind, ChapterNumber, NewChapter};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

type HandlerResult<T> = Result<(StatusCode, Json<T>), (StatusCode, String)>;

/// Grants the award for `kind`. The content is already committed, so a failure here is
/// logged and reported as a missing progression rather than failing the request.
async fn grant_award(
    app_state: &AppState,
    user_id: Uuid,
    kind: AwardKind,
) -> (Option<ProgressionDto>, u64) {
    match app_state.db.apply_award(user_id, kind.award()).await {
        Ok(outcome) => {
            if outcome.levels_gained > 0 {
                info!(
                    "User {} reached level {} (+{})",
                    user_id, outcome.progression.level, outcome.levels_gained
                );
            }
            (Some(outcome.progression.into()), outcome.levels_gained)
        }
        Err(e) => {
            error!("Failed to apply {:?} award to user {}: {:?}", kind, user_id, e);
            (None, 0)
        }
    }
}

/// Publish a new work.
#[utoipa::path(
    post,
    path = "/works",
    request_body = PublishWorkRequest,
    responses(
        (status = 201, description = "Work published", body = PublishWorkResponse),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn publish_work_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<PublishWorkRequest>,
) -> HandlerResult<PublishWorkResponse> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }

    let work = app_state
        .db
        .create_work(user_id, title, req.description.trim())
        .await
        .map_err(|e| {
            error!("Failed to create work: {:?}", e);
            port_error_response(e, "Failed to create work")
        })?;
    info!("User {} published work {}", user_id, work.id);

    let (progression, levels_gained) = grant_award(&app_state, user_id, AwardKind::WorkPublished).await;
    Ok((
        StatusCode::CREATED,
        Json(PublishWorkResponse {
            work: work.into(),
            progression,
            levels_gained,
        }),
    ))
}

/// Publish a chapter of one of your works.
#[utoipa::path(
    post,
    path = "/works/{work_id}/chapters",
    request_body = PublishChapterRequest,
    params(("work_id" = Uuid, Path, description = "Identifier of the work.")),
    responses(
        (status = 201, description = "Chapter published", body = PublishChapterResponse),
        (status = 400, description = "Invalid chapter"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Work belongs to another user"),
        (status = 404, description = "Unknown work")
    )
)]
pub async fn publish_chapter_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(work_id): Path<Uuid>,
    Json(req): Json<PublishChapterRequest>,
) -> HandlerResult<PublishChapterResponse> {
    let number = req.number.trim();
    let language = req.language.trim().to_ascii_lowercase();
    if number.is_empty() || language.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Chapter number and language are required".to_string(),
        ));
    }
    if req.page_count == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "A chapter needs at least one page".to_string(),
        ));
    }

    let work = app_state.db.get_work(work_id).await.map_err(|e| {
        error!("Failed to load work {}: {:?}", work_id, e);
        port_error_response(e, "Failed to load work")
    })?;
    if work.author_id != user_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only the author can publish chapters".to_string(),
        ));
    }

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Chapter {}", number));

    let chapter = app_state
        .db
        .create_chapter(
            work_id,
            NewChapter {
                number: ChapterNumber::new(number),
                title,
                language,
                page_count: req.page_count,
            },
        )
        .await
        .map_err(|e| {
            error!("Failed to create chapter: {:?}", e);
            port_error_response(e, "Failed to create chapter")
        })?;
    info!("User {} published chapter {} of work {}", user_id, chapter.id, work_id);

    let (progression, levels_gained) =
        grant_award(&app_state, user_id, AwardKind::ChapterPublished).await;
    Ok((
        StatusCode::CREATED,
        Json(PublishChapterResponse {
            chapter: ChapterDto::from(&chapter),
            progression,
            levels_gained,
        }),
    ))
}
