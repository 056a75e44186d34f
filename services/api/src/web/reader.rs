//! services/api/src/web/reader.rs
//!
//! Chapter listings and the stateless reader endpoint. The reading position lives on
//! the client; each request carries it in and gets the next position back.

use crate::error::port_error_response;
use crate::web::protocol::{
    ChapterDto, ChapterListResponse, LanguageQuery, ReaderAction, ReaderRequest, ReaderResponse,
};
use crate::web::state::{language_label, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use manga_reader_core::{
    CatalogEntry, Chapter, ChapterList, LanguageFilter, Navigation, ReaderPosition, Step,
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

type HandlerResult<T> = Result<(StatusCode, Json<T>), (StatusCode, String)>;

/// Upper bound on a client-reported page count.
pub const MAX_PAGE_COUNT: usize = 10_000;

//=========================================================================================
// Navigation
//=========================================================================================

/// The language selection whose chapters are needed to answer `request`.
pub fn required_filter(request: &ReaderRequest, current: &LanguageFilter) -> LanguageFilter {
    match &request.action {
        ReaderAction::SwitchLanguage { lang } => {
            LanguageFilter::parse(lang).unwrap_or_else(|| current.clone())
        }
        _ => current.clone(),
    }
}

/// Applies the requested action to the client's position over `catalog`.
pub fn resolve_reader(
    catalog: &[Chapter],
    request: &ReaderRequest,
    current: &LanguageFilter,
) -> ReaderResponse {
    let list = ChapterList::build(catalog, current);
    let mut position = ReaderPosition::open(&list, &request.chapter_id, request.layout.into());
    if let Some(page_count) = request.page_count {
        position = position.with_page_count(page_count.min(MAX_PAGE_COUNT));
    }
    let position = position.with_page(request.page_index);

    let stayed = |position| Navigation {
        position,
        step: Step::Stayed,
    };

    let (list, filter, navigation) = match &request.action {
        ReaderAction::Open => (list, current.clone(), stayed(position)),
        ReaderAction::Advance => {
            let navigation = position.advance(&list);
            (list, current.clone(), navigation)
        }
        ReaderAction::Retreat => {
            let navigation = position.retreat(&list);
            (list, current.clone(), navigation)
        }
        ReaderAction::Jump { page_index } => {
            (list, current.clone(), position.jump_to_page(*page_index))
        }
        ReaderAction::NextChapter => {
            let navigation = position.next_chapter(&list);
            (list, current.clone(), navigation)
        }
        ReaderAction::PreviousChapter => {
            let navigation = position.previous_chapter(&list);
            (list, current.clone(), navigation)
        }
        ReaderAction::SwitchLanguage { .. } => {
            let filter = required_filter(request, current);
            let (list, moved) = position.switch_language(catalog, &request.chapter_id, &filter);
            (list, filter, stayed(moved))
        }
    };

    let links = navigation.position.links(&list);
    ReaderResponse::from_navigation(
        &request.chapter_id,
        navigation.position.chapter(&list),
        &navigation,
        links.previous,
        links.next,
        language_label(&filter),
    )
}

fn parsed_chapters(entries: Vec<CatalogEntry>) -> Vec<Chapter> {
    entries
        .into_iter()
        .filter_map(CatalogEntry::into_chapter)
        .collect()
}

fn chapter_list_response(
    work_id: String,
    chapters: &[Chapter],
    filter: &LanguageFilter,
) -> ChapterListResponse {
    let list = ChapterList::build(chapters, filter);
    ChapterListResponse {
        work_id,
        chapters: list.iter().map(ChapterDto::from).collect(),
    }
}

//=========================================================================================
// Catalog-backed Handlers
//=========================================================================================

/// List the chapters of a catalog manga in reading order.
#[utoipa::path(
    get,
    path = "/manga/{manga_id}/chapters",
    params(
        ("manga_id" = String, Path, description = "Catalog identifier of the manga."),
        LanguageQuery
    ),
    responses(
        (status = 200, description = "Ordered chapters", body = ChapterListResponse),
        (status = 404, description = "Unknown manga"),
        (status = 500, description = "Catalog unavailable")
    )
)]
pub async fn list_manga_chapters_handler(
    State(app_state): State<Arc<AppState>>,
    Path(manga_id): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> HandlerResult<ChapterListResponse> {
    let filter = app_state.language_filter(query.lang.as_deref());
    let entries = app_state
        .catalog
        .fetch_chapters(&manga_id, &filter)
        .await
        .map_err(|e| {
            error!("Failed to fetch chapters for {}: {:?}", manga_id, e);
            port_error_response(e, "Failed to fetch chapters")
        })?;

    let chapters = parsed_chapters(entries);
    Ok((
        StatusCode::OK,
        Json(chapter_list_response(manga_id, &chapters, &filter)),
    ))
}

/// Move the reader of a catalog manga.
#[utoipa::path(
    post,
    path = "/manga/{manga_id}/reader",
    request_body = ReaderRequest,
    params(("manga_id" = String, Path, description = "Catalog identifier of the manga.")),
    responses(
        (status = 200, description = "The new reading position", body = ReaderResponse),
        (status = 404, description = "Unknown manga"),
        (status = 500, description = "Catalog unavailable")
    )
)]
pub async fn manga_reader_handler(
    State(app_state): State<Arc<AppState>>,
    Path(manga_id): Path<String>,
    Json(request): Json<ReaderRequest>,
) -> HandlerResult<ReaderResponse> {
    let current = app_state.language_filter(request.lang.as_deref());
    let needed = required_filter(&request, &current);
    let entries = app_state
        .catalog
        .fetch_chapters(&manga_id, &needed)
        .await
        .map_err(|e| {
            error!("Failed to fetch chapters for {}: {:?}", manga_id, e);
            port_error_response(e, "Failed to fetch chapters")
        })?;

    let response = resolve_reader(&parsed_chapters(entries), &request, &current);
    debug!(
        "Reader {:?} on {} -> chapter {} page {} ({:?})",
        request.action, manga_id, response.chapter_id, response.page_index, response.step
    );
    Ok((StatusCode::OK, Json(response)))
}

//=========================================================================================
// Locally Published Works
//=========================================================================================

async fn work_chapters(app_state: &AppState, work_id: Uuid) -> Result<Vec<Chapter>, (StatusCode, String)> {
    let db = &app_state.db;
    let result = async {
        db.get_work(work_id).await?;
        db.get_chapters_for_work(work_id).await
    }
    .await;

    result.map_err(|e| {
        error!("Failed to load chapters of work {}: {:?}", work_id, e);
        port_error_response(e, "Failed to load chapters")
    })
}

/// List the chapters of a locally published work in reading order.
#[utoipa::path(
    get,
    path = "/works/{work_id}/chapters",
    params(
        ("work_id" = Uuid, Path, description = "Identifier of the work."),
        LanguageQuery
    ),
    responses(
        (status = 200, description = "Ordered chapters", body = ChapterListResponse),
        (status = 404, description = "Unknown work")
    )
)]
pub async fn list_work_chapters_handler(
    State(app_state): State<Arc<AppState>>,
    Path(work_id): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
) -> HandlerResult<ChapterListResponse> {
    let filter = app_state.language_filter(query.lang.as_deref());
    let chapters = work_chapters(&app_state, work_id).await?;
    Ok((
        StatusCode::OK,
        Json(chapter_list_response(work_id.to_string(), &chapters, &filter)),
    ))
}

/// Move the reader of a locally published work.
#[utoipa::path(
    post,
    path = "/works/{work_id}/reader",
    request_body = ReaderRequest,
    params(("work_id" = Uuid, Path, description = "Identifier of the work.")),
    responses(
        (status = 200, description = "The new reading position", body = ReaderResponse),
        (status = 404, description = "Unknown work")
    )
)]
pub async fn work_reader_handler(
    State(app_state): State<Arc<AppState>>,
    Path(work_id): Path<Uuid>,
    Json(request): Json<ReaderRequest>,
) -> HandlerResult<ReaderResponse> {
    let current = app_state.language_filter(request.lang.as_deref());
    let chapters = work_chapters(&app_state, work_id).await?;
    Ok((
        StatusCode::OK,
        Json(resolve_reader(&chapters, &request, &current)),
    ))
}
