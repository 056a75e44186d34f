pub mod auth;
pub mod library;
pub mod middleware;
pub mod protocol;
pub mod publish;
pub mod reader;
pub mod rest;
pub mod state;

// Re-export the handlers so the binary can build the router from one place.
pub use library::{delete_library_handler, list_library_handler, upsert_library_handler};
pub use middleware::require_auth;
pub use publish::{publish_chapter_handler, publish_work_handler};
pub use reader::{
    list_manga_chapters_handler, list_work_chapters_handler, manga_reader_handler,
    work_reader_handler,
};
pub use rest::profile_handler;

use crate::web::state::AppState;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Builds the API router: public auth and reading routes, and the routes that need a
/// signed-in user behind `require_auth`. Routers are merged per method, so reading a
/// work's chapters stays public while publishing to the same path does not.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/manga/{manga_id}/chapters", get(list_manga_chapters_handler))
        .route("/manga/{manga_id}/reader", post(manga_reader_handler))
        .route("/works/{work_id}/chapters", get(list_work_chapters_handler))
        .route("/works/{work_id}/reader", post(work_reader_handler));

    let protected_routes = Router::new()
        .route("/profile", get(profile_handler))
        .route("/works", post(publish_work_handler))
        .route("/works/{work_id}/chapters", post(publish_chapter_handler))
        .route("/library", get(list_library_handler).post(upsert_library_handler))
        .route("/library/{entry_id}", delete(delete_library_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
