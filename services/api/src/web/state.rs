//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the small helpers handlers share.

use crate::config::Config;
use manga_reader_core::ports::{CatalogService, DatabaseService};
use manga_reader_core::LanguageFilter;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub catalog: Arc<dyn CatalogService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Resolves a `lang` query value, falling back to the configured default languages.
    pub fn language_filter(&self, lang: Option<&str>) -> LanguageFilter {
        lang.and_then(LanguageFilter::parse)
            .unwrap_or_else(|| self.config.default_languages.clone())
    }
}

/// Renders a filter back into the `lang` query form.
pub fn language_label(filter: &LanguageFilter) -> String {
    match filter {
        LanguageFilter::All => "all".to_string(),
        LanguageFilter::Only(codes) => codes.join(","),
    }
}
