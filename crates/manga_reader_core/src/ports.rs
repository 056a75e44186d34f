//! crates/manga_reader_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    CatalogEntry, Chapter, LanguageFilter, LibraryEntry, NewChapter, User, UserCredentials, Work,
};
use crate::progression::{Award, AwardOutcome, UserProgression};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Progression ---
    async fn get_progression(&self, user_id: Uuid) -> PortResult<UserProgression>;

    /// Applies `award` to the user's stored progression as one atomic read-modify-write.
    /// Concurrent awards to the same user must serialize.
    async fn apply_award(&self, user_id: Uuid, award: Award) -> PortResult<AwardOutcome>;

    // --- Works and Chapters ---
    async fn create_work(&self, author_id: Uuid, title: &str, description: &str)
        -> PortResult<Work>;

    async fn get_work(&self, work_id: Uuid) -> PortResult<Work>;

    async fn create_chapter(&self, work_id: Uuid, chapter: NewChapter) -> PortResult<Chapter>;

    async fn get_chapters_for_work(&self, work_id: Uuid) -> PortResult<Vec<Chapter>>;

    // --- Library ---
    async fn list_library(&self, user_id: Uuid) -> PortResult<Vec<LibraryEntry>>;

    async fn find_library_entry(
        &self,
        user_id: Uuid,
        manga_id: &str,
    ) -> PortResult<Option<LibraryEntry>>;

    async fn get_library_entry(&self, entry_id: Uuid) -> PortResult<LibraryEntry>;

    /// Inserts or replaces the entry with the same id.
    async fn save_library_entry(&self, entry: LibraryEntry) -> PortResult<LibraryEntry>;

    async fn delete_library_entry(&self, entry_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetches the chapter feed of a work in the requested languages.
    /// Every raw item is returned, validated or not.
    async fn fetch_chapters(
        &self,
        manga_id: &str,
        filter: &LanguageFilter,
    ) -> PortResult<Vec<CatalogEntry>>;
}
