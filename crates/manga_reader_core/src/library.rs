//! crates/manga_reader_core/src/library.rs
//!
//! Merge rules for a user's library: the list of works they read, plan to read,
//! finished or dropped.

use crate::domain::{LibraryEntry, ReadStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LibraryError {
    #[error("Manga id must not be empty")]
    MissingManga,
    #[error("Invalid current chapter: {0}")]
    InvalidChapter(f64),
}

/// A partial change to a library entry. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryUpdate {
    pub status: Option<ReadStatus>,
    pub current_chapter: Option<f64>,
    pub is_favorite: Option<bool>,
}

impl LibraryUpdate {
    fn validate(&self) -> Result<(), LibraryError> {
        match self.current_chapter {
            Some(chapter) if !chapter.is_finite() || chapter < 0.0 => {
                Err(LibraryError::InvalidChapter(chapter))
            }
            _ => Ok(()),
        }
    }
}

/// Applies `update` to the user's entry for `manga_id`, creating it when absent.
///
/// Returns the entry to store and whether it is new. New entries default to
/// plan-to-read, chapter 0, not a favourite.
pub fn upsert_entry(
    existing: Option<LibraryEntry>,
    user_id: Uuid,
    manga_id: &str,
    update: LibraryUpdate,
    now: DateTime<Utc>,
) -> Result<(LibraryEntry, bool), LibraryError> {
    if manga_id.trim().is_empty() {
        return Err(LibraryError::MissingManga);
    }
    update.validate()?;

    match existing {
        Some(entry) => {
            let merged = LibraryEntry {
                status: update.status.unwrap_or(entry.status),
                current_chapter: update.current_chapter.unwrap_or(entry.current_chapter),
                is_favorite: update.is_favorite.unwrap_or(entry.is_favorite),
                updated_at: now,
                ..entry
            };
            Ok((merged, false))
        }
        None => {
            let created = LibraryEntry {
                id: Uuid::new_v4(),
                user_id,
                manga_id: manga_id.trim().to_string(),
                status: update.status.unwrap_or(ReadStatus::PlanToRead),
                current_chapter: update.current_chapter.unwrap_or(0.0),
                is_favorite: update.is_favorite.unwrap_or(false),
                updated_at: now,
            };
            Ok((created, true))
        }
    }
}

/// Orders entries most recently updated first.
pub fn sort_recent_first(entries: &mut [LibraryEntry]) {
    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
