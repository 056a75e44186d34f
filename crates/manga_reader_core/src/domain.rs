//! crates/manga_reader_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Chapters and Works
//=========================================================================================

/// A chapter number as published by the catalog.
///
/// Kept as the original label so values like "10.5" or "extra" survive, with the
/// numeric value cached for ordering. Numeric labels order before non-numeric ones.
#[derive(Debug, Clone)]
pub struct ChapterNumber {
    label: String,
    value: Option<f64>,
}

impl ChapterNumber {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let value = label
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite());
        Self { label, value }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The numeric value, when the label is a number.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.value, other.value) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.label.cmp(&other.label),
        }
    }
}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ChapterNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChapterNumber {}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A single numbered installment of a work in one translation language.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub work_id: String,
    pub number: ChapterNumber,
    pub title: String,
    pub language: String,
    pub page_count: usize,
    pub published_at: DateTime<Utc>,
}

/// The result of validating one raw catalog item at the provider boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    Parsed(Chapter),
    Malformed { id: Option<String>, reason: String },
}

impl CatalogEntry {
    pub fn into_chapter(self) -> Option<Chapter> {
        match self {
            CatalogEntry::Parsed(chapter) => Some(chapter),
            CatalogEntry::Malformed { .. } => None,
        }
    }
}

/// Which translations the reader wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageFilter {
    All,
    Only(Vec<String>),
}

impl LanguageFilter {
    /// Parses a comma separated selection such as `en,ar` or `all`.
    /// Returns `None` when nothing usable was supplied.
    pub fn parse(selection: &str) -> Option<Self> {
        let codes: Vec<String> = selection
            .split(',')
            .map(|code| code.trim().to_ascii_lowercase())
            .filter(|code| !code.is_empty())
            .collect();

        if codes.is_empty() {
            return None;
        }
        if codes.iter().any(|code| code == "all") {
            return Some(LanguageFilter::All);
        }
        Some(LanguageFilter::Only(codes))
    }

    pub fn allows(&self, language: &str) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(codes) => codes.iter().any(|c| c.eq_ignore_ascii_case(language)),
        }
    }

    /// Position of `language` in the preference list, used as an ordering tie-break.
    pub fn preference(&self, language: &str) -> usize {
        match self {
            LanguageFilter::All => 0,
            LanguageFilter::Only(codes) => codes
                .iter()
                .position(|c| c.eq_ignore_ascii_case(language))
                .unwrap_or(codes.len()),
        }
    }
}

/// A title published by a user of the site.
#[derive(Debug, Clone)]
pub struct Work {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a user publishes a new chapter for one of their works.
#[derive(Debug, Clone)]
pub struct NewChapter {
    pub number: ChapterNumber,
    pub title: String,
    pub language: String,
    pub page_count: usize,
}

//=========================================================================================
// Users
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Library
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Reading,
    Completed,
    OnHold,
    Dropped,
    PlanToRead,
}

impl ReadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStatus::Reading => "READING",
            ReadStatus::Completed => "COMPLETED",
            ReadStatus::OnHold => "ON_HOLD",
            ReadStatus::Dropped => "DROPPED",
            ReadStatus::PlanToRead => "PLAN_TO_READ",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "READING" => Some(ReadStatus::Reading),
            "COMPLETED" => Some(ReadStatus::Completed),
            "ON_HOLD" => Some(ReadStatus::OnHold),
            "DROPPED" => Some(ReadStatus::Dropped),
            "PLAN_TO_READ" => Some(ReadStatus::PlanToRead),
            _ => None,
        }
    }
}

/// A work tracked in a user's library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub manga_id: String,
    pub status: ReadStatus,
    pub current_chapter: f64,
    pub is_favorite: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_chapters_sort_between_neighbours() {
        let mut numbers: Vec<ChapterNumber> =
            ["11", "10.5", "10", "2"].into_iter().map(ChapterNumber::new).collect();
        numbers.sort();
        let labels: Vec<&str> = numbers.iter().map(|n| n.label()).collect();
        assert_eq!(labels, vec!["2", "10", "10.5", "11"]);
    }

    #[test]
    fn non_numeric_chapters_sort_last() {
        let mut numbers: Vec<ChapterNumber> = ["extra", "3", "bonus", "1"]
            .into_iter()
            .map(ChapterNumber::new)
            .collect();
        numbers.sort();
        let labels: Vec<&str> = numbers.iter().map(|n| n.label()).collect();
        assert_eq!(labels, vec!["1", "3", "bonus", "extra"]);
    }

    #[test]
    fn language_filter_parses_all_and_lists() {
        assert_eq!(LanguageFilter::parse("all"), Some(LanguageFilter::All));
        assert_eq!(
            LanguageFilter::parse(" EN, ar ,"),
            Some(LanguageFilter::Only(vec!["en".to_string(), "ar".to_string()]))
        );
        assert_eq!(LanguageFilter::parse(" , "), None);
    }

    #[test]
    fn language_preference_follows_selection_order() {
        let filter = LanguageFilter::Only(vec!["ar".to_string(), "en".to_string()]);
        assert_eq!(filter.preference("ar"), 0);
        assert_eq!(filter.preference("en"), 1);
        assert_eq!(filter.preference("fr"), 2);
        assert!(filter.allows("EN"));
        assert!(!filter.allows("fr"));
    }

    #[test]
    fn read_status_round_trips_through_labels() {
        assert_eq!(ReadStatus::parse("on_hold"), Some(ReadStatus::OnHold));
        assert_eq!(ReadStatus::PlanToRead.as_str(), "PLAN_TO_READ");
        assert_eq!(ReadStatus::parse("unknown"), None);
    }
}
