//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.
//! The core domain stays serialization-free; everything crossing the wire is mapped here.

use chrono::{DateTime, Utc};
use manga_reader_core::{
    Chapter, LayoutMode, LibraryEntry, Navigation, Step, UserProgression, Work,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Chapters and Reader
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ChapterDto {
    pub id: String,
    pub work_id: String,
    pub number: String,
    pub title: String,
    pub language: String,
    pub page_count: usize,
    pub published_at: DateTime<Utc>,
}

impl From<&Chapter> for ChapterDto {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id.clone(),
            work_id: chapter.work_id.clone(),
            number: chapter.number.label().to_string(),
            title: chapter.title.clone(),
            language: chapter.language.clone(),
            page_count: chapter.page_count,
            published_at: chapter.published_at,
        }
    }
}

/// Query string accepted by chapter listings.
#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct LanguageQuery {
    /// Comma separated language codes, or `all`.
    pub lang: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ChapterListResponse {
    pub work_id: String,
    pub chapters: Vec<ChapterDto>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutModeDto {
    #[default]
    Single,
    Double,
    Continuous,
}

impl From<LayoutModeDto> for LayoutMode {
    fn from(mode: LayoutModeDto) -> Self {
        match mode {
            LayoutModeDto::Single => LayoutMode::Single,
            LayoutModeDto::Double => LayoutMode::Double,
            LayoutModeDto::Continuous => LayoutMode::Continuous,
        }
    }
}

impl From<LayoutMode> for LayoutModeDto {
    fn from(mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Single => LayoutModeDto::Single,
            LayoutMode::Double => LayoutModeDto::Double,
            LayoutMode::Continuous => LayoutModeDto::Continuous,
        }
    }
}

/// Navigation requested by the reader.
#[derive(Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReaderAction {
    /// Open the chapter without moving.
    Open,
    Advance,
    Retreat,
    Jump { page_index: usize },
    NextChapter,
    PreviousChapter,
    SwitchLanguage { lang: String },
}

/// The client-held reading position plus the action to apply to it.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct ReaderRequest {
    pub chapter_id: String,
    #[serde(default)]
    pub page_index: usize,
    /// Number of pages actually served for the chapter, when known.
    pub page_count: Option<usize>,
    #[serde(default)]
    pub layout: LayoutModeDto,
    pub lang: Option<String>,
    pub action: ReaderAction,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepDto {
    Stayed,
    TurnedPage,
    EnteredChapter,
}

impl From<Step> for StepDto {
    fn from(step: Step) -> Self {
        match step {
            Step::Stayed => StepDto::Stayed,
            Step::TurnedPage => StepDto::TurnedPage,
            Step::EnteredChapter => StepDto::EnteredChapter,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ReaderResponse {
    /// The chapter to display. For an unresolved position this is the requested chapter.
    pub chapter_id: String,
    /// `false` when the chapter is not part of the selected languages.
    pub resolved: bool,
    pub chapter: Option<ChapterDto>,
    pub page_index: usize,
    pub page_count: usize,
    pub layout: LayoutModeDto,
    pub step: StepDto,
    pub previous_chapter_id: Option<String>,
    pub next_chapter_id: Option<String>,
    /// The language selection the position refers to.
    pub lang: String,
}

impl ReaderResponse {
    pub fn from_navigation(
        requested_chapter_id: &str,
        chapter: Option<&Chapter>,
        navigation: &Navigation,
        previous_chapter_id: Option<String>,
        next_chapter_id: Option<String>,
        lang: String,
    ) -> Self {
        let position = navigation.position;
        Self {
            chapter_id: chapter
                .map(|c| c.id.clone())
                .unwrap_or_else(|| requested_chapter_id.to_string()),
            resolved: position.is_resolved(),
            chapter: chapter.map(ChapterDto::from),
            page_index: position.page_index,
            page_count: position.page_count,
            layout: position.layout.into(),
            step: navigation.step.into(),
            previous_chapter_id,
            next_chapter_id,
            lang,
        }
    }
}

//=========================================================================================
// Publishing and Progression
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ProgressionDto {
    pub level: u64,
    pub experience: u64,
    pub experience_to_next_level: u64,
    pub score: u64,
    pub percent_to_next_level: f64,
}

impl From<UserProgression> for ProgressionDto {
    fn from(progression: UserProgression) -> Self {
        Self {
            level: progression.level,
            experience: progression.experience,
            experience_to_next_level: progression.experience_to_next_level,
            score: progression.score,
            percent_to_next_level: progression.percent_to_next_level(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub progression: ProgressionDto,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct WorkDto {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Work> for WorkDto {
    fn from(work: Work) -> Self {
        Self {
            id: work.id,
            author_id: work.author_id,
            title: work.title,
            description: work.description,
            created_at: work.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct PublishWorkRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PublishWorkResponse {
    pub work: WorkDto,
    /// `None` when the work was stored but the award could not be applied.
    pub progression: Option<ProgressionDto>,
    pub levels_gained: u64,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct PublishChapterRequest {
    pub number: String,
    pub title: Option<String>,
    pub language: String,
    pub page_count: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PublishChapterResponse {
    pub chapter: ChapterDto,
    pub progression: Option<ProgressionDto>,
    pub levels_gained: u64,
}

//=========================================================================================
// Library
//=========================================================================================

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct LibraryUpsertRequest {
    pub manga_id: String,
    /// One of READING, COMPLETED, ON_HOLD, DROPPED, PLAN_TO_READ.
    pub status: Option<String>,
    pub current_chapter: Option<f64>,
    pub is_favorite: Option<bool>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct LibraryEntryDto {
    pub id: Uuid,
    pub manga_id: String,
    pub status: String,
    pub current_chapter: f64,
    pub is_favorite: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<LibraryEntry> for LibraryEntryDto {
    fn from(entry: LibraryEntry) -> Self {
        Self {
            id: entry.id,
            manga_id: entry.manga_id,
            status: entry.status.as_str().to_string(),
            current_chapter: entry.current_chapter,
            is_favorite: entry.is_favorite,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct MessageResponse {
    pub message: String,
}
