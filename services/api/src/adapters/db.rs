//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manga_reader_core::domain::{
    AuthSession, Chapter, ChapterNumber, LibraryEntry, NewChapter, ReadStatus, User,
    UserCredentials, Work,
};
use manga_reader_core::ports::{DatabaseService, PortError, PortResult};
use manga_reader_core::progression::{Award, AwardOutcome, UserProgression};
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn conflict_or_unexpected(e: sqlx::Error, what: &str) -> PortError {
    let unique = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        PortError::Conflict(what.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    name: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}
impl AuthSessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            id: self.id,
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressionRecord {
    experience: i64,
    level: i64,
    experience_to_next_level: i64,
    score: i64,
}
impl ProgressionRecord {
    fn to_domain(self) -> UserProgression {
        UserProgression {
            experience: to_u64(self.experience),
            level: to_u64(self.level).max(1),
            experience_to_next_level: to_u64(self.experience_to_next_level).max(1),
            score: to_u64(self.score),
        }
    }
}

#[derive(FromRow)]
struct WorkRecord {
    id: Uuid,
    author_id: Uuid,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}
impl WorkRecord {
    fn to_domain(self) -> Work {
        Work {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ChapterRecord {
    id: Uuid,
    work_id: Uuid,
    number: String,
    title: String,
    language: String,
    page_count: i32,
    published_at: DateTime<Utc>,
}
impl ChapterRecord {
    fn to_domain(self) -> Chapter {
        Chapter {
            id: self.id.to_string(),
            work_id: self.work_id.to_string(),
            number: ChapterNumber::new(self.number),
            title: self.title,
            language: self.language,
            page_count: usize::try_from(self.page_count).unwrap_or(0),
            published_at: self.published_at,
        }
    }
}

#[derive(FromRow)]
struct LibraryEntryRecord {
    id: Uuid,
    user_id: Uuid,
    manga_id: String,
    status: String,
    current_chapter: f64,
    is_favorite: bool,
    updated_at: DateTime<Utc>,
}
impl LibraryEntryRecord {
    fn to_domain(self) -> LibraryEntry {
        let status = ReadStatus::parse(&self.status).unwrap_or_else(|| {
            warn!("Unknown library status '{}' on entry {}", self.status, self.id);
            ReadStatus::PlanToRead
        });
        LibraryEntry {
            id: self.id,
            user_id: self.user_id,
            manga_id: self.manga_id,
            status,
            current_chapter: self.current_chapter,
            is_favorite: self.is_favorite,
            updated_at: self.updated_at,
        }
    }
}

const LIBRARY_COLUMNS: &str =
    "id, user_id, manga_id, status, current_chapter, is_favorite, updated_at";
const CHAPTER_COLUMNS: &str = "id, work_id, number, title, language, page_count, published_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let defaults = UserProgression::default();
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, name, email, hashed_password, experience, level, experience_to_next_level, score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING user_id, name, email",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(to_i64(defaults.experience))
        .bind(to_i64(defaults.level))
        .bind(to_i64(defaults.experience_to_next_level))
        .bind(to_i64(defaults.score))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "Email is already registered"))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, name, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let session = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT id, user_id, expires_at FROM auth_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(AuthSessionRecord::to_domain)
        .ok_or(PortError::Unauthorized)?;

        if session.expires_at <= Utc::now() {
            debug!("Auth session {} has expired", session.id);
            return Err(PortError::Unauthorized);
        }
        Ok(session.user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_progression(&self, user_id: Uuid) -> PortResult<UserProgression> {
        let record = sqlx::query_as::<_, ProgressionRecord>(
            "SELECT experience, level, experience_to_next_level, score FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn apply_award(&self, user_id: Uuid, award: Award) -> PortResult<AwardOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The row lock serializes concurrent awards for the same user.
        let current = sqlx::query_as::<_, ProgressionRecord>(
            "SELECT experience, level, experience_to_next_level, score FROM users WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", user_id)))?
        .to_domain();

        let outcome = current.award(award);
        let next = outcome.progression;

        sqlx::query(
            "UPDATE users SET experience = $1, level = $2, experience_to_next_level = $3, score = $4 WHERE user_id = $5",
        )
        .bind(to_i64(next.experience))
        .bind(to_i64(next.level))
        .bind(to_i64(next.experience_to_next_level))
        .bind(to_i64(next.score))
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(outcome)
    }

    async fn create_work(
        &self,
        author_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<Work> {
        let record = sqlx::query_as::<_, WorkRecord>(
            "INSERT INTO works (id, author_id, title, description) VALUES ($1, $2, $3, $4) \
             RETURNING id, author_id, title, description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_work(&self, work_id: Uuid) -> PortResult<Work> {
        let record = sqlx::query_as::<_, WorkRecord>(
            "SELECT id, author_id, title, description, created_at FROM works WHERE id = $1",
        )
        .bind(work_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Work {} not found", work_id)))?;
        Ok(record.to_domain())
    }

    async fn create_chapter(&self, work_id: Uuid, chapter: NewChapter) -> PortResult<Chapter> {
        let page_count = i32::try_from(chapter.page_count)
            .map_err(|_| PortError::InvalidInput("Page count is too large".to_string()))?;
        let record = sqlx::query_as::<_, ChapterRecord>(&format!(
            "INSERT INTO chapters (id, work_id, number, title, language, page_count) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CHAPTER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(work_id)
        .bind(chapter.number.label())
        .bind(&chapter.title)
        .bind(&chapter.language)
        .bind(page_count)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_chapters_for_work(&self, work_id: Uuid) -> PortResult<Vec<Chapter>> {
        let records = sqlx::query_as::<_, ChapterRecord>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE work_id = $1 ORDER BY published_at ASC"
        ))
        .bind(work_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let chapters = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(chapters)
    }

    async fn list_library(&self, user_id: Uuid) -> PortResult<Vec<LibraryEntry>> {
        let records = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let entries = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(entries)
    }

    async fn find_library_entry(
        &self,
        user_id: Uuid,
        manga_id: &str,
    ) -> PortResult<Option<LibraryEntry>> {
        let record = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE user_id = $1 AND manga_id = $2"
        ))
        .bind(user_id)
        .bind(manga_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn get_library_entry(&self, entry_id: Uuid) -> PortResult<LibraryEntry> {
        let record = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE id = $1"
        ))
        .bind(entry_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Library entry {} not found", entry_id)))?;
        Ok(record.to_domain())
    }

    async fn save_library_entry(&self, entry: LibraryEntry) -> PortResult<LibraryEntry> {
        let record = sqlx::query_as::<_, LibraryEntryRecord>(&format!(
            "INSERT INTO library_entries ({LIBRARY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, \
             current_chapter = EXCLUDED.current_chapter, is_favorite = EXCLUDED.is_favorite, \
             updated_at = EXCLUDED.updated_at \
             RETURNING {LIBRARY_COLUMNS}"
        ))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.manga_id)
        .bind(entry.status.as_str())
        .bind(entry.current_chapter)
        .bind(entry.is_favorite)
        .bind(entry.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "Library entry already exists"))?;
        Ok(record.to_domain())
    }

    async fn delete_library_entry(&self, entry_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM library_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Library entry {} not found",
                entry_id
            )));
        }
        Ok(())
    }
}
