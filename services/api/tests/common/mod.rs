//! In-memory implementations of the service ports for handler tests.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::state::AppState;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use manga_reader_core::ports::{CatalogService, DatabaseService, PortError, PortResult};
use manga_reader_core::{
    Award, AwardOutcome, CatalogEntry, Chapter, ChapterNumber, LanguageFilter, LibraryEntry,
    NewChapter, User, UserCredentials, UserProgression, Work,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, (User, String, UserProgression)>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    works: HashMap<Uuid, Work>,
    chapters: Vec<Chapter>,
    library: HashMap<Uuid, LibraryEntry>,
}

#[derive(Default)]
pub struct InMemoryDb {
    store: Mutex<Store>,
}

impl InMemoryDb {
    pub fn add_user(&self, name: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        let user = User {
            user_id,
            name: name.to_string(),
            email: format!("{}@example.com", name),
        };
        self.store
            .lock()
            .unwrap()
            .users
            .insert(user_id, (user, "hash".to_string(), UserProgression::default()));
        user_id
    }

    pub fn set_progression(&self, user_id: Uuid, progression: UserProgression) {
        let mut store = self.store.lock().unwrap();
        if let Some(entry) = store.users.get_mut(&user_id) {
            entry.2 = progression;
        }
    }

    /// Opens a day-long auth session for `user_id` and returns its id.
    pub fn add_session(&self, user_id: Uuid) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.store.lock().unwrap().sessions.insert(
            session_id.clone(),
            (user_id, Utc::now() + chrono::Duration::days(1)),
        );
        session_id
    }

    pub fn progression(&self, user_id: Uuid) -> UserProgression {
        self.store.lock().unwrap().users[&user_id].2
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user_with_email(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut store = self.store.lock().unwrap();
        if store.users.values().any(|(u, _, _)| u.email == email) {
            return Err(PortError::Conflict("Email is already registered".to_string()));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        };
        store.users.insert(
            user.user_id,
            (user.clone(), hashed_password.to_string(), UserProgression::default()),
        );
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let store = self.store.lock().unwrap();
        store
            .users
            .get(&user_id)
            .map(|(u, _, _)| u.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let store = self.store.lock().unwrap();
        store
            .users
            .values()
            .find(|(u, _, _)| u.email == email)
            .map(|(u, hash, _)| UserCredentials {
                user_id: u.user_id,
                email: u.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.store
            .lock()
            .unwrap()
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let store = self.store.lock().unwrap();
        match store.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.store.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn get_progression(&self, user_id: Uuid) -> PortResult<UserProgression> {
        let store = self.store.lock().unwrap();
        store
            .users
            .get(&user_id)
            .map(|(_, _, p)| *p)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn apply_award(&self, user_id: Uuid, award: Award) -> PortResult<AwardOutcome> {
        // Read and write under one lock, like the row lock in the Postgres adapter.
        let mut store = self.store.lock().unwrap();
        let entry = store
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        let outcome = entry.2.award(award);
        entry.2 = outcome.progression;
        Ok(outcome)
    }

    async fn create_work(
        &self,
        author_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<Work> {
        let work = Work {
            id: Uuid::new_v4(),
            author_id,
            title: title.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().works.insert(work.id, work.clone());
        Ok(work)
    }

    async fn get_work(&self, work_id: Uuid) -> PortResult<Work> {
        self.store
            .lock()
            .unwrap()
            .works
            .get(&work_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Work {} not found", work_id)))
    }

    async fn create_chapter(&self, work_id: Uuid, chapter: NewChapter) -> PortResult<Chapter> {
        let chapter = Chapter {
            id: Uuid::new_v4().to_string(),
            work_id: work_id.to_string(),
            number: chapter.number,
            title: chapter.title,
            language: chapter.language,
            page_count: chapter.page_count,
            published_at: Utc::now(),
        };
        self.store.lock().unwrap().chapters.push(chapter.clone());
        Ok(chapter)
    }

    async fn get_chapters_for_work(&self, work_id: Uuid) -> PortResult<Vec<Chapter>> {
        let work_id = work_id.to_string();
        Ok(self
            .store
            .lock()
            .unwrap()
            .chapters
            .iter()
            .filter(|c| c.work_id == work_id)
            .cloned()
            .collect())
    }

    async fn list_library(&self, user_id: Uuid) -> PortResult<Vec<LibraryEntry>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .library
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_library_entry(
        &self,
        user_id: Uuid,
        manga_id: &str,
    ) -> PortResult<Option<LibraryEntry>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .library
            .values()
            .find(|e| e.user_id == user_id && e.manga_id == manga_id)
            .cloned())
    }

    async fn get_library_entry(&self, entry_id: Uuid) -> PortResult<LibraryEntry> {
        self.store
            .lock()
            .unwrap()
            .library
            .get(&entry_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Library entry {} not found", entry_id)))
    }

    async fn save_library_entry(&self, entry: LibraryEntry) -> PortResult<LibraryEntry> {
        self.store
            .lock()
            .unwrap()
            .library
            .insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn delete_library_entry(&self, entry_id: Uuid) -> PortResult<()> {
        self.store
            .lock()
            .unwrap()
            .library
            .remove(&entry_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Library entry {} not found", entry_id)))
    }
}

/// A catalog that serves a fixed feed, honouring the language filter like the real API.
#[derive(Default)]
pub struct StaticCatalog {
    pub feeds: HashMap<String, Vec<CatalogEntry>>,
}

#[async_trait]
impl CatalogService for StaticCatalog {
    async fn fetch_chapters(
        &self,
        manga_id: &str,
        filter: &LanguageFilter,
    ) -> PortResult<Vec<CatalogEntry>> {
        let feed = self
            .feeds
            .get(manga_id)
            .ok_or_else(|| PortError::NotFound(format!("Manga {} not found", manga_id)))?;
        Ok(feed
            .iter()
            .filter(|entry| match entry {
                CatalogEntry::Parsed(chapter) => filter.allows(&chapter.language),
                CatalogEntry::Malformed { .. } => true,
            })
            .cloned()
            .collect())
    }
}

pub fn chapter(id: &str, number: &str, language: &str, pages: usize) -> Chapter {
    Chapter {
        id: id.to_string(),
        work_id: "manga-1".to_string(),
        number: ChapterNumber::new(number),
        title: format!("Chapter {}", number),
        language: language.to_string(),
        page_count: pages,
        published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn test_state(db: Arc<InMemoryDb>, catalog: StaticCatalog) -> Arc<AppState> {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/test".to_string()),
        "DEFAULT_LANGUAGES" => Some("en".to_string()),
        _ => None,
    })
    .expect("test config");

    Arc::new(AppState {
        db,
        catalog: Arc::new(catalog),
        config: Arc::new(config),
    })
}
