//! services/api/src/adapters/catalog.rs
//!
//! This module contains the adapter for the third-party content catalog (a MangaDex
//! compatible API). It implements the `CatalogService` port from the `core` crate and
//! validates every feed item into a `CatalogEntry` at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manga_reader_core::domain::{CatalogEntry, Chapter, ChapterNumber, LanguageFilter};
use manga_reader_core::ports::{CatalogService, PortError, PortResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Upper bound on feed pages fetched for one work.
const MAX_FEED_PAGES: u32 = 20;

pub struct HttpCatalogAdapter {
    client: Client,
    base_url: String,
    feed_limit: u32,
}

impl HttpCatalogAdapter {
    pub fn new(client: Client, base_url: String, feed_limit: u32) -> Self {
        Self {
            client,
            base_url,
            feed_limit,
        }
    }

    fn feed_query(&self, filter: &LanguageFilter, offset: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.feed_limit.to_string()),
            ("offset", offset.to_string()),
            ("order[chapter]", "asc".to_string()),
        ];
        if let LanguageFilter::Only(codes) = filter {
            query.extend(codes.iter().map(|code| ("translatedLanguage[]", code.clone())));
        }
        query
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    total: Option<u32>,
}

#[derive(Deserialize)]
struct RawChapter {
    id: Option<String>,
    attributes: Option<RawAttributes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttributes {
    chapter: Option<String>,
    title: Option<String>,
    translated_language: Option<String>,
    pages: Option<i64>,
    publish_at: Option<String>,
}

/// Validates one raw feed item.
pub fn parse_feed_item(manga_id: &str, item: Value) -> CatalogEntry {
    let id_hint = item.get("id").and_then(Value::as_str).map(str::to_string);
    let malformed = |reason: &str| CatalogEntry::Malformed {
        id: id_hint.clone(),
        reason: reason.to_string(),
    };

    let raw: RawChapter = match serde_json::from_value(item) {
        Ok(raw) => raw,
        Err(e) => return malformed(&format!("unreadable item: {}", e)),
    };
    let Some(id) = raw.id.filter(|id| !id.trim().is_empty()) else {
        return malformed("missing id");
    };
    let Some(attributes) = raw.attributes else {
        return malformed("missing attributes");
    };
    let Some(language) = attributes
        .translated_language
        .filter(|lang| !lang.trim().is_empty())
    else {
        return malformed("missing translated language");
    };
    let page_count = match attributes.pages.map(usize::try_from) {
        Some(Ok(pages)) => pages,
        _ => return malformed("missing or negative page count"),
    };
    let published_at = match attributes
        .publish_at
        .as_deref()
        .map(DateTime::parse_from_rfc3339)
    {
        Some(Ok(at)) => at.with_timezone(&Utc),
        _ => return malformed("missing or invalid publish timestamp"),
    };

    // Oneshots come without a number.
    let number = attributes
        .chapter
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "0".to_string());
    let title = attributes
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Chapter {}", number));

    CatalogEntry::Parsed(Chapter {
        id,
        work_id: manga_id.to_string(),
        number: ChapterNumber::new(number),
        title,
        language: language.to_ascii_lowercase(),
        page_count,
        published_at,
    })
}

/// Whether another feed page is needed after reading `fetched` items up to `offset`.
fn feed_has_more(fetched: u32, offset: u32, total: Option<u32>) -> bool {
    fetched > 0 && offset < total.unwrap_or(offset)
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for HttpCatalogAdapter {
    async fn fetch_chapters(
        &self,
        manga_id: &str,
        filter: &LanguageFilter,
    ) -> PortResult<Vec<CatalogEntry>> {
        let url = format!("{}/manga/{}/feed", self.base_url, manga_id);
        let mut entries = Vec::new();
        let mut offset = 0;
        let mut remaining = true;

        for _ in 0..MAX_FEED_PAGES {
            let response = self
                .client
                .get(&url)
                .query(&self.feed_query(filter, offset))
                .send()
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(PortError::NotFound(format!("Manga {} not found", manga_id)));
            }
            let feed: FeedResponse = response
                .error_for_status()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .json()
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;

            let fetched = feed.data.len() as u32;
            entries.extend(feed.data.into_iter().map(|item| parse_feed_item(manga_id, item)));
            offset += fetched;

            remaining = feed_has_more(fetched, offset, feed.total);
            if !remaining {
                break;
            }
        }
        if remaining {
            warn!(
                "Catalog feed for {} stopped after {} pages with chapters left; list is truncated at {}",
                manga_id, MAX_FEED_PAGES, offset
            );
        }

        let malformed = entries
            .iter()
            .filter(|entry| matches!(entry, CatalogEntry::Malformed { .. }))
            .count();
        if malformed > 0 {
            warn!(
                "Catalog feed for {} had {} malformed chapter(s) out of {}",
                manga_id,
                malformed,
                entries.len()
            );
        }
        debug!("Fetched {} catalog entries for {}", entries.len(), manga_id);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feed_paging_stops_at_total_or_empty_page() {
        assert!(feed_has_more(500, 500, Some(1200)));
        assert!(!feed_has_more(200, 1200, Some(1200)));
        assert!(!feed_has_more(0, 500, Some(1200)));
        assert!(!feed_has_more(30, 30, None));
    }

    fn item(attributes: Value) -> Value {
        json!({ "id": "ch-1", "type": "chapter", "attributes": attributes })
    }

    #[test]
    fn parses_a_complete_item() {
        let entry = parse_feed_item(
            "manga-1",
            item(json!({
                "chapter": "10.5",
                "title": "Interlude",
                "translatedLanguage": "EN",
                "pages": 18,
                "publishAt": "2023-05-01T10:00:00+00:00"
            })),
        );
        let chapter = entry.into_chapter().expect("parsed");
        assert_eq!(chapter.id, "ch-1");
        assert_eq!(chapter.work_id, "manga-1");
        assert_eq!(chapter.number.value(), Some(10.5));
        assert_eq!(chapter.language, "en");
        assert_eq!(chapter.page_count, 18);
    }

    #[test]
    fn fills_in_missing_number_and_title() {
        let entry = parse_feed_item(
            "m",
            item(json!({
                "chapter": null,
                "title": "",
                "translatedLanguage": "ar",
                "pages": 3,
                "publishAt": "2023-05-01T10:00:00Z"
            })),
        );
        let chapter = entry.into_chapter().expect("parsed");
        assert_eq!(chapter.number.label(), "0");
        assert_eq!(chapter.title, "Chapter 0");
    }

    #[test]
    fn missing_language_is_malformed() {
        let entry = parse_feed_item(
            "m",
            item(json!({ "chapter": "1", "pages": 3, "publishAt": "2023-05-01T10:00:00Z" })),
        );
        assert!(matches!(
            entry,
            CatalogEntry::Malformed { id: Some(ref id), .. } if id == "ch-1"
        ));
    }

    #[test]
    fn wrong_types_are_malformed_not_fatal() {
        let entry = parse_feed_item(
            "m",
            item(json!({ "chapter": "1", "translatedLanguage": "en", "pages": "many" })),
        );
        assert!(matches!(entry, CatalogEntry::Malformed { .. }));

        let entry = parse_feed_item("m", json!({ "attributes": {} }));
        assert!(matches!(entry, CatalogEntry::Malformed { id: None, .. }));
    }

    #[test]
    fn negative_pages_are_malformed() {
        let entry = parse_feed_item(
            "m",
            item(json!({
                "chapter": "1",
                "translatedLanguage": "en",
                "pages": -1,
                "publishAt": "2023-05-01T10:00:00Z"
            })),
        );
        assert!(matches!(entry, CatalogEntry::Malformed { .. }));
    }

    #[test]
    fn feed_query_lists_each_language() {
        let adapter = HttpCatalogAdapter::new(Client::new(), "http://x".to_string(), 100);
        let filter = LanguageFilter::Only(vec!["en".to_string(), "ar".to_string()]);
        let query = adapter.feed_query(&filter, 0);
        let languages: Vec<&str> = query
            .iter()
            .filter(|(k, _)| *k == "translatedLanguage[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(languages, vec!["en", "ar"]);
        assert!(adapter
            .feed_query(&LanguageFilter::All, 0)
            .iter()
            .all(|(k, _)| *k != "translatedLanguage[]"));
    }
}
