//! Site-wide content search.
//!
//! Published entries in `searchable_content` carry a title and description
//! in English plus optional Arabic and French columns. A search matches the
//! term case-insensitively against all six columns and renders each hit in
//! the reader's language, falling back to English.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use newsdesk_core::NewsdeskResult;
use serde::{Deserialize, Serialize};

use crate::entities::from_row;
use crate::gateway::{Collection, PersistenceGateway};
use crate::query::{Q, Query};

/// Most hits returned for one search.
pub const SEARCH_LIMIT: usize = 20;

const SEARCH_COLUMNS: [&str; 6] = [
    "title",
    "description",
    "title_ar",
    "title_fr",
    "description_ar",
    "description_fr",
];

/// One row of `searchable_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchableContent {
    pub id: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub title_fr: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default)]
    pub description_fr: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SearchableContent {
    /// The title in `language`, falling back to English.
    pub fn title_in(&self, language: &str) -> &str {
        localized(language, self.title_ar.as_deref(), self.title_fr.as_deref())
            .unwrap_or(&self.title)
    }

    /// The description in `language`, falling back to English.
    pub fn description_in(&self, language: &str) -> Option<&str> {
        localized(
            language,
            self.description_ar.as_deref(),
            self.description_fr.as_deref(),
        )
        .or(self.description.as_deref())
    }
}

fn localized<'a>(language: &str, ar: Option<&'a str>, fr: Option<&'a str>) -> Option<&'a str> {
    match language {
        "ar" => ar,
        "fr" => fr,
        _ => None,
    }
    .filter(|text| !text.is_empty())
}

/// A search hit rendered for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub content_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Searches published site content.
#[derive(Clone)]
pub struct ContentSearch {
    gateway: Arc<dyn PersistenceGateway>,
}

impl ContentSearch {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Published entries matching `term` in any language, newest first.
    ///
    /// A blank term returns nothing without calling the backend.
    pub async fn search(&self, term: &str) -> NewsdeskResult<Vec<SearchableContent>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::all()
            .filter(Q::eq("is_published", true) & Q::search(&SEARCH_COLUMNS, term))
            .newest_first()
            .limit(SEARCH_LIMIT);
        let rows = self
            .gateway
            .select(Collection::SearchableContent, &query)
            .await?;
        tracing::debug!(term, hits = rows.len(), "content search");
        rows.into_iter().map(from_row).collect()
    }

    /// Runs [`search`](Self::search) and renders the hits in `language`.
    pub async fn display(&self, term: &str, language: &str) -> NewsdeskResult<Vec<SearchHit>> {
        Ok(self
            .search(term)
            .await?
            .into_iter()
            .map(|content| SearchHit {
                title: content.title_in(language).to_string(),
                description: content.description_in(language).map(str::to_string),
                id: content.id,
                content_type: content.content_type,
                url: content.url,
                created_at: content.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGateway;
    use crate::value::Row;

    fn entry(id: &str, title: &str, created: &str) -> Row {
        Row::new()
            .with("id", id)
            .with("content_type", "report")
            .with("title", title)
            .with("is_published", true)
            .with("created_at", created)
    }

    fn search_over(rows: Vec<Row>) -> ContentSearch {
        let gateway = MemoryGateway::new();
        gateway.seed(Collection::SearchableContent, rows);
        ContentSearch::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn test_blank_term_returns_nothing() {
        let search = search_over(vec![entry("c1", "Budget", "2025-01-01T00:00:00+00:00")]);
        assert!(search.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_matches_any_language_and_skips_drafts() {
        let search = search_over(vec![
            entry("c1", "Regional budget", "2025-01-01T00:00:00+00:00"),
            entry("c2", "Water report", "2025-02-01T00:00:00+00:00")
                .with("description_fr", "Analyse du BUDGET de l'eau"),
            entry("c3", "Budget draft", "2025-03-01T00:00:00+00:00").with("is_published", false),
            entry("c4", "Transport", "2025-04-01T00:00:00+00:00"),
        ]);
        let ids: Vec<String> = search
            .search("budget")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c2".to_string(), "c1".to_string()]);
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let rows = (0..25)
            .map(|i| {
                let created = format!("2025-01-{:02}T00:00:00+00:00", i + 1);
                entry(&format!("c{i}"), "Census", &created)
            })
            .collect();
        let hits = search_over(rows).search("census").await.unwrap();
        assert_eq!(hits.len(), SEARCH_LIMIT);
        assert_eq!(hits[0].id, "c24");
    }

    #[tokio::test]
    async fn test_display_localizes_with_english_fallback() {
        let search = search_over(vec![entry("c1", "Budget", "2025-01-01T00:00:00+00:00")
            .with("title_ar", "الميزانية")
            .with("title_fr", "")
            .with("description", "Annual figures")
            .with("url", "/reports/budget")]);

        let ar = search.display("budget", "ar").await.unwrap();
        assert_eq!(ar[0].title, "الميزانية");
        assert_eq!(ar[0].description.as_deref(), Some("Annual figures"));

        let fr = search.display("budget", "fr").await.unwrap();
        assert_eq!(fr[0].title, "Budget");
        assert_eq!(fr[0].url.as_deref(), Some("/reports/budget"));
    }
}
