//! An in-process [`PersistenceGateway`].
//!
//! Used for local development and as the storage behind the test doubles.
//! Inserted rows get a v4 UUID `id` and a `created_at` timestamp, as the
//! hosted backend would assign them.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use newsdesk_core::NewsdeskResult;

use crate::gateway::{Collection, PersistenceGateway};
use crate::query::{Q, Query};
use crate::value::{Row, Value};

/// Stores rows in memory, per collection, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: RwLock<HashMap<Collection, Vec<Row>>>,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every row in `collection`.
    pub fn rows(&self, collection: Collection) -> Vec<Row> {
        self.tables
            .read()
            .expect("memory gateway lock poisoned")
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Inserts rows verbatim, without assigning ids or timestamps.
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Row>) {
        self.tables
            .write()
            .expect("memory gateway lock poisoned")
            .entry(collection)
            .or_default()
            .extend(rows);
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn insert(&self, collection: Collection, records: Vec<Row>) -> NewsdeskResult<Vec<Row>> {
        let now = Utc::now();
        let stored: Vec<Row> = records
            .into_iter()
            .map(|mut row| {
                if !row.contains("id") {
                    row.insert("id", uuid::Uuid::new_v4().to_string());
                }
                row.insert("created_at", Value::DateTime(now));
                row
            })
            .collect();
        self.seed(collection, stored.clone());
        Ok(stored)
    }

    async fn update(&self, collection: Collection, filter: &Q, patch: Row) -> NewsdeskResult<()> {
        let mut tables = self.tables.write().expect("memory gateway lock poisoned");
        if let Some(rows) = tables.get_mut(&collection) {
            rows.iter_mut()
                .filter(|row| filter.matches(row))
                .for_each(|row| row.merge(&patch));
        }
        Ok(())
    }

    async fn select(&self, collection: Collection, query: &Query) -> NewsdeskResult<Vec<Row>> {
        Ok(query.apply(self.rows(collection)))
    }

    async fn delete(&self, collection: Collection, filter: &Q) -> NewsdeskResult<()> {
        let mut tables = self.tables.write().expect("memory gateway lock poisoned");
        if let Some(rows) = tables.get_mut(&collection) {
            rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let gw = MemoryGateway::new();
        let stored = gw
            .insert_one(Collection::AdRequests, Row::new().with("email", "a@b.com"))
            .await
            .unwrap();
        assert!(stored.get_str("id").is_some());
        assert!(matches!(stored.get("created_at"), Some(Value::DateTime(_))));
        assert_eq!(gw.rows(Collection::AdRequests).len(), 1);
        assert!(gw.rows(Collection::Profiles).is_empty());
    }

    #[tokio::test]
    async fn test_update_select_delete_count() {
        let gw = MemoryGateway::new();
        gw.seed(
            Collection::Notifications,
            vec![
                Row::new().with("id", "n1").with("user_id", "u1").with("read", false),
                Row::new().with("id", "n2").with("user_id", "u1").with("read", false),
                Row::new().with("id", "n3").with("user_id", "u2").with("read", false),
            ],
        );

        gw.update(
            Collection::Notifications,
            &Q::eq("user_id", "u1"),
            Row::new().with("read", true),
        )
        .await
        .unwrap();
        let unread = Q::eq("read", false);
        assert_eq!(gw.count(Collection::Notifications, Some(&unread)).await.unwrap(), 1);

        gw.delete(Collection::Notifications, &Q::eq("id", "n3"))
            .await
            .unwrap();
        assert_eq!(gw.count(Collection::Notifications, None).await.unwrap(), 2);

        let rows = gw
            .select(Collection::Notifications, &Query::all().filter(Q::eq("id", "n2")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("read"), Some(&Value::Bool(true)));
    }
}
