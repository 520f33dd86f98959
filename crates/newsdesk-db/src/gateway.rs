//! The persistence gateway: the call interface to the hosted datastore.
//!
//! Everything above this trait (services, form handlers) is written against
//! `&dyn PersistenceGateway`, so the hosted REST backend
//! ([`RestGateway`](crate::rest::RestGateway)) and the in-process
//! [`MemoryGateway`](crate::memory::MemoryGateway) are interchangeable.

use std::fmt;

use async_trait::async_trait;
use newsdesk_core::NewsdeskResult;

use crate::query::{Q, Query};
use crate::value::Row;

/// A named persisted record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Advertisement requests.
    AdRequests,
    /// Service (report/dashboard/consultation) requests.
    ServiceRequests,
    /// Per-user notifications.
    Notifications,
    /// User profiles (name, role).
    Profiles,
    /// Searchable site content in all languages.
    SearchableContent,
}

impl Collection {
    /// The backend table name.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::AdRequests => "ad_requests",
            Self::ServiceRequests => "service_requests",
            Self::Notifications => "notifications",
            Self::Profiles => "profiles",
            Self::SearchableContent => "searchable_content",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Async CRUD interface to the hosted datastore.
///
/// Ids and `created_at` timestamps are assigned by the gateway, never by
/// the caller.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Inserts `records` and returns them as stored (with ids and timestamps).
    async fn insert(&self, collection: Collection, records: Vec<Row>) -> NewsdeskResult<Vec<Row>>;

    /// Applies `patch` to every row matching `filter`.
    async fn update(&self, collection: Collection, filter: &Q, patch: Row) -> NewsdeskResult<()>;

    /// Returns rows matching `query`.
    async fn select(&self, collection: Collection, query: &Query) -> NewsdeskResult<Vec<Row>>;

    /// Deletes every row matching `filter`.
    async fn delete(&self, collection: Collection, filter: &Q) -> NewsdeskResult<()>;

    /// Counts rows matching `filter` (all rows when `None`).
    async fn count(&self, collection: Collection, filter: Option<&Q>) -> NewsdeskResult<usize> {
        let query = Query {
            filter: filter.cloned(),
            ..Query::default()
        };
        Ok(self.select(collection, &query).await?.len())
    }

    /// Inserts a single record and returns it as stored.
    async fn insert_one(&self, collection: Collection, record: Row) -> NewsdeskResult<Row> {
        self.insert(collection, vec![record])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                newsdesk_core::NewsdeskError::Database(format!(
                    "insert into {collection} returned no row"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(Collection::AdRequests.table_name(), "ad_requests");
        assert_eq!(Collection::ServiceRequests.to_string(), "service_requests");
        assert_eq!(Collection::Notifications.table_name(), "notifications");
        assert_eq!(Collection::Profiles.table_name(), "profiles");
    }
}
