//! Request and profile services used by the forms and the back office.
//!
//! Reads and creates are open to whoever the gateway lets through. Status
//! and role changes check the injected [`SessionStore`] first.

use std::sync::Arc;

use chrono::{Duration, Utc};
use newsdesk_auth::{Role, SessionStore};
use newsdesk_core::{NewsdeskError, NewsdeskResult};

use crate::entities::{
    from_row, to_row, AdRequest, AdStatus, Profile, RequestEntity, StatusFilter, StatusValue,
};
use crate::gateway::{Collection, PersistenceGateway};
use crate::query::{OrderBy, Q, Query};
use crate::value::{Row, Value};

/// Length of an ad campaign started by activating a request.
pub const AD_CAMPAIGN_DAYS: i64 = 30;

/// Creates, lists, and reviews ad and service requests.
#[derive(Clone)]
pub struct RequestService {
    gateway: Arc<dyn PersistenceGateway>,
    session: SessionStore,
}

impl RequestService {
    /// Creates a service over `gateway`, authorizing with `session`.
    pub fn new(gateway: Arc<dyn PersistenceGateway>, session: SessionStore) -> Self {
        Self { gateway, session }
    }

    /// Stores a new request and returns it as persisted.
    pub async fn create<R: RequestEntity>(&self, request: &R) -> NewsdeskResult<R> {
        let row = self
            .gateway
            .insert_one(R::COLLECTION, to_row(request)?)
            .await?;
        from_row(row)
    }

    /// Lists requests, newest first.
    pub async fn list<R: RequestEntity>(
        &self,
        filter: StatusFilter<R::Status>,
    ) -> NewsdeskResult<Vec<R>> {
        let mut query = Query::all().newest_first();
        if let StatusFilter::Only(status) = filter {
            query = query.filter(Q::eq("status", status.as_str()));
        }
        self.gateway
            .select(R::COLLECTION, &query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Sets a request's status and admin notes. Requires a moderator.
    ///
    /// Activating an ad also stamps its campaign window.
    pub async fn update_status<R: RequestEntity>(
        &self,
        id: &str,
        status: R::Status,
        admin_notes: Option<&str>,
    ) -> NewsdeskResult<()> {
        let reviewer = self.session.require_moderator()?;
        let notes = admin_notes.filter(|n| !n.trim().is_empty());
        let mut patch = Row::new()
            .with("status", status.as_str())
            .with("admin_notes", notes);
        if status.starts_campaign() {
            let start = Utc::now();
            patch.insert("start_date", start);
            patch.insert("end_date", start + Duration::days(AD_CAMPAIGN_DAYS));
        }
        self.gateway
            .update(R::COLLECTION, &Q::eq("id", id), patch)
            .await?;
        tracing::info!(
            collection = %R::COLLECTION,
            request = id,
            status = %status,
            reviewer = %reviewer.user_id,
            "request status updated"
        );
        Ok(())
    }

    /// Counts requests, optionally with one status.
    pub async fn count<R: RequestEntity>(
        &self,
        status: Option<R::Status>,
    ) -> NewsdeskResult<usize> {
        let filter = status.map(|s| Q::eq("status", s.as_str()));
        self.gateway.count(R::COLLECTION, filter.as_ref()).await
    }

    /// Counts approved ads.
    pub async fn active_ads_count(&self) -> NewsdeskResult<usize> {
        self.count::<AdRequest>(Some(AdStatus::Approved)).await
    }
}

/// Reads and edits user profiles.
#[derive(Clone)]
pub struct ProfileService {
    gateway: Arc<dyn PersistenceGateway>,
    session: SessionStore,
}

impl ProfileService {
    /// Creates a service over `gateway`, authorizing with `session`.
    pub fn new(gateway: Arc<dyn PersistenceGateway>, session: SessionStore) -> Self {
        Self { gateway, session }
    }

    /// Lists profiles newest first, optionally with one role.
    pub async fn list(&self, role: Option<Role>) -> NewsdeskResult<Vec<Profile>> {
        let mut query = Query::all().newest_first();
        if let Some(role) = role {
            query = query.filter(Q::eq("role", role.as_str()));
        }
        self.select(&query).await
    }

    /// Lists profiles alphabetically by name, for recipient pickers.
    pub async fn list_by_name(&self) -> NewsdeskResult<Vec<Profile>> {
        self.select(&Query::all().order_by(OrderBy::asc("full_name")))
            .await
    }

    /// Returns a profile, or `None` if it does not exist.
    pub async fn get(&self, user_id: &str) -> NewsdeskResult<Option<Profile>> {
        let query = Query::all().filter(Q::eq("id", user_id)).limit(1);
        match self.select(&query).await {
            Ok(mut profiles) => Ok(profiles.pop()),
            Err(err) if err.backend_code() == Some("PGRST116") => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Applies `patch` to a profile.
    pub async fn update(&self, user_id: &str, patch: Row) -> NewsdeskResult<()> {
        if patch.contains("role") {
            return Err(NewsdeskError::PermissionDenied(
                "roles are changed with update_role".to_string(),
            ));
        }
        self.gateway
            .update(Collection::Profiles, &Q::eq("id", user_id), patch)
            .await
    }

    /// Changes a user's role. Requires an admin.
    pub async fn update_role(&self, user_id: &str, role: Role) -> NewsdeskResult<()> {
        let admin = self.session.require_admin()?;
        self.gateway
            .update(
                Collection::Profiles,
                &Q::eq("id", user_id),
                Row::new().with("role", role.as_str()),
            )
            .await?;
        tracing::info!(user = user_id, role = %role, by = %admin.user_id, "user role updated");
        Ok(())
    }

    /// Counts all profiles.
    pub async fn count(&self) -> NewsdeskResult<usize> {
        self.gateway.count(Collection::Profiles, None).await
    }

    /// Ids of every profile.
    pub async fn all_ids(&self) -> NewsdeskResult<Vec<String>> {
        let rows = self
            .gateway
            .select(Collection::Profiles, &Query::all())
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| match row.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Uuid(id)) => Some(id.to_string()),
                _ => None,
            })
            .collect())
    }

    async fn select(&self, query: &Query) -> NewsdeskResult<Vec<Profile>> {
        self.gateway
            .select(Collection::Profiles, query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }
}
