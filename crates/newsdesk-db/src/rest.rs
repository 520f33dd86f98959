//! [`PersistenceGateway`] over the hosted datastore's REST interface.
//!
//! The hosted backend exposes each collection at `{url}/rest/v1/{table}` and
//! takes filters as query parameters (`status=eq.pending`,
//! `or=(title.ilike.*x*,title_ar.ilike.*x*)`, `order=created_at.desc`,
//! `limit=50`). Every request carries the project's public key; when a
//! [`SessionStore`] is attached, the signed-in user's access token replaces
//! it in the `Authorization` header. The token is read on every request, so
//! signing in or out takes effect without rebuilding the gateway.

use std::time::Duration;

use async_trait::async_trait;
use newsdesk_auth::SessionStore;
use newsdesk_core::settings::BackendSettings;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;

use crate::gateway::{Collection, PersistenceGateway};
use crate::query::{Lookup, OrderBy, Q, Query};
use crate::value::{Row, Value};

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// REST client for the hosted datastore.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Option<SessionStore>,
}

impl RestGateway {
    /// Builds a gateway from backend settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL or key is empty, or if the
    /// HTTP client cannot be built.
    pub fn new(settings: &BackendSettings) -> NewsdeskResult<Self> {
        if settings.url.is_empty() || settings.anon_key.is_empty() {
            return Err(NewsdeskError::Configuration(
                "backend.url and backend.anon_key must be set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| NewsdeskError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
            session: None,
        })
    }

    /// Authenticates as whoever is signed in to `session`.
    #[must_use]
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    fn bearer(&self) -> String {
        self.session
            .as_ref()
            .and_then(SessionStore::access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        let bearer = self.bearer();
        self.client
            .request(
                method,
                format!("{}/rest/v1/{}", self.base_url, collection.table_name()),
            )
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder, collection: Collection) -> NewsdeskResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: BackendErrorBody = response.json().await.unwrap_or_default();
        tracing::debug!(%collection, status = status.as_u16(), code = ?body.code, "backend rejected request");
        Err(NewsdeskError::Http {
            status: status.as_u16(),
            code: body.code,
            message: body
                .message
                .or(body.error)
                .unwrap_or_else(|| status.to_string()),
        })
    }
}

#[async_trait]
impl PersistenceGateway for RestGateway {
    async fn insert(&self, collection: Collection, records: Vec<Row>) -> NewsdeskResult<Vec<Row>> {
        let builder = self
            .request(Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&records);
        let response = self.send(builder, collection).await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| NewsdeskError::Serialization(e.to_string()))
    }

    async fn update(&self, collection: Collection, filter: &Q, patch: Row) -> NewsdeskResult<()> {
        let builder = self
            .request(Method::PATCH, collection)
            .query(&filter_params(filter))
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send(builder, collection).await.map(drop)
    }

    async fn select(&self, collection: Collection, query: &Query) -> NewsdeskResult<Vec<Row>> {
        let builder = self
            .request(Method::GET, collection)
            .query(&select_params(query));
        let response = self.send(builder, collection).await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| NewsdeskError::Serialization(e.to_string()))
    }

    async fn delete(&self, collection: Collection, filter: &Q) -> NewsdeskResult<()> {
        let builder = self
            .request(Method::DELETE, collection)
            .query(&filter_params(filter));
        self.send(builder, collection).await.map(drop)
    }

    async fn count(&self, collection: Collection, filter: Option<&Q>) -> NewsdeskResult<usize> {
        let mut params = vec![("select".to_string(), "id".to_string())];
        if let Some(q) = filter {
            params.extend(filter_params(q));
        }
        let builder = self
            .request(Method::HEAD, collection)
            .query(&params)
            .header("Prefer", "count=exact");
        let response = self.send(builder, collection).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|h| h.to_str().ok())
            .and_then(|range| range.rsplit('/').next())
            .and_then(|total| total.parse().ok())
            .ok_or_else(|| {
                NewsdeskError::Serialization("missing or malformed Content-Range".to_string())
            })
    }
}

// ============================================================
// Query rendering
// ============================================================

fn select_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    if let Some(q) = &query.filter {
        params.extend(filter_params(q));
    }
    if !query.order.is_empty() {
        let order: Vec<String> = query.order.iter().map(render_order).collect();
        params.push(("order".to_string(), order.join(",")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn render_order(order: &OrderBy) -> String {
    let direction = if order.descending { "desc" } else { "asc" };
    format!("{}.{direction}", order.field)
}

/// Renders a filter as top-level query parameters.
fn filter_params(q: &Q) -> Vec<(String, String)> {
    match q {
        Q::Filter { field, lookup } => vec![(field.clone(), render_lookup(lookup))],
        Q::And(children) => children.iter().flat_map(filter_params).collect(),
        Q::Or(children) => vec![("or".to_string(), format!("({})", render_list(children)))],
        Q::Not(inner) => match inner.as_ref() {
            Q::Filter { field, lookup } => {
                vec![(field.clone(), format!("not.{}", render_lookup(lookup)))]
            }
            Q::And(children) => {
                vec![("not.and".to_string(), format!("({})", render_list(children)))]
            }
            Q::Or(children) => vec![("not.or".to_string(), format!("({})", render_list(children)))],
            Q::Not(twice) => filter_params(twice),
        },
    }
}

fn render_list(children: &[Q]) -> String {
    children
        .iter()
        .map(render_nested)
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders a filter inside an `or=(...)`/`and=(...)` group.
fn render_nested(q: &Q) -> String {
    match q {
        Q::Filter { field, lookup } => format!("{field}.{}", render_lookup(lookup)),
        Q::And(children) => format!("and({})", render_list(children)),
        Q::Or(children) => format!("or({})", render_list(children)),
        Q::Not(inner) => match inner.as_ref() {
            Q::Filter { field, lookup } => format!("{field}.not.{}", render_lookup(lookup)),
            other => format!("not.{}", render_nested(other)),
        },
    }
}

fn render_lookup(lookup: &Lookup) -> String {
    match lookup {
        Lookup::Exact(Value::Null) | Lookup::IsNull(true) => "is.null".to_string(),
        Lookup::IsNull(false) => "not.is.null".to_string(),
        Lookup::Exact(v) => format!("eq.{}", quote(&v.to_string())),
        Lookup::IContains(term) => format!("ilike.{}", quote(&format!("*{term}*"))),
        Lookup::In(values) => {
            let items: Vec<String> = values.iter().map(|v| quote(&v.to_string())).collect();
            format!("in.({})", items.join(","))
        }
    }
}

/// Quotes operands containing the backend's reserved characters.
fn quote(raw: &str) -> String {
    if raw.contains([',', '(', ')', '"', ':', '\\']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}
