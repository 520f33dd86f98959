//! # newsdesk-db
//!
//! The persistence side of newsdesk. Form handlers and services talk to the
//! hosted datastore only through the [`PersistenceGateway`] trait.
//!
//! ## Modules
//!
//! - [`value`] - [`Value`] and [`Row`], the data that crosses the gateway
//! - [`query`] - Filter trees ([`Q`], [`Lookup`]), ordering, and [`Query`]
//! - [`gateway`] - The [`PersistenceGateway`] trait and [`Collection`] names
//! - [`memory`] - An in-process gateway
//! - [`rest`] - The hosted REST gateway
//! - [`entities`] - Request, notification, and profile shapes with their status sets
//! - [`services`] - Request review and profile management
//! - [`search`] - Multilingual search over published content

pub mod entities;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod rest;
pub mod search;
pub mod services;
pub mod value;

pub use entities::{
    AdRequest, AdStatus, Notification, NotificationKind, Profile, RequestEntity, ServiceRequest,
    ServiceStatus, StatusFilter, StatusValue,
};
pub use gateway::{Collection, PersistenceGateway};
pub use memory::MemoryGateway;
pub use query::{Lookup, OrderBy, Q, Query};
pub use rest::RestGateway;
pub use search::{ContentSearch, SearchHit, SearchableContent, SEARCH_LIMIT};
pub use services::{ProfileService, RequestService};
pub use value::{Row, Value};
