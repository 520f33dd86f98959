//! # newsdesk-test
//!
//! Test doubles and fixtures for the newsdesk crates.
//!
//! - [`gateway`] - [`RecordingGateway`]: call log, failure injection, hold latch
//! - [`auth`] - [`MemoryAuthProvider`] and session helpers
//! - [`notifier`] - [`RecordingNotifier`] for detached notifications
//! - [`fixtures`] - Valid drafts for every form

pub mod auth;
pub mod fixtures;
pub mod gateway;
pub mod notifier;

pub use auth::{signed_in_as, MemoryAuthProvider};
pub use gateway::{GatewayCall, GatewayOp, RecordingGateway};
pub use notifier::{RecordingNotifier, SentNotification};
