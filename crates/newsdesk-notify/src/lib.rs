//! # newsdesk-notify
//!
//! Secondary notifications triggered by a successful submission, and the
//! inbox users read them from.
//!
//! - [`fanout`] - The [`Notifier`] trait, its store and webhook variants, and
//!   [`DetachedNotification`] for fire-and-forget dispatch
//! - [`inbox`] - Listing, marking, and displaying a user's notifications

pub mod fanout;
pub mod inbox;

pub use fanout::{DetachedNotification, Notifier, StoreNotifier, WebhookNotifier};
pub use inbox::{time_ago, Inbox, InboxItem, INBOX_LIMIT};
