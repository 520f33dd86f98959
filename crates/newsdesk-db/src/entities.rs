//! Persisted request, notification, and profile shapes.
//!
//! Entities are plain serde structs. They cross the gateway as [`Row`]s via
//! [`to_row`] and [`from_row`], so the column names are exactly the serde
//! field names.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use newsdesk_auth::Role;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::gateway::Collection;
use crate::value::Row;

/// Converts an entity into a row for insertion. `None` columns are omitted
/// where the entity marks them `skip_serializing_if`.
pub fn to_row<T: Serialize>(entity: &T) -> NewsdeskResult<Row> {
    let json = serde_json::to_value(entity)?;
    Ok(serde_json::from_value(json)?)
}

/// Converts a stored row into an entity.
pub fn from_row<T: DeserializeOwned>(row: Row) -> NewsdeskResult<T> {
    let json = serde_json::to_value(row)?;
    Ok(serde_json::from_value(json)?)
}

// ── Status enumerations ─────────────────────────────────────────────────

/// A closed set of status values stored as text.
///
/// Only membership is enforced: any status may be set from any other.
pub trait StatusValue:
    Copy + fmt::Display + FromStr<Err = NewsdeskError> + Send + Sync + 'static
{
    /// Every allowed value, in display order.
    const ALL: &'static [Self];

    /// The stored representation.
    fn as_str(self) -> &'static str;

    /// Whether moving to this status starts an ad campaign window.
    fn starts_campaign(self) -> bool {
        false
    }
}

fn parse_status<S: StatusValue>(kind: &str, s: &str) -> NewsdeskResult<S> {
    S::ALL
        .iter()
        .copied()
        .find(|status| status.as_str() == s)
        .ok_or_else(|| NewsdeskError::BadRequest(format!("invalid {kind} status '{s}'")))
}

/// Lifecycle of an advertisement request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    /// Submitted, not yet looked at.
    #[default]
    Pending,
    /// Being reviewed by staff.
    InReview,
    /// Accepted.
    Approved,
    /// Declined.
    Rejected,
    /// Running.
    Active,
    /// Campaign window has ended.
    Expired,
}

impl StatusValue for AdStatus {
    const ALL: &'static [Self] = &[
        Self::Pending,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
        Self::Active,
        Self::Expired,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }

    fn starts_campaign(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdStatus {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status("ad request", s)
    }
}

/// Lifecycle of a service request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Submitted, not yet looked at.
    #[default]
    Pending,
    /// Being reviewed by staff.
    InReview,
    /// Accepted.
    Approved,
    /// Declined.
    Rejected,
    /// Delivered.
    Completed,
}

impl StatusValue for ServiceStatus {
    const ALL: &'static [Self] = &[
        Self::Pending,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
        Self::Completed,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_status("service request", s)
    }
}

/// A status list filter: everything, or one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter<S> {
    /// No filtering.
    #[default]
    All,
    /// Only rows with this status.
    Only(S),
}

impl<S: StatusValue> FromStr for StatusFilter<S> {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

// ── Requests ────────────────────────────────────────────────────────────

/// A persisted request type with a status column.
pub trait RequestEntity: Serialize + DeserializeOwned + Send + Sync {
    /// The status enumeration for this request type.
    type Status: StatusValue;

    /// Where requests of this type are stored.
    const COLLECTION: Collection;
}

/// An advertisement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub institution_name: String,
    pub sector: String,
    #[serde(default)]
    pub ad_types: Vec<String>,
    pub ad_details: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub boost_ad: bool,
    #[serde(default)]
    pub status: AdStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RequestEntity for AdRequest {
    type Status = AdStatus;
    const COLLECTION: Collection = Collection::AdRequests;
}

/// A request for a report, dashboard, or consultation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub institution_name: String,
    pub sector: String,
    pub service_type: String,
    pub description: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RequestEntity for ServiceRequest {
    type Status = ServiceStatus;
    const COLLECTION: Collection = Collection::ServiceRequests;
}

// ── Notifications ───────────────────────────────────────────────────────

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Alert,
}

impl NotificationKind {
    /// Every allowed value.
    pub const ALL: [Self; 4] = [Self::Info, Self::Success, Self::Warning, Self::Alert];

    /// The stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Alert => "alert",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NewsdeskError::BadRequest(format!("invalid notification type '{s}'")))
    }
}

/// One notification addressed to one user, with optional translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub title_fr: Option<String>,
    pub message: String,
    #[serde(default)]
    pub message_ar: Option<String>,
    #[serde(default)]
    pub message_fr: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Creates an unread `info` notification for `user_id`.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            title: title.into(),
            title_ar: None,
            title_fr: None,
            message: message.into(),
            message_ar: None,
            message_fr: None,
            kind: NotificationKind::Info,
            related_type: None,
            related_id: None,
            read: false,
            created_at: None,
        }
    }

    /// The title in `language`, falling back to the default text.
    pub fn title_in(&self, language: &str) -> &str {
        let translated = match language {
            "ar" => self.title_ar.as_deref(),
            "fr" => self.title_fr.as_deref(),
            _ => None,
        };
        translated.filter(|t| !t.is_empty()).unwrap_or(&self.title)
    }

    /// The message in `language`, falling back to the default text.
    pub fn message_in(&self, language: &str) -> &str {
        let translated = match language {
            "ar" => self.message_ar.as_deref(),
            "fr" => self.message_fr.as_deref(),
            _ => None,
        };
        translated.filter(|m| !m.is_empty()).unwrap_or(&self.message)
    }
}

// ── Profiles ────────────────────────────────────────────────────────────

/// A user's profile row. Its id is the auth user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
