//! Types shared by claims and requests

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::status::TicketStatus;
use crate::auth::UserId;

/// Backend identifier of a claim or request
pub type TicketId = i64;

/// Which resource a ticket lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketKind {
    Claim,
    Request,
}

impl TicketKind {
    /// Path segment and admin `type` value
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketKind::Claim => "claim",
            TicketKind::Request => "request",
        }
    }

    /// Spanish noun used in messages
    pub fn label(&self) -> &'static str {
        match self {
            TicketKind::Claim => "reclamo",
            TicketKind::Request => "solicitud",
        }
    }

    /// Dashboard route of the creation form
    pub fn new_item_link(&self) -> &'static str {
        match self {
            TicketKind::Claim => "/dashboard/claims/new",
            TicketKind::Request => "/dashboard/requests/new",
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claim or request as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub id: Option<TicketId>,

    /// Owner
    pub user: UserId,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub subject: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    #[serde(default)]
    pub status: TicketStatus,

    /// Some backend versions call this `date`; absent or unparseable dates stay `None`
    #[serde(
        default,
        alias = "date",
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a ticket creation
#[derive(Debug, Clone, Serialize)]
pub struct NewTicket {
    /// Owner
    pub user: UserId,
    /// Short title
    pub subject: String,
    /// Free-text body
    pub description: String,
    /// Initial status, pending unless overridden
    pub status: TicketStatus,
}

impl NewTicket {
    /// A fresh ticket starts out pending
    pub fn new(user: UserId, subject: &str, description: &str) -> Self {
        Self {
            user,
            subject: subject.to_string(),
            description: description.to_string(),
            status: TicketStatus::Pending,
        }
    }
}

/// Body of the generic `PATCH /admin` status update
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    /// Acting administrator
    pub user_id: UserId,
    /// Which resource the ticket lives under
    #[serde(rename = "type")]
    pub kind: TicketKind,
    /// Ticket to move
    pub id: TicketId,
    /// Target status
    pub status: TicketStatus,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` or a bare date
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ticket_accepts_date_alias_and_nulls() {
        let ticket: Ticket = serde_json::from_value(json!({
            "id": 4,
            "user": 1,
            "subject": null,
            "description": "desc",
            "status": "pending",
            "date": "2024-03-01"
        }))
        .unwrap();

        assert_eq!(ticket.subject, "");
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.created_at.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_null_and_missing_status_are_pending() {
        let missing: Ticket = serde_json::from_value(json!({"user": 1})).unwrap();
        let null: Ticket = serde_json::from_value(json!({"user": 1, "status": null})).unwrap();
        assert_eq!(missing.status, TicketStatus::Pending);
        assert_eq!(null.status, missing.status);
    }

    #[test]
    fn test_invalid_date_is_not_fabricated() {
        let ticket: Ticket = serde_json::from_value(json!({
            "user": 1, "status": "Completado", "created_at": "ayer"
        }))
        .unwrap();
        assert!(ticket.created_at.is_none());
        assert!(ticket.id.is_none());
    }

    #[test]
    fn test_status_update_body() {
        let body = serde_json::to_value(StatusUpdate {
            user_id: 1,
            kind: TicketKind::Request,
            id: 9,
            status: TicketStatus::Completed,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"user_id": 1, "type": "request", "id": 9, "status": "Completado"})
        );
    }
}
