//! List, detail and dashboard state for claims and requests

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashSet;

use crate::auth::UserId;
use crate::error::Error;
use crate::tickets::{Ticket, TicketId, TicketKind, TicketService, TicketStatus};

/// How many recent items the dashboard shows per kind
pub const RECENT_LIMIT: usize = 3;

const MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Rounded share of `part` in `total`, 0 when there is nothing to divide
pub fn percentage(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u64
}

/// `1 mar 2024`
pub fn format_date(date: &DateTime<Utc>) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// "Hace N horas" style age, falling back to the date after a week
pub fn relative_time(date: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let hours = (*now - *date).num_hours();
    if hours < 1 {
        return "Hace menos de 1 hora".to_string();
    }
    if hours < 24 {
        return format!("Hace {} hora{}", hours, if hours > 1 { "s" } else { "" });
    }
    let days = hours / 24;
    if days < 7 {
        format!("Hace {} día{}", days, if days > 1 { "s" } else { "" })
    } else {
        format_date(date)
    }
}

/// Label and classes of a status badge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPill {
    pub label: String,
    pub class: &'static str,
}

impl From<&TicketStatus> for StatusPill {
    fn from(status: &TicketStatus) -> Self {
        Self {
            label: status.label().to_string(),
            class: status.pill_class(),
        }
    }
}

/// The session user's claims or requests, with per-row delete state
#[derive(Debug, Clone)]
pub struct TicketList {
    kind: TicketKind,
    items: Vec<Ticket>,
    deleting: HashSet<TicketId>,
    error: Option<String>,
}

impl TicketList {
    pub fn new(kind: TicketKind, items: Vec<Ticket>) -> Self {
        Self {
            kind,
            items,
            deleting: HashSet::new(),
            error: None,
        }
    }

    /// Fetch the list; a failure is kept as the list's error message
    pub async fn load(service: &TicketService, owner: Option<UserId>) -> Self {
        match service.get_all(owner).await {
            Ok(items) => Self::new(service.kind(), items),
            Err(err) => {
                let mut list = Self::new(service.kind(), Vec::new());
                list.error = Some(err.to_string());
                list
            }
        }
    }

    pub fn kind(&self) -> TicketKind {
        self.kind
    }

    pub fn items(&self) -> &[Ticket] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_deleting(&self, id: TicketId) -> bool {
        self.deleting.contains(&id)
    }

    pub fn find(&self, id: TicketId) -> Option<&Ticket> {
        self.items.iter().find(|item| item.id == Some(id))
    }

    /// Items whose status matches `status`
    pub fn with_status<'a>(&'a self, status: &'a TicketStatus) -> impl Iterator<Item = &'a Ticket> {
        self.items.iter().filter(move |item| &item.status == status)
    }

    /// Mark a row as being deleted; false when it is unknown or already in flight
    ///
    /// An unknown id is recorded as the list's error.
    pub fn begin_delete(&mut self, id: TicketId) -> bool {
        if self.find(id).is_none() {
            self.error = Some(format!("No existe ningún elemento con id {}", id));
            return false;
        }
        self.error = None;
        self.deleting.insert(id)
    }

    /// Apply the outcome of a delete: drop the row on success, keep it and record the error otherwise
    pub fn finish_delete(&mut self, id: TicketId, result: Result<(), Error>) -> bool {
        self.deleting.remove(&id);
        match result {
            Ok(()) => {
                self.items.retain(|item| item.id != Some(id));
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }

    /// Delete a row after the user confirmed; nothing happens without confirmation
    pub async fn delete(
        &mut self,
        service: &TicketService,
        id: TicketId,
        confirmed: bool,
        token: Option<&str>,
    ) -> bool {
        if !confirmed || !self.begin_delete(id) {
            return false;
        }
        let result = service.delete(id, token).await;
        self.finish_delete(id, result)
    }
}

/// Per-status counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub rejected: u64,
    pub other: u64,
}

impl StatusCounts {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut counts = Self::default();
        for ticket in tickets {
            counts.total += 1;
            match ticket.status {
                TicketStatus::Pending => counts.pending += 1,
                TicketStatus::InProgress => counts.in_progress += 1,
                TicketStatus::Completed => counts.completed += 1,
                TicketStatus::Rejected => counts.rejected += 1,
                TicketStatus::Other(_) => counts.other += 1,
            }
        }
        counts
    }

    pub fn completed_percentage(&self) -> u64 {
        percentage(self.completed, self.total)
    }
}

/// A shortcut to a creation form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAction {
    pub title: &'static str,
    pub link: &'static str,
}

/// Everything the landing dashboard shows
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub claims: StatusCounts,
    pub requests: StatusCounts,
    pub recent_claims: Vec<Ticket>,
    pub recent_requests: Vec<Ticket>,
    pub quick_actions: Vec<QuickAction>,
}

impl Dashboard {
    pub fn build(claims: &[Ticket], requests: &[Ticket]) -> Self {
        Self {
            claims: StatusCounts::from_tickets(claims),
            requests: StatusCounts::from_tickets(requests),
            recent_claims: most_recent(claims, RECENT_LIMIT),
            recent_requests: most_recent(requests, RECENT_LIMIT),
            quick_actions: vec![
                QuickAction {
                    title: "Nuevo Reclamo",
                    link: TicketKind::Claim.new_item_link(),
                },
                QuickAction {
                    title: "Nueva Solicitud",
                    link: TicketKind::Request.new_item_link(),
                },
            ],
        }
    }

    /// Fetch both collections concurrently and build the dashboard
    pub async fn load(
        claims: &TicketService,
        requests: &TicketService,
        owner: Option<UserId>,
    ) -> Result<Self, Error> {
        let (claims, requests) = tokio::try_join!(claims.get_all(owner), requests.get_all(owner))?;
        Ok(Self::build(&claims, &requests))
    }
}

/// Newest first; undated items are left out
pub fn most_recent(tickets: &[Ticket], limit: usize) -> Vec<Ticket> {
    let mut dated: Vec<&Ticket> = tickets.iter().filter(|t| t.created_at.is_some()).collect();
    dated.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    dated.into_iter().take(limit).cloned().collect()
}
