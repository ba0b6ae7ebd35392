//! Admin panel and reports
//!
//! Every call here is gated on the acting user's `is_admin` flag before
//! anything is sent.

use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::{User, UserId};
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::tickets::{Ticket, TicketId, TicketKind, TicketService, TicketStatus};
use crate::views::percentage;

/// Owner details embedded in admin listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Owner id
    pub id: UserId,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
}

/// A ticket with its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    #[serde(default)]
    pub user_info: Option<UserInfo>,
}

/// Payload of `GET /admin`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminData {
    #[serde(default)]
    pub claims: Vec<AdminTicket>,
    #[serde(default)]
    pub requests: Vec<AdminTicket>,
    #[serde(default)]
    pub total_claims: u64,
    #[serde(default)]
    pub total_requests: u64,
}

impl AdminData {
    pub fn items(&self, kind: TicketKind) -> &[AdminTicket] {
        match kind {
            TicketKind::Claim => &self.claims,
            TicketKind::Request => &self.requests,
        }
    }
}

/// Precomputed per-status counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStats {
    /// Every ticket in the period
    #[serde(default)]
    pub total: u64,
    /// Pending tickets
    #[serde(default)]
    pub pendiente: u64,
    /// Tickets in progress
    #[serde(default)]
    pub en_proceso: u64,
    /// Completed tickets
    #[serde(default)]
    pub completado: u64,
}

/// Rounded share of each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusPercentages {
    /// Share of pending tickets
    pub pending: u64,
    /// Share of tickets in progress
    pub in_progress: u64,
    /// Share of completed tickets
    pub completed: u64,
}

impl StatusStats {
    /// Counter for `status`; 0 for states the report does not track
    pub fn count(&self, status: &TicketStatus) -> u64 {
        match status {
            TicketStatus::Pending => self.pendiente,
            TicketStatus::InProgress => self.en_proceso,
            TicketStatus::Completed => self.completado,
            _ => 0,
        }
    }

    /// Rounded share of each tracked status in `total`
    pub fn percentages(&self) -> StatusPercentages {
        StatusPercentages {
            pending: percentage(self.pendiente, self.total),
            in_progress: percentage(self.en_proceso, self.total),
            completed: percentage(self.completado, self.total),
        }
    }
}

/// One day of the chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    /// Day, `YYYY-MM-DD`
    pub date: String,
    /// Counters for that day
    #[serde(flatten)]
    pub stats: StatusStats,
}

/// Period covered by a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day covered, `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: String,
    /// Last day covered, `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: String,
}

/// Payload of `GET /reports`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportsData {
    #[serde(default)]
    pub claims_stats: StatusStats,
    #[serde(default)]
    pub requests_stats: StatusStats,
    #[serde(default)]
    pub claims_chart_data: Vec<ChartRow>,
    #[serde(default)]
    pub requests_chart_data: Vec<ChartRow>,
    #[serde(default)]
    pub date_range: DateRange,
}

/// One entry of a bulk status change
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    /// Claim or request
    pub kind: TicketKind,
    /// Ticket to move
    pub id: TicketId,
    /// Target status
    pub status: TicketStatus,
}

/// Client for `/admin` and `/reports`
#[derive(Debug, Clone)]
pub struct Admin {
    url: String,
    client: Client,
    options: ClientOptions,
    claims: TicketService,
    requests: TicketService,
}

fn require_admin(user: &User) -> Result<(), Error> {
    if user.is_admin {
        Ok(())
    } else {
        Err(Error::auth(
            "Acceso denegado. Solo administradores pueden acceder a este panel.",
        ))
    }
}

impl Admin {
    pub(crate) fn new(
        url: &str,
        client: Client,
        options: ClientOptions,
        claims: TicketService,
        requests: TicketService,
    ) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            claims,
            requests,
        }
    }

    fn service(&self, kind: TicketKind) -> &TicketService {
        match kind {
            TicketKind::Claim => &self.claims,
            TicketKind::Request => &self.requests,
        }
    }

    /// Every claim and request with owner details
    pub async fn overview(&self, user: &User, token: Option<&str>) -> Result<AdminData, Error> {
        require_admin(user)?;
        Fetch::get(&self.client, &format!("{}/admin", self.url))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .query("user_id", user.id)
            .execute::<AdminData>()
            .await
    }

    /// Aggregated counters and chart series
    pub async fn reports(&self, user: &User, token: Option<&str>) -> Result<ReportsData, Error> {
        require_admin(user)?;
        Fetch::get(&self.client, &format!("{}/reports", self.url))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .query("user_id", user.id)
            .execute::<ReportsData>()
            .await
    }

    /// Move one ticket to `status`
    pub async fn update_status(
        &self,
        user: &User,
        token: Option<&str>,
        kind: TicketKind,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), Error> {
        require_admin(user)?;
        self.service(kind)
            .update_status(id, status, user.id, token)
            .await
    }

    /// Issue every update concurrently
    ///
    /// One result per update, in input order. Updates that succeed stay
    /// applied when others fail.
    pub async fn apply_bulk(
        &self,
        user: &User,
        token: Option<&str>,
        updates: &[PendingUpdate],
    ) -> Result<Vec<Result<(), Error>>, Error> {
        require_admin(user)?;

        let calls = updates.iter().map(|update| {
            self.service(update.kind)
                .update_status(update.id, update.status.clone(), user.id, token)
        });
        let results = join_all(calls).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            log::warn!("{} of {} bulk updates failed", failed, results.len());
        }
        Ok(results)
    }
}

/// Admin panel state; re-fetches after every mutation
#[derive(Debug, Clone, Default)]
pub struct AdminPanel {
    data: Option<AdminData>,
    updating: Option<TicketId>,
    error: Option<String>,
}

impl AdminPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&AdminData> {
        self.data.as_ref()
    }

    pub fn updating(&self) -> Option<TicketId> {
        self.updating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn refresh(&mut self, admin: &Admin, user: &User, token: Option<&str>) -> bool {
        match admin.overview(user, token).await {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }

    /// Change a status, then reload the whole panel
    pub async fn set_status(
        &mut self,
        admin: &Admin,
        user: &User,
        token: Option<&str>,
        kind: TicketKind,
        id: TicketId,
        status: TicketStatus,
    ) -> bool {
        self.updating = Some(id);
        let result = admin.update_status(user, token, kind, id, status).await;
        let ok = match result {
            Ok(()) => self.refresh(admin, user, token).await,
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        };
        self.updating = None;
        ok
    }
}
