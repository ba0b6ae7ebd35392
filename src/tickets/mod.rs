//! Claims and requests services
//!
//! Both resources share the same shape and the same routes, distinguished
//! only by the path segment, so one service covers both.

mod status;
mod types;

use reqwest::Client;

use crate::auth::UserId;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use status::*;
pub use types::*;

/// Client for `/claim` or `/request`
#[derive(Debug, Clone)]
pub struct TicketService {
    url: String,
    client: Client,
    options: ClientOptions,
    kind: TicketKind,
}

impl TicketService {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, kind: TicketKind) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            kind,
        }
    }

    pub fn kind(&self) -> TicketKind {
        self.kind
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.url, self.kind.as_str(), suffix)
    }

    /// Every ticket owned by `owner`
    ///
    /// Returns an empty list without touching the network while no user is known.
    pub async fn get_all(&self, owner: Option<UserId>) -> Result<Vec<Ticket>, Error> {
        let Some(owner) = owner else {
            log::debug!("no user yet, skipping {} fetch", self.kind);
            return Ok(Vec::new());
        };

        Fetch::get(&self.client, &self.endpoint(&format!("/user/{}", owner)))
            .timeout(self.options.request_timeout)
            .execute::<Vec<Ticket>>()
            .await
    }

    /// A single ticket
    pub async fn get_by_id(&self, id: TicketId, token: Option<&str>) -> Result<Ticket, Error> {
        Fetch::get(&self.client, &self.endpoint(&format!("/{}", id)))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .execute::<Ticket>()
            .await
    }

    /// Submit a new ticket
    pub async fn create(&self, ticket: &NewTicket) -> Result<Ticket, Error> {
        let created = Fetch::post(&self.client, &self.endpoint(""))
            .timeout(self.options.request_timeout)
            .json(ticket)?
            .execute::<Ticket>()
            .await?;

        log::info!("created {} {:?} for user {}", self.kind, created.id, ticket.user);
        Ok(created)
    }

    /// Move a ticket to `status` through the generic admin update
    pub async fn update_status(
        &self,
        id: TicketId,
        status: TicketStatus,
        acting_user: UserId,
        token: Option<&str>,
    ) -> Result<(), Error> {
        let update = StatusUpdate {
            user_id: acting_user,
            kind: self.kind,
            id,
            status,
        };

        Fetch::patch(&self.client, &format!("{}/admin", self.url))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .json(&update)?
            .execute_body()
            .await?;

        log::info!("{} {} moved to {}", self.kind, id, update.status);
        Ok(())
    }

    /// Delete a ticket
    pub async fn delete(&self, id: TicketId, token: Option<&str>) -> Result<(), Error> {
        Fetch::delete(&self.client, &self.endpoint(&format!("/{}", id)))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .execute_body()
            .await?;

        log::info!("deleted {} {}", self.kind, id);
        Ok(())
    }
}
