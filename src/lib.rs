//! Resolution Rust Client Library
//!
//! A Rust client for the Resolution service, where customers submit and
//! track claims and requests, verify their account with an emailed code,
//! and administrators move tickets through their lifecycle and read
//! aggregate reports.

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod tickets;
pub mod verification;
pub mod views;

use std::sync::Arc;

use reqwest::Client;

use crate::admin::Admin;
use crate::auth::{Auth, FileSessionStore, MemorySessionStore, SessionContext, SessionStore};
use crate::config::ClientOptions;
use crate::tickets::{TicketKind, TicketService};
use crate::verification::{FlowPurpose, VerificationFlow};

/// The main entry point for the Resolution client
pub struct Resolution {
    /// API base URL, `/api` included
    pub url: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client for accounts, sign-in and verification codes
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
}

impl Resolution {
    /// Create a new client against a backend origin
    ///
    /// # Example
    ///
    /// ```
    /// use resolution_client::Resolution;
    ///
    /// let resolution = Resolution::new("http://localhost:8000");
    /// assert_eq!(resolution.url, "http://localhost:8000/api");
    /// ```
    pub fn new(origin: &str) -> Self {
        Self::new_with_options(ClientOptions::default().with_origin(origin))
    }

    /// Create a new client configured from the environment
    pub fn from_env() -> Self {
        Self::new_with_options(ClientOptions::from_env())
    }

    /// Create a new client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use resolution_client::{Resolution, config::ClientOptions};
    ///
    /// let options = ClientOptions::default()
    ///     .with_origin("http://backend:8000")
    ///     .with_persist_session(false);
    /// let resolution = Resolution::new_with_options(options);
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Self {
        let http_client = Client::new();
        let auth = Auth::new(&options.api_url, http_client.clone(), options.clone());

        Self {
            url: options.api_url.clone(),
            http_client,
            auth,
            options,
        }
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    fn tickets(&self, kind: TicketKind) -> TicketService {
        TicketService::new(&self.url, self.http_client.clone(), self.options.clone(), kind)
    }

    /// Service for `/claim`
    pub fn claims(&self) -> TicketService {
        self.tickets(TicketKind::Claim)
    }

    /// Service for `/request`
    pub fn requests(&self) -> TicketService {
        self.tickets(TicketKind::Request)
    }

    /// Admin panel and reports
    pub fn admin(&self) -> Admin {
        Admin::new(
            &self.url,
            self.http_client.clone(),
            self.options.clone(),
            self.claims(),
            self.requests(),
        )
    }

    /// Session context backed by `store`
    pub fn session_with_store(&self, store: Arc<dyn SessionStore>) -> SessionContext {
        SessionContext::new(self.auth.clone(), store)
    }

    /// Session context persisted where the options say, or kept in memory
    pub fn session(&self) -> SessionContext {
        let store: Arc<dyn SessionStore> = if self.options.persist_session {
            Arc::new(FileSessionStore::new(self.options.session_path.clone()))
        } else {
            Arc::new(MemorySessionStore::new())
        };
        self.session_with_store(store)
    }

    /// Start a verification or password-reset flow for `email`
    pub fn verification(&self, email: &str, purpose: FlowPurpose) -> VerificationFlow {
        VerificationFlow::new(email, purpose, self.options.resend_cooldown)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Session, SessionContext, SessionState, User};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::tickets::{NewTicket, Ticket, TicketKind, TicketStatus};
    pub use crate::Resolution;
}
