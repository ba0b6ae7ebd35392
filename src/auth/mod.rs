//! Authentication and user management for Resolution

mod context;
mod session;
mod types;

use reqwest::Client;
use serde_json::json;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::verification::{validate_code, validate_new_password};

pub use context::*;
pub use session::*;
pub use types::*;

/// Client for the `/user`, `/login` and `/auth` resources
#[derive(Debug, Clone)]
pub struct Auth {
    /// API base URL, `/api` included
    url: String,

    /// HTTP client used for requests
    client: Client,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// Register a new account
    pub async fn register(&self, data: &RegisterData) -> Result<User, Error> {
        let user = Fetch::post(&self.client, &self.endpoint("/user"))
            .timeout(self.options.request_timeout)
            .json(data)?
            .execute::<User>()
            .await?;

        log::info!("registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Sign in through the dedicated login endpoint
    ///
    /// A 2xx payload carrying `error` is reported as [`Error::Domain`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = Fetch::post(&self.client, &self.endpoint("/login"))
            .timeout(self.options.request_timeout)
            .json(&credentials)?
            .execute::<LoginResponse>()
            .await?;

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(Error::domain(error));
        }

        match (response.user, response.token) {
            (Some(user), Some(token)) => Ok(Session::new(token, user)),
            _ => Err(Error::unexpected_body("login response without user or token")),
        }
    }

    /// List every user
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        Fetch::get(&self.client, &self.endpoint("/user"))
            .timeout(self.options.request_timeout)
            .execute::<Vec<User>>()
            .await
    }

    /// Find a user by email; the backend has no lookup route, so this scans the list
    pub async fn find_user_by_email(&self, email: &str) -> Result<User, Error> {
        let email = email.trim();
        self.list_users()
            .await?
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| Error::not_found("Usuario no encontrado"))
    }

    /// Fetch a single user
    pub async fn get_user(&self, id: UserId, token: Option<&str>) -> Result<User, Error> {
        Fetch::get(&self.client, &self.endpoint(&format!("/user/{}", id)))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .execute::<User>()
            .await
    }

    /// Partially update a user
    pub async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
        token: Option<&str>,
    ) -> Result<Option<User>, Error> {
        Fetch::patch(&self.client, &self.endpoint(&format!("/user/{}", id)))
            .timeout(self.options.request_timeout)
            .maybe_bearer_auth(token)
            .json(update)?
            .execute_optional::<User>()
            .await
    }

    /// Issue the first verification code for a user
    pub async fn issue_code(&self, user_id: UserId) -> Result<AuthCodeEnvelope, Error> {
        Fetch::post(&self.client, &self.endpoint("/auth"))
            .timeout(self.options.request_timeout)
            .json(&json!({ "user": user_id }))?
            .execute::<AuthCodeEnvelope>()
            .await
    }

    /// Regenerate the verification code of the account behind `email`
    pub async fn resend_code(&self, email: &str) -> Result<AuthCodeEnvelope, Error> {
        let user = self.find_user_by_email(email).await?;

        let envelope = Fetch::put(&self.client, &self.endpoint("/auth"))
            .timeout(self.options.request_timeout)
            .json(&json!({ "user": user.id }))?
            .execute::<AuthCodeEnvelope>()
            .await?;

        log::info!("verification code re-issued for user {}", user.id);
        Ok(envelope)
    }

    /// Check a code against the backend without side effects on the user
    pub async fn check_code(&self, email: &str, code: &str) -> Result<User, Error> {
        validate_code(code)?;
        let user = self.find_user_by_email(email).await?;

        let response = Fetch::post(&self.client, &self.endpoint("/auth"))
            .timeout(self.options.request_timeout)
            .json(&json!({ "user_id": user.id, "code": code }))?
            .execute::<VerificationResponse>()
            .await?;

        if !response.success {
            return Err(Error::domain(
                response
                    .error
                    .unwrap_or_else(|| "Código de verificación incorrecto".to_string()),
            ));
        }

        Ok(user)
    }

    /// Verify an account with the emailed code and flag it verified
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<User, Error> {
        let user = self.check_code(email, code).await?;
        let updated = self.update_user(user.id, &UserUpdate::verified(), None).await?;

        log::info!("user {} verified", user.id);
        Ok(updated.unwrap_or(User {
            verified: true,
            ..user
        }))
    }

    /// Replace the password of the account behind `email`, authorized by its code
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), Error> {
        validate_new_password(new_password, confirmation)?;
        let user = self.check_code(email, code).await?;
        self.update_user(user.id, &UserUpdate::password(new_password), None)
            .await?;

        log::info!("password reset for user {}", user.id);
        Ok(())
    }
}
