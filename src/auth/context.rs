//! Signed-in state shared by every view

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::session::{Session, SessionStore, TOKEN_KEY, USER_KEY};
use super::types::User;
use super::Auth;
use crate::error::Error;

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The store has not been read yet
    Loading,
    /// Nobody is signed in, or the stored user is not verified
    Anonymous,
    /// A verified user is signed in
    Authenticated(Session),
}

/// Holds the signed-in user and mirrors it into a [`SessionStore`]
pub struct SessionContext {
    auth: Auth,
    store: Arc<dyn SessionStore>,
    persist: bool,
    state: RwLock<SessionState>,
}

impl SessionContext {
    /// Create a context in the `Loading` state; call [`SessionContext::restore`] next
    pub fn new(auth: Auth, store: Arc<dyn SessionStore>) -> Self {
        let persist = auth.options.persist_session;
        Self {
            auth,
            store,
            persist,
            state: RwLock::new(SessionState::Loading),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        *self.write() = state;
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    /// The active session, if a verified user is signed in
    pub fn session(&self) -> Option<Session> {
        match &*self.read() {
            SessionState::Authenticated(session) => Some(session.clone()),
            _ => None,
        }
    }

    /// The signed-in user
    pub fn current_user(&self) -> Option<User> {
        self.session().map(|session| session.user)
    }

    /// Bearer token of the active session
    pub fn token(&self) -> Option<String> {
        self.session().map(|session| session.token)
    }

    /// Whether the store has not been read yet
    pub fn is_loading(&self) -> bool {
        matches!(*self.read(), SessionState::Loading)
    }

    /// Whether a verified user is signed in
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.read(), SessionState::Authenticated(_))
    }

    /// Whether the signed-in user is an administrator
    pub fn is_admin(&self) -> bool {
        self.current_user().map(|user| user.is_admin).unwrap_or(false)
    }

    /// Leave `Loading` by reading whatever the store holds
    pub async fn restore(&self) -> Result<SessionState, Error> {
        let loaded = self.load_stored().await;
        let state = match loaded {
            Ok(state) => state,
            Err(err) => {
                self.set_state(SessionState::Anonymous);
                return Err(err);
            }
        };
        self.set_state(state.clone());
        Ok(state)
    }

    async fn load_stored(&self) -> Result<SessionState, Error> {
        let token = self.store.get(TOKEN_KEY).await?;
        let raw_user = self.store.get(USER_KEY).await?;

        match (token, raw_user) {
            (Some(token), Some(raw_user)) => match serde_json::from_str::<User>(&raw_user) {
                Ok(user) if user.verified => {
                    Ok(SessionState::Authenticated(Session::new(token, user)))
                }
                Ok(_) => Ok(SessionState::Anonymous),
                Err(err) => {
                    log::warn!("discarding unreadable stored user: {}", err);
                    self.store.clear().await?;
                    Ok(SessionState::Anonymous)
                }
            },
            (Some(token), None) => self.restore_from_token(token).await,
            _ => Ok(SessionState::Anonymous),
        }
    }

    /// Only a token was stored: decode the user id out of it and ask the backend
    async fn restore_from_token(&self, token: String) -> Result<SessionState, Error> {
        let Some(user_id) = Session::legacy_user_id(&token) else {
            return Ok(SessionState::Anonymous);
        };

        match self.auth.get_user(user_id, Some(&token)).await {
            Ok(user) if user.verified => {
                let session = Session::new(token, user);
                self.persist(&session).await?;
                Ok(SessionState::Authenticated(session))
            }
            Ok(_) => Ok(SessionState::Anonymous),
            Err(err) => {
                log::warn!("stored token rejected, signing out: {}", err);
                self.store.clear().await?;
                Ok(SessionState::Anonymous)
            }
        }
    }

    async fn persist(&self, session: &Session) -> Result<(), Error> {
        if self.persist {
            self.store.save(session).await?;
        }
        Ok(())
    }

    /// Sign in; unverified accounts are refused and the context stays anonymous
    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let session = self.auth.login(email, password).await?;

        if !session.user.verified {
            self.set_state(SessionState::Anonymous);
            return Err(Error::auth("Cuenta no verificada"));
        }

        self.persist(&session).await?;
        let user = session.user.clone();
        log::info!("user {} signed in", user.id);
        self.set_state(SessionState::Authenticated(session));
        Ok(user)
    }

    /// Sign out and forget the stored session
    pub async fn logout(&self) -> Result<(), Error> {
        self.set_state(SessionState::Anonymous);
        self.store.clear().await
    }

    /// Re-fetch the signed-in user and re-check its `verified` flag
    pub async fn refresh_user(&self) -> Result<User, Error> {
        let session = self
            .session()
            .ok_or_else(|| Error::auth("Sesión no iniciada"))?;

        let user = self
            .auth
            .get_user(session.user.id, Some(&session.token))
            .await?;

        // persisted even when unverified; restore re-checks the flag
        let refreshed = Session::new(session.token, user.clone());
        self.persist(&refreshed).await?;

        if user.verified {
            self.set_state(SessionState::Authenticated(refreshed));
        } else {
            log::info!("user {} is no longer verified", user.id);
            self.set_state(SessionState::Anonymous);
        }

        Ok(user)
    }
}
