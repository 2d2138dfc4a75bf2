//! Client session: who is signed in, and the channel that asks the UI to show a login
//! prompt.
//!
//! The prompt channel is passed explicitly to every network-calling component instead
//! of living in a global event bus. Any of them can raise it; any observer holding a
//! receiver can react.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use super::SessionApi;
use crate::errors::AppError;
use crate::models::CurrentUser;

const PROMPT_CAPACITY: usize = 16;

/// A request to present the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequired {
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    user: Arc<watch::Sender<Option<CurrentUser>>>,
    prompts: broadcast::Sender<AuthRequired>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Session {
    pub fn new(user: Option<CurrentUser>) -> Self {
        let (user, _) = watch::channel(user);
        let (prompts, _) = broadcast::channel(PROMPT_CAPACITY);
        Self {
            user: Arc::new(user),
            prompts,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn signed_in(user: CurrentUser) -> Self {
        Self::new(Some(user))
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        *self.user.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// Follow sign-in state changes.
    pub fn watch_user(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.user.subscribe()
    }

    /// Receive login prompts.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthRequired> {
        self.prompts.subscribe()
    }

    /// Ask observers to present the login flow.
    pub fn require_login(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::debug!("Login required: {}", reason);
        // no observer is fine; nobody is showing a prompt
        let _ = self.prompts.send(AuthRequired { reason });
    }

    /// Route an operation's failure: auth failures drop the local user and prompt.
    pub fn report(&self, err: &AppError) {
        if err.is_auth_failure() {
            self.user.send_replace(None);
            self.require_login(err.message());
        }
    }

    /// Reload the signed-in user. Failures read as signed out.
    pub async fn refresh<A: SessionApi + ?Sized>(&self, api: &A) -> Option<CurrentUser> {
        let user = match api.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                None
            }
        };
        self.user.send_replace(user);
        user
    }

    /// Store the token handed back by the login callback, then reload the user.
    pub async fn sign_in<A: SessionApi + ?Sized>(
        &self,
        api: &A,
        token: &str,
    ) -> Result<Option<CurrentUser>, AppError> {
        api.store_token(token).await?;
        Ok(self.refresh(api).await)
    }

    pub async fn sign_out<A: SessionApi + ?Sized>(&self, api: &A) -> Result<(), AppError> {
        api.clear_token().await?;
        self.user.send_replace(None);
        Ok(())
    }
}
