use std::sync::Arc;

use exam_core::model::UserId;
use remote::{Authenticator, RemoteError};
use tracing::{info, instrument, warn};

use crate::error::AuthError;

/// Logs users in against the backend.
#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn Authenticator>,
}

impl AccountService {
    #[must_use]
    pub fn new(auth: Arc<dyn Authenticator>) -> Self {
        Self { auth }
    }

    /// Exchange credentials for a user id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` for blank input without calling
    /// the backend, `AuthError::Rejected` with the server message, or
    /// `AuthError::Remote` when the backend is unreachable.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<UserId, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        match self.auth.authenticate(username, password).await {
            Ok(user_id) => {
                info!(%user_id, "logged in");
                Ok(user_id)
            }
            Err(RemoteError::Rejected(message)) => {
                warn!(%message, "login rejected");
                Err(AuthError::Rejected(message))
            }
            Err(e) => Err(AuthError::Remote(e)),
        }
    }
}
