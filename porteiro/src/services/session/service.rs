use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{info, warn};

use porteiro_core::error::{AuthFailure, Error, Result};
use porteiro_core::module_id::ModuleId;
use porteiro_core::permission::Action;
use porteiro_core::session::Session;

use crate::services::entity_store::EntityStore;
use crate::services::permissions::resolve;

use super::blob::BlobStore;
use super::token::SessionSealer;

/// Authentication lifecycle of the single logical actor of this process.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
}

/// Holds the current authenticated identity and its resolved permission
/// snapshot, persisting it across process restarts through a signed blob.
pub struct SessionService {
    state: RwLock<SessionState>,
    blob_store: Arc<dyn BlobStore>,
    sealer: SessionSealer,
    state_key: String,
}

impl SessionService {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        sealer: SessionSealer,
        state_key: impl Into<String>,
    ) -> Self {
        Self {
            state: RwLock::new(SessionState::Anonymous),
            blob_store,
            sealer,
            state_key: state_key.into(),
        }
    }

    /// Authenticate against the entity store and transition to
    /// Authenticated. Both failure sub-reasons surface as the same generic
    /// credential error; any failure falls back to Anonymous.
    pub async fn login(
        &self,
        store: &EntityStore,
        email: &str,
        password: &SecretString,
    ) -> Result<Session> {
        *self.state.write().await = SessionState::Authenticating;

        match self.authenticate(store, email, password).await {
            Ok(session) => {
                let blob = self.sealer.seal(&session)?;
                self.blob_store.write(&self.state_key, &blob).await?;
                *self.state.write().await = SessionState::Authenticated(session.clone());
                info!("User '{}' authenticated", session.user.username);
                Ok(session)
            }
            Err(err) => {
                *self.state.write().await = SessionState::Anonymous;
                warn!("Login failed for '{email}'");
                Err(err)
            }
        }
    }

    async fn authenticate(
        &self,
        store: &EntityStore,
        email: &str,
        password: &SecretString,
    ) -> Result<Session> {
        let user = store
            .user_by_email(email)
            .await?
            .ok_or(Error::Auth(AuthFailure::UserNotFound))?;

        let verified =
            bcrypt::verify(password.expose_secret(), &user.password_hash).unwrap_or(false);
        if !verified {
            return Err(Error::Auth(AuthFailure::BadCredential));
        }

        // Resolve once at login; the gate answers from this snapshot for
        // the lifetime of the session.
        let modules = store.modules().await?;
        let permissions = store.permissions_for_user_type(&user.user_type_id).await?;
        Ok(Session {
            user: user.without_credentials(),
            permissions: resolve(&modules, &permissions),
            created_at: Utc::now(),
        })
    }

    /// Clear in-memory and persisted state. Never fails; a persistence
    /// hiccup is logged and the in-memory state is cleared regardless.
    pub async fn logout(&self) {
        *self.state.write().await = SessionState::Anonymous;
        if let Err(err) = self.blob_store.delete(&self.state_key).await {
            warn!("Unable to clear persisted session: {err}");
        }
        info!("Session cleared");
    }

    /// Restore the persisted session, if any. The blob must carry a valid
    /// signature, the current schema version, and an unexpired TTL;
    /// otherwise it is discarded and the state stays Anonymous.
    pub async fn restore(&self) -> Option<Session> {
        let blob = match self.blob_store.read(&self.state_key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(err) => {
                warn!("Unable to read persisted session: {err}");
                return None;
            }
        };

        match self.sealer.open(&blob) {
            Ok(session) => {
                *self.state.write().await = SessionState::Authenticated(session.clone());
                info!("Restored session for '{}'", session.user.username);
                Some(session)
            }
            Err(err) => {
                warn!("Rejecting persisted session: {err}");
                if let Err(err) = self.blob_store.delete(&self.state_key).await {
                    warn!("Unable to discard rejected session blob: {err}");
                }
                *self.state.write().await = SessionState::Anonymous;
                None
            }
        }
    }

    pub async fn current(&self) -> Option<Session> {
        match &*self.state.read().await {
            SessionState::Authenticated(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(&*self.state.read().await, SessionState::Authenticated(_))
    }

    /// The authorization gate. Fail-closed: false whenever no session is
    /// established or the module has no resolved row.
    pub async fn has_permission(&self, module: &ModuleId, action: Action) -> bool {
        match &*self.state.read().await {
            SessionState::Authenticated(session) => session.has_permission(module, action),
            _ => false,
        }
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("state_key", &self.state_key)
            .finish_non_exhaustive()
    }
}
