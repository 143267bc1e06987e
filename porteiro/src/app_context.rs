use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use porteiro_core::error::{Error, Result};
use porteiro_core::module_id::ModuleId;
use porteiro_core::notification_types::{Message, MessageType};
use porteiro_core::permission::Action;
use porteiro_core::session::Session;

use crate::notification::notify;
use crate::services::permissions::PermissionGrid;
use crate::services::session::blob::FileBlobStore;
use crate::services::session::token::SessionSealer;
use crate::services::{EntityStore, SessionService};
use crate::settings::Settings;

/// Everything a collaborator needs, passed explicitly. There is no global
/// auth state; components receive a [`SharedAppContext`] at construction.
pub struct AppContext {
    pub settings: Settings,
    pub store: EntityStore,
    pub sessions: SessionService,
}

pub type SharedAppContext = Arc<AppContext>;

impl AppContext {
    pub fn new() -> anyhow::Result<SharedAppContext> {
        let settings = Settings::new()?;
        Ok(Self::with_settings(settings))
    }

    pub fn with_settings(settings: Settings) -> SharedAppContext {
        let store = EntityStore::in_memory(
            Duration::from_secs(settings.store.timeout_secs),
            settings.auth.bcrypt_cost,
        );
        let blob_store = Arc::new(FileBlobStore::new(&settings.session.state_dir));
        let sealer = SessionSealer::new(
            settings.session.secret.clone(),
            settings.session.ttl_minutes,
        );
        let sessions = SessionService::new(blob_store, sealer, settings.session.state_key.clone());
        Arc::new(Self {
            settings,
            store,
            sessions,
        })
    }

    /// Log in and emit the user-facing banner for the transition. The
    /// failure banner never reveals which credential check failed.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session> {
        match self.sessions.login(&self.store, email, password).await {
            Ok(session) => {
                let msg = Message::new(MessageType::LoginSucceeded, &session.user.full_name);
                notify(&self.settings.notifications, &msg).await;
                Ok(session)
            }
            Err(err) => {
                let msg = login_failure_banner(&err, email);
                notify(&self.settings.notifications, &msg).await;
                Err(err)
            }
        }
    }

    /// Persist a user type's edited grid and emit the saved-count banner.
    pub async fn save_permissions(&self, grid: &mut PermissionGrid) -> Result<usize> {
        let user_type = self.store.user_type(grid.user_type_id()).await?;
        let saved = grid.save(&self.store).await?;
        let msg = Message::new(
            MessageType::PermissionsSaved { count: saved },
            &user_type.name,
        );
        notify(&self.settings.notifications, &msg).await;
        Ok(saved)
    }

    pub async fn logout(&self) {
        let subject = self
            .sessions
            .current()
            .await
            .map(|s| s.user.full_name)
            .unwrap_or_else(|| "Anonymous".to_string());
        self.sessions.logout().await;
        let msg = Message::new(MessageType::LoggedOut, &subject);
        notify(&self.settings.notifications, &msg).await;
    }

    pub async fn restore(&self) -> Option<Session> {
        let session = self.sessions.restore().await?;
        let msg = Message::new(MessageType::SessionRestored, &session.user.full_name);
        notify(&self.settings.notifications, &msg).await;
        Some(session)
    }

    /// The gate predicate routing/UI collaborators call.
    pub async fn has_permission(&self, module: &ModuleId, action: Action) -> bool {
        self.sessions.has_permission(module, action).await
    }
}

/// Banner for a failed login. Only credential failures wear the generic
/// credential message; a backing-store failure must not look like a typo.
fn login_failure_banner(err: &Error, email: &str) -> Message {
    match err {
        Error::Auth(_) => Message::new(MessageType::LoginFailed, email),
        _ => Message::new(
            MessageType::Custom("Sign-in is unavailable right now.".to_string()),
            email,
        ),
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
