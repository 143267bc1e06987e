use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::User;
use crate::module_id::ModuleId;
use crate::permission::{Action, Capabilities};

/// One resolved per-module grant row of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPermission {
    pub module_id: ModuleId,
    pub module_name: String,
    #[serde(flatten)]
    pub caps: Capabilities,
}

/// Snapshot of the authenticated identity plus its resolved permissions,
/// computed once at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub permissions: Vec<UserPermission>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// The authorization gate predicate. Pure and cheap; UI collaborators
    /// call this per render. A module without a resolved row is denied.
    pub fn has_permission(&self, module: &ModuleId, action: Action) -> bool {
        self.permissions
            .iter()
            .find(|p| &p.module_id == module)
            .map(|p| p.caps.get(action))
            .unwrap_or(false)
    }
}
