use tracing::info;

use porteiro_core::entities::{Module, Permission};
use porteiro_core::error::{Error, Result};
use porteiro_core::module_id::ModuleId;
use porteiro_core::permission::{Action, Capabilities};
use porteiro_core::session::UserPermission;

use crate::services::entity_store::EntityStore;

/// Compute the effective capability table of a user type over the modules
/// in scope: exactly one row per module, and a module without a grant row
/// defaults to no access at all.
pub fn resolve(modules: &[Module], permissions: &[Permission]) -> Vec<UserPermission> {
    modules
        .iter()
        .map(|module| {
            let caps = permissions
                .iter()
                .find(|p| p.module_id == module.id)
                .map(|p| p.caps)
                .unwrap_or_default();
            UserPermission {
                module_id: module.id.clone(),
                module_name: module.name.clone(),
                caps,
            }
        })
        .collect()
}

/// One editable row of the permission grid.
#[derive(Debug, Clone)]
pub struct PermissionRow {
    pub module_id: ModuleId,
    pub module_name: String,
    pub caps: Capabilities,
    pub permission_id: Option<String>,
    /// Capability set as last loaded from the store; rows are dirty only
    /// relative to this snapshot.
    loaded: Capabilities,
}

impl PermissionRow {
    pub fn is_dirty(&self) -> bool {
        self.caps != self.loaded
    }

    /// Edit one flag through the monotonic capability rule.
    pub fn set(&mut self, action: Action, value: bool) {
        self.caps = self.caps.apply(action, value);
    }
}

/// The editable grant grid of one user type across all modules.
///
/// Saving persists only dirty rows, so unrelated rows touched by another
/// session are not clobbered. Two sessions editing the same row still end
/// last-writer-wins; there is no versioning or conflict detection.
#[derive(Debug)]
pub struct PermissionGrid {
    user_type_id: String,
    rows: Vec<PermissionRow>,
}

impl PermissionGrid {
    /// Load the grid for a user type. Modules and grants are fetched in
    /// sequence; the store gives no ordering guarantee across calls.
    pub async fn load(store: &EntityStore, user_type_id: &str) -> Result<Self> {
        store.user_type(user_type_id).await?;
        let modules = store.modules().await?;
        let permissions = store.permissions_for_user_type(user_type_id).await?;

        let rows = modules
            .into_iter()
            .map(|module| {
                let existing = permissions.iter().find(|p| p.module_id == module.id);
                let caps = existing.map(|p| p.caps).unwrap_or_default();
                PermissionRow {
                    module_id: module.id,
                    module_name: module.name,
                    caps,
                    permission_id: existing.map(|p| p.id.clone()),
                    loaded: caps,
                }
            })
            .collect();

        Ok(Self {
            user_type_id: user_type_id.to_string(),
            rows,
        })
    }

    pub fn user_type_id(&self) -> &str {
        &self.user_type_id
    }

    pub fn rows(&self) -> &[PermissionRow] {
        &self.rows
    }

    /// Edit one flag of the row for the given module.
    pub fn set(&mut self, module: &ModuleId, action: Action, value: bool) -> Result<()> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| &row.module_id == module)
            .ok_or_else(|| Error::not_found("module", module.as_str()))?;
        row.set(action, value);
        Ok(())
    }

    pub fn dirty_rows(&self) -> impl Iterator<Item = &PermissionRow> {
        self.rows.iter().filter(|row| row.is_dirty())
    }

    /// Persist dirty rows and refresh their snapshots. Returns the number
    /// of rows written. Rows persist through the pair-keyed upsert, so a
    /// row created meanwhile by another session is updated, not duplicated.
    pub async fn save(&mut self, store: &EntityStore) -> Result<usize> {
        let mut saved = 0;
        for row in self.rows.iter_mut().filter(|row| row.is_dirty()) {
            let permission = store
                .upsert_permission(&self.user_type_id, &row.module_id, row.caps)
                .await?;
            row.permission_id = Some(permission.id);
            row.loaded = row.caps;
            saved += 1;
        }
        if saved > 0 {
            info!(
                "Saved {} permission row(s) for user type '{}'",
                saved, self.user_type_id
            );
        }
        Ok(saved)
    }

    /// Flattened snapshot in the shape sessions carry.
    pub fn resolved(&self) -> Vec<UserPermission> {
        self.rows
            .iter()
            .map(|row| UserPermission {
                module_id: row.module_id.clone(),
                module_name: row.module_name.clone(),
                caps: row.caps,
            })
            .collect()
    }
}
