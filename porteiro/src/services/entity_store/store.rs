use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use porteiro_core::entities::{Module, Permission, User, UserType};
use porteiro_core::error::{Error, Result};
use porteiro_core::module_id::ModuleId;
use porteiro_core::permission::Capabilities;

use super::backend::{StorageBackend, StoreError, Table};
use super::memory::MemoryBackend;

/// Fields of a user to be created; the credential arrives as a secret and
/// is stored as a bcrypt hash only.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub user_type_id: String,
    pub password: SecretString,
}

/// Typed registry of modules, user types, users, and permissions on top of
/// a replaceable [`StorageBackend`].
///
/// Every backend call is bounded by a timeout; an elapsed timeout surfaces
/// as a store error. No operation leaves partial side effects on failure.
#[derive(Clone)]
pub struct EntityStore {
    backend: Arc<dyn StorageBackend>,
    call_timeout: Duration,
    bcrypt_cost: u32,
}

impl EntityStore {
    pub fn new(backend: Arc<dyn StorageBackend>, call_timeout: Duration, bcrypt_cost: u32) -> Self {
        Self {
            backend,
            call_timeout,
            bcrypt_cost,
        }
    }

    pub fn in_memory(call_timeout: Duration, bcrypt_cost: u32) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), call_timeout, bcrypt_cost)
    }

    async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T> {
        match timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Error::Store(err.message)),
            Err(_) => Err(Error::Store(format!(
                "{op} timed out after {:?}",
                self.call_timeout
            ))),
        }
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| Error::Store(format!("malformed row: {e}")))
    }

    fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>> {
        values.into_iter().map(Self::decode).collect()
    }

    fn encode<T: Serialize>(entity: &T) -> Result<Value> {
        serde_json::to_value(entity).map_err(|e| Error::Store(format!("unencodable row: {e}")))
    }

    fn require(field: &'static str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::validation(format!("{field} must not be empty")));
        }
        Ok(())
    }

    // --- Modules -----------------------------------------------------------

    pub async fn modules(&self) -> Result<Vec<Module>> {
        let rows = self
            .call("select modules", self.backend.select(Table::Modules, &[]))
            .await?;
        Self::decode_all(rows)
    }

    pub async fn module(&self, id: &ModuleId) -> Result<Module> {
        let filter = [("id", id.as_str().to_string())];
        let rows = self
            .call("select module", self.backend.select(Table::Modules, &filter))
            .await?;
        rows.into_iter()
            .next()
            .map(Self::decode)
            .transpose()?
            .ok_or_else(|| Error::not_found("module", id.as_str()))
    }

    /// Create a module whose identity tag is derived from its display name.
    pub async fn create_module(&self, name: &str) -> Result<Module> {
        self.register_module(ModuleId::from_name(name), name).await
    }

    /// Create a module under an explicit identity tag. Used for the builtin
    /// administration modules, whose display names are localized.
    pub async fn register_module(&self, id: ModuleId, name: &str) -> Result<Module> {
        Self::require("module name", name)?;
        if id.as_str().is_empty() {
            return Err(Error::validation(
                "module name must contain at least one letter or digit",
            ));
        }

        let filter = [("id", id.as_str().to_string())];
        let existing = self
            .call("select module", self.backend.select(Table::Modules, &filter))
            .await?;
        if !existing.is_empty() {
            return Err(Error::validation(format!("module '{id}' already exists")));
        }

        let module = Module {
            id,
            name: name.to_string(),
        };
        let row = self
            .call(
                "insert module",
                self.backend.insert(Table::Modules, Self::encode(&module)?),
            )
            .await?;
        info!("Created module '{}'", module.id);
        Self::decode(row)
    }

    pub async fn update_module(&self, module: &Module) -> Result<Module> {
        Self::require("module name", &module.name)?;
        self.module(&module.id).await?;
        let row = self
            .call(
                "update module",
                self.backend
                    .update(Table::Modules, module.id.as_str(), Self::encode(module)?),
            )
            .await?;
        Self::decode(row)
    }

    /// Delete a module. Rejected while permission grants still reference it;
    /// the caller removes dependents first.
    pub async fn delete_module(&self, id: &ModuleId) -> Result<Module> {
        self.module(id).await?;

        let filter = [("module_id", id.as_str().to_string())];
        let dependents = self
            .call(
                "select permissions",
                self.backend.select(Table::Permissions, &filter),
            )
            .await?;
        if !dependents.is_empty() {
            return Err(Error::validation(format!(
                "module '{id}' is still referenced by {} permission grant(s)",
                dependents.len()
            )));
        }

        let row = self
            .call(
                "delete module",
                self.backend.delete(Table::Modules, id.as_str()),
            )
            .await?;
        info!("Deleted module '{id}'");
        Self::decode(row)
    }

    // --- User types --------------------------------------------------------

    pub async fn user_types(&self) -> Result<Vec<UserType>> {
        let rows = self
            .call(
                "select user types",
                self.backend.select(Table::UserTypes, &[]),
            )
            .await?;
        Self::decode_all(rows)
    }

    pub async fn user_type(&self, id: &str) -> Result<UserType> {
        let filter = [("id", id.to_string())];
        let rows = self
            .call(
                "select user type",
                self.backend.select(Table::UserTypes, &filter),
            )
            .await?;
        rows.into_iter()
            .next()
            .map(Self::decode)
            .transpose()?
            .ok_or_else(|| Error::not_found("user type", id))
    }

    pub async fn create_user_type(&self, name: &str) -> Result<UserType> {
        Self::require("user type name", name)?;
        let user_type = UserType {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        let row = self
            .call(
                "insert user type",
                self.backend
                    .insert(Table::UserTypes, Self::encode(&user_type)?),
            )
            .await?;
        info!("Created user type '{}'", user_type.name);
        Self::decode(row)
    }

    pub async fn update_user_type(&self, user_type: &UserType) -> Result<UserType> {
        Self::require("user type name", &user_type.name)?;
        self.user_type(&user_type.id).await?;
        let row = self
            .call(
                "update user type",
                self.backend
                    .update(Table::UserTypes, &user_type.id, Self::encode(user_type)?),
            )
            .await?;
        Self::decode(row)
    }

    /// Delete a user type. Rejected while users or permission grants still
    /// reference it.
    pub async fn delete_user_type(&self, id: &str) -> Result<UserType> {
        self.user_type(id).await?;

        let filter = [("user_type_id", id.to_string())];
        let users = self
            .call("select users", self.backend.select(Table::Users, &filter))
            .await?;
        if !users.is_empty() {
            return Err(Error::validation(format!(
                "user type is still assigned to {} user(s)",
                users.len()
            )));
        }
        let grants = self
            .call(
                "select permissions",
                self.backend.select(Table::Permissions, &filter),
            )
            .await?;
        if !grants.is_empty() {
            return Err(Error::validation(format!(
                "user type is still referenced by {} permission grant(s)",
                grants.len()
            )));
        }

        let row = self
            .call(
                "delete user type",
                self.backend.delete(Table::UserTypes, id),
            )
            .await?;
        info!("Deleted user type '{id}'");
        Self::decode(row)
    }

    // --- Users -------------------------------------------------------------

    pub async fn users(&self) -> Result<Vec<User>> {
        let rows = self
            .call("select users", self.backend.select(Table::Users, &[]))
            .await?;
        Self::decode_all(rows)
    }

    pub async fn user(&self, id: &str) -> Result<User> {
        let filter = [("id", id.to_string())];
        let rows = self
            .call("select user", self.backend.select(Table::Users, &filter))
            .await?;
        rows.into_iter()
            .next()
            .map(Self::decode)
            .transpose()?
            .ok_or_else(|| Error::not_found("user", id))
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let filter = [("email", email.to_string())];
        let rows = self
            .call("select user", self.backend.select(Table::Users, &filter))
            .await?;
        rows.into_iter().next().map(Self::decode).transpose()
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        Self::require("full name", &new_user.full_name)?;
        Self::require("username", &new_user.username)?;
        Self::require("email", &new_user.email)?;
        Self::require("password", new_user.password.expose_secret())?;

        // Referenced role must exist.
        self.user_type(&new_user.user_type_id).await?;

        if self.user_by_email(&new_user.email).await?.is_some() {
            return Err(Error::validation(format!(
                "a user with email '{}' already exists",
                new_user.email
            )));
        }

        let password_hash = bcrypt::hash(new_user.password.expose_secret(), self.bcrypt_cost)
            .map_err(|e| Error::validation(format!("unable to hash credential: {e}")))?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name: new_user.full_name,
            username: new_user.username,
            email: new_user.email,
            user_type_id: new_user.user_type_id,
            password_hash,
        };
        let row = self
            .call(
                "insert user",
                self.backend.insert(Table::Users, Self::encode(&user)?),
            )
            .await?;
        info!("Created user '{}'", user.username);
        Self::decode(row)
    }

    pub async fn update_user(&self, user: &User) -> Result<User> {
        Self::require("full name", &user.full_name)?;
        Self::require("username", &user.username)?;
        Self::require("email", &user.email)?;
        self.user(&user.id).await?;
        self.user_type(&user.user_type_id).await?;
        let row = self
            .call(
                "update user",
                self.backend
                    .update(Table::Users, &user.id, Self::encode(user)?),
            )
            .await?;
        Self::decode(row)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User> {
        self.user(id).await?;
        let row = self
            .call("delete user", self.backend.delete(Table::Users, id))
            .await?;
        info!("Deleted user '{id}'");
        Self::decode(row)
    }

    // --- Permissions -------------------------------------------------------

    pub async fn permissions(&self) -> Result<Vec<Permission>> {
        let rows = self
            .call(
                "select permissions",
                self.backend.select(Table::Permissions, &[]),
            )
            .await?;
        Self::decode_all(rows)
    }

    pub async fn permissions_for_user_type(&self, user_type_id: &str) -> Result<Vec<Permission>> {
        let filter = [("user_type_id", user_type_id.to_string())];
        let rows = self
            .call(
                "select permissions",
                self.backend.select(Table::Permissions, &filter),
            )
            .await?;
        Self::decode_all(rows)
    }

    /// Write the grant for a (user type, module) pair. The pair is unique:
    /// an existing row is updated in place, otherwise a fresh row is
    /// inserted. Ids assigned by earlier inserts are never assumed stable.
    pub async fn upsert_permission(
        &self,
        user_type_id: &str,
        module_id: &ModuleId,
        caps: Capabilities,
    ) -> Result<Permission> {
        if !caps.is_consistent() {
            return Err(Error::validation(
                "capability set grants writes without access",
            ));
        }
        self.user_type(user_type_id).await?;
        self.module(module_id).await?;

        let filter = [
            ("user_type_id", user_type_id.to_string()),
            ("module_id", module_id.as_str().to_string()),
        ];
        let existing = self
            .call(
                "select permissions",
                self.backend.select(Table::Permissions, &filter),
            )
            .await?;

        let permission = match existing.into_iter().next() {
            Some(row) => {
                let mut permission: Permission = Self::decode(row)?;
                permission.caps = caps;
                let updated = self
                    .call(
                        "update permission",
                        self.backend.update(
                            Table::Permissions,
                            &permission.id.clone(),
                            Self::encode(&permission)?,
                        ),
                    )
                    .await?;
                Self::decode::<Permission>(updated)?
            }
            None => {
                let permission = Permission {
                    id: Uuid::new_v4().to_string(),
                    user_type_id: user_type_id.to_string(),
                    module_id: module_id.clone(),
                    caps,
                };
                let inserted = self
                    .call(
                        "insert permission",
                        self.backend
                            .insert(Table::Permissions, Self::encode(&permission)?),
                    )
                    .await?;
                Self::decode::<Permission>(inserted)?
            }
        };

        debug!(
            "Stored grant for user type '{}' on module '{}'",
            user_type_id, module_id
        );
        Ok(permission)
    }

    pub async fn delete_permission(&self, id: &str) -> Result<Permission> {
        let filter = [("id", id.to_string())];
        let rows = self
            .call(
                "select permission",
                self.backend.select(Table::Permissions, &filter),
            )
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found("permission", id));
        }
        let row = self
            .call(
                "delete permission",
                self.backend.delete(Table::Permissions, id),
            )
            .await?;
        Self::decode(row)
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
