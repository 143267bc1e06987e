use serde::{Deserialize, Serialize};

use crate::module_id::ModuleId;
use crate::permission::Capabilities;

/// A feature area of the application subject to access control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
}

/// A named role; the unit by which permissions are granted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserType {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub user_type_id: String,
    /// bcrypt hash of the credential, never the plaintext.
    #[serde(default)]
    pub password_hash: String,
}

impl User {
    /// Copy of the user with the credential hash stripped, for snapshots
    /// that leave the store (sessions, persisted blobs).
    pub fn without_credentials(&self) -> User {
        User {
            password_hash: String::new(),
            ..self.clone()
        }
    }
}

/// The capability grant of one (user type, module) pair.
///
/// At most one row exists per pair; inserting for an existing pair is an
/// update, never a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub id: String,
    pub user_type_id: String,
    pub module_id: ModuleId,
    #[serde(flatten)]
    pub caps: Capabilities,
}
