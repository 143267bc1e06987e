use serde::{Deserialize, Serialize};

use crate::utils::slugify::slugify;

/// Identity of an access-controlled feature area.
///
/// The four administration modules are first-class tags; modules created at
/// runtime are identified by a slug derived from their display name, so
/// comparisons never happen on free-form strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleId {
    Users,
    UserTypes,
    Modules,
    Permissions,
    Custom(String),
}

impl ModuleId {
    /// The administration modules every installation ships with.
    pub fn builtin() -> Vec<ModuleId> {
        vec![
            ModuleId::Users,
            ModuleId::UserTypes,
            ModuleId::Modules,
            ModuleId::Permissions,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModuleId::Users => "users",
            ModuleId::UserTypes => "user-types",
            ModuleId::Modules => "modules",
            ModuleId::Permissions => "permissions",
            ModuleId::Custom(slug) => slug,
        }
    }

    /// Parse an identity tag from its slug form.
    pub fn from_slug(slug: &str) -> ModuleId {
        match slug {
            "users" => ModuleId::Users,
            "user-types" => ModuleId::UserTypes,
            "modules" => ModuleId::Modules,
            "permissions" => ModuleId::Permissions,
            other => ModuleId::Custom(other.to_string()),
        }
    }

    /// Derive the identity tag for a module from its display name.
    pub fn from_name(name: &str) -> ModuleId {
        ModuleId::from_slug(&slugify(name))
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.as_str().to_string()
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        ModuleId::from_slug(&s)
    }
}
