use serde::{Deserialize, Serialize};

/// Actions that can be granted on a module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Access,
    Create,
    Edit,
    Delete,
}

impl Action {
    /// All actions in display order.
    pub fn all() -> Vec<Action> {
        vec![Action::Access, Action::Create, Action::Edit, Action::Delete]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Access => "access",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }

    /// Parse from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Action> {
        match s.to_lowercase().as_str() {
            "access" => Some(Action::Access),
            "create" => Some(Action::Create),
            "edit" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// The capability flags of one (user type, module) grant.
///
/// Invariant: `create | edit | delete` implies `access`. Every mutation goes
/// through [`Capabilities::apply`], which maintains the invariant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capabilities {
    pub access: bool,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
}

impl Capabilities {
    /// No grants at all; the fail-closed default.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn full() -> Self {
        Self {
            access: true,
            create: true,
            edit: true,
            delete: true,
        }
    }

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::Access => self.access,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }

    /// Set a single flag, keeping the grant set consistent:
    /// revoking `access` clears every flag, granting any write turns
    /// `access` on as well.
    #[must_use]
    pub fn apply(self, action: Action, value: bool) -> Capabilities {
        match (action, value) {
            (Action::Access, false) => Capabilities::none(),
            (Action::Access, true) => Capabilities {
                access: true,
                ..self
            },
            (action, value) => {
                let mut next = self;
                match action {
                    Action::Create => next.create = value,
                    Action::Edit => next.edit = value,
                    Action::Delete => next.delete = value,
                    Action::Access => unreachable!("handled above"),
                }
                if value {
                    next.access = true;
                }
                next
            }
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.access || !(self.create || self.edit || self.delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip() {
        for action in Action::all() {
            assert_eq!(Action::from_str(action.as_str()), Some(action));
        }
        assert_eq!(Action::from_str("EDIT"), Some(Action::Edit));
        assert_eq!(Action::from_str("manage"), None);
    }

    #[test]
    fn test_revoking_access_clears_everything() {
        let caps = Capabilities {
            access: true,
            create: false,
            edit: true,
            delete: true,
        };
        assert_eq!(caps.apply(Action::Access, false), Capabilities::none());
    }

    #[test]
    fn test_granting_write_forces_access() {
        let caps = Capabilities::none().apply(Action::Create, true);
        assert!(caps.access);
        assert!(caps.create);
        assert!(!caps.edit);

        let caps = Capabilities::none().apply(Action::Delete, true);
        assert!(caps.access);
        assert!(caps.delete);
    }

    #[test]
    fn test_plain_updates_touch_only_the_target_flag() {
        let caps = Capabilities::full().apply(Action::Edit, false);
        assert!(caps.access && caps.create && caps.delete);
        assert!(!caps.edit);

        let caps = Capabilities::none().apply(Action::Access, true);
        assert_eq!(
            caps,
            Capabilities {
                access: true,
                ..Capabilities::none()
            }
        );
    }

    #[test]
    fn test_apply_keeps_the_invariant_for_any_single_edit() {
        // Every starting state times every single-field update.
        for bits in 0..16u8 {
            let start = Capabilities {
                access: bits & 1 != 0,
                create: bits & 2 != 0,
                edit: bits & 4 != 0,
                delete: bits & 8 != 0,
            };
            for action in Action::all() {
                for value in [false, true] {
                    assert!(
                        start.apply(action, value).is_consistent(),
                        "inconsistent after {start:?} + {action:?}={value}"
                    );
                }
            }
        }
    }
}
