// src/gateway/permission.rs

/// The invoking actor, reduced to what the permission check needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub is_administrator: bool,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn administrator(mut self) -> Self {
        self.is_administrator = true;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

/// Administrators always pass; otherwise any role matching a privileged name
/// (case-insensitive) does.
pub fn is_admin_or_privileged<S: AsRef<str>>(identity: &Identity, privileged_roles: &[S]) -> bool {
    if identity.is_administrator {
        return true;
    }

    identity.roles.iter().any(|role| {
        privileged_roles
            .iter()
            .any(|allowed| role.trim().eq_ignore_ascii_case(allowed.as_ref().trim()))
    })
}
