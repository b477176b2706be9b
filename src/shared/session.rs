/**
 * User Session
 *
 * Identity as handed over by the session provider. Roles are claims issued
 * by the backend; the client only reads them and never grants privileges on
 * its own.
 */
use crate::shared::favorites::UserId;
use serde::{Deserialize, Serialize};

/// Role claim attached to a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Offer management console access
    Admin,
    /// Any other claim the backend issues
    Other(String),
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Admin access comes only from the server-issued role claim
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }
}
