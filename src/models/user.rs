use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Provider,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Provider => "PROVIDER",
            Role::User => "USER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "PROVIDER" => Some(Role::Provider),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

/// A signed-in identity. Credentials live with the identity provider, never here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub username: String,
    pub name: String,
    pub role: Role,
    /// Only meaningful for providers: the trade whose bookings they may act on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this account may act on work in `category`.
    pub fn serves(&self, category: Category) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Provider => self.category == Some(category),
            Role::User => false,
        }
    }
}
