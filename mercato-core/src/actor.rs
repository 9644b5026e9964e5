use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};
use mercato_shared::Slug;

/// The five marketplace roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Seller,
    Moderator,
    Customer,
    Delivery,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Seller => "seller",
            Role::Moderator => "moderator",
            Role::Customer => "customer",
            Role::Delivery => "delivery",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(raw: &str) -> CoreResult<Self> {
        match raw {
            "admin" => Ok(Role::Admin),
            "seller" => Ok(Role::Seller),
            "moderator" => Ok(Role::Moderator),
            "customer" => Ok(Role::Customer),
            "delivery" => Ok(Role::Delivery),
            other => Err(CoreError::Validation(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved caller of a core operation.
///
/// The transport layer authenticates once, builds an `Actor`, and passes it
/// into every service call; the core never consults ambient "current user"
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub slug: Slug,
    pub role: Role,
}

impl Actor {
    pub fn new(slug: Slug, role: Role) -> Self {
        Self { slug, role }
    }

    pub fn require_role(&self, role: Role, action: &str) -> CoreResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "a {} may not {action}",
                self.role
            )))
        }
    }

    pub fn require_any(&self, roles: &[Role], action: &str) -> CoreResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "a {} may not {action}",
                self.role
            )))
        }
    }
}
