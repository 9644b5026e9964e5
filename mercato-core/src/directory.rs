use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{actor::Role, CoreResult};
use mercato_shared::Slug;

/// A user as the core sees one: identity, role, block flag. Account
/// management (registration, credentials, profiles) lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub slug: Slug,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: Role,
    pub is_blocked: bool,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Read-only lookup into the account service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_slug(&self, slug: &Slug) -> CoreResult<UserRecord>;

    async fn find_by_role(&self, role: Role) -> Vec<UserRecord>;
}
