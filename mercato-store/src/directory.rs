use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use mercato_core::{CoreError, CoreResult, Role, UserDirectory, UserRecord};
use mercato_shared::Slug;

/// In-memory user directory standing in for the account service.
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Slug, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.slug.clone(), user);
    }

    pub async fn block(&self, slug: &Slug) -> CoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(slug)
            .ok_or_else(|| CoreError::not_found(format!("user {slug}")))?;
        user.is_blocked = true;
        Ok(())
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_slug(&self, slug: &Slug) -> CoreResult<UserRecord> {
        self.users
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("user {slug}")))
    }

    async fn find_by_role(&self, role: Role) -> Vec<UserRecord> {
        self.users
            .read()
            .await
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courier(slug: &str) -> UserRecord {
        UserRecord {
            slug: Slug::from_raw(slug),
            firstname: "Awa".to_string(),
            lastname: "Diop".to_string(),
            email: format!("{slug}@example.test"),
            role: Role::Delivery,
            is_blocked: false,
        }
    }

    #[tokio::test]
    async fn lookup_by_slug_and_role() {
        let directory = InMemoryUserDirectory::new();
        directory.insert(courier("usr-c1")).await;
        directory.insert(courier("usr-c2")).await;

        let found = directory.find_by_slug(&Slug::from_raw("usr-c1")).await.unwrap();
        assert_eq!(found.role, Role::Delivery);

        assert_eq!(directory.find_by_role(Role::Delivery).await.len(), 2);
        assert!(directory.find_by_role(Role::Moderator).await.is_empty());

        let missing = directory.find_by_slug(&Slug::from_raw("usr-x")).await;
        assert!(matches!(missing, Err(CoreError::NotFound(_))));
    }
}
