use async_trait::async_trait;
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::auth::User;

/// Password for the seeded demo account; hashed at seed time so the
/// stored hash always verifies.
const DEMO_PASSWORD: &str = "password123";

pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Storage seam for user accounts. The in-memory implementation stands in
/// for a database; swapping in a persistent store requires no handler changes.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<User>;

    async fn find_by_id(&self, id: &str) -> Option<User>;

    async fn email_or_username_taken(&self, email: &str, username: &str) -> bool;

    async fn insert(&self, new_user: NewUser) -> User;

    async fn record_login(&self, id: &str);

    async fn update_profile(
        &self,
        id: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Option<User>;
}

pub struct MemoryUserStore {
    inner: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    /// Starts with the demo account so the API is usable out of the box.
    pub fn seeded() -> Self {
        let demo_hash = hash(DEMO_PASSWORD, DEFAULT_COST)
            .expect("bcrypt hashing of the demo password cannot fail");
        let demo = User {
            id: "1".to_string(),
            email: "demo@chatlingo.com".to_string(),
            username: "demo_user".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            password_hash: demo_hash,
            is_active: true,
            is_verified: true,
            subscription_tier: "free".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        };

        Self {
            inner: RwLock::new(vec![demo]),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        let users = self.inner.read().await;
        users.iter().find(|u| u.email == email).cloned()
    }

    async fn find_by_id(&self, id: &str) -> Option<User> {
        let users = self.inner.read().await;
        users.iter().find(|u| u.id == id).cloned()
    }

    async fn email_or_username_taken(&self, email: &str, username: &str) -> bool {
        let users = self.inner.read().await;
        users
            .iter()
            .any(|u| u.email == email || u.username == username)
    }

    async fn insert(&self, new_user: NewUser) -> User {
        let mut users = self.inner.write().await;
        let user = User {
            id: (users.len() + 1).to_string(),
            email: new_user.email,
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            is_active: true,
            is_verified: false,
            subscription_tier: "free".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        };
        users.push(user.clone());
        user
    }

    async fn record_login(&self, id: &str) {
        let mut users = self.inner.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
        }
    }

    async fn update_profile(
        &self,
        id: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Option<User> {
        let mut users = self.inner.write().await;
        let user = users.iter_mut().find(|u| u.id == id)?;
        if let Some(first_name) = first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            user.last_name = last_name;
        }
        Some(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn seeded_store_contains_demo_user() {
        let store = MemoryUserStore::seeded();
        let demo = store.find_by_email("demo@chatlingo.com").await.unwrap();
        assert_eq!(demo.id, "1");
        assert!(demo.is_active);
    }

    #[tokio::test]
    async fn demo_password_verifies_against_seeded_hash() {
        let store = MemoryUserStore::seeded();
        let demo = store.find_by_email("demo@chatlingo.com").await.unwrap();
        assert!(bcrypt::verify(DEMO_PASSWORD, &demo.password_hash).unwrap());
        assert!(!bcrypt::verify("wrong password", &demo.password_hash).unwrap());
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryUserStore::seeded();
        let user = store.insert(new_user("a@example.com", "a")).await;
        assert_eq!(user.id, "2");
        assert!(!user.is_verified);
        assert_eq!(user.subscription_tier, "free");
    }

    #[tokio::test]
    async fn detects_duplicate_email_and_username() {
        let store = MemoryUserStore::seeded();
        assert!(
            store
                .email_or_username_taken("demo@chatlingo.com", "other")
                .await
        );
        assert!(store.email_or_username_taken("other@example.com", "demo_user").await);
        assert!(!store.email_or_username_taken("new@example.com", "new_user").await);
    }

    #[tokio::test]
    async fn update_profile_only_touches_provided_fields() {
        let store = MemoryUserStore::seeded();
        let updated = store
            .update_profile("1", Some("Updated".to_string()), None)
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Updated");
        assert_eq!(updated.last_name, "User");

        assert!(store.update_profile("99", None, None).await.is_none());
    }
}
