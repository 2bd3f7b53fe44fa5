use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use serde_json::json;
use tracing::info;

use geopost_store::{Query, SearchIndex};
use geopost_types::models::User;

use crate::error::ApiError;

pub const USER_INDEX: &str = "user";

/// Credential store over the `user` index. The document id is the username.
///
/// Uniqueness is a read-then-write check with no lock around it: two signups
/// racing on the same name can both pass the check, and the later write wins.
#[derive(Clone)]
pub struct UserStore {
    index: Arc<dyn SearchIndex>,
}

impl UserStore {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Index settings for the `user` index; usernames match exactly.
    pub fn index_mapping() -> serde_json::Value {
        json!({
            "mappings": {
                "properties": {
                    "username": { "type": "keyword" }
                }
            }
        })
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let hits = self
            .index
            .search(USER_INDEX, &Query::term("username", username))
            .await
            .map_err(ApiError::upstream("Failed to read from search index"))?;

        Ok(hits
            .decode::<User>()
            .into_iter()
            .find(|u| u.username == username))
    }

    /// Store a new account, hashing `user.password` first. Visible to reads on return.
    pub async fn create(&self, mut user: User) -> Result<(), ApiError> {
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(ApiError::Conflict);
        }

        user.password = hash_password(&user.password)?;

        let body = serde_json::to_value(&user).map_err(|_| ApiError::Internal("Failed to encode user"))?;
        self.index
            .index_document(USER_INDEX, &user.username, &body)
            .await
            .map_err(ApiError::upstream("Failed to save to search index"))?;

        info!("User is added: {}", user.username);
        Ok(())
    }

    /// Succeeds only for an existing username with the password given at signup.
    pub async fn verify(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !password_matches(&user.password, password) {
            return Err(ApiError::Unauthorized);
        }

        info!("Login as {}", username);
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::Internal("Failed to hash password"))
}

fn password_matches(stored: &str, candidate: &str) -> bool {
    // Unparsable stored hashes never match.
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use geopost_store::MemoryIndex;

    use super::*;

    fn user(name: &str, password: &str) -> User {
        User {
            username: name.into(),
            password: password.into(),
            age: Some(30),
            gender: None,
        }
    }

    async fn store() -> UserStore {
        let index = Arc::new(MemoryIndex::new());
        index
            .create_index(USER_INDEX, &UserStore::index_mapping())
            .await
            .unwrap();
        UserStore::new(index)
    }

    #[tokio::test]
    async fn create_then_find_stores_hash_not_plaintext() {
        let users = store().await;
        users.create(user("alice", "hunter2")).await.unwrap();

        let found = users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.age, Some(30));
        assert_ne!(found.password, "hunter2");
        assert!(found.password.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn find_missing_user_on_fresh_index_is_an_upstream_error() {
        // The index is created at startup; reading before then is a store failure.
        let users = UserStore::new(Arc::new(MemoryIndex::new()));
        let err = users.find_by_username("nobody").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream { .. }));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_and_keeps_first() {
        let users = store().await;
        users.create(user("bob", "first")).await.unwrap();

        let err = users.create(user("bob", "second")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict));

        users.verify("bob", "first").await.unwrap();
        assert!(matches!(
            users.verify("bob", "second").await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password_and_unknown_user() {
        let users = store().await;
        users.create(user("carol", "secret")).await.unwrap();

        users.verify("carol", "secret").await.unwrap();
        assert!(matches!(users.verify("carol", "Secret").await, Err(ApiError::Unauthorized)));
        assert!(matches!(users.verify("dave", "secret").await, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!password_matches("plaintext", "plaintext"));
    }
}
