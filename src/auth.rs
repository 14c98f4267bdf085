//! Auth provider capability
//!
//! The review core only needs an opaque caller identity; how that identity
//! is established (password hashing, token formats) lives behind this
//! boundary. `StaticAuthProvider` is the in-memory implementation used by
//! the runtime's composition root - real deployments would swap in a
//! directory- or JWT-backed provider.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    InvalidToken(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::InvalidToken(token) => write!(f, "Invalid or expired token: {}", token),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Capability consumed by the ingestion path and protected queries
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify credentials and issue a bearer token
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, AuthError>;

    /// Resolve a bearer token to the caller's identity
    async fn authorize(&self, token: &str) -> Result<String, AuthError>;
}

/// In-memory users and random bearer tokens
pub struct StaticAuthProvider {
    users: HashMap<String, String>,
    tokens: Mutex<HashMap<String, String>>,
}

impl StaticAuthProvider {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self {
            users,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Parse `user:password,user:password` pairs (the AUTH_USERS env format)
    pub fn from_pairs(pairs: &str) -> Self {
        let users = pairs
            .split(',')
            .filter_map(|pair| {
                let (user, password) = pair.split_once(':')?;
                if user.is_empty() {
                    return None;
                }
                Some((user.trim().to_string(), password.trim().to_string()))
            })
            .collect();

        Self::new(users)
    }

    fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        (0..32)
            .map(|_| format!("{:x}", rng.gen_range(0..16)))
            .collect()
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, AuthError> {
        match self.users.get(&credentials.username) {
            Some(password) if *password == credentials.password => {
                let token = Self::generate_token();
                self.tokens
                    .lock()
                    .unwrap()
                    .insert(token.clone(), credentials.username.clone());
                Ok(token)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn authorize(&self, token: &str) -> Result<String, AuthError> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticAuthProvider {
        StaticAuthProvider::from_pairs("alice:secret,bob:hunter2")
    }

    #[tokio::test]
    async fn test_authenticate_then_authorize() {
        let auth = provider();

        let token = auth
            .authenticate(&Credentials {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        let identity = auth.authorize(&token).await.unwrap();
        assert_eq!(identity, "alice");
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let auth = provider();

        let result = auth
            .authenticate(&Credentials {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let auth = provider();
        let result = auth.authorize("deadbeef").await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_from_pairs_skips_malformed_entries() {
        let auth = StaticAuthProvider::from_pairs("alice:secret,garbage,:nopass");
        assert_eq!(auth.users.len(), 1);
        assert!(auth.users.contains_key("alice"));
    }
}
