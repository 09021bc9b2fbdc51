//! User service
//!
//! Registration and API-key identity. The plain API key is generated once,
//! handed to the caller, and only its SHA-256 hash is stored.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::entities::{NewUser, User, UserId};
use crate::domain::ports::UserRepository;
use crate::domain::validation;
use crate::error::{AppError, DomainError, Violations};

/// Raw registration payload. Required fields arrive as `Option` so missing
/// values are reported as violations together with the field-level rules.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Service for managing users
pub struct UserService<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>) -> Self {
        Self { users }
    }

    /// Register a new user. Returns the user and the plain API key; the key
    /// cannot be recovered later.
    pub async fn register(&self, draft: UserDraft) -> Result<(User, String), AppError> {
        let mut violations = Violations::new();
        match &draft.first_name {
            Some(first_name) => validation::check_name(&mut violations, "firstName", first_name),
            None => violations.push("firstName", "first name is required"),
        }
        match &draft.last_name {
            Some(last_name) => validation::check_name(&mut violations, "lastName", last_name),
            None => violations.push("lastName", "last name is required"),
        }
        match &draft.email {
            Some(email) => validation::check_email(&mut violations, "email", email),
            None => violations.push("email", "email is required"),
        }
        violations.into_result()?;

        let (Some(first_name), Some(last_name), Some(email)) =
            (draft.first_name, draft.last_name, draft.email)
        else {
            return Err(AppError::Internal(
                "validated registration draft was incomplete".to_string(),
            ));
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "user with email '{}' already exists",
                email
            ))));
        }

        let api_key = generate_api_key();
        let api_key_hash = hash_api_key(&api_key);

        let user = self
            .users
            .create(&NewUser {
                first_name,
                last_name,
                email,
                api_key_hash,
            })
            .await?;

        Ok((user, api_key))
    }

    pub async fn get(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }

    pub async fn find_by_api_key(&self, key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_api_key_hash(key_hash).await?)
    }

    /// Resolve the account that owns the presented plain API key.
    pub async fn authenticate(&self, api_key: &str) -> Result<Option<User>, AppError> {
        self.find_by_api_key(&hash_api_key(api_key)).await
    }

    /// Update the last seen timestamp
    pub async fn touch(&self, id: &UserId) -> Result<(), AppError> {
        Ok(self.users.update_last_seen(id).await?)
    }
}

/// Generate a random API key
pub fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("sk-{}", hex::encode(bytes))
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
