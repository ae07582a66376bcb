//! Identity use-cases: registration, credential checks, session subject
//! lookup.
//!
//! Credentials are hashed with Argon2id and carried as PHC strings. Login
//! failures collapse into one "Invalid credentials" rejection so the response
//! never reveals which of email or password was wrong; that rejection stays a
//! 400, reserving 401 for missing sessions.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, Error, User, UserId, UserValidationError};

/// Minimum accepted password length, matching the registration contract.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Registration input as received from the edge.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

/// Identity service over the user repository port.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
}

fn map_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => duplicate_email_error(),
    }
}

fn duplicate_email_error() -> Error {
    Error::invalid_request("A user with this email already exists.")
        .with_details(json!({ "field": "email", "code": "unique" }))
}

fn email_field_error(error: &UserValidationError) -> Error {
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": "email", "code": "invalid" }))
}

fn invalid_credentials() -> Error {
    Error::invalid_request("Invalid credentials")
}

impl IdentityService {
    /// Create the service over a repository port.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new account and return it.
    ///
    /// # Errors
    /// Invalid email, short password, and duplicate email all surface as
    /// field-scoped validation errors.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, Error> {
        let email = EmailAddress::new(&request.email).map_err(|err| email_field_error(&err))?;
        if request.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(Error::invalid_request(format!(
                "Password must be at least {PASSWORD_MIN_LEN} characters."
            ))
            .with_details(json!({ "field": "password", "code": "min_length" })));
        }
        let name = request
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        let password_hash = hash_password(&request.password)?;

        let user = User::new(email, name, password_hash, Utc::now());
        self.users
            .insert(&user)
            .await
            .map_err(map_persistence_error)?;
        Ok(user)
    }

    /// Check credentials and return the matching active account.
    ///
    /// The email is normalized (trimmed, lowercased) before lookup. Unknown
    /// address, inactive account, and hash mismatch are indistinguishable to
    /// the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let email = EmailAddress::new(email).map_err(|_| invalid_credentials())?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_persistence_error)?
            .filter(|user| user.is_active)
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&user.password_hash, password) {
            debug!(user = %user.id, "credential mismatch");
            return Err(invalid_credentials());
        }
        Ok(user)
    }

    /// Resolve the session subject, rejecting vanished or deactivated
    /// accounts.
    pub async fn current_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .filter(|user| user.is_active)
            .ok_or_else(|| Error::unauthorized("Unauthorized"))
    }
}

fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

fn verify_password(stored: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubUserRepository {
        users: Mutex<Vec<User>>,
        fail_with: Mutex<Option<UserPersistenceError>>,
    }

    impl StubUserRepository {
        fn seeded(user: User) -> Self {
            Self {
                users: Mutex::new(vec![user]),
                fail_with: Mutex::new(None),
            }
        }

        fn fail_next(&self, error: UserPersistenceError) {
            *self.fail_with.lock().expect("lock") = Some(error);
        }

        fn take_failure(&self) -> Option<UserPersistenceError> {
            self.fail_with.lock().expect("lock").take()
        }
    }

    #[async_trait]
    impl UserRepository for StubUserRepository {
        async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
            if let Some(error) = self.take_failure() {
                return Err(error);
            }
            let mut users = self.users.lock().expect("lock");
            if users.iter().any(|existing| existing.email == user.email) {
                return Err(UserPersistenceError::duplicate_email());
            }
            users.push(user.clone());
            Ok(())
        }

        async fn find_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Option<User>, UserPersistenceError> {
            if let Some(error) = self.take_failure() {
                return Err(error);
            }
            Ok(self
                .users
                .lock()
                .expect("lock")
                .iter()
                .find(|user| user.email == *email)
                .cloned())
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
            Ok(self
                .users
                .lock()
                .expect("lock")
                .iter()
                .find(|user| user.id == *id)
                .cloned())
        }
    }

    fn service() -> (Arc<StubUserRepository>, IdentityService) {
        let repo = Arc::new(StubUserRepository::default());
        (repo.clone(), IdentityService::new(repo))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_owned(),
            name: Some("Ada".to_owned()),
            password: "correct horse".to_owned(),
        }
    }

    #[tokio::test]
    async fn register_hashes_and_stores_the_password() {
        let (_, identity) = service();
        let user = identity
            .register(register_request("Ada@Example.com"))
            .await
            .expect("registration succeeds");
        assert_eq!(user.email.as_ref(), "ada@example.com");
        assert!(user.password_hash.starts_with("$argon2"));
        assert_ne!(user.password_hash, "correct horse");
    }

    #[tokio::test]
    async fn register_rejects_short_passwords() {
        let (_, identity) = service();
        let mut request = register_request("a@b.co");
        request.password = "short".to_owned();
        let err = identity.register(request).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(err.message().contains('8'));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (_, identity) = service();
        identity
            .register(register_request("a@b.co"))
            .await
            .expect("first registration");
        let err = identity
            .register(register_request("A@B.CO"))
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d["field"].as_str()),
            Some("email")
        );
    }

    #[tokio::test]
    async fn login_normalizes_email_and_verifies_hash() {
        let (_, identity) = service();
        identity
            .register(register_request("ada@example.com"))
            .await
            .expect("registration");

        let user = identity
            .login("  ADA@example.COM ", "correct horse")
            .await
            .expect("login succeeds");
        assert_eq!(user.email.as_ref(), "ada@example.com");

        let err = identity
            .login("ada@example.com", "wrong password")
            .await
            .expect_err("mismatch rejected");
        assert_eq!(err.message(), "Invalid credentials");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn login_rejects_inactive_accounts() {
        let (repo, identity) = service();
        identity
            .register(register_request("ada@example.com"))
            .await
            .expect("registration");
        repo.users.lock().expect("lock")[0].is_active = false;

        let err = identity
            .login("ada@example.com", "correct horse")
            .await
            .expect_err("inactive rejected");
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn current_user_rejects_unknown_subjects() {
        let (_, identity) = service();
        let err = identity
            .current_user(&UserId::random())
            .await
            .expect_err("unknown subject");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn connection_failures_map_to_service_unavailable() {
        let user = User::new(
            EmailAddress::new("a@b.co").expect("valid"),
            None,
            "$argon2id$fake".to_owned(),
            Utc::now(),
        );
        let repo = Arc::new(StubUserRepository::seeded(user));
        repo.fail_next(UserPersistenceError::connection("pool exhausted"));
        let identity = IdentityService::new(repo);
        let err = identity
            .login("a@b.co", "whatever")
            .await
            .expect_err("propagated");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
