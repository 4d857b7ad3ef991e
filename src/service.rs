use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{debug, error, warn};

use crate::{
    config::AuthConfig,
    error::{BoxError, CredentialError, PasswordError, TokenError},
    password::PasswordHasher,
    repository::{LinkRepository, UserRepository},
    token::{TokenIssuer, TokenVerifier},
    types::{Credentials, Email, Link, LinkId, NewLink, NewUser, Token, UnsavedUser, User, UserId},
    validation::{validate_new_link, validate_new_user},
};

/// Account creation, login and request authentication.
///
/// Holds no mutable state: the repository handle, the hasher and the token
/// keys are fixed at construction, so clones can be shared freely between
/// request handlers.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self::with_clock(users, config, Arc::new(DefaultClock))
    }

    pub fn with_clock(
        users: Arc<dyn UserRepository>,
        config: &AuthConfig,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(config.hash_cost),
            issuer: TokenIssuer::new(config, clock.clone()),
            verifier: TokenVerifier::new(config, clock),
        }
    }

    /// Validate the input, hash the password and persist the user. The
    /// returned user only ever carries the hash.
    pub async fn create_user(&self, input: NewUser) -> Result<User, CredentialError> {
        validate_new_user(&input)?;

        let hasher = self.hasher;
        let plaintext = input.password;
        let password = run_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| {
                error!(error = %e, "failed to hash password");
                CredentialError::internal(e)
            })?;

        let user = self
            .users
            .create(UnsavedUser {
                username: input.username,
                email: input.email,
                password,
            })
            .await
            .map_err(|e| {
                error!(error = %e, "failed to persist user");
                CredentialError::internal(e)
            })?;

        debug!(user_id = %user.id.0, "created user");
        Ok(user)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<Token, CredentialError> {
        // An unknown email is reported as a bad request rather than "not
        // found", so the response does not say which field was wrong.
        let user = self
            .users
            .get_by_email(&credentials.email)
            .await
            .map_err(|_| {
                warn!("login attempted for unknown email");
                CredentialError::BadRequest
            })?;

        let hasher = self.hasher;
        let hash = user.password.clone();
        let plaintext = credentials.password;
        let matches = run_blocking(move || hasher.verify(&hash, &plaintext))
            .await
            .map_err(|e| {
                error!(user_id = %user.id.0, error = %e, "stored password hash is unreadable");
                CredentialError::internal(e)
            })?;

        if !matches {
            warn!(user_id = %user.id.0, "login failed: wrong password");
            return Err(CredentialError::PermissionDenied { source: None });
        }

        let token = self.issuer.issue(&user.id).map_err(|e| {
            error!(error = %e, "failed to sign token");
            CredentialError::internal(e)
        })?;

        debug!(user_id = %user.id.0, "issued session token");
        Ok(token)
    }

    /// Verify a session token and return the user it was issued to.
    ///
    /// A token that cannot be decoded at all is reported as an internal
    /// error. Every other rejection (foreign algorithm, bad signature, wrong
    /// issuer or audience, expiry) is a permission error.
    pub fn authenticate(&self, token: &str) -> Result<UserId, CredentialError> {
        match self.verifier.verify(token) {
            Ok(claims) => Ok(UserId(claims.sub)),
            Err(e @ (TokenError::Malformed { .. } | TokenError::Signing { .. } | TokenError::Clock)) => {
                warn!(error = %e, "token could not be processed");
                Err(CredentialError::internal(e))
            }
            Err(e) => {
                warn!(error = %e, "token rejected");
                Err(CredentialError::PermissionDenied { source: Some(e) })
            }
        }
    }

    pub async fn get_by_id(&self, id: &UserId) -> Result<User, CredentialError> {
        self.users
            .get_by_id(id)
            .await
            .map_err(CredentialError::not_found)
    }

    pub async fn get_by_email(&self, email: &Email) -> Result<User, CredentialError> {
        self.users
            .get_by_email(email)
            .await
            .map_err(CredentialError::not_found)
    }

    pub async fn exists(&self, id: &UserId) -> bool {
        self.get_by_id(id).await.is_ok()
    }
}

/// Argon2 is deliberately slow, so hashing and verifying run on the blocking
/// pool instead of an async worker.
async fn run_blocking<T>(
    work: impl FnOnce() -> Result<T, PasswordError> + Send + 'static,
) -> Result<T, BoxError>
where
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

/// Bookmarked links: validation in front of the repository.
#[derive(Clone)]
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
}

impl LinkService {
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self { links }
    }

    pub async fn create(&self, link: NewLink) -> Result<Link, CredentialError> {
        validate_new_link(&link)?;

        let link = self.links.create(link).await.map_err(|e| {
            error!(error = %e, "failed to persist link");
            CredentialError::internal(e)
        })?;

        debug!(link_id = %link.id.0, "created link");
        Ok(link)
    }

    pub async fn get_by_id(&self, id: &LinkId) -> Result<Link, CredentialError> {
        self.links
            .get_by_id(id)
            .await
            .map_err(CredentialError::not_found)
    }
}
