use std::error::Error as StdError;

use warp::reject::Reject;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A field that failed validation. Only the first failing field of an input is
/// ever reported.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username is invalid")]
    Username,
    #[error("email is invalid")]
    Email,
    #[error("password is invalid")]
    Password,
    #[error("title is invalid")]
    Title,
    #[error("href is invalid")]
    Href,
    #[error("user is required")]
    User,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Username => "username",
            ValidationError::Email => "email",
            ValidationError::Password => "password",
            ValidationError::Title => "title",
            ValidationError::Href => "href",
            ValidationError::User => "user",
        }
    }
}

/// Errors surfaced by the credential and link services. The underlying cause
/// is kept as the error source for logging but never rendered in `Display`.
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("bad request")]
    BadRequest,
    #[error("permission denied")]
    PermissionDenied {
        #[source]
        source: Option<TokenError>,
    },
    #[error("object not found")]
    ObjectNotFound {
        #[source]
        source: Option<BoxError>,
    },
    #[error("internal server error")]
    Internal {
        #[source]
        source: BoxError,
    },
}

impl CredentialError {
    pub(crate) fn internal(source: impl Into<BoxError>) -> Self {
        CredentialError::Internal {
            source: source.into(),
        }
    }

    pub(crate) fn not_found(source: impl Into<BoxError>) -> Self {
        CredentialError::ObjectNotFound {
            source: Some(source.into()),
        }
    }
}

impl Reject for CredentialError {}

/// Failures while issuing or verifying a session token.
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("token could not be decoded")]
    Malformed {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("token signed with unexpected algorithm {0:?}")]
    AlgorithmRejected(jsonwebtoken::Algorithm),
    #[error("token rejected")]
    Invalid {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("token audience does not match its subject")]
    AudienceMismatch,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token")]
    Signing {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("system clock is before the unix epoch")]
    Clock,
}

/// Failures while hashing or checking a password.
#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("failed to generate salt")]
    Salt {
        #[from]
        source: rand::Error,
    },
    #[error("password hash error")]
    Hash {
        #[from]
        source: argon2::Error,
    },
}

/// Opaque failure reported by a repository implementation.
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("a user with that email already exists")]
    DuplicateEmail,
    #[error("error during database operation")]
    Database {
        #[from]
        source: BoxError,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} must be set to a non-empty value")]
    MissingSecret(&'static str),
    #[error("failed to load settings")]
    Load {
        #[from]
        source: config::ConfigError,
    },
    #[error("environment variable {name} is invalid")]
    Invalid {
        name: &'static str,
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn internal_error_hides_cause_in_display_but_keeps_source() {
        let err = CredentialError::internal(RepositoryError::DuplicateEmail);

        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(
            err.source().map(|s| s.to_string()).as_deref(),
            Some("a user with that email already exists")
        );
    }

    #[test]
    fn validation_errors_name_their_field() {
        let err: CredentialError = ValidationError::Email.into();

        assert_eq!(err.to_string(), "email is invalid");
        assert_eq!(ValidationError::Email.field(), "email");
    }
}
