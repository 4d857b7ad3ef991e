use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct LinkId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Username(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Email(pub String);

/// A password as typed by the user. Only ever accepted as input: it cannot be
/// serialized and its `Debug` output is redacted.
#[derive(Clone, Deserialize)]
#[repr(transparent)]
pub struct PlaintextPassword(pub String);

impl fmt::Debug for PlaintextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextPassword([redacted])")
    }
}

/// Encoded output of [`crate::PasswordHasher::hash`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[repr(transparent)]
pub struct HashedPassword(pub String);

/// Account creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub password: PlaintextPassword,
}

/// A validated user whose password has already been hashed, ready to be
/// persisted. The repository assigns the identifier.
#[derive(Debug, Clone)]
pub struct UnsavedUser {
    pub username: Username,
    pub email: Email,
    pub password: HashedPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub password: HashedPassword,
}

impl User {
    pub(crate) fn from_unsaved(id: UserId, user: UnsavedUser) -> Self {
        Self {
            id,
            username: user.username,
            email: user.email,
            password: user.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: Email,
    pub password: PlaintextPassword,
}

/// A signed session token in compact serialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Token {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    /// Expiry in milliseconds since the unix epoch.
    pub exp: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLink {
    pub title: String,
    pub href: String,
    pub user: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub href: String,
    pub user: UserId,
}

impl Link {
    pub(crate) fn from_new(id: LinkId, link: NewLink) -> Self {
        Self {
            id,
            title: link.title,
            href: link.href,
            user: link.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_password_debug_is_redacted() {
        let password = PlaintextPassword("hunter22hunter22".into());
        let rendered = format!("{password:?}");

        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn claims_serialize_with_registered_names() {
        let claims = Claims {
            iss: "anchorly.com".into(),
            sub: "abc".into(),
            aud: "abc".into(),
            exp: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["iss"], "anchorly.com");
        assert_eq!(value["sub"], "abc");
        assert_eq!(value["aud"], "abc");
        assert_eq!(value["exp"], 1_700_000_000_000u64);
    }
}
