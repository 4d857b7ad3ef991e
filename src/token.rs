//! Stateless session tokens.
//!
//! Tokens are HMAC-signed JWTs in compact serialization. Nothing is stored
//! server side: a token is valid exactly when its signature checks out under
//! the process secret and its `exp` (epoch milliseconds) is still in the
//! future.

use std::{fmt, sync::Arc, time::Duration};

use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use mockable::Clock;

use crate::{
    config::AuthConfig,
    error::TokenError,
    types::{Claims, Token, UserId},
};

/// The only algorithms a token may be signed with. Anything else in the header
/// is rejected before the signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

fn now_millis(clock: &dyn Clock) -> Result<u64, TokenError> {
    u64::try_from(clock.utc().timestamp_millis()).map_err(|_| TokenError::Clock)
}

#[derive(Clone)]
pub struct TokenIssuer {
    issuer: String,
    lifetime: Duration,
    key: EncodingKey,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            issuer: config.issuer.clone(),
            lifetime: config.token_lifetime,
            key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            clock,
        }
    }

    pub fn issue(&self, subject: &UserId) -> Result<Token, TokenError> {
        let lifetime = u64::try_from(self.lifetime.as_millis()).unwrap_or(u64::MAX);
        let exp = now_millis(self.clock.as_ref())?.saturating_add(lifetime);

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.0.clone(),
            aud: subject.0.clone(),
            exp,
        };

        let value = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.key)
            .map_err(|source| TokenError::Signing { source })?;

        Ok(Token { value })
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    issuer: String,
    key: DecodingKey,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            issuer: config.issuer.clone(),
            key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            clock,
        }
    }

    /// Parse, check the algorithm, check signature and issuer, then expiry.
    /// Each step short-circuits.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|source| TokenError::Malformed { source })?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::AlgorithmRejected(header.alg));
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation())
            .map_err(classify)?
            .claims;

        if claims.aud != claims.sub {
            return Err(TokenError::AudienceMismatch);
        }

        // `exp` is in milliseconds, which the library would read as seconds.
        if now_millis(self.clock.as_ref())? >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);
        validation
    }
}

fn classify(source: jsonwebtoken::errors::Error) -> TokenError {
    match source.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Malformed { source },
        _ => TokenError::Invalid { source },
    }
}
