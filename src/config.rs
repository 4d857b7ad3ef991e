use std::{fmt, net::SocketAddr, time::Duration};

use config::Environment;
use serde::Deserialize;

use crate::{error::ConfigError, password::HashCost};

/// Every setting is read from `ANCHORLY_*` environment variables.
pub const ENV_PREFIX: &str = "ANCHORLY";
pub const TOKEN_KEY_VAR: &str = "ANCHORLY_TOKEN_KEY";
pub const HASH_COST_VAR: &str = "ANCHORLY_HASH_*";

pub const DEFAULT_ISSUER: &str = "anchorly.com";
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3 * 60 * 60);
pub const DEFAULT_ADDR: &str = "127.0.0.1:4000";

/// Key for signing session tokens. Guaranteed non-empty.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret(TOKEN_KEY_VAR));
        }
        Ok(Self(secret))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([redacted])")
    }
}

/// Raw process settings as they appear in the environment, before any of
/// them are checked. `ANCHORLY_TOKEN_KEY` lands in `token_key`, and so on.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub token_key: Option<String>,
    pub token_issuer: Option<String>,
    pub token_lifetime_secs: Option<u64>,
    pub hash_time_cost: Option<u32>,
    pub hash_mem_cost_kib: Option<u32>,
    pub addr: Option<SocketAddr>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Values are left as strings by the source; numeric fields are parsed
    /// on deserialize so the secret is never reinterpreted.
    pub fn load(source: Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn auth(&self) -> Result<AuthConfig, ConfigError> {
        let secret = self
            .token_key
            .clone()
            .ok_or(ConfigError::MissingSecret(TOKEN_KEY_VAR))?;
        let mut config = AuthConfig::new(SigningSecret::new(secret)?);

        if let Some(issuer) = self.token_issuer.clone().filter(|s| !s.is_empty()) {
            config.issuer = issuer;
        }
        if let Some(secs) = self.token_lifetime_secs {
            config.token_lifetime = Duration::from_secs(secs);
        }
        if self.hash_time_cost.is_some() || self.hash_mem_cost_kib.is_some() {
            let default = HashCost::default();
            config.hash_cost = HashCost::new(
                self.hash_mem_cost_kib.unwrap_or(default.mem_cost_kib),
                self.hash_time_cost.unwrap_or(default.time_cost),
            )
            .map_err(|e| ConfigError::Invalid {
                name: HASH_COST_VAR,
                source: Box::new(e),
            })?;
        }

        Ok(config)
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            addr: self
                .addr
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 4000))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Written to, and required in, the `iss` claim of every token.
    pub issuer: String,
    /// How long a token stays valid after it is issued.
    /// If the secret changes, all outstanding tokens stop verifying.
    pub token_lifetime: Duration,
    pub signing_secret: SigningSecret,
    pub hash_cost: HashCost,
}

impl AuthConfig {
    /// Defaults for everything except the secret.
    pub fn new(signing_secret: SigningSecret) -> Self {
        Self {
            issuer: DEFAULT_ISSUER.into(),
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
            signing_secret,
            hash_cost: HashCost::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Settings::from_env()?.auth()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Settings::from_env()?.server())
    }
}
