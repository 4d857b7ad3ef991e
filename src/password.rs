use rand::{rngs::OsRng, RngCore};

use crate::{
    error::PasswordError,
    types::{HashedPassword, PlaintextPassword},
};

const SALT_LEN: usize = 16;

/// Work factor for password hashing. Raising either value makes every hash
/// (and every login) proportionally slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory per hash, in KiB.
    pub mem_cost_kib: u32,
    /// Number of passes over the memory.
    pub time_cost: u32,
}

impl HashCost {
    /// Checks the values against argon2's lower limits, so a bad cost is
    /// caught when it is configured rather than on the first hash.
    pub fn new(mem_cost_kib: u32, time_cost: u32) -> Result<Self, PasswordError> {
        let lanes = argon2::Config::default().lanes;
        if time_cost < 1 {
            return Err(argon2::Error::TimeTooSmall.into());
        }
        if mem_cost_kib < 8 * lanes {
            return Err(argon2::Error::MemoryTooLittle.into());
        }
        Ok(Self {
            mem_cost_kib,
            time_cost,
        })
    }
}

impl Default for HashCost {
    fn default() -> Self {
        let config = argon2::Config::default();
        Self {
            mem_cost_kib: config.mem_cost,
            time_cost: config.time_cost,
        }
    }
}

/// Salted Argon2 password hashing. Hashes are stored in the PHC string format,
/// so parameters and salt travel with each hash and old hashes keep verifying
/// after the cost is changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    cost: HashCost,
}

impl PasswordHasher {
    pub fn new(cost: HashCost) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> HashCost {
        self.cost
    }

    pub fn hash(&self, password: &PlaintextPassword) -> Result<HashedPassword, PasswordError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut salt)?;

        let config = argon2::Config {
            mem_cost: self.cost.mem_cost_kib,
            time_cost: self.cost.time_cost,
            ..argon2::Config::default()
        };

        let encoded = argon2::hash_encoded(password.0.as_bytes(), &salt, &config)?;

        Ok(HashedPassword(encoded))
    }

    /// Returns `Ok(false)` on a mismatch. Only a corrupt or unparseable hash is
    /// an error.
    pub fn verify(
        &self,
        hash: &HashedPassword,
        password: &PlaintextPassword,
    ) -> Result<bool, PasswordError> {
        Ok(argon2::verify_encoded(&hash.0, password.0.as_bytes())?)
    }
}
