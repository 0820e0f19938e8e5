//! Operator password hashing built around Argon2id.
//!
//! Hashes are PHC strings, so the salt and parameters travel with the hash and
//! verification keeps working if the parameters below are raised later.

use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

/// Argon2id cost parameters: 19 MiB, 3 passes, 1 lane.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 1;

fn argon2() -> Result<Argon2<'static>, password_hash::Error> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash `plain` with a fresh random salt and return the PHC string.
pub fn hash_password(plain: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(argon2()?.hash_password(plain.as_bytes(), &salt)?.to_string())
}

/// Check `plain` against a stored PHC hash.
///
/// An unparseable stored hash verifies as `false`.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    match argon2() {
        Ok(argon2) => argon2.verify_password(plain.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
