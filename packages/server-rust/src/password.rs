//! Password hashing and the registration strength policy.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Minimum password length accepted at registration.
pub const MIN_LENGTH: usize = 8;

/// Reason attached to the `password` field when the policy rejects one.
pub const STRENGTH_REQUIREMENTS: &str = "must be at least 8 characters long and contain a \
     lowercase letter, an uppercase letter, a digit, and a special character";

const SPECIAL: &str = "!@#$%^&*()_+{}[]:;<>,.?~\\|-";

/// Checks the registration strength policy: minimum length plus at least
/// one lowercase letter, uppercase letter, digit, and special character.
#[must_use]
pub fn is_strong(password: &str) -> bool {
    if password.chars().count() < MIN_LENGTH {
        return false;
    }
    let mut has_lower = false;
    let mut has_upper = false;
    let mut has_digit = false;
    let mut has_special = false;
    for c in password.chars() {
        if c.is_lowercase() {
            has_lower = true;
        } else if c.is_uppercase() {
            has_upper = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if SPECIAL.contains(c) {
            has_special = true;
        }
    }
    has_lower && has_upper && has_digit && has_special
}

fn salt() -> SaltString {
    use rand::Rng;
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes).expect("16-byte salt always encodes")
}

/// Hashes a password with Argon2 and a fresh random salt.
///
/// # Errors
///
/// Propagates the underlying hasher error (does not happen with the
/// default parameters).
pub fn hash(password: &str) -> Result<String, argon2::password_hash::Error> {
    Argon2::default()
        .hash_password(password.as_bytes(), &salt())
        .map(|h| h.to_string())
}

/// Verifies a password against a stored hash. An undecodable hash counts
/// as a mismatch rather than an error.
#[must_use]
pub fn verify(hashword: &str, password: &str) -> bool {
    PasswordHash::new(hashword)
        .ok()
        .as_ref()
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
