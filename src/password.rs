//! Password hashing and comparison.

/// bcrypt cost factor for new password hashes.
pub const HASH_COST: u32 = 12;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plaintext password with bcrypt.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, HASH_COST)
}

/// Compare a plaintext password against a stored hash.
///
/// Returns false for a mismatch and for an empty or malformed stored hash;
/// comparison never errors out to the caller.
pub fn compare_password(plain: &str, hash: &str) -> bool {
    if hash.is_empty() {
        return false;
    }
    bcrypt::verify(plain, hash).unwrap_or(false)
}
