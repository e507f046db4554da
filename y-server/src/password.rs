use anyhow::{Context, Result};

/// Hash a plaintext password with bcrypt at the given cost
pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    bcrypt::hash(plain, cost).context("Failed to hash password")
}

/// Check a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be checked: {}", e);
            false
        }
    }
}

/// [`hash_password`] on tokio's blocking pool
pub async fn hash_password_task(plain: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain, cost))
        .await
        .context("Password hashing task panicked")?
}

/// [`verify_password`] on tokio's blocking pool
pub async fn verify_password_task(plain: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("Password check task panicked")
}
