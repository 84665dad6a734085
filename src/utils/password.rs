use crate::utils::error::AppError;

/// Hashes a plaintext password with bcrypt (salted, one-way).
///
/// bcrypt is CPU bound, so the work runs on the blocking pool instead of
/// stalling the actix worker.
pub async fn hash_password(plaintext: &str, cost: u32) -> Result<String, AppError> {
    let plaintext = plaintext.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
        .await
        .map_err(|e| AppError::PasswordHash(format!("Task join error: {}", e)))?
        .map_err(AppError::from)
}
