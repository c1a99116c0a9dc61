use crate::database::MongoDB;
use crate::models::User;
use crate::utils::error::AppError;
use mongodb::bson::{doc, oid::ObjectId};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Upload limits are fixed in code; only store, port and secret come from
/// the environment.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
pub const UPLOAD_DIR: &str = "uploads";

/// Any image/* subtype is accepted; everything else is rejected before the
/// body is read.
pub fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// `avatar-<millis>-<random><ext>`. Millis plus a v4 UUID keep concurrent
/// uploads from ever colliding; the client's filename only contributes its
/// extension.
pub fn unique_avatar_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    format!(
        "avatar-{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        ext
    )
}

pub async fn write_avatar(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf, AppError> {
    let path = dir.join(filename);

    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store avatar: {}", e)))?;

    Ok(path)
}

/// Persists the avatar bytes and points the user's profile at the new
/// file. Returns the public path clients can GET.
pub async fn store_avatar(
    db: &MongoDB,
    user_id: &str,
    original_filename: Option<&str>,
    data: &[u8],
) -> Result<String, AppError> {
    let object_id = ObjectId::parse_str(user_id)
        .map_err(|_| AppError::Validation("Invalid user id".to_string()))?;

    let collection = db.collection::<User>("users");

    // The identity must still exist before anything touches disk
    collection
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let filename = unique_avatar_name(original_filename);
    write_avatar(Path::new(UPLOAD_DIR), &filename, data).await?;

    let public_path = format!("/uploads/{}", filename);

    collection
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "profilePicture": &public_path } },
        )
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    log::info!("🖼️ Avatar stored for user {}: {}", user_id, public_path);

    Ok(public_path)
}
