use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, ResponseError};
use futures::StreamExt;

use crate::database::MongoDB;
use crate::services::auth_service::Claims;
use crate::services::upload_service::{self, MAX_AVATAR_BYTES};
use crate::utils::error::AppError;

/// POST /api/user/avatar - replace the caller's avatar with a multipart
/// image upload (single field named `avatar`)
pub async fn upload_avatar(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    mut payload: Multipart,
) -> HttpResponse {
    let user_id = &user.sub;
    log::info!("🖼️ POST /user/avatar - user: {}", user_id);

    let (filename, data) = match read_avatar_field(&mut payload).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            return AppError::Validation("avatar file is required".to_string()).error_response()
        }
        Err(e) => {
            log::warn!("❌ Avatar upload rejected for {}: {}", user_id, e);
            return e.error_response();
        }
    };

    match upload_service::store_avatar(&db, user_id, filename.as_deref(), &data).await {
        Ok(path) => {
            log::info!("✅ Avatar updated for user {}", user_id);
            HttpResponse::Ok().json(serde_json::json!({ "profilePicture": path }))
        }
        Err(e) => {
            log::warn!("❌ Avatar upload failed for {}: {}", user_id, e);
            e.error_response()
        }
    }
}

/// Pulls the first `avatar` field out of the multipart stream. The MIME
/// check runs before any body bytes are read, and the size cap is enforced
/// chunk by chunk so an oversized upload never sits fully in memory.
async fn read_avatar_field(
    payload: &mut Multipart,
) -> Result<Option<(Option<String>, Vec<u8>)>, AppError> {
    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {}", e)))?;

        if field.name() != "avatar" {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !upload_service::is_image(&content_type) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Only image uploads are accepted, got {}",
                content_type
            )));
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(|name| name.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;

            if data.len() + bytes.len() > MAX_AVATAR_BYTES {
                return Err(AppError::PayloadTooLarge(format!(
                    "Avatar exceeds the {} byte limit",
                    MAX_AVATAR_BYTES
                )));
            }
            data.extend_from_slice(&bytes);
        }

        return Ok(Some((filename, data)));
    }

    Ok(None)
}
