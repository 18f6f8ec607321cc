//! Product image uploads.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use futures::TryStreamExt;
use uuid::Uuid;

use shopfront_shared::dto::UploadResponse;

use crate::middleware::auth::AuthUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const UPLOAD_ROUTE: &str = "/assets/uploads";
const FIELD_NAME: &str = "image";

/// A collision-free file name that keeps a sane extension.
///
/// The client's extension is kept when it is short and alphanumeric,
/// otherwise the image subtype (`png`, `jpeg`, ...) is used.
fn stored_file_name(original: Option<&str>, subtype: &str) -> String {
    let extension = original
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| {
            subtype
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        });

    let stem = format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    );
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid upload: {err}"))
}

/// POST /upload
pub async fn upload_image(
    state: web::Data<AppState>,
    caller: AuthUser,
    req: HttpRequest,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    caller.require_admin()?;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }

        let subtype = match field.content_type() {
            Some(mime) if mime.type_().as_str() == "image" => mime.subtype().as_str().to_string(),
            _ => return Err(AppError::BadRequest("Only image files are allowed".to_string())),
        };
        let original = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest(format!(
                    "File exceeds the {} MiB limit",
                    MAX_UPLOAD_BYTES / (1024 * 1024)
                )));
            }
            data.extend_from_slice(&chunk);
        }
        if data.is_empty() {
            return Err(AppError::BadRequest("No file uploaded".to_string()));
        }

        let file_name = stored_file_name(original.as_deref(), &subtype);
        let upload_dir = &state.config.upload_dir;
        tokio::fs::create_dir_all(upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("create upload dir: {e}")))?;
        tokio::fs::write(upload_dir.join(&file_name), &data)
            .await
            .map_err(|e| AppError::Internal(format!("write upload: {e}")))?;

        tracing::info!(file = %file_name, bytes = data.len(), "Image uploaded");

        let info = req.connection_info();
        let url = format!(
            "{}://{}{}/{}",
            info.scheme(),
            info.host(),
            UPLOAD_ROUTE,
            file_name
        );
        return Ok(HttpResponse::Ok().json(UploadResponse { url }));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}
