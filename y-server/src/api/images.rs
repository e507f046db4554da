use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::db::repositories::{ImageRepository, StoredImage};
use crate::middleware::AuthAccount;
use crate::state::AppState;

use super::{ApiError, ApiResult};

/// GET /api/images/:id - Raw image bytes with their stored type
pub async fn get_image(
    State(state): State<AppState>,
    AuthAccount(_): AuthAccount,
    Path(image_id): Path<i64>,
) -> ApiResult<Response> {
    let image = state
        .db
        .with_connection(|conn| -> ApiResult<Option<StoredImage>> {
            Ok(ImageRepository::new(conn).get(image_id)?)
        })?
        .ok_or_else(|| ApiError::NotFound("Image not found.".to_string()))?;

    Ok(([(header::CONTENT_TYPE, image.mimetype)], image.data).into_response())
}
