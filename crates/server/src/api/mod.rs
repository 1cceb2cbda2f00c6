use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use server_api::{create_tour, get_tour, list_tours, ImageUpload, TourSubmission};
use shared::{
    domain::{Tour, TourId},
    error::{ApiError, ErrorCode},
    protocol::{form_fields, TourCreated},
};
use tracing::debug;

use crate::app_state::AppState;

pub(crate) type Rejection = (StatusCode, Json<ApiError>);

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::DuplicateName => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Upload => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn reject(err: ApiError) -> Rejection {
    (status_for(err.code), Json(err))
}

pub(crate) async fn http_list_tours(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tour>>, Rejection> {
    let tours = list_tours(&state.api).await.map_err(reject)?;
    Ok(Json(tours))
}

pub(crate) async fn http_get_tour(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Tour>, Rejection> {
    let tour_id = raw_id
        .trim()
        .parse::<i64>()
        .map_err(|_| reject(ApiError::validation(format!("invalid tour id '{raw_id}'"))))?;
    let tour = get_tour(&state.api, TourId(tour_id))
        .await
        .map_err(reject)?;
    Ok(Json(tour))
}

pub(crate) async fn http_create_tour(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<TourCreated>), Rejection> {
    let submission = read_submission(multipart, state.max_image_bytes).await?;
    let created = create_tour(&state.api, submission)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn read_submission(
    mut multipart: Multipart,
    max_image_bytes: usize,
) -> Result<TourSubmission, Rejection> {
    let mut submission = TourSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field_name.as_str() {
            form_fields::NAME => {
                submission.name = field.text().await.map_err(multipart_rejection)?;
            }
            form_fields::HOTSPOTS => {
                submission.hotspots = Some(field.text().await.map_err(multipart_rejection)?);
            }
            form_fields::IMAGES => {
                let name = field.file_name().unwrap_or_default().to_string();
                let media_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(multipart_rejection)?;
                if bytes.len() > max_image_bytes {
                    return Err((
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Json(ApiError::validation(format!(
                            "image '{name}' exceeds {max_image_bytes} bytes"
                        ))),
                    ));
                }
                submission.images.push(ImageUpload {
                    name,
                    media_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(submission)
}

fn multipart_rejection(err: MultipartError) -> Rejection {
    (
        err.status(),
        Json(ApiError::validation(format!(
            "invalid multipart body: {}",
            err.body_text()
        ))),
    )
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
