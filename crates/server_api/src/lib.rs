use std::sync::Arc;

use navigation::LinkPolicy;
use shared::{
    domain::{Tour, TourId},
    error::{ApiError, ErrorCode},
    protocol::TourCreated,
};
use storage::{DuplicateTourName, ImageRecord, ImageStore, Storage, StoredTour};
use tracing::{error, info, warn};

pub mod submission;

pub use submission::{ImageUpload, TourSubmission};

use submission::ValidatedImage;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub images: Arc<dyn ImageStore>,
    pub link_policy: LinkPolicy,
}

/// Validates, uploads and persists a tour. Either every image is stored and
/// the tour row committed, or nothing remains.
pub async fn create_tour(
    ctx: &ApiContext,
    submission: TourSubmission,
) -> Result<TourCreated, ApiError> {
    let tour = submission.validate(ctx.link_policy)?;

    if ctx
        .storage
        .tour_name_exists(&tour.name)
        .await
        .map_err(internal)?
    {
        return Err(duplicate_name(&tour.name));
    }

    let records = upload_images(ctx, &tour.images).await?;
    let tour_id = match ctx
        .storage
        .create_tour(&tour.name, &records, &tour.hotspots)
        .await
    {
        Ok(tour_id) => tour_id,
        Err(err) => {
            discard_uploads(ctx, &records).await;
            if let Some(duplicate) = err.downcast_ref::<DuplicateTourName>() {
                return Err(duplicate_name(&duplicate.0));
            }
            return Err(internal(err));
        }
    };

    let hotspot_count = tour.hotspot_count();
    info!(
        tour_id = tour_id.0,
        name = %tour.name,
        images = records.len(),
        hotspots = hotspot_count,
        "tour created"
    );
    Ok(TourCreated {
        id: tour_id,
        name: tour.name,
        image_count: records.len(),
        hotspot_count,
        message: "Tour created successfully!".to_string(),
    })
}

pub async fn list_tours(ctx: &ApiContext) -> Result<Vec<Tour>, ApiError> {
    let tours = ctx.storage.list_tours().await.map_err(internal)?;
    Ok(tours.into_iter().map(StoredTour::into_tour).collect())
}

pub async fn get_tour(ctx: &ApiContext, tour_id: TourId) -> Result<Tour, ApiError> {
    ctx.storage
        .load_tour(tour_id)
        .await
        .map_err(internal)?
        .map(StoredTour::into_tour)
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "tour not found"))
}

async fn upload_images(
    ctx: &ApiContext,
    images: &[ValidatedImage],
) -> Result<Vec<ImageRecord>, ApiError> {
    let mut records = Vec::with_capacity(images.len());
    for image in images {
        match ctx
            .images
            .put(&image.name, &image.media_type, &image.bytes)
            .await
        {
            Ok(object) => records.push(ImageRecord {
                name: image.name.clone(),
                storage_key: object.key,
                url: object.url,
                size_bytes: image.bytes.len() as u64,
                media_type: image.media_type.clone(),
            }),
            Err(err) => {
                error!(
                    image = %image.name,
                    error = %format!("{err:#}"),
                    "image upload failed; discarding tour"
                );
                discard_uploads(ctx, &records).await;
                return Err(ApiError::new(
                    ErrorCode::Upload,
                    format!("failed to store image '{}': {err}", image.name),
                ));
            }
        }
    }
    Ok(records)
}

async fn discard_uploads(ctx: &ApiContext, records: &[ImageRecord]) {
    for record in records {
        if let Err(err) = ctx.images.remove(&record.storage_key).await {
            warn!(key = %record.storage_key, error = %err, "failed to remove orphaned image");
        }
    }
}

fn duplicate_name(name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::DuplicateName,
        format!("a tour named '{name}' already exists"),
    )
}

fn internal(err: impl std::fmt::Display) -> ApiError {
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
