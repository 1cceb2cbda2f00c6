use serde::{Deserialize, Serialize};

use crate::domain::TourId;

pub const TOURS_ROUTE: &str = "/api/tours";
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Multipart field names accepted by `POST /api/tours`.
pub mod form_fields {
    pub const NAME: &str = "name";
    pub const IMAGES: &str = "images";
    pub const HOTSPOTS: &str = "hotspots";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourCreated {
    pub id: TourId,
    pub name: String,
    pub image_count: usize,
    pub hotspot_count: usize,
    pub message: String,
}
