use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(TourId);

/// A panorama belonging to exactly one tour. `name` is its identity within the tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub url: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub media_type: String,
}

/// A clickable point on a panorama that links to another image of the same tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub pitch: f64,
    pub yaw: f64,
    pub room_id: String,
    pub description: String,
    pub target_image: String,
}

/// Hotspots placed on one image.
///
/// `image_name` is the canonical key. Documents written before names were
/// persisted only carry `image_url`, which is matched against [`Image::url`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub hotspots: Vec<Hotspot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: TourId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub images: Vec<Image>,
    pub hotspots: Vec<HotspotGroup>,
}

impl Tour {
    pub fn hotspot_count(&self) -> usize {
        self.hotspots.iter().map(|group| group.hotspots.len()).sum()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
