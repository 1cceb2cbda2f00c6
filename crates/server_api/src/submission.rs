//! Intake of tour submissions.
//!
//! Upload forms send hotspots as loosely typed JSON: coordinates may arrive as
//! numbers or as the strings a text field produced. Everything is checked here
//! once and turned into canonical [`Hotspot`] records; nothing downstream
//! re-interprets the raw payload.

use std::collections::{BTreeMap, HashSet};

use navigation::{find_dangling_links, LinkPolicy};
use serde::Deserialize;
use shared::{domain::Hotspot, error::ApiError};
use tracing::warn;

pub const MAX_IMAGE_NAME_BYTES: usize = 180;

/// One uploaded file. `name` doubles as the image identity inside the tour.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct TourSubmission {
    pub name: String,
    pub images: Vec<ImageUpload>,
    /// JSON object mapping image names to hotspot lists.
    pub hotspots: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ValidatedTour {
    pub name: String,
    pub images: Vec<ValidatedImage>,
    pub hotspots: BTreeMap<String, Vec<Hotspot>>,
}

impl ValidatedTour {
    pub fn hotspot_count(&self) -> usize {
        self.hotspots.values().map(Vec::len).sum()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHotspot {
    pitch: Coordinate,
    yaw: Coordinate,
    #[serde(default)]
    room_id: String,
    #[serde(default)]
    description: String,
    target_image: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn resolve(&self, field: &str, source: &str, index: usize) -> Result<f64, ApiError> {
        let value = match self {
            Self::Number(value) => Some(*value),
            Self::Text(raw) if raw.trim().is_empty() => {
                return Err(ApiError::validation(format!(
                    "hotspot #{index} on '{source}' is missing {field}"
                )))
            }
            Self::Text(raw) => raw.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite()).ok_or_else(|| {
            ApiError::validation(format!(
                "hotspot #{index} on '{source}' has an invalid {field}"
            ))
        })
    }
}

impl TourSubmission {
    pub fn validate(self, policy: LinkPolicy) -> Result<ValidatedTour, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::validation("tour name is required"));
        }
        if self.images.is_empty() {
            return Err(ApiError::validation("at least one image is required"));
        }

        let mut seen = HashSet::with_capacity(self.images.len());
        let mut images = Vec::with_capacity(self.images.len());
        for image in self.images {
            let validated = validate_image(image)?;
            if !seen.insert(validated.name.clone()) {
                return Err(ApiError::validation(format!(
                    "image name '{}' is used more than once",
                    validated.name
                )));
            }
            images.push(validated);
        }

        let hotspots = parse_hotspots(self.hotspots.as_deref(), &seen)?;

        let dangling = find_dangling_links(
            images.iter().map(|image| image.name.as_str()),
            hotspots
                .iter()
                .map(|(source, list)| (source.as_str(), list.as_slice())),
        );
        if !dangling.is_empty() {
            match policy {
                LinkPolicy::Strict => {
                    let details: Vec<String> = dangling.iter().map(ToString::to_string).collect();
                    return Err(ApiError::validation(details.join("; ")));
                }
                LinkPolicy::Lazy => {
                    for link in &dangling {
                        warn!(tour = %name, %link, "accepting dangling hotspot link");
                    }
                }
            }
        }

        Ok(ValidatedTour {
            name,
            images,
            hotspots,
        })
    }
}

fn validate_image(image: ImageUpload) -> Result<ValidatedImage, ApiError> {
    let name = image.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("image name is required"));
    }
    if name.len() > MAX_IMAGE_NAME_BYTES {
        return Err(ApiError::validation(format!("image name '{name}' is too long")));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ApiError::validation("image name must not contain path separators"));
    }
    if image.bytes.is_empty() {
        return Err(ApiError::validation(format!("image '{name}' is empty")));
    }

    let media_type = image
        .media_type
        .map(|media_type| media_type.trim().to_ascii_lowercase())
        .filter(|media_type| !media_type.is_empty() && media_type != "application/octet-stream")
        .or_else(|| {
            mime_guess::from_path(&name)
                .first()
                .map(|mime| mime.essence_str().to_string())
        })
        .unwrap_or_default();
    if !media_type.starts_with("image/") {
        return Err(ApiError::validation(format!(
            "image '{name}' is not an image (media type '{media_type}')"
        )));
    }

    Ok(ValidatedImage {
        name,
        media_type,
        bytes: image.bytes,
    })
}

pub fn parse_hotspots(
    raw: Option<&str>,
    image_names: &HashSet<String>,
) -> Result<BTreeMap<String, Vec<Hotspot>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(BTreeMap::new());
    };

    let parsed: BTreeMap<String, Vec<RawHotspot>> = serde_json::from_str(raw).map_err(|err| {
        ApiError::validation(format!(
            "hotspots must map image names to hotspot lists: {err}"
        ))
    })?;

    let mut hotspots: BTreeMap<String, Vec<Hotspot>> = BTreeMap::new();
    for (source, list) in parsed {
        let source = source.trim().to_string();
        if !image_names.contains(&source) {
            return Err(ApiError::validation(format!(
                "hotspots reference unknown image '{source}'"
            )));
        }
        if list.is_empty() {
            continue;
        }

        let mut canonical = Vec::with_capacity(list.len());
        for (index, raw) in list.into_iter().enumerate() {
            let target_image = raw.target_image.trim().to_string();
            if target_image.is_empty() {
                return Err(ApiError::validation(format!(
                    "hotspot #{index} on '{source}' has no target image"
                )));
            }
            canonical.push(Hotspot {
                pitch: raw.pitch.resolve("pitch", &source, index)?,
                yaw: raw.yaw.resolve("yaw", &source, index)?,
                room_id: raw.room_id.trim().to_string(),
                description: raw.description.trim().to_string(),
                target_image,
            });
        }
        hotspots.entry(source).or_default().extend(canonical);
    }
    Ok(hotspots)
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
