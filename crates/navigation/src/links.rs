use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::domain::Hotspot;
use thiserror::Error;

/// When hotspot targets are checked against the tour's images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// Dangling targets are accepted at creation and fail only when clicked.
    #[default]
    Lazy,
    /// Dangling targets reject the whole tour at creation.
    Strict,
}

#[derive(Debug, Error)]
#[error("unknown link policy '{0}', expected 'lazy' or 'strict'")]
pub struct UnknownLinkPolicy(String);

impl FromStr for LinkPolicy {
    type Err = UnknownLinkPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "strict" => Ok(Self::Strict),
            _ => Err(UnknownLinkPolicy(raw.to_string())),
        }
    }
}

impl fmt::Display for LinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lazy => f.write_str("lazy"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// A hotspot whose target names no image of its tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingLink {
    pub source_image: String,
    /// Position of the hotspot within its source image's list.
    pub index: usize,
    pub target_image: String,
}

impl fmt::Display for DanglingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hotspot #{} on '{}' targets missing image '{}'",
            self.index, self.source_image, self.target_image
        )
    }
}

pub fn find_dangling_links<'a, I, H>(image_names: I, hotspots_by_image: H) -> Vec<DanglingLink>
where
    I: IntoIterator<Item = &'a str>,
    H: IntoIterator<Item = (&'a str, &'a [Hotspot])>,
{
    let known: HashSet<&str> = image_names.into_iter().collect();
    let mut dangling = Vec::new();
    for (source, hotspots) in hotspots_by_image {
        for (index, hotspot) in hotspots.iter().enumerate() {
            if !known.contains(hotspot.target_image.as_str()) {
                dangling.push(DanglingLink {
                    source_image: source.to_string(),
                    index,
                    target_image: hotspot.target_image.clone(),
                });
            }
        }
    }
    dangling
}
