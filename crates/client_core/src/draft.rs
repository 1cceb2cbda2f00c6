//! A tour being authored before upload.
//!
//! Images are keyed by name and hotspots are grouped under the name of the
//! image they sit on, the same shape the server persists. Renaming an image
//! therefore has to move its group and retarget every hotspot pointing at it.

use std::collections::BTreeMap;

use navigation::{find_dangling_links, DanglingLink};
use shared::domain::Hotspot;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("tour name is required")]
    MissingName,
    #[error("a tour needs at least one image")]
    NoImages,
    #[error("image name is required")]
    EmptyImageName,
    #[error("image '{0}' is already part of the draft")]
    DuplicateImage(String),
    #[error("no image named '{0}' in the draft")]
    UnknownImage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftImage {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct TourDraft {
    name: String,
    images: Vec<DraftImage>,
    hotspots: BTreeMap<String, Vec<Hotspot>>,
}

impl TourDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn images(&self) -> &[DraftImage] {
        &self.images
    }

    pub fn hotspots(&self) -> &BTreeMap<String, Vec<Hotspot>> {
        &self.hotspots
    }

    pub fn hotspots_for(&self, image_name: &str) -> &[Hotspot] {
        self.hotspots
            .get(image_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn add_image(
        &mut self,
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), DraftError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DraftError::EmptyImageName);
        }
        if self.contains_image(&name) {
            return Err(DraftError::DuplicateImage(name));
        }
        self.images.push(DraftImage {
            name,
            media_type: media_type.into(),
            bytes,
        });
        Ok(())
    }

    /// Removes an image together with the hotspots placed on it. Hotspots on
    /// other images that targeted it are kept and become dangling.
    pub fn remove_image(&mut self, name: &str) -> Result<DraftImage, DraftError> {
        let position = self
            .images
            .iter()
            .position(|image| image.name == name)
            .ok_or_else(|| DraftError::UnknownImage(name.to_string()))?;
        self.hotspots.remove(name);
        Ok(self.images.remove(position))
    }

    pub fn rename_image(&mut self, from: &str, to: impl Into<String>) -> Result<(), DraftError> {
        let to = to.into().trim().to_string();
        if to.is_empty() {
            return Err(DraftError::EmptyImageName);
        }
        if from == to {
            return Ok(());
        }
        if self.contains_image(&to) {
            return Err(DraftError::DuplicateImage(to));
        }
        let image = self
            .images
            .iter_mut()
            .find(|image| image.name == from)
            .ok_or_else(|| DraftError::UnknownImage(from.to_string()))?;
        image.name = to.clone();

        if let Some(group) = self.hotspots.remove(from) {
            self.hotspots.insert(to.clone(), group);
        }
        for hotspot in self.hotspots.values_mut().flatten() {
            if hotspot.target_image == from {
                hotspot.target_image = to.clone();
            }
        }
        Ok(())
    }

    /// Places a hotspot on `source`. The target is not checked here; see
    /// [`TourDraft::dangling_links`].
    pub fn add_hotspot(&mut self, source: &str, hotspot: Hotspot) -> Result<(), DraftError> {
        if !self.contains_image(source) {
            return Err(DraftError::UnknownImage(source.to_string()));
        }
        self.hotspots
            .entry(source.to_string())
            .or_default()
            .push(hotspot);
        Ok(())
    }

    pub fn remove_hotspot(&mut self, source: &str, index: usize) -> Option<Hotspot> {
        let group = self.hotspots.get_mut(source)?;
        if index >= group.len() {
            return None;
        }
        let removed = group.remove(index);
        if group.is_empty() {
            self.hotspots.remove(source);
        }
        Some(removed)
    }

    pub fn dangling_links(&self) -> Vec<DanglingLink> {
        find_dangling_links(
            self.images.iter().map(|image| image.name.as_str()),
            self.hotspots
                .iter()
                .map(|(source, list)| (source.as_str(), list.as_slice())),
        )
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.images.is_empty() {
            return Err(DraftError::NoImages);
        }
        if let Some(source) = self.hotspots.keys().find(|source| !self.contains_image(source)) {
            return Err(DraftError::UnknownImage(source.clone()));
        }
        Ok(())
    }

    /// The `hotspots` form field: image name to hotspot list.
    pub fn hotspots_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.hotspots)
    }

    fn contains_image(&self, name: &str) -> bool {
        self.images.iter().any(|image| image.name == name)
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
