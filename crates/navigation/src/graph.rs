use std::collections::{HashMap, HashSet, VecDeque};

use shared::domain::{Hotspot, HotspotGroup, Image, Tour, TourId};

use crate::{
    error::NavigationError,
    links::{find_dangling_links, DanglingLink},
};

/// Directed graph over one tour's images, plus the "current image" pointer
/// used while the tour is being viewed.
#[derive(Debug, Clone)]
pub struct NavigationGraph {
    tour_id: TourId,
    tour_name: String,
    images: Vec<Image>,
    index: HashMap<String, usize>,
    hotspots: HashMap<String, Vec<Hotspot>>,
    current: usize,
}

impl NavigationGraph {
    pub fn load(tour: &Tour) -> Result<Self, NavigationError> {
        if tour.images.is_empty() {
            return Err(NavigationError::malformed(format!(
                "tour '{}' has no images",
                tour.name
            )));
        }

        let mut index = HashMap::with_capacity(tour.images.len());
        for (position, image) in tour.images.iter().enumerate() {
            if image.name.trim().is_empty() {
                return Err(NavigationError::malformed(format!(
                    "image at position {position} has no name"
                )));
            }
            if index.insert(image.name.clone(), position).is_some() {
                return Err(NavigationError::malformed(format!(
                    "image name '{}' appears more than once",
                    image.name
                )));
            }
        }

        let mut hotspots: HashMap<String, Vec<Hotspot>> = HashMap::new();
        for group in &tour.hotspots {
            let source = resolve_group_source(&tour.images, &index, group)?;
            hotspots
                .entry(source.to_string())
                .or_default()
                .extend(group.hotspots.iter().cloned());
        }

        Ok(Self {
            tour_id: tour.id,
            tour_name: tour.name.clone(),
            images: tour.images.clone(),
            index,
            hotspots,
            current: 0,
        })
    }

    /// Parses a tour document as served by `GET /api/tours/:id` and loads it.
    pub fn load_json(raw: &str) -> Result<Self, NavigationError> {
        let tour: Tour = serde_json::from_str(raw)
            .map_err(|err| NavigationError::malformed(err.to_string()))?;
        Self::load(&tour)
    }

    pub fn tour_id(&self) -> TourId {
        self.tour_id
    }

    pub fn tour_name(&self) -> &str {
        &self.tour_name
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn image(&self, name: &str) -> Option<&Image> {
        self.index.get(name).map(|&position| &self.images[position])
    }

    pub fn current_image(&self) -> &Image {
        &self.images[self.current]
    }

    /// Follows `hotspot` to its target. On a miss the current image is kept.
    pub fn activate_hotspot(&mut self, hotspot: &Hotspot) -> Result<&Image, NavigationError> {
        self.select_image(&hotspot.target_image)
    }

    pub fn select_image(&mut self, name: &str) -> Result<&Image, NavigationError> {
        let Some(&position) = self.index.get(name) else {
            return Err(NavigationError::TargetNotFound {
                target: name.to_string(),
            });
        };
        self.current = position;
        Ok(&self.images[position])
    }

    pub fn hotspots_for(&self, image_name: &str) -> &[Hotspot] {
        self.hotspots
            .get(image_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every hotspot with the image it is placed on, in tour image order.
    pub fn edges(&self) -> impl Iterator<Item = (&Image, &Hotspot)> {
        self.images.iter().flat_map(move |image| {
            self.hotspots_for(&image.name)
                .iter()
                .map(move |hotspot| (image, hotspot))
        })
    }

    pub fn dangling_links(&self) -> Vec<DanglingLink> {
        find_dangling_links(
            self.images.iter().map(|image| image.name.as_str()),
            self.images
                .iter()
                .map(|image| (image.name.as_str(), self.hotspots_for(&image.name))),
        )
    }

    /// Images no chain of valid hotspots leads to from the first image.
    pub fn unreachable_images(&self) -> Vec<&Image> {
        let mut seen = HashSet::from([0usize]);
        let mut queue = VecDeque::from([0usize]);
        while let Some(position) = queue.pop_front() {
            for hotspot in self.hotspots_for(&self.images[position].name) {
                if let Some(&next) = self.index.get(&hotspot.target_image) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        self.images
            .iter()
            .enumerate()
            .filter(|(position, _)| !seen.contains(position))
            .map(|(_, image)| image)
            .collect()
    }
}

fn resolve_group_source<'a>(
    images: &'a [Image],
    index: &HashMap<String, usize>,
    group: &HotspotGroup,
) -> Result<&'a str, NavigationError> {
    if let Some(name) = group.image_name.as_deref() {
        return index
            .get(name)
            .map(|&position| images[position].name.as_str())
            .ok_or_else(|| {
                NavigationError::malformed(format!("hotspots reference unknown image '{name}'"))
            });
    }

    if let Some(url) = group.image_url.as_deref() {
        return images
            .iter()
            .find(|image| image.url == url)
            .map(|image| image.name.as_str())
            .ok_or_else(|| {
                NavigationError::malformed(format!("hotspots reference unknown image url '{url}'"))
            });
    }

    Err(NavigationError::malformed("hotspot group names no image"))
}

#[cfg(test)]
#[path = "tests/graph_tests.rs"]
mod tests;
