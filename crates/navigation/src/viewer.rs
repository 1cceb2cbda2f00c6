use shared::domain::{Hotspot, Image};
use tracing::{debug, warn};

use crate::graph::NavigationGraph;

/// The rendering side of a viewer. One instance is reused for every image:
/// the previous scene is always unloaded before the next one is loaded.
pub trait SceneRenderer {
    fn load_scene(&mut self, image: &Image, hotspots: &[Hotspot]) -> anyhow::Result<()>;
    fn unload_scene(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    CurrentImageChanged { from: String, to: String },
    Unchanged,
}

/// Owns a navigation graph and the single renderer presenting its current image.
pub struct Viewer<R: SceneRenderer> {
    graph: NavigationGraph,
    renderer: R,
    scene_loaded: bool,
}

impl<R: SceneRenderer> Viewer<R> {
    pub fn open(graph: NavigationGraph, mut renderer: R) -> anyhow::Result<Self> {
        let image = graph.current_image();
        renderer.load_scene(image, graph.hotspots_for(&image.name))?;
        Ok(Self {
            graph,
            renderer,
            scene_loaded: true,
        })
    }

    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn current_image(&self) -> &Image {
        self.graph.current_image()
    }

    pub fn current_hotspots(&self) -> &[Hotspot] {
        self.graph.hotspots_for(&self.graph.current_image().name)
    }

    /// Follows the `index`-th hotspot of the current image.
    ///
    /// A missing hotspot or target is logged and leaves the current scene up.
    pub fn click_hotspot(&mut self, index: usize) -> anyhow::Result<ViewerEvent> {
        let from = self.graph.current_image().name.clone();
        let Some(hotspot) = self.current_hotspots().get(index).cloned() else {
            warn!(image = %from, index, "no hotspot at index");
            return Ok(ViewerEvent::Unchanged);
        };

        if let Err(error) = self.graph.activate_hotspot(&hotspot) {
            warn!(
                image = %from,
                index,
                room_id = %hotspot.room_id,
                %error,
                "hotspot target not found; staying on current image"
            );
            return Ok(ViewerEvent::Unchanged);
        }
        self.present(from)
    }

    pub fn select_image(&mut self, name: &str) -> anyhow::Result<ViewerEvent> {
        let from = self.graph.current_image().name.clone();
        if let Err(error) = self.graph.select_image(name) {
            warn!(image = %from, %error, "image selection ignored");
            return Ok(ViewerEvent::Unchanged);
        }
        self.present(from)
    }

    /// Shows the graph's current image. If the renderer refuses it, the
    /// graph goes back to `from` and that scene is reloaded.
    fn present(&mut self, from: String) -> anyhow::Result<ViewerEvent> {
        let to = self.graph.current_image().name.clone();
        if to == from && self.scene_loaded {
            return Ok(ViewerEvent::Unchanged);
        }

        if self.scene_loaded {
            self.renderer.unload_scene();
            self.scene_loaded = false;
        }
        if let Err(error) = self.load_current_scene() {
            warn!(from = %from, to = %to, %error, "scene failed to load; restoring previous image");
            if self.graph.select_image(&from).is_ok() {
                if let Err(restore_error) = self.load_current_scene() {
                    warn!(image = %from, error = %restore_error, "previous scene could not be restored");
                }
            }
            return Err(error);
        }

        debug!(from = %from, to = %to, "current image changed");
        Ok(ViewerEvent::CurrentImageChanged { from, to })
    }

    fn load_current_scene(&mut self) -> anyhow::Result<()> {
        let image = self.graph.current_image();
        self.renderer
            .load_scene(image, self.graph.hotspots_for(&image.name))?;
        self.scene_loaded = true;
        Ok(())
    }
}

impl<R: SceneRenderer> Drop for Viewer<R> {
    fn drop(&mut self) {
        if self.scene_loaded {
            self.renderer.unload_scene();
        }
    }
}

#[cfg(test)]
#[path = "tests/viewer_tests.rs"]
mod tests;
