use std::io::Write;

use navigation::SceneRenderer;
use shared::domain::{Hotspot, Image};
use tracing::debug;

/// Presents scenes as plain text on any writer.
pub struct TextRenderer<W: Write> {
    pub(crate) out: W,
    pub(crate) loaded: Option<String>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, loaded: None }
    }
}

impl<W: Write> SceneRenderer for TextRenderer<W> {
    fn load_scene(&mut self, image: &Image, hotspots: &[Hotspot]) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "== {} ({}, {} bytes)",
            image.name, image.media_type, image.size
        )?;
        writeln!(self.out, "   {}", image.url)?;
        if hotspots.is_empty() {
            writeln!(self.out, "   no hotspots")?;
        }
        for (index, hotspot) in hotspots.iter().enumerate() {
            writeln!(self.out, "   {}", describe_hotspot(index, hotspot))?;
        }
        self.out.flush()?;
        self.loaded = Some(image.name.clone());
        Ok(())
    }

    fn unload_scene(&mut self) {
        let Some(name) = self.loaded.take() else {
            return;
        };
        if let Err(error) = writeln!(self.out, "-- leaving {name}") {
            debug!(%error, "failed to write scene transition");
        }
    }
}

pub fn describe_hotspot(index: usize, hotspot: &Hotspot) -> String {
    let label = if hotspot.description.is_empty() {
        hotspot.room_id.as_str()
    } else {
        hotspot.description.as_str()
    };
    format!(
        "[{index}] {label} -> {} (pitch {:.1}, yaw {:.1})",
        hotspot.target_image, hotspot.pitch, hotspot.yaw
    )
}

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod tests;
