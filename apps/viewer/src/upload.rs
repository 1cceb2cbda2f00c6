use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::TourDraft;
use shared::domain::Hotspot;
use tracing::warn;

/// Builds an upload draft from image files on disk. Each image is named
/// after its file name; `hotspots_file` uses the same JSON shape as the
/// upload form, image name to hotspot list.
pub async fn build_draft(
    name: &str,
    image_paths: &[PathBuf],
    hotspots_file: Option<&Path>,
) -> anyhow::Result<TourDraft> {
    let mut draft = TourDraft::new(name);

    for path in image_paths {
        let file_name = path
            .file_name()
            .and_then(|file_name| file_name.to_str())
            .with_context(|| format!("'{}' has no usable file name", path.display()))?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image '{}'", path.display()))?;
        draft.add_image(file_name, media_type, bytes)?;
    }

    if let Some(file) = hotspots_file {
        let raw = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read hotspots file '{}'", file.display()))?;
        let groups: BTreeMap<String, Vec<Hotspot>> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid hotspots file '{}'", file.display()))?;
        for (source, hotspots) in groups {
            for hotspot in hotspots {
                draft
                    .add_hotspot(&source, hotspot)
                    .with_context(|| format!("hotspots file '{}'", file.display()))?;
            }
        }
    }

    for link in draft.dangling_links() {
        warn!(%link, "hotspot target is not part of this upload");
    }
    Ok(draft)
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
