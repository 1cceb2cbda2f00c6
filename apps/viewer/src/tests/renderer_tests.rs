use super::*;

fn image(name: &str) -> Image {
    Image {
        name: name.to_string(),
        url: format!("/uploads/{name}"),
        size: 1024,
        media_type: "image/jpeg".to_string(),
    }
}

fn hotspot(description: &str, room_id: &str, target: &str) -> Hotspot {
    Hotspot {
        pitch: -2.3,
        yaw: 135.0,
        room_id: room_id.to_string(),
        description: description.to_string(),
        target_image: target.to_string(),
    }
}

fn written(renderer: &TextRenderer<Vec<u8>>) -> String {
    String::from_utf8(renderer.out.clone()).expect("utf8")
}

#[test]
fn load_scene_prints_image_and_numbered_hotspots() {
    let mut renderer = TextRenderer::new(Vec::new());
    renderer
        .load_scene(
            &image("hall.jpg"),
            &[
                hotspot("To the kitchen", "k1", "kitchen.jpg"),
                hotspot("", "stairs", "landing.jpg"),
            ],
        )
        .expect("load");

    let text = written(&renderer);
    assert!(text.contains("== hall.jpg (image/jpeg, 1024 bytes)"));
    assert!(text.contains("/uploads/hall.jpg"));
    assert!(text.contains("[0] To the kitchen -> kitchen.jpg (pitch -2.3, yaw 135.0)"));
    assert!(text.contains("[1] stairs -> landing.jpg"));
    assert_eq!(renderer.loaded.as_deref(), Some("hall.jpg"));
}

#[test]
fn unload_only_reports_a_loaded_scene() {
    let mut renderer = TextRenderer::new(Vec::new());
    renderer.unload_scene();
    assert!(written(&renderer).is_empty());

    renderer.load_scene(&image("hall.jpg"), &[]).expect("load");
    renderer.unload_scene();
    renderer.unload_scene();

    let text = written(&renderer);
    assert!(text.contains("no hotspots"));
    assert_eq!(text.matches("-- leaving hall.jpg").count(), 1);
    assert!(renderer.loaded.is_none());
}
