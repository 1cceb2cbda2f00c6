use super::*;

fn hotspot(target: &str) -> Hotspot {
    Hotspot {
        pitch: -4.0,
        yaw: 90.0,
        room_id: format!("to-{target}"),
        description: String::new(),
        target_image: target.to_string(),
    }
}

fn two_room_draft() -> TourDraft {
    let mut draft = TourDraft::new("House");
    draft
        .add_image("hall.jpg", "image/jpeg", vec![1, 2, 3])
        .expect("hall");
    draft
        .add_image("kitchen.jpg", "image/jpeg", vec![4, 5, 6])
        .expect("kitchen");
    draft
        .add_hotspot("hall.jpg", hotspot("kitchen.jpg"))
        .expect("hall hotspot");
    draft
        .add_hotspot("kitchen.jpg", hotspot("hall.jpg"))
        .expect("kitchen hotspot");
    draft
}

#[test]
fn rejects_duplicate_and_blank_image_names() {
    let mut draft = two_room_draft();
    assert_eq!(
        draft.add_image("hall.jpg", "image/jpeg", vec![9]),
        Err(DraftError::DuplicateImage("hall.jpg".into()))
    );
    assert_eq!(
        draft.add_image("   ", "image/jpeg", vec![9]),
        Err(DraftError::EmptyImageName)
    );
    assert_eq!(draft.images().len(), 2);
}

#[test]
fn hotspot_source_must_be_a_draft_image() {
    let mut draft = two_room_draft();
    assert_eq!(
        draft.add_hotspot("attic.jpg", hotspot("hall.jpg")),
        Err(DraftError::UnknownImage("attic.jpg".into()))
    );
}

#[test]
fn hotspot_target_may_dangle_until_checked() {
    let mut draft = two_room_draft();
    draft
        .add_hotspot("hall.jpg", hotspot("garden.jpg"))
        .expect("dangling target is accepted");

    let dangling = draft.dangling_links();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].source_image, "hall.jpg");
    assert_eq!(dangling[0].index, 1);
    assert_eq!(dangling[0].target_image, "garden.jpg");
    assert!(draft.validate().is_ok());
}

#[test]
fn rename_moves_group_and_retargets_hotspots() {
    let mut draft = two_room_draft();
    draft
        .rename_image("kitchen.jpg", "galley.jpg")
        .expect("rename");

    assert!(draft.images().iter().any(|image| image.name == "galley.jpg"));
    assert!(draft.hotspots_for("kitchen.jpg").is_empty());
    assert_eq!(draft.hotspots_for("galley.jpg").len(), 1);
    assert_eq!(draft.hotspots_for("hall.jpg")[0].target_image, "galley.jpg");
    assert!(draft.dangling_links().is_empty());
}

#[test]
fn rename_refuses_taken_or_unknown_names() {
    let mut draft = two_room_draft();
    assert_eq!(
        draft.rename_image("kitchen.jpg", "hall.jpg"),
        Err(DraftError::DuplicateImage("hall.jpg".into()))
    );
    assert_eq!(
        draft.rename_image("attic.jpg", "loft.jpg"),
        Err(DraftError::UnknownImage("attic.jpg".into()))
    );
    assert_eq!(draft.hotspots_for("hall.jpg")[0].target_image, "kitchen.jpg");
}

#[test]
fn removing_an_image_drops_its_hotspots_and_leaves_links_dangling() {
    let mut draft = two_room_draft();
    let removed = draft.remove_image("kitchen.jpg").expect("remove");
    assert_eq!(removed.bytes, vec![4, 5, 6]);
    assert!(draft.hotspots_for("kitchen.jpg").is_empty());

    let dangling = draft.dangling_links();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].target_image, "kitchen.jpg");
}

#[test]
fn removing_the_last_hotspot_drops_the_group() {
    let mut draft = two_room_draft();
    let removed = draft.remove_hotspot("hall.jpg", 0).expect("hotspot");
    assert_eq!(removed.target_image, "kitchen.jpg");
    assert!(!draft.hotspots().contains_key("hall.jpg"));
    assert!(draft.remove_hotspot("hall.jpg", 0).is_none());
}

#[test]
fn validate_requires_name_and_images() {
    assert_eq!(TourDraft::new("  ").validate(), Err(DraftError::MissingName));
    assert_eq!(TourDraft::new("Empty").validate(), Err(DraftError::NoImages));
}

#[test]
fn hotspots_json_uses_the_upload_shape() {
    let draft = two_room_draft();
    let value: serde_json::Value =
        serde_json::from_str(&draft.hotspots_json().expect("encode")).expect("json");
    assert_eq!(value["hall.jpg"][0]["targetImage"], "kitchen.jpg");
    assert_eq!(value["hall.jpg"][0]["roomId"], "to-kitchen.jpg");
    assert_eq!(value["kitchen.jpg"][0]["yaw"], 90.0);
}
