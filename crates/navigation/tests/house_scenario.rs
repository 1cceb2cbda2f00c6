use navigation::{NavigationError, NavigationGraph};
use shared::domain::{Hotspot, HotspotGroup, Image, Tour, TourId};

fn named(name: &str) -> Image {
    Image {
        name: name.to_string(),
        url: format!("https://cdn.example.test/{name}"),
        size: 0,
        media_type: "image/jpeg".to_string(),
    }
}

#[test]
fn lobby_hotspot_leads_to_hall() {
    let tour = Tour {
        id: TourId(1),
        name: "House".to_string(),
        created_at: None,
        images: vec![named("Lobby"), named("Hall")],
        hotspots: vec![HotspotGroup {
            image_name: Some("Lobby".to_string()),
            image_url: None,
            hotspots: vec![Hotspot {
                pitch: 0.0,
                yaw: 1.2,
                room_id: "r2".to_string(),
                description: "Go to Hall".to_string(),
                target_image: "Hall".to_string(),
            }],
        }],
    };

    let mut graph = NavigationGraph::load(&tour).expect("graph");
    assert_eq!(graph.current_image().name, "Lobby");

    let only = graph.hotspots_for("Lobby").to_vec();
    assert_eq!(only.len(), 1);
    graph.activate_hotspot(&only[0]).expect("hall exists");
    assert_eq!(graph.current_image().name, "Hall");
}

#[test]
fn tour_without_images_fails_to_load() {
    let tour = Tour {
        id: TourId(2),
        name: "Empty".to_string(),
        created_at: None,
        images: Vec::new(),
        hotspots: Vec::new(),
    };
    assert!(matches!(
        NavigationGraph::load(&tour),
        Err(NavigationError::MalformedTour(_))
    ));
}
