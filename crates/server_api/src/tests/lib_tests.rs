use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use navigation::NavigationGraph;
use storage::StoredObject;

use super::*;

/// Keeps objects in memory and fails every `put` after the first `fail_after`.
#[derive(Default)]
struct MemoryImageStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_after: Option<usize>,
}

impl MemoryImageStore {
    fn len(&self) -> usize {
        self.objects.lock().expect("lock").len()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(
        &self,
        file_name: &str,
        _media_type: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredObject> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| n >= limit) {
            anyhow::bail!("bucket unavailable");
        }
        let key = format!("{n}-{file_name}");
        self.objects
            .lock()
            .expect("lock")
            .insert(key.clone(), bytes.to_vec());
        Ok(StoredObject {
            url: format!("https://cdn.example.test/{key}"),
            key,
        })
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().expect("lock").remove(key);
        Ok(())
    }
}

async fn context(images: Arc<MemoryImageStore>, link_policy: LinkPolicy) -> ApiContext {
    ApiContext {
        storage: Storage::new("sqlite::memory:").await.expect("db"),
        images,
        link_policy,
    }
}

fn upload(name: &str) -> ImageUpload {
    ImageUpload {
        name: name.to_string(),
        media_type: Some("image/jpeg".to_string()),
        bytes: vec![7; 16],
    }
}

fn house() -> TourSubmission {
    TourSubmission {
        name: "House".to_string(),
        images: vec![upload("Lobby"), upload("Hall")],
        hotspots: Some(
            r#"{"Lobby":[{"pitch":0,"yaw":1.2,"roomId":"r2","description":"Go to Hall","targetImage":"Hall"}]}"#
                .to_string(),
        ),
    }
}

#[tokio::test]
async fn created_tour_round_trips_into_a_navigable_graph() {
    let images = Arc::new(MemoryImageStore::default());
    let ctx = context(images.clone(), LinkPolicy::Lazy).await;

    let created = create_tour(&ctx, house()).await.expect("create");
    assert_eq!(created.image_count, 2);
    assert_eq!(created.hotspot_count, 1);
    assert_eq!(images.len(), 2);

    let tours = list_tours(&ctx).await.expect("list");
    assert_eq!(tours.len(), 1);
    let tour = get_tour(&ctx, created.id).await.expect("get");
    assert_eq!(tour, tours[0]);
    assert_eq!(tour.images[0].size, 16);
    assert!(tour.images[1].url.starts_with("https://cdn.example.test/"));

    let mut graph = NavigationGraph::load(&tour).expect("graph");
    assert_eq!(graph.current_image().name, "Lobby");
    let hotspot = graph.hotspots_for("Lobby")[0].clone();
    graph.activate_hotspot(&hotspot).expect("hall");
    assert_eq!(graph.current_image().name, "Hall");
}

#[tokio::test]
async fn failed_upload_discards_every_stored_image() {
    let images = Arc::new(MemoryImageStore {
        fail_after: Some(1),
        ..MemoryImageStore::default()
    });
    let ctx = context(images.clone(), LinkPolicy::Lazy).await;

    let err = create_tour(&ctx, house()).await.expect_err("second put fails");
    assert_eq!(err.code, ErrorCode::Upload);
    assert_eq!(images.len(), 0);
    assert!(list_tours(&ctx).await.expect("list").is_empty());
}

#[tokio::test]
async fn duplicate_name_is_rejected_before_uploading() {
    let images = Arc::new(MemoryImageStore::default());
    let ctx = context(images.clone(), LinkPolicy::Lazy).await;
    create_tour(&ctx, house()).await.expect("first");

    let err = create_tour(&ctx, house()).await.expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::DuplicateName);
    assert_eq!(images.len(), 2);
}

#[tokio::test]
async fn strict_policy_rejects_dangling_links() {
    let images = Arc::new(MemoryImageStore::default());
    let ctx = context(images.clone(), LinkPolicy::Strict).await;
    let mut submission = house();
    submission.hotspots = Some(r#"{"Lobby":[{"pitch":0,"yaw":0,"targetImage":"Attic"}]}"#.into());

    let err = create_tour(&ctx, submission).await.expect_err("dangling");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(images.len(), 0);
}

#[tokio::test]
async fn unknown_tour_is_not_found() {
    let ctx = context(Arc::new(MemoryImageStore::default()), LinkPolicy::Lazy).await;
    let err = get_tour(&ctx, TourId(41)).await.expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}
