use super::*;
use axum::{
    body::{self, Body},
    http::Request,
    response::Response,
};
use navigation::{LinkPolicy, NavigationGraph};
use shared::{
    domain::Tour,
    error::{ApiError, ErrorCode},
    protocol::TourCreated,
};
use tower::ServiceExt;

const BOUNDARY: &str = "tour-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

async fn test_app(max_image_bytes: usize) -> (Router, tempfile::TempDir) {
    let uploads = tempfile::tempdir().expect("tempdir");
    let settings = Settings {
        uploads_dir: uploads.path().to_path_buf(),
        ..Settings::default()
    };
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let images = LocalImageStore::open(uploads.path(), settings.image_public_base().expect("base"))
        .await
        .expect("image store");
    let api = ApiContext {
        storage,
        images: Arc::new(images),
        link_policy: LinkPolicy::Lazy,
    };
    let app = build_router(
        Arc::new(AppState {
            api,
            max_image_bytes,
        }),
        &settings,
    )
    .expect("router");
    (app, uploads)
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(TOURS_ROUTE)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn house_request(name: &str) -> Request<Body> {
    multipart_request(&[
        Part::Text("name", name),
        Part::File {
            file_name: "Lobby",
            content_type: "image/jpeg",
            bytes: b"lobby-pixels",
        },
        Part::File {
            file_name: "Hall",
            content_type: "image/jpeg",
            bytes: b"hall-pixels",
        },
        Part::Text(
            "hotspots",
            r#"{"Lobby":[{"pitch":0,"yaw":1.2,"roomId":"r2","description":"Go to Hall","targetImage":"Hall"}]}"#,
        ),
    ])
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _uploads) = test_app(1024).await;
    let response = app.oneshot(get("/healthz")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn uploaded_tour_is_listed_served_and_navigable() {
    let (app, _uploads) = test_app(1024).await;

    let response = app
        .clone()
        .oneshot(house_request("House"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: TourCreated = json_body(response).await;
    assert_eq!(created.image_count, 2);
    assert_eq!(created.hotspot_count, 1);

    let response = app.clone().oneshot(get(TOURS_ROUTE)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let tours: Vec<Tour> = json_body(response).await;
    assert_eq!(tours.len(), 1);

    let response = app
        .clone()
        .oneshot(get(&format!("{TOURS_ROUTE}/{}", created.id.0)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let tour: Tour = json_body(response).await;
    assert_eq!(tour.images[0].media_type, "image/jpeg");
    assert_eq!(tour.images[0].size, b"lobby-pixels".len() as u64);

    let mut graph = NavigationGraph::load(&tour).expect("graph");
    let hotspot = graph.hotspots_for("Lobby")[0].clone();
    graph.activate_hotspot(&hotspot).expect("hall");
    assert_eq!(graph.current_image().name, "Hall");

    let response = app
        .oneshot(get(&graph.current_image().url))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"hall-pixels");
}

#[tokio::test]
async fn missing_name_is_a_validation_error() {
    let (app, _uploads) = test_app(1024).await;
    let request = multipart_request(&[Part::File {
        file_name: "Lobby.jpg",
        content_type: "image/jpeg",
        bytes: b"pixels",
    }]);

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn duplicate_tour_name_conflicts() {
    let (app, _uploads) = test_app(1024).await;
    let first = app
        .clone()
        .oneshot(house_request("House"))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(house_request("House")).await.expect("response");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let err: ApiError = json_body(second).await;
    assert_eq!(err.code, ErrorCode::DuplicateName);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let (app, uploads) = test_app(4).await;
    let response = app.oneshot(house_request("House")).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        std::fs::read_dir(uploads.path()).expect("uploads").count(),
        0
    );
}

#[tokio::test]
async fn unknown_tour_is_not_found() {
    let (app, _uploads) = test_app(1024).await;
    let response = app
        .oneshot(get(&format!("{TOURS_ROUTE}/404")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_tour_id_is_a_json_validation_error() {
    let (app, _uploads) = test_app(1024).await;
    let response = app
        .oneshot(get(&format!("{TOURS_ROUTE}/abc")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = json_body(response).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert_eq!(error.message, "invalid tour id 'abc'");
}

#[tokio::test]
async fn unknown_tour_body_is_an_api_error() {
    let (app, _uploads) = test_app(1024).await;
    let response = app
        .oneshot(get(&format!("{TOURS_ROUTE}/404")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error: ApiError = json_body(response).await;
    assert_eq!(error.code, ErrorCode::NotFound);
}
