//! HTTP client for the tour server, plus the client-side state that sits
//! around it: a [`TourDraft`] being authored before upload and the
//! [`TourSession`] that decides which loaded tour is current.

use navigation::NavigationGraph;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{Tour, TourId},
    protocol::{form_fields, TourCreated, TOURS_ROUTE},
};
use tracing::{debug, info};
use url::Url;

pub mod draft;
pub mod error;
pub mod session;

pub use draft::{DraftError, DraftImage, TourDraft};
pub use error::ClientError;
pub use session::{LoadOutcome, LoadTicket, SessionError, TourSession};

#[derive(Debug, Clone)]
pub struct TourClient {
    http: Client,
    server_url: String,
}

impl TourClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(server_url.trim())?;
        Ok(Self {
            http: Client::new(),
            server_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Resolves an image URL from a tour document. Relative URLs such as
    /// `/uploads/<key>.jpg` are served by the same host as the API.
    pub fn image_url(&self, url: &str) -> String {
        if url.contains("://") {
            return url.to_string();
        }
        format!("{}/{}", self.server_url, url.trim_start_matches('/'))
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let res = self
            .http
            .get(format!("{}/healthz", self.server_url))
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }

    pub async fn list_tours(&self) -> Result<Vec<Tour>, ClientError> {
        let res = self
            .http
            .get(format!("{}{TOURS_ROUTE}", self.server_url))
            .send()
            .await?;
        Ok(check_status(res).await?.json().await?)
    }

    pub async fn get_tour(&self, tour_id: TourId) -> Result<Tour, ClientError> {
        let res = self
            .http
            .get(format!("{}{TOURS_ROUTE}/{}", self.server_url, tour_id.0))
            .send()
            .await?;
        Ok(check_status(res).await?.json().await?)
    }

    /// Fetches a tour and builds its navigation graph. A document that is not
    /// a usable tour surfaces as [`navigation::NavigationError::MalformedTour`].
    pub async fn load_graph(&self, tour_id: TourId) -> Result<NavigationGraph, ClientError> {
        let res = self
            .http
            .get(format!("{}{TOURS_ROUTE}/{}", self.server_url, tour_id.0))
            .send()
            .await?;
        let body = check_status(res).await?.text().await?;
        let graph = NavigationGraph::load_json(&body)?;
        debug!(
            tour_id = tour_id.0,
            images = graph.images().len(),
            "tour graph loaded"
        );
        Ok(graph)
    }

    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let res = self.http.get(self.image_url(url)).send().await?;
        Ok(check_status(res).await?.bytes().await?.to_vec())
    }

    /// Uploads a draft as one multipart request: the tour name, every image as
    /// an `images` part named after the image, and the hotspot map as JSON.
    pub async fn create_tour(&self, draft: &TourDraft) -> Result<TourCreated, ClientError> {
        draft.validate()?;

        let mut form = Form::new().text(form_fields::NAME, draft.name().to_string());
        for image in draft.images() {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.name.clone())
                .mime_str(&image.media_type)?;
            form = form.part(form_fields::IMAGES, part);
        }
        form = form.text(form_fields::HOTSPOTS, draft.hotspots_json()?);

        let res = self
            .http
            .post(format!("{}{TOURS_ROUTE}", self.server_url))
            .multipart(form)
            .send()
            .await?;
        let created: TourCreated = check_status(res).await?.json().await?;
        info!(
            tour_id = created.id.0,
            name = %created.name,
            images = created.image_count,
            "tour uploaded"
        );
        Ok(created)
    }
}

async fn check_status(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(ClientError::from_response(status.as_u16(), &body))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
