use std::{fs, path::PathBuf};

use anyhow::Context;
use navigation::LinkPolicy;
use serde::Deserialize;
use shared::protocol::UPLOADS_ROUTE;
use storage::DEFAULT_DATABASE_URL;
use url::Url;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub uploads_dir: PathBuf,
    pub server_public_url: Option<String>,
    pub max_image_bytes: usize,
    pub max_request_bytes: usize,
    pub link_policy: LinkPolicy,
    pub cors_origin: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            uploads_dir: PathBuf::from("./uploads"),
            server_public_url: None,
            max_image_bytes: 32 * 1024 * 1024,
            max_request_bytes: 256 * 1024 * 1024,
            link_policy: LinkPolicy::Lazy,
            cors_origin: None,
        }
    }
}

/// Keys accepted in `server.toml`; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    uploads_dir: Option<PathBuf>,
    server_public_url: Option<String>,
    max_image_bytes: Option<usize>,
    max_request_bytes: Option<usize>,
    link_policy: Option<String>,
    cors_origin: Option<String>,
}

impl Settings {
    /// Base URL that stored image URLs are built from, e.g.
    /// `https://tours.example.com/uploads` or just `/uploads`.
    pub fn image_public_base(&self) -> anyhow::Result<String> {
        let Some(public_url) = self.server_public_url.as_deref() else {
            return Ok(UPLOADS_ROUTE.to_string());
        };
        let parsed = Url::parse(public_url)
            .with_context(|| format!("invalid server_public_url '{public_url}'"))?;
        Ok(format!(
            "{}{UPLOADS_ROUTE}",
            parsed.as_str().trim_end_matches('/')
        ))
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then the environment.
pub fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings =
            toml::from_str(raw).with_context(|| format!("failed to parse {SETTINGS_FILE}"))?;
        if let Some(v) = file_cfg.bind_addr {
            settings.server_bind = v;
        }
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.uploads_dir {
            settings.uploads_dir = v;
        }
        if let Some(v) = file_cfg.server_public_url {
            settings.server_public_url = Some(v);
        }
        if let Some(v) = file_cfg.max_image_bytes {
            settings.max_image_bytes = v;
        }
        if let Some(v) = file_cfg.max_request_bytes {
            settings.max_request_bytes = v;
        }
        if let Some(v) = file_cfg.link_policy {
            settings.link_policy = v.parse()?;
        }
        if let Some(v) = file_cfg.cors_origin {
            settings.cors_origin = Some(v);
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__UPLOADS_DIR") {
        settings.uploads_dir = PathBuf::from(v);
    }

    if let Some(v) = env("SERVER_PUBLIC_URL") {
        settings.server_public_url = Some(v);
    }

    if let Some(v) = env("APP__MAX_IMAGE_BYTES") {
        settings.max_image_bytes = v
            .parse()
            .with_context(|| format!("invalid APP__MAX_IMAGE_BYTES '{v}'"))?;
    }
    if let Some(v) = env("APP__MAX_REQUEST_BYTES") {
        settings.max_request_bytes = v
            .parse()
            .with_context(|| format!("invalid APP__MAX_REQUEST_BYTES '{v}'"))?;
    }

    if let Some(v) = env("APP__LINK_POLICY") {
        settings.link_policy = v.parse()?;
    }

    if let Some(v) = env("APP__CORS_ORIGIN") {
        settings.cors_origin = Some(v);
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
