use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

use shared::domain::{Hotspot, HotspotGroup, Image, Tour, TourId};

pub mod image_store;

pub use image_store::{ImageStore, LocalImageStore, StoredObject};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/tours.db";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Returned (inside `anyhow::Error`) when a tour name is already taken.
#[derive(Debug, Clone, Error)]
#[error("a tour named '{0}' already exists")]
pub struct DuplicateTourName(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub name: String,
    pub storage_key: String,
    pub url: String,
    pub size_bytes: u64,
    pub media_type: String,
}

#[derive(Debug, Clone)]
pub struct StoredTour {
    pub tour_id: TourId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ImageRecord>,
    /// Hotspots keyed by source image name, each list in placement order.
    pub hotspots: BTreeMap<String, Vec<Hotspot>>,
}

impl StoredTour {
    /// The document served to clients. Groups follow image order; a group
    /// whose source image is gone is kept under its name alone.
    pub fn into_tour(self) -> Tour {
        let mut remaining = self.hotspots;
        let mut groups = Vec::with_capacity(remaining.len());
        for image in &self.images {
            if let Some(hotspots) = remaining.remove(&image.name) {
                groups.push(HotspotGroup {
                    image_name: Some(image.name.clone()),
                    image_url: Some(image.url.clone()),
                    hotspots,
                });
            }
        }
        groups.extend(remaining.into_iter().map(|(name, hotspots)| HotspotGroup {
            image_name: Some(name),
            image_url: None,
            hotspots,
        }));

        Tour {
            id: self.tour_id,
            name: self.name,
            created_at: Some(self.created_at),
            images: self
                .images
                .into_iter()
                .map(|image| Image {
                    name: image.name,
                    url: image.url,
                    size: image.size_bytes,
                    media_type: image.media_type,
                })
                .collect(),
            hotspots: groups,
        }
    }
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn tour_name_exists(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM tours WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Inserts the tour, its images and its hotspots in one transaction.
    pub async fn create_tour(
        &self,
        name: &str,
        images: &[ImageRecord],
        hotspots: &BTreeMap<String, Vec<Hotspot>>,
    ) -> Result<TourId> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin tour transaction")?;

        let rec = sqlx::query("INSERT INTO tours (name, created_at) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| insert_tour_error(err, name))?;
        let tour_id = TourId(rec.get::<i64, _>(0));

        for (position, image) in images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tour_images (tour_id, position, name, storage_key, url, size_bytes, media_type)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(tour_id.0)
            .bind(i64::try_from(position)?)
            .bind(&image.name)
            .bind(&image.storage_key)
            .bind(&image.url)
            .bind(i64::try_from(image.size_bytes).unwrap_or(i64::MAX))
            .bind(&image.media_type)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert image '{}'", image.name))?;
        }

        for (source_image, list) in hotspots {
            for (position, hotspot) in list.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO tour_hotspots (tour_id, source_image, position, pitch, yaw, room_id, description, target_image)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(tour_id.0)
                .bind(source_image)
                .bind(i64::try_from(position)?)
                .bind(hotspot.pitch)
                .bind(hotspot.yaw)
                .bind(&hotspot.room_id)
                .bind(&hotspot.description)
                .bind(&hotspot.target_image)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to insert hotspot on '{source_image}'"))?;
            }
        }

        tx.commit().await.context("failed to commit tour")?;
        Ok(tour_id)
    }

    /// All tours in creation order.
    pub async fn list_tours(&self) -> Result<Vec<StoredTour>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM tours ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut images = self.images_by_tour(None).await?;
        let mut hotspots = self.hotspots_by_tour(None).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let id = r.get::<i64, _>(0);
                StoredTour {
                    tour_id: TourId(id),
                    name: r.get::<String, _>(1),
                    created_at: r.get::<DateTime<Utc>, _>(2),
                    images: images.remove(&id).unwrap_or_default(),
                    hotspots: hotspots.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    pub async fn load_tour(&self, tour_id: TourId) -> Result<Option<StoredTour>> {
        let Some(row) = sqlx::query("SELECT id, name, created_at FROM tours WHERE id = ?")
            .bind(tour_id.0)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut images = self.images_by_tour(Some(tour_id)).await?;
        let mut hotspots = self.hotspots_by_tour(Some(tour_id)).await?;
        Ok(Some(StoredTour {
            tour_id,
            name: row.get::<String, _>(1),
            created_at: row.get::<DateTime<Utc>, _>(2),
            images: images.remove(&tour_id.0).unwrap_or_default(),
            hotspots: hotspots.remove(&tour_id.0).unwrap_or_default(),
        }))
    }

    async fn images_by_tour(&self, only: Option<TourId>) -> Result<HashMap<i64, Vec<ImageRecord>>> {
        let rows = sqlx::query(
            "SELECT tour_id, name, storage_key, url, size_bytes, media_type
             FROM tour_images
             WHERE ?1 IS NULL OR tour_id = ?1
             ORDER BY tour_id, position",
        )
        .bind(only.map(|id| id.0))
        .fetch_all(&self.pool)
        .await?;

        let mut by_tour: HashMap<i64, Vec<ImageRecord>> = HashMap::new();
        for r in rows {
            by_tour
                .entry(r.get::<i64, _>(0))
                .or_default()
                .push(ImageRecord {
                    name: r.get::<String, _>(1),
                    storage_key: r.get::<String, _>(2),
                    url: r.get::<String, _>(3),
                    size_bytes: r.get::<i64, _>(4).max(0) as u64,
                    media_type: r.get::<String, _>(5),
                });
        }
        Ok(by_tour)
    }

    async fn hotspots_by_tour(
        &self,
        only: Option<TourId>,
    ) -> Result<HashMap<i64, BTreeMap<String, Vec<Hotspot>>>> {
        let rows = sqlx::query(
            "SELECT tour_id, source_image, pitch, yaw, room_id, description, target_image
             FROM tour_hotspots
             WHERE ?1 IS NULL OR tour_id = ?1
             ORDER BY tour_id, source_image, position",
        )
        .bind(only.map(|id| id.0))
        .fetch_all(&self.pool)
        .await?;

        let mut by_tour: HashMap<i64, BTreeMap<String, Vec<Hotspot>>> = HashMap::new();
        for r in rows {
            by_tour
                .entry(r.get::<i64, _>(0))
                .or_default()
                .entry(r.get::<String, _>(1))
                .or_default()
                .push(Hotspot {
                    pitch: r.get::<f64, _>(2),
                    yaw: r.get::<f64, _>(3),
                    room_id: r.get::<String, _>(4),
                    description: r.get::<String, _>(5),
                    target_image: r.get::<String, _>(6),
                });
        }
        Ok(by_tour)
    }
}

fn insert_tour_error(err: sqlx::Error, name: &str) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return DuplicateTourName(name.to_string()).into();
        }
    }
    anyhow::Error::new(err).context(format!("failed to insert tour '{name}'"))
}

/// Normalises a configured database location and creates its parent
/// directory. Bare paths such as `data/tours.db` become `sqlite://` URLs.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
