use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use migration::MigratorTrait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, ConnectOptions,
    Database as SeaDatabase, DatabaseConnection, EntityTrait, QuerySelect,
};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::entities::{self, song::SongSource};
use crate::ports::catalog::AudioLocation;

pub struct Database {
    pub conn: DatabaseConnection,
}

/// A song about to be added to the catalog.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub source: SongSource,
    pub location: AudioLocation,
    pub clip_url: Option<String>,
    pub externally_hosted: bool,
    pub duration_seconds: Option<i32>,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(16)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .wrap_err_with(|| format!("Failed to open database: {}", path.display()))?;

        let database = Self::migrate(conn).await?;
        log::info!("Database ready at: {}", path.display());
        Ok(database)
    }

    /// Run pending migrations on an open connection
    pub async fn migrate(conn: DatabaseConnection) -> Result<Self> {
        log::debug!("Running database migrations");
        migration::Migrator::up(&conn, None)
            .await
            .wrap_err("Failed to run database migrations")?;
        Ok(Database { conn })
    }

    // ========== Song Methods ==========

    /// Insert a song, trimming and validating its title and artist
    pub async fn insert_song(&self, song: NewSong) -> Result<entities::song::Model> {
        let title = song.title.trim();
        let artist = song.artist.trim();
        if title.is_empty() {
            return Err(eyre!("Song title must not be empty"));
        }
        if artist.is_empty() {
            return Err(eyre!("Song artist must not be empty"));
        }

        let model = entities::song::ActiveModel {
            title: Set(title.to_string()),
            artist: Set(artist.to_string()),
            source: Set(song.source),
            location_kind: Set(song.location.kind()),
            location: Set(song.location.as_stored()),
            clip_url: Set(song.clip_url),
            externally_hosted: Set(song.externally_hosted),
            duration_seconds: Set(song.duration_seconds),
            ..entities::song::ActiveModel::new()
        }
        .insert(&self.conn)
        .await
        .wrap_err_with(|| format!("Failed to insert song: '{}' by '{}'", title, artist))?;

        log::info!(
            "Song created: '{}' by '{}' (ID: {})",
            model.title,
            model.artist,
            model.id
        );
        Ok(model)
    }

    /// Lowercased (title, artist) pairs of every song, for duplicate detection
    pub async fn song_keys(&self) -> Result<HashSet<(String, String)>> {
        let pairs: Vec<(String, String)> = entities::song::Entity::find()
            .select_only()
            .column(entities::song::Column::Title)
            .column(entities::song::Column::Artist)
            .into_tuple()
            .all(&self.conn)
            .await
            .wrap_err("Failed to query song titles")?;

        Ok(pairs
            .into_iter()
            .map(|(title, artist)| (title.to_lowercase(), artist.to_lowercase()))
            .collect())
    }
}
