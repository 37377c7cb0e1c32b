use std::collections::HashSet;
use std::path::PathBuf;

use crate::entities::{self, song::LocationKind};

pub use crate::entities::song::SongSource;

/// Where the audio for a song lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioLocation {
    /// A URL a client can play directly.
    Url(String),
    /// An object-storage key that has to be signed before a client can fetch it.
    StorageKey(String),
    /// A file on this server, usable for clip extraction.
    LocalFile(PathBuf),
}

impl AudioLocation {
    pub fn kind(&self) -> LocationKind {
        match self {
            AudioLocation::Url(_) => LocationKind::Url,
            AudioLocation::StorageKey(_) => LocationKind::StorageKey,
            AudioLocation::LocalFile(_) => LocationKind::LocalFile,
        }
    }

    /// The raw string persisted in the `location` column.
    pub fn as_stored(&self) -> String {
        match self {
            AudioLocation::Url(url) => url.clone(),
            AudioLocation::StorageKey(key) => key.clone(),
            AudioLocation::LocalFile(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Decoupled representation of a catalog song, as the quiz core sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub source: SongSource,
    pub location: AudioLocation,
    pub clip_url: Option<String>,
    pub externally_hosted: bool,
    pub duration_seconds: Option<i32>,
}

impl From<entities::song::Model> for Song {
    fn from(model: entities::song::Model) -> Self {
        let location = match model.location_kind {
            LocationKind::Url => AudioLocation::Url(model.location),
            LocationKind::StorageKey => AudioLocation::StorageKey(model.location),
            LocationKind::LocalFile => AudioLocation::LocalFile(PathBuf::from(model.location)),
        };

        Self {
            id: model.id,
            title: model.title,
            artist: model.artist,
            source: model.source,
            location,
            clip_url: model.clip_url,
            externally_hosted: model.externally_hosted,
            duration_seconds: model.duration_seconds,
        }
    }
}

/// Conjunctive filter over catalog songs. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongFilter {
    pub source: Option<SongSource>,
    pub externally_hosted: Option<bool>,
}

impl SongFilter {
    pub fn by_source(source: SongSource) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Songs with a reliable playable reference, preferred when picking the answer.
    pub fn preferred() -> Self {
        Self {
            externally_hosted: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, song: &Song) -> bool {
        self.source.is_none_or(|source| song.source == source)
            && self
                .externally_hosted
                .is_none_or(|hosted| song.externally_hosted == hosted)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog query failed: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Port trait over the persistent store of songs.
///
/// Implementations live in `services::catalog` (production) and `test_utils` (in-memory).
#[async_trait::async_trait]
pub trait SongCatalog: Send + Sync {
    async fn count(&self) -> Result<u64, CatalogError>;

    async fn count_where(&self, filter: &SongFilter) -> Result<u64, CatalogError>;

    /// Uniformly samples one song matching `filter`, or any song when `filter` is `None`.
    async fn sample_one(&self, filter: Option<&SongFilter>) -> Result<Option<Song>, CatalogError>;

    /// Uniformly samples up to `limit` distinct songs whose ids are not in `exclude_ids`.
    async fn sample_excluding(
        &self,
        exclude_ids: &HashSet<i64>,
        filter: Option<&SongFilter>,
        limit: usize,
    ) -> Result<Vec<Song>, CatalogError>;
}
