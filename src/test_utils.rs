use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::{IteratorRandom, SliceRandom};
use sea_orm::{ConnectionTrait, Database as SeaDatabase};

use crate::database::{Database, NewSong};
use crate::ports::catalog::{AudioLocation, CatalogError, Song, SongCatalog, SongFilter, SongSource};

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:").await.unwrap();

    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    Arc::new(Database::migrate(conn).await.unwrap())
}

pub fn new_song(title: &str, artist: &str, source: SongSource) -> NewSong {
    NewSong {
        title: title.to_string(),
        artist: artist.to_string(),
        source,
        location: AudioLocation::Url(format!(
            "https://cdn.example.com/{}.mp3",
            title.to_lowercase().replace(' ', "-")
        )),
        clip_url: None,
        externally_hosted: false,
        duration_seconds: Some(180),
    }
}

pub fn song(id: i64, title: &str, artist: &str, source: SongSource) -> Song {
    Song {
        id,
        title: title.to_string(),
        artist: artist.to_string(),
        source,
        location: AudioLocation::Url(format!("https://cdn.example.com/{id}.mp3")),
        clip_url: None,
        externally_hosted: false,
        duration_seconds: Some(180),
    }
}

/// Catalog over a fixed list of songs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    songs: Vec<Song>,
}

impl InMemoryCatalog {
    pub fn new(songs: Vec<Song>) -> Self {
        Self { songs }
    }

    fn matching<'a>(&'a self, filter: Option<&'a SongFilter>) -> impl Iterator<Item = &'a Song> {
        self.songs
            .iter()
            .filter(move |song| filter.is_none_or(|f| f.matches(song)))
    }
}

#[async_trait::async_trait]
impl SongCatalog for InMemoryCatalog {
    async fn count(&self) -> Result<u64, CatalogError> {
        Ok(self.songs.len() as u64)
    }

    async fn count_where(&self, filter: &SongFilter) -> Result<u64, CatalogError> {
        Ok(self.matching(Some(filter)).count() as u64)
    }

    async fn sample_one(&self, filter: Option<&SongFilter>) -> Result<Option<Song>, CatalogError> {
        Ok(self
            .matching(filter)
            .choose(&mut rand::thread_rng())
            .cloned())
    }

    async fn sample_excluding(
        &self,
        exclude_ids: &HashSet<i64>,
        filter: Option<&SongFilter>,
        limit: usize,
    ) -> Result<Vec<Song>, CatalogError> {
        let mut candidates: Vec<Song> = self
            .matching(filter)
            .filter(|song| !exclude_ids.contains(&song.id))
            .cloned()
            .collect();
        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(limit);
        Ok(candidates)
    }
}

/// Catalog whose every query fails, for error propagation tests.
pub struct FailingCatalog;

#[async_trait::async_trait]
impl SongCatalog for FailingCatalog {
    async fn count(&self) -> Result<u64, CatalogError> {
        Err(sea_orm::DbErr::Custom("catalog offline".into()).into())
    }

    async fn count_where(&self, _filter: &SongFilter) -> Result<u64, CatalogError> {
        Err(sea_orm::DbErr::Custom("catalog offline".into()).into())
    }

    async fn sample_one(&self, _filter: Option<&SongFilter>) -> Result<Option<Song>, CatalogError> {
        Err(sea_orm::DbErr::Custom("catalog offline".into()).into())
    }

    async fn sample_excluding(
        &self,
        _exclude_ids: &HashSet<i64>,
        _filter: Option<&SongFilter>,
        _limit: usize,
    ) -> Result<Vec<Song>, CatalogError> {
        Err(sea_orm::DbErr::Custom("catalog offline".into()).into())
    }
}
