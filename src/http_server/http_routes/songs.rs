use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::http_server::{error::ApiError, state::AppState};
use crate::ports::catalog::{Song, SongSource};
use crate::services::quiz::Question;

/// A library song as clients see it. Storage keys and server paths stay private.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongResponse {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub source: SongSource,
    pub clip_url: Option<String>,
    pub externally_hosted: bool,
    pub duration_seconds: Option<i32>,
}

impl From<Song> for SongResponse {
    fn from(song: Song) -> Self {
        Self {
            id: song.id,
            title: song.title,
            artist: song.artist,
            source: song.source,
            clip_url: song.clip_url,
            externally_hosted: song.externally_hosted,
            duration_seconds: song.duration_seconds,
        }
    }
}

pub async fn random_clip(State(state): State<Arc<AppState>>) -> Result<Json<Question>, ApiError> {
    let question = state.quiz.generate_question().await?;
    Ok(Json(question))
}

pub async fn list_songs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SongResponse>>, ApiError> {
    let songs = state.songs.list().await?;
    Ok(Json(songs.into_iter().map(SongResponse::from).collect()))
}

pub async fn get_song(
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
) -> Result<Json<SongResponse>, ApiError> {
    let song = state
        .songs
        .get(song_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Song not found: {song_id}")))?;
    Ok(Json(SongResponse::from(song)))
}
