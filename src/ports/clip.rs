use std::path::PathBuf;

use serde::Serialize;

use crate::ports::catalog::Song;

/// A locator a client can use to play the right piece of audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PlayableReference {
    /// Playable as-is: a pre-cut clip, an extracted clip or an external URL.
    Url { url: String },
    /// A temporary object-storage URL.
    SignedUrl {
        signed_url: String,
        expires_in_seconds: u64,
    },
    /// The whole track; the client seeks to the offset and stops after the duration.
    FullTrack {
        full_url: String,
        start_offset_seconds: u32,
        duration_seconds: u32,
    },
}

impl PlayableReference {
    pub fn url(&self) -> &str {
        match self {
            PlayableReference::Url { url } => url,
            PlayableReference::SignedUrl { signed_url, .. } => signed_url,
            PlayableReference::FullTrack { full_url, .. } => full_url,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("Audio file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to extract clip for song {song_id}: {reason}")]
    ExtractionFailed { song_id: i64, reason: String },

    #[error("The {strategy} clip strategy cannot play a {kind} location (song {song_id})")]
    UnsupportedLocation {
        song_id: i64,
        strategy: &'static str,
        kind: &'static str,
    },

    #[error("Failed to sign storage key {key}: {reason}")]
    Signing { key: String, reason: String },

    #[error("Clip cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a catalog song into something a client can play.
///
/// Implementations live in `clip_resolver`, one per configured strategy.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ClipResolver: Send + Sync {
    async fn resolve(&self, song: &Song) -> Result<PlayableReference, ClipError>;
}
