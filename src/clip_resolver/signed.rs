use chrono::Utc;

use crate::clip_resolver::{Presigner, hosted_reference, unsupported};
use crate::ports::catalog::{AudioLocation, Song};
use crate::ports::clip::{ClipError, ClipResolver, PlayableReference};

/// Presigns storage keys; URL locations pass through.
#[derive(Debug, Clone)]
pub struct SignedUrlResolver {
    presigner: Presigner,
    expires_in_seconds: u64,
}

impl SignedUrlResolver {
    pub fn new(presigner: Presigner, expires_in_seconds: u64) -> Self {
        Self {
            presigner,
            expires_in_seconds,
        }
    }
}

#[async_trait::async_trait]
impl ClipResolver for SignedUrlResolver {
    async fn resolve(&self, song: &Song) -> Result<PlayableReference, ClipError> {
        if let Some(reference) = hosted_reference(song) {
            return Ok(reference);
        }

        match &song.location {
            AudioLocation::StorageKey(key) => {
                let signed_url =
                    self.presigner
                        .presign_get(key, self.expires_in_seconds, Utc::now())?;
                tracing::debug!("Signed storage key {} for song {}", key, song.id);
                Ok(PlayableReference::SignedUrl {
                    signed_url,
                    expires_in_seconds: self.expires_in_seconds,
                })
            }
            AudioLocation::Url(url) => Ok(PlayableReference::Url {
                url: song.clip_url.clone().unwrap_or_else(|| url.clone()),
            }),
            AudioLocation::LocalFile(_) => Err(unsupported(song, "signed_url")),
        }
    }
}
