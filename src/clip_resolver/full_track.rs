use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clip_resolver::{ClipWindow, Presigner, hosted_reference, unsupported};
use crate::ports::catalog::{AudioLocation, Song};
use crate::ports::clip::{ClipError, ClipResolver, PlayableReference};

/// Hands out the whole track plus a random window for the client to play.
#[derive(Debug, Clone)]
pub struct FullTrackResolver {
    signing: Option<(Presigner, u64)>,
    clip_seconds: u32,
}

impl FullTrackResolver {
    /// `signing` is needed only for catalogs holding storage keys.
    pub fn new(signing: Option<(Presigner, u64)>, clip_seconds: u32) -> Self {
        Self {
            signing,
            clip_seconds,
        }
    }

    fn full_url(&self, song: &Song) -> Result<String, ClipError> {
        match (&song.location, &self.signing) {
            (AudioLocation::Url(url), _) => Ok(url.clone()),
            (AudioLocation::StorageKey(key), Some((presigner, expires_in_seconds))) => {
                presigner.presign_get(key, *expires_in_seconds, Utc::now())
            }
            _ => Err(unsupported(song, "full_track")),
        }
    }
}

#[async_trait::async_trait]
impl ClipResolver for FullTrackResolver {
    async fn resolve(&self, song: &Song) -> Result<PlayableReference, ClipError> {
        if let Some(reference) = hosted_reference(song) {
            return Ok(reference);
        }

        let full_url = self.full_url(song)?;
        let window = ClipWindow::pick(
            song.duration_seconds.map(f64::from),
            self.clip_seconds,
            &mut StdRng::from_entropy(),
        );

        Ok(PlayableReference::FullTrack {
            full_url,
            start_offset_seconds: window.start_seconds,
            duration_seconds: self.clip_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::ports::catalog::SongSource;
    use crate::test_utils::song;

    fn presigner() -> Presigner {
        Presigner::from_config(&StorageConfig {
            bucket: "quiz-songs".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: Some("AKID".to_string()),
            secret_access_key: Some("SECRET".to_string()),
            expires_in_seconds: 600,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_offset_within_track() {
        let resolver = FullTrackResolver::new(None, 7);
        let mut s = song(3, "A", "B", SongSource::Youtube);
        s.duration_seconds = Some(20);

        for _ in 0..200 {
            let clip = resolver.resolve(&s).await.unwrap();
            let PlayableReference::FullTrack {
                full_url,
                start_offset_seconds,
                duration_seconds,
            } = clip
            else {
                panic!("expected a full track, got {clip:?}");
            };
            assert_eq!(full_url, "https://cdn.example.com/3.mp3");
            assert!(start_offset_seconds < 13);
            assert_eq!(duration_seconds, 7);
        }
    }

    #[tokio::test]
    async fn test_unknown_duration_starts_at_zero() {
        let resolver = FullTrackResolver::new(None, 7);
        let mut s = song(3, "A", "B", SongSource::Youtube);
        s.duration_seconds = None;

        let clip = resolver.resolve(&s).await.unwrap();

        assert!(matches!(
            clip,
            PlayableReference::FullTrack {
                start_offset_seconds: 0,
                duration_seconds: 7,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_storage_key_needs_signing() {
        let mut s = song(3, "A", "B", SongSource::S3);
        s.location = AudioLocation::StorageKey("music/a.mp3".to_string());

        let unsigned = FullTrackResolver::new(None, 7).resolve(&s).await;
        assert!(matches!(
            unsigned,
            Err(ClipError::UnsupportedLocation {
                strategy: "full_track",
                ..
            })
        ));

        let signed = FullTrackResolver::new(Some((presigner(), 600)), 7)
            .resolve(&s)
            .await
            .unwrap();
        assert!(
            signed
                .url()
                .starts_with("https://quiz-songs.s3.amazonaws.com/music/a.mp3?")
        );
        assert!(signed.url().contains("X-Amz-Expires=600"));
    }

    #[tokio::test]
    async fn test_hosted_clip_is_returned_as_is() {
        let mut s = song(3, "A", "B", SongSource::Soundcloud);
        s.externally_hosted = true;
        s.clip_url = Some("https://cdn.example.com/clips/3.mp3".to_string());

        let clip = FullTrackResolver::new(None, 7).resolve(&s).await.unwrap();

        assert_eq!(
            clip,
            PlayableReference::Url {
                url: "https://cdn.example.com/clips/3.mp3".to_string()
            }
        );
    }
}
