use crate::clip_resolver::{hosted_reference, unsupported};
use crate::ports::catalog::{AudioLocation, Song};
use crate::ports::clip::{ClipError, ClipResolver, PlayableReference};

/// Hands out the song's clip URL, or its track URL, unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectResolver;

#[async_trait::async_trait]
impl ClipResolver for DirectResolver {
    async fn resolve(&self, song: &Song) -> Result<PlayableReference, ClipError> {
        if let Some(reference) = hosted_reference(song) {
            return Ok(reference);
        }

        if let Some(url) = &song.clip_url {
            return Ok(PlayableReference::Url { url: url.clone() });
        }

        match &song.location {
            AudioLocation::Url(url) => Ok(PlayableReference::Url { url: url.clone() }),
            _ => Err(unsupported(song, "direct")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::catalog::SongSource;
    use crate::test_utils::song;

    #[tokio::test]
    async fn test_clip_url_wins() {
        let mut s = song(1, "A", "B", SongSource::S3);
        s.clip_url = Some("https://cdn.example.com/clip.mp3".to_string());

        let clip = DirectResolver.resolve(&s).await.unwrap();

        assert_eq!(clip.url(), "https://cdn.example.com/clip.mp3");
    }

    #[tokio::test]
    async fn test_storage_key_is_unsupported() {
        let mut s = song(1, "A", "B", SongSource::S3);
        s.location = AudioLocation::StorageKey("music/a.mp3".to_string());

        let result = DirectResolver.resolve(&s).await;

        assert!(matches!(
            result,
            Err(ClipError::UnsupportedLocation {
                song_id: 1,
                strategy: "direct",
                kind: "storage key"
            })
        ));
    }
}
