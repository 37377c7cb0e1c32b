//! The clip strategies a server can be configured with.
//!
//! Each strategy implements [`ClipResolver`]; [`build_clip_resolver`] picks one from the
//! config at startup.

pub mod direct;
pub mod extract;
pub mod full_track;
pub mod presign;
pub mod signed;

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use rand::Rng;

use crate::config::{ClipStrategyConfig, Config};
use crate::ffmpeg::Ffmpeg;
use crate::ports::catalog::{AudioLocation, Song};
use crate::ports::clip::{ClipError, ClipResolver, PlayableReference};

pub use direct::DirectResolver;
pub use extract::ExtractResolver;
pub use full_track::FullTrackResolver;
pub use presign::Presigner;
pub use signed::SignedUrlResolver;

/// Externally hosted songs are never processed: their pre-cut clip, or else their URL.
fn hosted_reference(song: &Song) -> Option<PlayableReference> {
    if !song.externally_hosted {
        return None;
    }
    song.clip_url
        .clone()
        .or_else(|| match &song.location {
            AudioLocation::Url(url) => Some(url.clone()),
            _ => None,
        })
        .map(|url| PlayableReference::Url { url })
}

/// The part of a track a question plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub start_seconds: u32,
    pub length_seconds: f64,
}

impl ClipWindow {
    /// Random start in `[0, D - clip)`, or 0 when the track is no longer than the clip
    /// or its duration is unknown. The length is `min(clip, D)`.
    pub fn pick<R: Rng + ?Sized>(duration: Option<f64>, clip_seconds: u32, rng: &mut R) -> Self {
        let clip = f64::from(clip_seconds);
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return Self {
                start_seconds: 0,
                length_seconds: clip,
            };
        };

        let max_start = duration - clip;
        let start_seconds = if max_start <= 0.0 {
            0
        } else {
            rng.gen_range(0..max_start.ceil() as u32)
        };

        Self {
            start_seconds,
            length_seconds: duration.min(clip),
        }
    }
}

fn location_kind_name(location: &AudioLocation) -> &'static str {
    match location {
        AudioLocation::Url(_) => "url",
        AudioLocation::StorageKey(_) => "storage key",
        AudioLocation::LocalFile(_) => "local file",
    }
}

fn unsupported(song: &Song, strategy: &'static str) -> ClipError {
    ClipError::UnsupportedLocation {
        song_id: song.id,
        strategy,
        kind: location_kind_name(&song.location),
    }
}

pub fn build_clip_resolver(config: &Config) -> Result<Arc<dyn ClipResolver>> {
    let clip_seconds = config.quiz.clip_seconds;

    let resolver: Arc<dyn ClipResolver> = match &config.clips {
        ClipStrategyConfig::Direct => Arc::new(DirectResolver),
        ClipStrategyConfig::SignedUrl(storage) => Arc::new(SignedUrlResolver::new(
            Presigner::from_config(storage).wrap_err("Failed to configure URL signing")?,
            storage.expires_in_seconds,
        )),
        ClipStrategyConfig::FullTrack { storage } => {
            let signing = storage
                .as_ref()
                .map(|storage| {
                    Presigner::from_config(storage)
                        .map(|presigner| (presigner, storage.expires_in_seconds))
                })
                .transpose()
                .wrap_err("Failed to configure URL signing")?;
            Arc::new(FullTrackResolver::new(signing, clip_seconds))
        }
        ClipStrategyConfig::Extract { .. } => {
            let directory = config
                .clips_directory()
                .ok_or_else(|| eyre!("Extract strategy without directory"))?;
            std::fs::create_dir_all(&directory).wrap_err_with(|| {
                format!("Failed to create clip directory: {}", directory.display())
            })?;
            let purged = extract::purge_cached_clips(&directory).wrap_err_with(|| {
                format!("Failed to clear clip directory: {}", directory.display())
            })?;
            if purged > 0 {
                tracing::info!("Removed {} clip(s) left by an earlier run", purged);
            }
            Arc::new(ExtractResolver::new(
                Ffmpeg::locate()?,
                directory,
                config.public_base_url(),
                clip_seconds,
                config.clip_retention()?,
            ))
        }
    };

    tracing::info!("Using {} clip strategy", strategy_name(&config.clips));
    Ok(resolver)
}

fn strategy_name(strategy: &ClipStrategyConfig) -> &'static str {
    match strategy {
        ClipStrategyConfig::Direct => "direct",
        ClipStrategyConfig::SignedUrl(_) => "signed_url",
        ClipStrategyConfig::FullTrack { .. } => "full_track",
        ClipStrategyConfig::Extract { .. } => "extract",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::catalog::SongSource;
    use crate::test_utils::song;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_clip_window_stays_inside_track() {
        let mut rng = StdRng::seed_from_u64(11);

        for duration in [7.5, 8.0, 30.0, 181.4, 600.0] {
            for _ in 0..500 {
                let window = ClipWindow::pick(Some(duration), 7, &mut rng);
                assert!(f64::from(window.start_seconds) < duration - 7.0);
                assert_eq!(window.length_seconds, 7.0);
            }
        }
    }

    #[test]
    fn test_clip_window_short_track() {
        let mut rng = StdRng::seed_from_u64(12);

        let window = ClipWindow::pick(Some(4.25), 7, &mut rng);
        assert_eq!(
            window,
            ClipWindow {
                start_seconds: 0,
                length_seconds: 4.25
            }
        );

        let exact = ClipWindow::pick(Some(7.0), 7, &mut rng);
        assert_eq!(exact.start_seconds, 0);
        assert_eq!(exact.length_seconds, 7.0);
    }

    #[test]
    fn test_clip_window_unknown_duration() {
        let mut rng = StdRng::seed_from_u64(13);

        for duration in [None, Some(0.0), Some(f64::NAN)] {
            let window = ClipWindow::pick(duration, 7, &mut rng);
            assert_eq!(window.start_seconds, 0);
            assert_eq!(window.length_seconds, 7.0);
        }
    }

    #[test]
    fn test_clip_window_reaches_late_offsets() {
        let mut rng = StdRng::seed_from_u64(14);

        let latest = (0..2000)
            .map(|_| ClipWindow::pick(Some(20.0), 7, &mut rng).start_seconds)
            .max()
            .unwrap();

        assert_eq!(latest, 12);
    }

    #[test]
    fn test_hosted_reference_prefers_clip_url() {
        let mut hosted = song(1, "A", "B", SongSource::Youtube);
        hosted.externally_hosted = true;
        hosted.clip_url = Some("https://cdn.example.com/clips/1.mp3".to_string());

        assert_eq!(
            hosted_reference(&hosted),
            Some(PlayableReference::Url {
                url: "https://cdn.example.com/clips/1.mp3".to_string()
            })
        );
    }

    #[test]
    fn test_hosted_reference_falls_back_to_url() {
        let mut hosted = song(1, "A", "B", SongSource::Youtube);
        hosted.externally_hosted = true;

        assert_eq!(
            hosted_reference(&hosted),
            Some(PlayableReference::Url {
                url: "https://cdn.example.com/1.mp3".to_string()
            })
        );
    }

    #[test]
    fn test_hosted_reference_ignores_local_songs() {
        let local = song(1, "A", "B", SongSource::S3);
        assert_eq!(hosted_reference(&local), None);

        let mut hosted_key = song(2, "A", "B", SongSource::S3);
        hosted_key.externally_hosted = true;
        hosted_key.location = AudioLocation::StorageKey("music/a.mp3".to_string());
        assert_eq!(hosted_reference(&hosted_key), None);
    }

    #[tokio::test]
    async fn test_build_direct_resolver() {
        let config = Config::default();
        let resolver = build_clip_resolver(&config).unwrap();

        let clip = resolver
            .resolve(&song(1, "A", "B", SongSource::Youtube))
            .await
            .unwrap();

        assert_eq!(clip.url(), "https://cdn.example.com/1.mp3");
    }
}
