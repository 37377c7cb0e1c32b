use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clip_resolver::{ClipWindow, hosted_reference, unsupported};
use crate::ports::audio::AudioTool;
use crate::ports::catalog::{AudioLocation, Song};
use crate::ports::clip::{ClipError, ClipResolver, PlayableReference};

const CLIP_PREFIX: &str = "clip_";
const PARTIAL_PREFIX: &str = ".clip_";

/// Cuts clips out of local files and serves them from a cache directory.
///
/// Each clip is written to `<clips_dir>/clip_<song id>.mp3` and removed once the
/// retention window has passed since it was written. A clip still on disk is handed
/// out again without re-extracting.
///
/// ffmpeg writes into a temporary file next to the cache that is renamed into place
/// only on success, so a visible `clip_<id>.mp3` is always complete.
pub struct ExtractResolver<A: AudioTool> {
    tool: A,
    clips_dir: PathBuf,
    public_base_url: String,
    clip_seconds: u32,
    retention: Duration,
}

pub fn clip_file_name(song_id: i64) -> String {
    format!("{CLIP_PREFIX}{song_id}.mp3")
}

/// Removes clips and partial extractions left in `directory` by an earlier run.
pub fn purge_cached_clips(directory: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let is_clip = name.starts_with(CLIP_PREFIX) && name.ends_with(".mp3");
        if !(is_clip || name.starts_with(PARTIAL_PREFIX)) || !entry.file_type()?.is_file() {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(removed)
}

impl<A: AudioTool> ExtractResolver<A> {
    pub fn new(
        tool: A,
        clips_dir: PathBuf,
        public_base_url: String,
        clip_seconds: u32,
        retention: Duration,
    ) -> Self {
        Self {
            tool,
            clips_dir,
            public_base_url,
            clip_seconds,
            retention,
        }
    }

    fn clip_url(&self, song_id: i64) -> String {
        format!(
            "{}/assets/clips/{}",
            self.public_base_url,
            clip_file_name(song_id)
        )
    }

    async fn extract(&self, song: &Song, source: &Path, clip_path: &Path) -> Result<(), ClipError> {
        let failed = |err: color_eyre::Report| ClipError::ExtractionFailed {
            song_id: song.id,
            reason: format!("{err:#}"),
        };

        let duration = self.tool.probe_duration(source).await.map_err(failed)?;
        let window = ClipWindow::pick(
            Some(duration),
            self.clip_seconds,
            &mut StdRng::from_entropy(),
        );

        // Dropped, and so deleted, unless the extraction succeeds
        let partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .suffix(".mp3")
            .tempfile_in(&self.clips_dir)?;

        self.tool
            .extract_clip(
                source,
                partial.path(),
                window.start_seconds,
                window.length_seconds,
            )
            .await
            .map_err(failed)?;

        partial
            .persist(clip_path)
            .map_err(|err| ClipError::Io(err.error))?;

        tracing::info!(
            "Extracted {:.3}s clip for song {} at {}s",
            window.length_seconds,
            song.id,
            window.start_seconds
        );
        Ok(())
    }

    fn schedule_cleanup(&self, clip_path: PathBuf, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_file(&clip_path).await {
                Ok(()) => tracing::debug!("Removed expired clip {}", clip_path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => tracing::warn!(
                    "Failed to remove expired clip {}: {}",
                    clip_path.display(),
                    err
                ),
            }
        });
    }
}

#[async_trait::async_trait]
impl<A: AudioTool> ClipResolver for ExtractResolver<A> {
    #[tracing::instrument(skip(self, song), fields(song_id = song.id))]
    async fn resolve(&self, song: &Song) -> Result<PlayableReference, ClipError> {
        if let Some(reference) = hosted_reference(song) {
            return Ok(reference);
        }

        let AudioLocation::LocalFile(source) = &song.location else {
            return Err(unsupported(song, "extract"));
        };

        if !tokio::fs::try_exists(source).await? {
            return Err(ClipError::MissingFile(source.clone()));
        }

        let clip_path = self.clips_dir.join(clip_file_name(song.id));
        match tokio::fs::metadata(&clip_path).await {
            Ok(metadata) => {
                tracing::debug!("Reusing cached clip {}", clip_path.display());
                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|modified| modified.elapsed().ok())
                    .unwrap_or_default();
                self.schedule_cleanup(clip_path, self.retention.saturating_sub(age));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.extract(song, source, &clip_path).await?;
                self.schedule_cleanup(clip_path, self.retention);
            }
            Err(err) => return Err(err.into()),
        }

        Ok(PlayableReference::Url {
            url: self.clip_url(song.id),
        })
    }
}
