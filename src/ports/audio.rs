use std::path::Path;

use color_eyre::eyre::Result;

/// Port over the external audio tooling (ffprobe / ffmpeg).
///
/// Implementations live in `ffmpeg` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AudioTool: Send + Sync {
    /// Length of the audio file in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Cuts `length_seconds` of audio starting at `start_seconds` into `destination`.
    async fn extract_clip(
        &self,
        source: &Path,
        destination: &Path,
        start_seconds: u32,
        length_seconds: f64,
    ) -> Result<()>;
}
