use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use tokio::process::Command;

use crate::ports::audio::AudioTool;

/// `AudioTool` backed by the `ffprobe` and `ffmpeg` binaries on the PATH.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Ffmpeg {
    pub fn locate() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| {
            eyre!("ffmpeg not found in PATH. Please install ffmpeg and ensure it's available.")
        })?;
        let ffprobe = which::which("ffprobe").map_err(|_| {
            eyre!("ffprobe not found in PATH. Please install ffmpeg and ensure it's available.")
        })?;
        Ok(Self { ffmpeg, ffprobe })
    }
}

fn parse_probe_output(stdout: &str) -> Result<f64> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| eyre!("ffprobe returned no duration"))?;
    let duration: f64 = line
        .parse()
        .wrap_err_with(|| format!("ffprobe returned an invalid duration: {line}"))?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(eyre!("ffprobe returned an invalid duration: {line}"));
    }
    Ok(duration)
}

#[async_trait::async_trait]
impl AudioTool for Ffmpeg {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await
            .wrap_err("Failed to run ffprobe")?;

        if !output.status.success() {
            return Err(eyre!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn extract_clip(
        &self,
        source: &Path,
        destination: &Path,
        start_seconds: u32,
        length_seconds: f64,
    ) -> Result<()> {
        tracing::debug!(
            "Extracting {:.3}s from {} at {}s",
            length_seconds,
            source.display(),
            start_seconds
        );

        let output = Command::new(&self.ffmpeg)
            .arg("-y")
            .args(["-ss", &start_seconds.to_string()])
            .args(["-t", &format!("{length_seconds:.3}")])
            .arg("-i")
            .arg(source)
            .args(["-vn", "-acodec", "libmp3lame", "-q:a", "2"])
            .arg(destination)
            .output()
            .await
            .wrap_err("Failed to run ffmpeg")?;

        if !output.status.success() {
            return Err(eyre!(
                "ffmpeg failed on {}: {}",
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_probe_output("183.452000\n").unwrap(), 183.452);
        assert_eq!(parse_probe_output("\n  42\n").unwrap(), 42.0);
    }

    #[test]
    fn test_parse_probe_output_invalid() {
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("N/A").is_err());
        assert!(parse_probe_output("-3.0").is_err());
    }
}
