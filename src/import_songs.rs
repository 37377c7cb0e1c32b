use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use regex::Regex;
use tracing::instrument;

use crate::database::{Database, NewSong};
use crate::ports::audio::AudioTool;
use crate::ports::catalog::{AudioLocation, SongSource};

const SUPPORTED_FILE_TYPES: [&str; 6] = ["mp3", "m4a", "flac", "ogg", "wav", "opus"];

const UNKNOWN_ARTIST: &str = "Unknown";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub existing: usize,
    pub errors: usize,
}

/// Splits file names into (title, artist) following each source's naming convention.
pub struct FilenameParser {
    dashed: Regex,
    underscored: Regex,
}

impl FilenameParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dashed: Regex::new(r"^\s*(.+?)\s+-\s+(.+?)\s*$").wrap_err("Failed to create regex")?,
            underscored: Regex::new(r"^\s*([^_]+?)\s*_\s*(.+?)\s*$")
                .wrap_err("Failed to create regex")?,
        })
    }

    /// YouTube downloads are named `Artist - Title`, SoundCloud ones `Title - Artist`
    /// and storage uploads `Title_Artist`. Anything else keeps the stem as the title.
    pub fn parse(&self, stem: &str, source: SongSource) -> (String, String) {
        let (regex, title_first) = match source {
            SongSource::Youtube => (&self.dashed, false),
            SongSource::Soundcloud => (&self.dashed, true),
            SongSource::S3 => (&self.underscored, true),
        };

        match regex.captures(stem) {
            Some(caps) => {
                let (first, second) = (caps[1].to_string(), caps[2].to_string());
                if title_first {
                    (first, second)
                } else {
                    (second, first)
                }
            }
            None => (stem.trim().to_string(), UNKNOWN_ARTIST.to_string()),
        }
    }
}

fn audio_files(directory: &Path) -> impl Iterator<Item = PathBuf> {
    walkdir::WalkDir::new(directory)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| SUPPORTED_FILE_TYPES.contains(&ext.to_lowercase().as_str()))
        })
        .map(|e| e.into_path())
}

/// Adds every audio file under `directory` to the catalog as a local file from `source`.
///
/// Songs whose title and artist are already in the catalog are skipped. When an audio
/// tool is given, each file's duration is probed and stored.
#[instrument(skip(database, audio))]
pub async fn import_directory(
    database: &Database,
    directory: &Path,
    source: SongSource,
    audio: Option<&dyn AudioTool>,
) -> Result<ImportSummary> {
    if !directory.is_dir() {
        return Err(eyre!("Not a directory: {}", directory.display()));
    }
    let directory = directory
        .canonicalize()
        .wrap_err_with(|| format!("Failed to resolve {}", directory.display()))?;

    let parser = FilenameParser::new()?;
    let mut known = database.song_keys().await?;
    let mut summary = ImportSummary::default();

    for path in audio_files(&directory) {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("Skipping file with non UTF-8 name: {}", path.display());
            summary.errors += 1;
            continue;
        };

        let (title, artist) = parser.parse(stem, source);
        if !known.insert((title.to_lowercase(), artist.to_lowercase())) {
            log::debug!("Already in catalog: '{}' by '{}'", title, artist);
            summary.existing += 1;
            continue;
        }

        let duration_seconds = match audio {
            Some(tool) => match tool.probe_duration(&path).await {
                Ok(duration) => Some(duration.round() as i32),
                Err(e) => {
                    log::warn!("Could not probe {}: {:#}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        let song = NewSong {
            title,
            artist,
            source,
            location: AudioLocation::LocalFile(path.clone()),
            clip_url: None,
            externally_hosted: false,
            duration_seconds,
        };

        match database.insert_song(song).await {
            Ok(_) => summary.added += 1,
            Err(e) => {
                log::warn!("Error importing {}: {:#}", path.display(), e);
                summary.errors += 1;
            }
        }
    }

    log::info!(
        "Import complete: {} added, {} already present, {} errors",
        summary.added,
        summary.existing,
        summary.errors
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::audio::MockAudioTool;
    use crate::services::song::SongService;
    use crate::test_utils::{new_song, test_db};
    use tempfile::TempDir;

    fn parse(stem: &str, source: SongSource) -> (String, String) {
        FilenameParser::new().unwrap().parse(stem, source)
    }

    fn pair(title: &str, artist: &str) -> (String, String) {
        (title.to_string(), artist.to_string())
    }

    #[test]
    fn test_parse_youtube() {
        assert_eq!(
            parse("Queen - Bohemian Rhapsody", SongSource::Youtube),
            pair("Bohemian Rhapsody", "Queen")
        );
        assert_eq!(
            parse("a-ha - Take On Me", SongSource::Youtube),
            pair("Take On Me", "a-ha")
        );
    }

    #[test]
    fn test_parse_soundcloud() {
        assert_eq!(
            parse("Midnight City - M83", SongSource::Soundcloud),
            pair("Midnight City", "M83")
        );
    }

    #[test]
    fn test_parse_storage_upload() {
        assert_eq!(
            parse("Yellow_Coldplay", SongSource::S3),
            pair("Yellow", "Coldplay")
        );
        assert_eq!(
            parse("Lose Yourself_Eminem_remastered", SongSource::S3),
            pair("Lose Yourself", "Eminem_remastered")
        );
    }

    #[test]
    fn test_parse_unrecognised_name() {
        assert_eq!(
            parse("track01", SongSource::Youtube),
            pair("track01", "Unknown")
        );
        assert_eq!(
            parse("No Separator Here", SongSource::S3),
            pair("No Separator Here", "Unknown")
        );
    }

    #[tokio::test]
    async fn test_import_directory() {
        let db = test_db().await;
        db.insert_song(new_song("Hello", "Adele", SongSource::Youtube))
            .await
            .unwrap();

        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("Adele - Hello.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("Nirvana - Lithium.mp3"), b"").unwrap();
        std::fs::write(nested.join("Pixies - Debaser.MP3"), b"").unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"").unwrap();

        let summary = import_directory(&db, dir.path(), SongSource::Youtube, None)
            .await
            .unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                added: 2,
                existing: 1,
                errors: 0
            }
        );

        let songs = SongService::new(db).list().await.unwrap();
        let lithium = songs.iter().find(|s| s.title == "Lithium").unwrap();
        assert_eq!(lithium.artist, "Nirvana");
        assert_eq!(lithium.source, SongSource::Youtube);
        let AudioLocation::LocalFile(path) = &lithium.location else {
            panic!("expected a local file, got {:?}", lithium.location);
        };
        assert!(path.is_absolute());
        assert!(path.ends_with("Nirvana - Lithium.mp3"));
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let db = test_db().await;
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Yellow_Coldplay.mp3"), b"").unwrap();

        let first = import_directory(&db, dir.path(), SongSource::S3, None)
            .await
            .unwrap();
        let second = import_directory(&db, dir.path(), SongSource::S3, None)
            .await
            .unwrap();

        assert_eq!(first.added, 1);
        assert_eq!(second.added, 0);
        assert_eq!(second.existing, 1);
    }

    #[tokio::test]
    async fn test_import_probes_duration() {
        let db = test_db().await;
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Creep - Radiohead.mp3"), b"").unwrap();
        let mut tool = MockAudioTool::new();
        tool.expect_probe_duration()
            .times(1)
            .returning(|_| Ok(238.6));

        import_directory(&db, dir.path(), SongSource::Soundcloud, Some(&tool))
            .await
            .unwrap();

        let songs = SongService::new(db).list().await.unwrap();
        assert_eq!(songs[0].duration_seconds, Some(239));
    }

    #[tokio::test]
    async fn test_import_rejects_missing_directory() {
        let db = test_db().await;

        let result =
            import_directory(&db, Path::new("/definitely/not/here"), SongSource::S3, None).await;

        assert!(result.is_err());
    }
}
