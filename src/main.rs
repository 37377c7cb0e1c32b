mod clip_resolver;
mod config;
mod database;
mod entities;
mod ffmpeg;
mod http_server;
mod import_songs;
mod logging;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config, database::Database, ffmpeg::Ffmpeg, import_songs::import_directory,
    logging::init_tracing, ports::audio::AudioTool, ports::catalog::SongSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "SONG_QUIZ_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `info` or `song_quiz=debug,tower_http=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP collector endpoint to export traces to
    #[arg(long, env = "OTLP_ENDPOINT", global = true)]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn is_directory(s: &str) -> Result<PathBuf, String> {
    let p: PathBuf = s.into();
    if p.is_dir() {
        Ok(p)
    } else {
        Err(format!("`{}` is not an existing directory", s))
    }
}

fn parse_source(s: &str) -> Result<SongSource, String> {
    match s.to_lowercase().as_str() {
        "youtube" => Ok(SongSource::Youtube),
        "soundcloud" => Ok(SongSource::Soundcloud),
        "s3" => Ok(SongSource::S3),
        _ => Err(format!(
            "`{}` is not a song source (youtube, soundcloud, s3)",
            s
        )),
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a folder of audio files into the song catalog
    Import {
        /// The folder to import
        #[arg(short, long, value_parser = is_directory)]
        input: PathBuf,

        /// Where the files came from; decides how file names are parsed
        #[arg(short, long, value_parser = parse_source)]
        source: SongSource,

        /// Skip probing durations with ffprobe
        #[arg(long)]
        no_probe: bool,
    },
    /// Serve the quiz HTTP API
    Serve {
        /// The port to run the server on, overriding the config file
        #[arg(short, long, env = "SONG_QUIZ_HTTP_PORT")]
        port: Option<u16>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        "song-quiz",
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = run(args).await;

    if let Some(provider) = tracer_provider
        && let Err(err) = provider.shutdown()
    {
        eprintln!("Failed to flush traces: {err}");
    }

    result
}

async fn run(args: Args) -> Result<()> {
    if let Commands::Config(config_commands) = &args.command {
        match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        }
        return Ok(());
    }

    log::debug!("Loading configuration");
    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load song-quiz config")?;

    let database = Database::open(&config.database_path()).await?;

    match args.command {
        Commands::Import {
            input,
            source,
            no_probe,
        } => {
            let ffmpeg = if no_probe {
                None
            } else {
                Ffmpeg::locate()
                    .inspect_err(|e| log::warn!("Durations will not be probed: {}", e))
                    .ok()
            };
            let summary = import_directory(
                &database,
                &input,
                source,
                ffmpeg.as_ref().map(|tool| tool as &dyn AudioTool),
            )
            .await?;
            println!(
                "Added {}, already present {}, errors {}",
                summary.added, summary.existing, summary.errors
            );
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            log::info!("Starting HTTP server on port: {}", config.server.port);
            http_server::app::start(database, config).await?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
