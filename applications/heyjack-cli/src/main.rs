/// Hey Jack - command-line player driver
use anyhow::Context;
use clap::{Parser, Subcommand};
use heyjack_cli::{
    config::AppConfig,
    format::{format_duration, status_line},
    script::parse_script,
    session_file::load_session,
    tracks::tracks_from_paths,
    PlayOptions,
};
use heyjack_playback::RepeatMode;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "heyjack")]
#[command(about = "Hey Jack playback engine driver", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "HEYJACK_CONFIG")]
    config: Option<PathBuf>,

    /// Session file, overrides session.path from the configuration
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play tracks through the simulated backend
    Play {
        /// Audio files to queue; the saved queue is used when empty
        tracks: Vec<PathBuf>,

        /// Index of the first track to play
        #[arg(short, long, default_value_t = 0)]
        start: usize,

        /// Steps to apply, e.g. "play,wait:5,next,status"
        #[arg(long, default_value = "play,status")]
        script: String,

        /// Volume (0.0-1.0)
        #[arg(long)]
        volume: Option<f32>,

        /// Repeat mode: off, all or one
        #[arg(long)]
        repeat: Option<RepeatMode>,

        /// Shuffle on or off
        #[arg(long)]
        shuffle: Option<bool>,

        /// Seed for reproducible shuffling
        #[arg(long)]
        seed: Option<u64>,

        /// Fail when a track file does not exist
        #[arg(long)]
        strict_paths: bool,
    },
    /// Show the saved session
    Session,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heyjack_cli=info,heyjack_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.session.is_some() {
        config.session.path = cli.session;
    }

    match cli.command {
        Commands::Play {
            tracks,
            start,
            script,
            volume,
            repeat,
            shuffle,
            seed,
            strict_paths,
        } => {
            if seed.is_some() {
                config.playback.shuffle_seed = seed;
            }
            config.validate()?;

            let tracks = tracks_from_paths(&tracks, strict_paths)?;
            if tracks.is_empty() && config.session.path.is_none() {
                anyhow::bail!("nothing to play: pass track files or a --session to restore");
            }

            let options = PlayOptions {
                tracks,
                start_index: start,
                steps: parse_script(&script)?,
                volume,
                repeat,
                shuffle,
            };
            let mut stdout = std::io::stdout();
            let snapshot = heyjack_cli::run_player(&config, options, &mut stdout).await?;
            println!("{}", status_line(&snapshot));
        }
        Commands::Session => {
            let path = config
                .session
                .path
                .context("no session file configured (use --session or session.path)")?;
            match load_session(&path)? {
                Some(session) => {
                    println!(
                        "volume {:.0}%  repeat {:?}  shuffle {}",
                        session.volume * 100.0,
                        session.repeat,
                        session.shuffle
                    );
                    for (index, track) in session.tracks.iter().enumerate() {
                        let marker = if session.cursor == Some(index) { ">" } else { " " };
                        println!(
                            "{marker} {:>3}. {} - {} [{}]",
                            index + 1,
                            track.artist,
                            track.title,
                            format_duration(track.duration_secs())
                        );
                    }
                }
                None => println!("no saved session at {}", path.display()),
            }
        }
    }

    Ok(())
}
