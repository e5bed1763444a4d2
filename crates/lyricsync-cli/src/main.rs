//! LyricSync CLI
//!
//! Headless access to the lyric timing engine: inspect a track's reconciled
//! lines, stamp times, and convert to and from LRC.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lyricsync_lib::core::cache::ReadCache;
use lyricsync_lib::core::lyrics::{export_lrc, parse_lrc, LrcMetadata, LyricLine};
use lyricsync_lib::core::persistence::prepare_save;
use lyricsync_lib::core::playback::{AudioClock, ManualClock, PlaybackMatcher};
use lyricsync_lib::core::reconcile::{
    find_prior_authorship_line, reconcile_with_stats, split_content, ReconcileStats,
};
use lyricsync_lib::core::settings::{EngineSettings, SettingsManager};
use lyricsync_lib::core::sources::{FileTextSource, FileTimingStore, TimingStore};
use lyricsync_lib::{SyncSession, TimeField, TrackKey};

// =============================================================================
// Arguments
// =============================================================================

#[derive(Parser)]
#[command(name = "lyricsync", version, about = "Line-level lyric timing tools")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Storage root for texts and timings (overrides settings)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct TrackArgs {
    album: String,
    track: String,
    lang: String,
}

impl TrackArgs {
    fn key(&self) -> TrackKey {
        TrackKey::new(&self.album, &self.track, &self.lang)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Open a track and print its reconciled lines
    Show {
        #[command(flatten)]
        track: TrackArgs,
    },
    /// Reconcile a text file against saved timings without touching storage
    Reconcile {
        /// Lyric text file
        #[arg(long)]
        text: PathBuf,
        /// JSON array of previously saved lines
        #[arg(long)]
        timings: Option<PathBuf>,
        /// Authorship string to append
        #[arg(long, default_value = "")]
        authorship: String,
    },
    /// Print the line to highlight at a playback time
    Active {
        /// JSON array of timed lines
        #[arg(long)]
        timings: PathBuf,
        /// Playback position in seconds
        #[arg(long)]
        time: f64,
        /// Treat the player as playing
        #[arg(long)]
        playing: bool,
        /// Authorship string (excluded from the "anything synced" check)
        #[arg(long)]
        authorship: Option<String>,
    },
    /// Stamp a line's start or end time and save
    Stamp {
        #[command(flatten)]
        track: TrackArgs,
        /// Line index
        #[arg(long)]
        index: usize,
        #[arg(long, value_enum, default_value_t = FieldArg::Start)]
        field: FieldArg,
        /// Time to stamp, in seconds
        #[arg(long)]
        time: f64,
        /// Track duration in seconds, if known
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Export a track's lines as LRC
    ExportLrc {
        #[command(flatten)]
        track: TrackArgs,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace a track's timings with the contents of an LRC file
    ImportLrc {
        #[command(flatten)]
        track: TrackArgs,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Start,
    End,
}

impl From<FieldArg> for TimeField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Start => TimeField::Start,
            FieldArg::End => TimeField::End,
        }
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => SettingsManager::from_path(path.clone()),
        None => SettingsManager::default_location(),
    }
    .load();
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| settings.resolved_root_dir());

    match &cli.command {
        Command::Show { track } => {
            let (session, _) = file_session(&root, &settings);
            open(&session, track.key()).await?;
            print_lines(&session.snapshot().lines, cli.json)
        }
        Command::Reconcile {
            text,
            timings,
            authorship,
        } => {
            let raw = std::fs::read_to_string(text)
                .with_context(|| format!("Failed to read {}", text.display()))?;
            let previous = match timings {
                Some(path) => read_lines(path)?,
                None => Vec::new(),
            };
            let prior = find_prior_authorship_line(&previous, authorship).cloned();
            let result =
                reconcile_with_stats(&split_content(&raw), &previous, authorship, prior.as_ref());

            if cli.json {
                print_json(&ReconcileOutput {
                    lines: &result.lines,
                    stats: &result.stats,
                })
            } else {
                print_lines(&result.lines, false)?;
                eprintln!(
                    "reused {}, unsynced {}, dropped {}{}",
                    result.stats.reused,
                    result.stats.unsynced,
                    result.stats.dropped,
                    if result.stats.fast_path { " (positional)" } else { "" }
                );
                Ok(())
            }
        }
        Command::Active {
            timings,
            time,
            playing,
            authorship,
        } => {
            let lines = read_lines(timings)?;
            let matcher = PlaybackMatcher::new(settings.playback.start_guard_sec);
            let index = matcher.active_index(&lines, authorship.as_deref(), *time, *playing);

            if cli.json {
                print_json(&index)
            } else {
                match index {
                    Some(i) => println!("{}\t{}", i, lines[i].text),
                    None => println!("none"),
                }
                Ok(())
            }
        }
        Command::Stamp {
            track,
            index,
            field,
            time,
            duration,
        } => {
            let (session, clock) = file_session(&root, &settings);
            if let Some(duration) = duration {
                clock.set_duration(*duration);
            }
            open(&session, track.key()).await?;

            clock.seek(*time);
            session.set_line_time(*index, (*field).into())?;
            session.save().await?;
            info!(key = %track.key(), index, "line stamped");

            print_lines(&session.snapshot().lines, cli.json)
        }
        Command::ExportLrc {
            track,
            artist,
            title,
            output,
        } => {
            let (session, _) = file_session(&root, &settings);
            open(&session, track.key()).await?;

            let metadata = LrcMetadata {
                artist: artist.clone(),
                title: title.clone(),
                language: Some(track.lang.clone()),
            };
            let lrc = export_lrc(&session.snapshot().lines, &metadata);
            match output {
                Some(path) => std::fs::write(path, lrc)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", lrc),
            }
            Ok(())
        }
        Command::ImportLrc { track, file } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let lines = parse_lrc(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let key = track.key();
            key.validate()?;
            let store = FileTimingStore::new(&root);
            let authorship = store.load_authorship(&key).await?.unwrap_or_default();
            store
                .save(&key, &prepare_save(&lines, &authorship))
                .await?
                .into_result()?;
            store.invalidate_cache(&key).await;
            info!(%key, lines = lines.len(), "imported LRC");

            print_lines(&lines, cli.json)
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Helpers
// =============================================================================

fn file_session(root: &Path, settings: &EngineSettings) -> (SyncSession, Arc<ManualClock>) {
    let cache_enabled = settings.storage.cache_enabled;
    let text_source = FileTextSource::with_cache(root, ReadCache::with_enabled(cache_enabled));
    let timing_store = FileTimingStore::with_cache(root, ReadCache::with_enabled(cache_enabled));
    let clock = Arc::new(ManualClock::new());

    let session = SyncSession::with_settings(
        Arc::new(text_source),
        Arc::new(timing_store),
        clock.clone(),
        settings,
    );
    (session, clock)
}

async fn open(session: &SyncSession, key: TrackKey) -> Result<()> {
    let outcome = session.open(key.clone()).await?;
    if !outcome.is_committed() {
        bail!("Load of {} was superseded", key);
    }
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<LyricLine>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid timings in {}", path.display()))
}

#[derive(Serialize)]
struct ReconcileOutput<'a> {
    lines: &'a [LyricLine],
    stats: &'a ReconcileStats,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[LyricLine], json: bool) -> Result<()> {
    if json {
        return print_json(lines);
    }
    for (i, line) in lines.iter().enumerate() {
        let end = line
            .end_time
            .map(format_time)
            .unwrap_or_else(|| "--:--.--".to_string());
        println!("{:>3}  {} - {}  {}", i, format_time(line.start_time), end, line.text);
    }
    Ok(())
}

fn format_time(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    format!(
        "{:02}:{:02}.{:02}",
        centis / 6000,
        (centis % 6000) / 100,
        centis % 100
    )
}
