//! Blocktris: a minimal falling-block puzzle game in the terminal.

mod app;
mod arena;
mod game;
mod game_loop;
mod input;
mod piece;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Narrowest arena that still fits the I piece.
const MIN_WIDTH: u16 = 4;
const MIN_HEIGHT: u16 = 2;
const MAX_DIMENSION: u16 = 64;
const MIN_FRAME_RATE: f64 = 1.0;
const MAX_FRAME_RATE: f64 = 1000.0;

/// Validated settings the game runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub drop_interval: Duration,
    pub frame_duration: Duration,
    pub seed: Option<u64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("width must be between {min} and {max} columns, got {0}", min = MIN_WIDTH, max = MAX_DIMENSION)]
    Width(u16),
    #[error("height must be between {min} and {max} rows, got {0}", min = MIN_HEIGHT, max = MAX_DIMENSION)]
    Height(u16),
    #[error("drop interval must be greater than zero")]
    DropInterval,
    #[error("frame rate must be between {min} and {max}, got {0}", min = MIN_FRAME_RATE, max = MAX_FRAME_RATE)]
    FrameRate(f64),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if !(MIN_WIDTH..=MAX_DIMENSION).contains(&args.width) {
            return Err(ConfigError::Width(args.width));
        }
        if !(MIN_HEIGHT..=MAX_DIMENSION).contains(&args.height) {
            return Err(ConfigError::Height(args.height));
        }
        if args.drop_interval_ms == 0 {
            return Err(ConfigError::DropInterval);
        }
        if !(MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&args.frame_rate) {
            return Err(ConfigError::FrameRate(args.frame_rate));
        }
        Ok(Self {
            width: args.width as usize,
            height: args.height as usize,
            drop_interval: Duration::from_millis(args.drop_interval_ms),
            frame_duration: Duration::from_secs_f64(1.0 / args.frame_rate),
            seed: args.seed,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.log_level)?;
    let config = GameConfig::from_args(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|err| {
        tracing::warn!(%err, "theme not loaded, using defaults");
        theme::Theme::default()
    });
    tracing::info!(?config, "starting");
    let mut app = App::new(config, theme);
    app.run()
}

/// Logs go to a file only; the terminal belongs to the game.
fn init_logging(path: Option<&Path>, level: LogLevel) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(tracing::Level::from(level))
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialising logging: {err}"))
}

/// Minimal falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktris",
    version,
    about = "Minimal falling-block puzzle game in the terminal. Fill rows to clear them.",
    long_about = "Blocktris is a minimal falling-block puzzle game.\n\n\
        Pieces fall one row per drop interval. Steer them left and right, drop them faster, \
        and fill complete rows to clear them. Clearing several rows at once doubles the points \
        for each extra row (10, 20, 40, 80). The game ends when a new piece has no room.\n\n\
        CONTROLS:\n  Left/h   Move left    Right/l  Move right    Down/j  Soft drop\n  \
        R        Restart (after game over)    Q / Esc  Quit"
)]
pub struct Args {
    /// Arena width in columns.
    #[arg(long, default_value = "12", value_name = "COLS")]
    pub width: u16,

    /// Arena height in rows.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Time between automatic one-row drops.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub drop_interval_ms: u64,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Seed for the piece sequence; random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Built-in colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Write logs to this file. Nothing is logged without it.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Most verbose level written to the log file.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(argv: &[&str]) -> Result<GameConfig, ConfigError> {
        let args = Args::try_parse_from(std::iter::once("blocktris").chain(argv.iter().copied()))
            .expect("arguments parse");
        GameConfig::from_args(&args)
    }

    #[test]
    fn defaults_match_classic_arena() {
        let config = config(&[]).unwrap();
        assert_eq!((config.width, config.height), (12, 20));
        assert_eq!(config.drop_interval, Duration::from_millis(1000));
        assert_eq!(config.seed, None);
        assert!(config.frame_duration > Duration::from_millis(16));
        assert!(config.frame_duration < Duration::from_millis(17));
    }

    #[test]
    fn custom_values() {
        let config = config(&[
            "--width",
            "10",
            "--height",
            "24",
            "--drop-interval-ms",
            "500",
            "--frame-rate",
            "20",
            "--seed",
            "99",
        ])
        .unwrap();
        assert_eq!((config.width, config.height), (10, 24));
        assert_eq!(config.drop_interval, Duration::from_millis(500));
        assert_eq!(config.frame_duration, Duration::from_millis(50));
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn rejects_arena_too_narrow_for_i_piece() {
        assert_eq!(config(&["--width", "3"]), Err(ConfigError::Width(3)));
        assert_eq!(config(&["--width", "65"]), Err(ConfigError::Width(65)));
        assert_eq!(config(&["--height", "1"]), Err(ConfigError::Height(1)));
    }

    #[test]
    fn rejects_zero_interval_and_bad_frame_rate() {
        assert_eq!(
            config(&["--drop-interval-ms", "0"]),
            Err(ConfigError::DropInterval)
        );
        assert_eq!(
            config(&["--frame-rate", "0"]),
            Err(ConfigError::FrameRate(0.0))
        );
        assert!(matches!(
            config(&["--frame-rate", "NaN"]),
            Err(ConfigError::FrameRate(_))
        ));
    }

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::Width(3).to_string(),
            "width must be between 4 and 64 columns, got 3"
        );
        assert_eq!(
            ConfigError::FrameRate(0.5).to_string(),
            "frame rate must be between 1 and 1000, got 0.5"
        );
    }

    #[test]
    fn log_level_parses_and_maps() {
        let args = Args::try_parse_from(["blocktris", "--log-level", "debug"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Debug);
        assert_eq!(tracing::Level::from(args.log_level), tracing::Level::DEBUG);
        assert!(Args::try_parse_from(["blocktris", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn no_log_file_means_no_subscriber() {
        assert!(init_logging(None, LogLevel::Trace).is_ok());
    }
}
