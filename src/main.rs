//! SkyMatch: a 6x6 swap-to-match puzzle with levels, lives and a timer, in the terminal.

mod anim;
mod app;
mod audio;
mod board;
mod effects;
mod engine;
mod highscores;
mod input;
mod matcher;
mod progression;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::PathBuf;

/// Options derived from CLI that affect the match engine.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub start_level: u32,
    pub lives: u32,
    /// Keep re-rolling the starting board until it holds no match.
    pub strict_start: bool,
    /// Fixed RNG seed for reproducible boards.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_level: 1,
            lives: progression::START_LIVES,
            strict_start: false,
            seed: None,
        }
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            start_level: args.start_level,
            lives: args.lives,
            strict_start: args.strict_start,
            seed: args.seed,
        }
    }
}

/// The terminal belongs to the UI, so logs only go to a file when asked for.
fn init_logging(path: Option<&std::path::Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("initialising logger")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mode = if args.light {
        theme::Mode::Light
    } else {
        theme::Mode::Dark
    };
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette, mode) {
        Ok(theme) => theme,
        Err(e) => {
            warn!("theme not loaded, using built-in colours: {}", e);
            let mut theme = theme::Theme::default();
            theme.apply_palette(args.palette);
            theme.mode = mode;
            theme
        }
    };
    let config = GameConfig::from(&args);
    info!("starting with {:?}", config);
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// SkyMatch: swap neighbouring tiles to line up three or more.
#[derive(Debug, Parser)]
#[command(
    name = "skymatch",
    version,
    about = "SkyMatch: a 6x6 match-3 puzzle in the terminal. Swap neighbours, line up three or more, beat 20 levels against the clock.",
    long_about = "SkyMatch is a terminal match-3 game.\n\n\
        Select a tile, then an adjacent one to swap them. Swaps that line up three or more \
        identical icons clear them; anything else is swapped back. Clearing scores points, \
        tiles above fall and new ones drop in. Reach each level's target before the timer \
        runs out, or lose a life.\n\n\
        CONTROLS:\n  Mouse click / Enter / Space  Tap tile     Arrows or hjkl  Move cursor\n  \
        P  Pause    R  Restart    Q / Esc  Quit to menu (exit from menu)\n  \
        M  Light/dark mode    S  Sound on/off    ?  How to play\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses built-in colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette for icons: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Start in light mode (toggle with M).
    #[arg(long)]
    pub light: bool,

    /// Draw icons as letters instead of emoji (for terminals without emoji fonts).
    #[arg(long)]
    pub ascii: bool,

    /// RNG seed for reproducible boards.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Level to start at.
    #[arg(long, default_value = "1", value_name = "N",
          value_parser = clap::value_parser!(u32).range(1..=i64::from(progression::TOTAL_LEVELS)))]
    pub start_level: u32,

    /// Lives at the start of a run.
    #[arg(long, default_value_t = progression::START_LIVES, value_name = "N",
          value_parser = clap::value_parser!(u32).range(1..=99))]
    pub lives: u32,

    /// Re-roll the starting board until it has no ready-made matches (default: a single pass).
    #[arg(long)]
    pub strict_start: bool,

    /// Disable tweens and fades; every transition completes instantly.
    #[arg(long)]
    pub no_animation: bool,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Start with sound off (toggle with S).
    #[arg(long)]
    pub mute: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to FILE (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["skymatch"]);
        let config = GameConfig::from(&args);
        assert_eq!(config.start_level, 1);
        assert_eq!(config.lives, 5);
        assert!(!config.strict_start);
        assert_eq!(config.seed, None);
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn test_start_level_range_is_enforced() {
        assert!(Args::try_parse_from(["skymatch", "--start-level", "20"]).is_ok());
        assert!(Args::try_parse_from(["skymatch", "--start-level", "0"]).is_err());
        assert!(Args::try_parse_from(["skymatch", "--start-level", "21"]).is_err());
        assert!(Args::try_parse_from(["skymatch", "--lives", "0"]).is_err());
    }

    #[test]
    fn test_palette_aliases() {
        let args = Args::parse_from(["skymatch", "--palette", "colourblind", "--seed", "9"]);
        assert_eq!(args.palette, Palette::Colorblind);
        assert_eq!(GameConfig::from(&args).seed, Some(9));
    }
}
