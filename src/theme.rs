//! Colours for tiles and the surrounding chrome, optionally overridden by a btop-style theme file.
//! Icon colours plus a dark and a light surface; `M` flips between them at runtime.

use crate::Palette;
use crate::board::Icon;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dark,
    Light,
}

/// Colours for everything that is not an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub bg: Color,
    /// Tile face.
    pub tile_bg: Color,
    /// Grid / border.
    pub div_line: Color,
    pub main_fg: Color,
    pub title: Color,
    pub inactive_fg: Color,
    /// Selection outline and keyboard cursor.
    pub highlight: Color,
}

const DARK: Surface = Surface {
    bg: Color::Rgb(0x28, 0x2C, 0x34),
    tile_bg: Color::Rgb(0x31, 0x35, 0x3F),
    div_line: Color::Rgb(0x3F, 0x44, 0x4F),
    main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
    title: Color::Rgb(0xE5, 0xC0, 0x7B),
    inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
    highlight: Color::Rgb(0xFF, 0xFF, 0xFF),
};

const LIGHT: Surface = Surface {
    bg: Color::Rgb(0xE6, 0xF2, 0xFF),
    tile_bg: Color::Rgb(0xFF, 0xFF, 0xFF),
    div_line: Color::Rgb(0xA8, 0xC4, 0xE0),
    main_fg: Color::Rgb(0x24, 0x29, 0x2E),
    title: Color::Rgb(0x1F, 0x6F, 0xEB),
    inactive_fg: Color::Rgb(0x8A, 0x93, 0x9E),
    highlight: Color::Rgb(0x00, 0x00, 0x00),
};

/// Apple, grape, orange, cherry, lemon, melon, gem, star.
const ICONS: [Color; 8] = [
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0xC6, 0x78, 0xDD),
    Color::Rgb(0xD1, 0x9A, 0x66),
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0xE5, 0xC0, 0x7B),
    Color::Rgb(0x56, 0xB6, 0xC2),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xFF, 0xD1, 0x66),
];

const HIGH_CONTRAST: [Color; 8] = [
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0xFF, 0x88, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

// Tol's bright scheme; distinct without relying on red against green.
const COLORBLIND: [Color; 8] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0x00),
    Color::Rgb(0x33, 0xBB, 0xEE),
    Color::Rgb(0xBB, 0xBB, 0xBB),
];

/// Theme file keys for each icon, first match wins.
const ICON_KEYS: [&[&str]; 8] = [
    &["icon_apple", "mem_box"],
    &["icon_grape", "net_box"],
    &["icon_orange", "proc_box"],
    &["icon_cherry", "cpu_end", "temp_end"],
    &["icon_lemon", "cpu_mid"],
    &["icon_melon", "hi_fg", "proc_misc"],
    &["icon_gem", "cpu_box"],
    &["icon_star", "title"],
];

#[derive(Debug, Clone)]
pub struct Theme {
    pub icons: [Color; 8],
    pub dark: Surface,
    pub light: Surface,
    pub mode: Mode,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            icons: ICONS,
            dark: DARK,
            light: LIGHT,
            mode: Mode::Dark,
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Built-in colours are used when `path` is None or the file does not exist.
    /// The palette, when not normal, replaces the icon colours afterwards.
    pub fn load(path: Option<&Path>, palette: Palette, mode: Mode) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        theme.mode = mode;
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.icons = HIGH_CONTRAST,
            Palette::Colorblind => self.icons = COLORBLIND,
        }
    }

    /// Values that fail to parse keep the built-in colour.
    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let mut theme = Self::default();
        for (slot, keys) in theme.icons.iter_mut().zip(ICON_KEYS) {
            if let Some(color) = keys.iter().find_map(|&k| get(k)) {
                *slot = color;
            }
        }
        let dark = &mut theme.dark;
        for (key, slot) in [
            ("main_bg", &mut dark.bg),
            ("meter_bg", &mut dark.tile_bg),
            ("div_line", &mut dark.div_line),
            ("main_fg", &mut dark.main_fg),
            ("title", &mut dark.title),
            ("inactive_fg", &mut dark.inactive_fg),
            ("selected_fg", &mut dark.highlight),
        ] {
            if let Some(color) = get(key) {
                *slot = color;
            }
        }
        theme
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Dark => Mode::Light,
            Mode::Light => Mode::Dark,
        };
        self.mode
    }

    /// Surface colours for the current mode.
    pub fn surface(&self) -> &Surface {
        match self.mode {
            Mode::Dark => &self.dark,
            Mode::Light => &self.light,
        }
    }

    #[inline]
    pub fn icon_color(&self, icon: Icon) -> Color {
        self.icons[icon.index() % self.icons.len()]
    }
}

/// Collect `theme[key]=value` assignments. Comments, blank lines, malformed
/// lines and empty values are skipped; the last assignment of a key wins.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (lhs, rhs) = line.split_once('=')?;
            let key = lhs.trim().strip_prefix("theme[")?.strip_suffix(']')?.trim();
            let value = rhs.trim().trim_matches(|c: char| c == '"' || c == '\'');
            (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// `#RRGGBB` or shorthand `#RGB`, leading `#` optional.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| invalid())
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
