//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours used by the board, sidebar and game-over screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Settled blocks and the falling piece.
    pub block: Color,
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, lines).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Game-over banner background.
    pub alert: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            block: Color::Rgb(0xE0, 0x6C, 0x75),
            bg: Color::Rgb(0x00, 0x00, 0x00),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            alert: Color::Rgb(0xBE, 0x50, 0x46),
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Missing path means built-in defaults; a missing key falls back to its default.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let defaults = Self::default();
        let get = |keys: &[&str], fallback: Color| -> Result<Color, ThemeError> {
            match keys.iter().find_map(|k| map.get(*k)) {
                Some(v) => parse_hex(v),
                None => Ok(fallback),
            }
        };
        Ok(Self {
            block: get(&["block", "cpu_end"], defaults.block)?,
            bg: get(&["main_bg", "meter_bg"], defaults.bg)?,
            div_line: get(&["div_line"], defaults.div_line)?,
            main_fg: get(&["main_fg"], defaults.main_fg)?,
            title: get(&["title"], defaults.title)?,
            alert: get(&["alert", "temp_end"], defaults.alert)?,
        })
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let digits = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.trim().to_string());
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match digits.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#ÿÿÿ"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#31353F""##);
        assert_eq!(map.get("main_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_parse_theme_skips_comments_and_noise() {
        let map = parse_theme_file("# comment\n\nfoo=bar\ntheme[title]='#E5C07B'\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("title"), Some(&"#E5C07B".to_string()));
    }

    #[test]
    fn test_from_map_falls_back_per_key() {
        let map = parse_theme_file(r##"theme[block]="#00FF00""##);
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.block, Color::Rgb(0, 255, 0));
        assert_eq!(theme.bg, Theme::default().bg);
    }

    #[test]
    fn test_from_map_reports_bad_colour() {
        let map = parse_theme_file(r##"theme[block]="red""##);
        assert!(matches!(Theme::from_map(&map), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_load_without_path_is_default() {
        assert_eq!(Theme::load(None).unwrap(), Theme::default());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("blocktris-no-such-theme.theme");
        assert!(matches!(Theme::load(Some(&path)), Err(ThemeError::Io(_))));
    }
}
