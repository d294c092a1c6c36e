use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const DEFAULT_INCREMENT: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 0;
pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("Invalid hex color regex")
});

/// User-editable counter settings.
///
/// Serialized field names (`bgColor`, `vibration`, ...) are the on-disk
/// format and must not change. Missing fields fall back to their defaults so
/// records written by older versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "increment_or_default")]
    pub increment: i64,

    /// Ceiling for the count; values <= 0 mean unlimited.
    #[serde(deserialize_with = "limit_or_default")]
    pub limit: i64,

    #[serde(rename = "bgColor")]
    pub background_color: String,

    #[serde(rename = "textColor")]
    pub text_color: String,

    #[serde(rename = "vibration")]
    pub vibration_enabled: bool,

    #[serde(rename = "sound")]
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            increment: DEFAULT_INCREMENT,
            limit: DEFAULT_LIMIT,
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            vibration_enabled: true,
            sound_enabled: false,
        }
    }
}

impl Settings {
    /// Whether a ceiling is enforced at all.
    pub fn has_limit(&self) -> bool {
        self.limit > 0
    }

    /// Apply a single typed update.
    pub fn apply(&mut self, update: SettingUpdate) {
        match update {
            SettingUpdate::Increment(value) => self.increment = value,
            SettingUpdate::Limit(value) => self.limit = value,
            SettingUpdate::BackgroundColor(value) => self.background_color = value,
            SettingUpdate::TextColor(value) => self.text_color = value,
            SettingUpdate::Vibration(value) => self.vibration_enabled = value,
            SettingUpdate::Sound(value) => self.sound_enabled = value,
        }
    }

    /// Background color for rendering, default black when unparseable.
    pub fn background_rgb(&self) -> Rgb {
        Rgb::parse(&self.background_color).unwrap_or(Rgb::BLACK)
    }

    /// Text color for rendering, default white when unparseable.
    pub fn text_rgb(&self) -> Rgb {
        Rgb::parse(&self.text_color).unwrap_or(Rgb::WHITE)
    }
}

/// Integers in legacy records may be numbers, numeric strings or `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientInteger {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LenientInteger>::deserialize(deserializer)?;
    Ok(match raw {
        Some(LenientInteger::Integer(value)) => Some(value),
        Some(LenientInteger::Float(value)) if value.is_finite() => Some(value.trunc() as i64),
        Some(LenientInteger::Text(text)) => parse_integer(&text).ok(),
        _ => None,
    })
}

fn increment_or_default<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_integer(deserializer)?.unwrap_or(DEFAULT_INCREMENT))
}

fn limit_or_default<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_integer(deserializer)?.unwrap_or(DEFAULT_LIMIT))
}

/// Parse user-entered integer text, ignoring surrounding whitespace.
pub fn parse_integer(text: &str) -> Result<i64, SettingError> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| SettingError::InvalidInteger(trimmed.to_string()))
}

/// Errors raised while turning raw field input into a [`SettingUpdate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    #[error("Not a whole number: {0:?}")]
    InvalidInteger(String),

    #[error("Setting {0} expects a boolean value")]
    ExpectedBoolean(SettingKey),
}

/// Keys of the editable settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Increment,
    Limit,
    BackgroundColor,
    TextColor,
    Vibration,
    Sound,
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKey::Increment => "increment",
            SettingKey::Limit => "limit",
            SettingKey::BackgroundColor => "bgColor",
            SettingKey::TextColor => "textColor",
            SettingKey::Vibration => "vibration",
            SettingKey::Sound => "sound",
        };
        f.write_str(name)
    }
}

/// A validated change to one setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    Increment(i64),
    Limit(i64),
    BackgroundColor(String),
    TextColor(String),
    Vibration(bool),
    Sound(bool),
}

impl SettingUpdate {
    /// Build an update from raw text entered for `key`.
    ///
    /// Integer keys are parsed, colors are taken verbatim, booleans accept
    /// `true`/`false`.
    pub fn parse(key: SettingKey, raw: &str) -> Result<Self, SettingError> {
        match key {
            SettingKey::Increment => parse_integer(raw).map(SettingUpdate::Increment),
            SettingKey::Limit => parse_integer(raw).map(SettingUpdate::Limit),
            SettingKey::BackgroundColor => Ok(SettingUpdate::BackgroundColor(raw.to_string())),
            SettingKey::TextColor => Ok(SettingUpdate::TextColor(raw.to_string())),
            SettingKey::Vibration => parse_bool(key, raw).map(SettingUpdate::Vibration),
            SettingKey::Sound => parse_bool(key, raw).map(SettingUpdate::Sound),
        }
    }

    pub fn key(&self) -> SettingKey {
        match self {
            SettingUpdate::Increment(_) => SettingKey::Increment,
            SettingUpdate::Limit(_) => SettingKey::Limit,
            SettingUpdate::BackgroundColor(_) => SettingKey::BackgroundColor,
            SettingUpdate::TextColor(_) => SettingKey::TextColor,
            SettingUpdate::Vibration(_) => SettingKey::Vibration,
            SettingUpdate::Sound(_) => SettingKey::Sound,
        }
    }
}

fn parse_bool(key: SettingKey, raw: &str) -> Result<bool, SettingError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SettingError::ExpectedBoolean(key)),
    }
}

/// An 8-bit RGB color parsed from `#rgb` or `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !HEX_COLOR.is_match(text) {
            return None;
        }

        let digits = &text[1..];
        let channel = |hex: &str| u8::from_str_radix(hex, 16).ok();

        if digits.len() == 3 {
            // #abc expands to #aabbcc
            let mut expanded = digits.chars().map(|c| {
                let pair: String = [c, c].iter().collect();
                channel(&pair)
            });
            Some(Self::new(expanded.next()??, expanded.next()??, expanded.next()??))
        } else {
            Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ))
        }
    }
}
