use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::types::KeyCode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse keyboard config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeAction {
    #[default]
    NoAction,
    InsertSpace,
    DeleteCharacter,
    DeleteWord,
    HideKeyboard,
    MoveCursorLeft,
    MoveCursorRight,
    MoveCursorUp,
    MoveCursorDown,
    ShiftLock,
    SwitchToNextSubtype,
    SwitchToPrevSubtype,
    ShowInputMethodPicker,
    Undo,
    Redo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteSwipeMode {
    None,
    #[default]
    CharactersPrecisely,
    WordsPrecisely,
    WholeWord,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeyTolerance {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for KeyTolerance {
    fn default() -> Self {
        // Vertical finger drift is far more common than horizontal drift.
        Self {
            horizontal: 0.10,
            vertical: 0.35,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub swipe_up: SwipeAction,
    pub swipe_down: SwipeAction,
    pub swipe_left: SwipeAction,
    pub swipe_right: SwipeAction,
    pub delete_key_swipe_left: DeleteSwipeMode,
    pub space_bar_swipe_left: SwipeAction,
    pub space_bar_swipe_right: SwipeAction,
    pub space_bar_swipe_up: SwipeAction,
    pub space_bar_long_press: SwipeAction,
    pub space_cursor_deadzone_units: u32,
    pub space_swipe_up_units: i32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_up: SwipeAction::ShiftLock,
            swipe_down: SwipeAction::HideKeyboard,
            swipe_left: SwipeAction::SwitchToNextSubtype,
            swipe_right: SwipeAction::SwitchToPrevSubtype,
            delete_key_swipe_left: DeleteSwipeMode::CharactersPrecisely,
            space_bar_swipe_left: SwipeAction::MoveCursorLeft,
            space_bar_swipe_right: SwipeAction::MoveCursorRight,
            space_bar_swipe_up: SwipeAction::NoAction,
            space_bar_long_press: SwipeAction::ShowInputMethodPicker,
            space_cursor_deadzone_units: 1,
            space_swipe_up_units: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub threshold_px: f32,
    pub unit_px: f32,
    pub velocity_threshold_px_per_s: f32,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            threshold_px: 48.0,
            unit_px: 12.0,
            velocity_threshold_px_per_s: 600.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlideConfig {
    pub enabled: bool,
    pub show_trail: bool,
    pub trail_duration_ms: u64,
    pub trail_radius_px: f32,
    pub detect_window_ms: u64,
    pub velocity_threshold_px_per_ms: f32,
    pub min_distance_px: f32,
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            show_trail: true,
            trail_duration_ms: 200,
            trail_radius_px: 8.0,
            detect_window_ms: 500,
            velocity_threshold_px_per_ms: 0.10,
            min_distance_px: 24.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub long_press_delay_ms: u64,
    pub popup_enabled: bool,
    pub key_tolerance: KeyTolerance,
    pub gestures: GestureConfig,
    pub swipe: SwipeConfig,
    pub glide: GlideConfig,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            long_press_delay_ms: 300,
            popup_enabled: true,
            key_tolerance: KeyTolerance::default(),
            gestures: GestureConfig::default(),
            swipe: SwipeConfig::default(),
            glide: GlideConfig::default(),
        }
    }
}

impl KeyboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: KeyboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.long_press_delay_ms == 0 {
            return Err(invalid("long_press_delay_ms", "must be greater than zero"));
        }
        if !(self.key_tolerance.horizontal >= 0.0) {
            return Err(invalid("key_tolerance.horizontal", "must not be negative"));
        }
        if !(self.key_tolerance.vertical >= 0.0) {
            return Err(invalid("key_tolerance.vertical", "must not be negative"));
        }
        if !(self.swipe.threshold_px > 0.0) {
            return Err(invalid("swipe.threshold_px", "must be positive"));
        }
        if !(self.swipe.unit_px > 0.0) {
            return Err(invalid("swipe.unit_px", "must be positive"));
        }
        if self.glide.trail_duration_ms == 0 {
            return Err(invalid("glide.trail_duration_ms", "must be greater than zero"));
        }
        Ok(())
    }

    /// Long-press delay for a key, scaled by key class.
    pub fn long_press_delay_for(&self, code: KeyCode) -> u64 {
        let base = self.long_press_delay_ms;
        match code {
            code if code.is_space() || code == KeyCode::SHIFT => base.saturating_mul(5) / 2,
            KeyCode::LANGUAGE_SWITCH => base.saturating_mul(2),
            _ => base,
        }
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
