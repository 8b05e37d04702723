//! Configuration types for the match loop bot.
//!
//! Loads settings from config.json at startup. Provides capture regions,
//! input timing, score plausibility bounds, and key bindings. Defaults are
//! tuned for a 1360x768 RPCS3 window; override via config.json to retune
//! for a different target environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<BotConfig> = OnceLock::new();

/// A screen rectangle in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Region {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/// Capture regions for the two OCR surfaces.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region where end-screen / gameplay keywords appear
    pub keyword: Region,
    /// Region covering the top box-score table (TEAM / quarters / TOTAL)
    pub box_score: Region,
    /// Larger window covering the same table, tried when the primary
    /// region fails to yield two team rows
    #[serde(default = "default_box_score_fallback")]
    pub box_score_fallback: Region,
}

fn default_box_score_fallback() -> Region {
    Region {
        top: 45,
        left: 360,
        width: 660,
        height: 200,
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            keyword: Region {
                top: 140,
                left: 280,
                width: 800,
                height: 220,
            },
            box_score: Region {
                top: 60,
                left: 420,
                width: 520,
                height: 120,
            },
            box_score_fallback: default_box_score_fallback(),
        }
    }
}

/// Open-loop input timing, all in milliseconds.
///
/// These are empirical: menu animation timing in the target emulator is
/// deterministic enough that fixed delays work, but they must be retuned
/// if the host or emulator settings change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between OCR polls while waiting for the end screen
    pub check_interval_ms: u64,
    /// Coarse poll interval while the game lock is active
    pub lock_poll_ms: u64,
    /// Gap after every completed input action
    pub input_gap_ms: u64,
    /// Press length for opening the postgame menu (Circle)
    pub menu_open_press_ms: u64,
    /// Press length for backing out one screen (Circle)
    pub back_press_ms: u64,
    /// Press length for starting the match (Start)
    pub start_press_ms: u64,
    /// Hold direction(s) this long before pressing confirm
    pub dir_hold_before_confirm_ms: u64,
    /// How long the confirm key stays down while directions are held
    pub confirm_hold_ms: u64,
    /// Keep holding directions this long after confirm is released
    pub release_after_ms: u64,
    /// Short menu settle delay
    pub settle_short_ms: u64,
    /// Long menu settle delay
    pub settle_long_ms: u64,
    /// Stick hold guaranteed to drive the cursor to one end of the list
    pub force_side_hold_ms: u64,
    /// Settle after a force-to-extreme
    pub force_settle_ms: u64,
    /// Short stick press that moves the cursor exactly one position
    /// (tune 140-240 if the center step isn't landing)
    pub step_ms: u64,
    /// Settle after a single step
    pub step_settle_ms: u64,
    /// How long L2+R2 are held to randomize the team under the cursor
    pub randomize_hold_ms: u64,
    /// Settle after a randomize
    pub randomize_settle_ms: u64,
    /// Lockout after starting a match, so mid-game OCR noise can't
    /// retrigger the postgame flow
    pub game_lock_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 5000,
            lock_poll_ms: 10_000,
            input_gap_ms: 300,
            menu_open_press_ms: 650,
            back_press_ms: 450,
            start_press_ms: 850,
            dir_hold_before_confirm_ms: 600,
            confirm_hold_ms: 550,
            release_after_ms: 250,
            settle_short_ms: 1000,
            settle_long_ms: 2000,
            force_side_hold_ms: 950,
            force_settle_ms: 450,
            step_ms: 180,
            step_settle_ms: 650,
            randomize_hold_ms: 550,
            randomize_settle_ms: 400,
            game_lock_ms: 120_000,
        }
    }
}

/// Score plausibility bounds and extraction retry budget.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Minimum plausible points for one team (5-minute quarters typical)
    pub min_score: u32,
    /// Hard ceiling guardrail
    pub max_score: u32,
    /// Minimum plausible combined points
    pub min_total: u32,
    /// Extra OCR attempts when the parse looks wrong
    pub max_rechecks: u32,
    /// Delay between recheck attempts
    pub recheck_delay_ms: u64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            min_score: 20,
            max_score: 150,
            min_total: 50,
            max_rechecks: 2,
            recheck_delay_ms: 600,
        }
    }
}

/// Key bindings matching the emulator's keyboard mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Cross
    pub confirm: String,
    /// Circle
    pub back: String,
    /// Start
    pub start: String,
    pub l2: String,
    pub r2: String,
    /// Left stick directions
    pub stick_up: String,
    pub stick_down: String,
    pub stick_left: String,
    pub stick_right: String,
    /// Operator stop key, polled once per controller loop iteration
    pub kill: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            confirm: "x".to_string(),
            back: "c".to_string(),
            start: "enter".to_string(),
            l2: "r".to_string(),
            r2: "t".to_string(),
            stick_up: "w".to_string(),
            stick_down: "s".to_string(),
            stick_left: "a".to_string(),
            stick_right: "d".to_string(),
            kill: "esc".to_string(),
        }
    }
}

/// Hysteresis settings for end-screen detection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Require this many consecutive end-screen reads before acting
    pub end_confirmations: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            end_confirmations: 3,
        }
    }
}

/// One Tesseract invocation profile.
///
/// Keyword detection and table reading need different contrast tuning:
/// the box-score table is small bright-on-dark text that only reads
/// reliably after upscaling and with a restricted character set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OcrProfile {
    /// Binarization threshold (pixels brighter than this become text)
    pub threshold: u8,
    /// Upscale factor applied before recognition (1.0 = none)
    pub scale: f32,
    /// Tesseract page segmentation mode
    pub psm: u8,
    /// Character whitelist, empty = unrestricted
    #[serde(default)]
    pub char_whitelist: String,
}

impl OcrProfile {
    /// Profile for the end-screen / gameplay keyword region.
    pub fn keyword_default() -> Self {
        Self {
            threshold: 150,
            scale: 1.0,
            psm: 6,
            char_whitelist: String::new(),
        }
    }

    /// Profile for the box-score table region.
    pub fn table_default() -> Self {
        Self {
            threshold: 170,
            scale: 2.0,
            psm: 6,
            char_whitelist: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string(),
        }
    }
}

/// OCR profiles for the two capture surfaces.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "OcrProfile::keyword_default")]
    pub keyword: OcrProfile,
    #[serde(default = "OcrProfile::table_default")]
    pub table: OcrProfile,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keyword: OcrProfile::keyword_default(),
            table: OcrProfile::table_default(),
        }
    }
}

/// Complete bot configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub regions: RegionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub scores: ScoreConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// Loads configuration from config.json or returns defaults.
/// Looks for config.json in the same directory as the executable.
fn load_config() -> BotConfig {
    let config_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf());

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    BotConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static BotConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = BotConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: BotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.scores.min_score, 20);
        assert_eq!(parsed.timing.game_lock_ms, 120_000);
        assert_eq!(parsed.keys.confirm, "x");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: BotConfig =
            serde_json::from_str(r#"{"scores": {"min_score": 10, "max_score": 200, "min_total": 30, "max_rechecks": 1, "recheck_delay_ms": 100}}"#)
                .unwrap();
        assert_eq!(parsed.scores.min_score, 10);
        // Untouched sections fall back to defaults
        assert_eq!(parsed.detection.end_confirmations, 3);
        assert_eq!(parsed.ocr.table.scale, 2.0);
    }

    #[test]
    fn test_region_deserializes_from_json() {
        let r: Region =
            serde_json::from_str(r#"{"top": 60, "left": 420, "width": 520, "height": 120}"#)
                .unwrap();
        assert_eq!(r.top, 60);
        assert_eq!(r.width, 520);
    }
}
