//! Screen perception: keyword-region sampling and classification.
//!
//! One OCR pass over the configured keyword region produces a normalized
//! text sample; a pure classifier maps it to one of three screen states.
//! Single misreads are expected and absorbed upstream by the session
//! controller's confirmation counter.

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::capture::ScreenGrabber;
use crate::config::{OcrProfile, Region};
use crate::ocr::TextRecognizer;

/// Keywords that only ever appear on the post-match wrap-up screen.
const END_KEYWORDS: &[&str] = &[
    "GAMEREEL",
    "GMOMENTS",
    "PRESSBOOK",
    "GAMEWRAPUP",
    "WRAPUP",
    "GAMESTATS",
];

/// Strong in-play indicators: venue names, overlay action words, and team
/// abbreviations that show up in the score bug. These cover cutaway shots
/// where the clock isn't visible.
const GAMEPLAY_SIGNALS: &[&str] = &[
    "ARENA", "CENTER", "PARK", "ORACLE", "GARDEN", "STAPLES", "DEFENSE", "OFFENSE", "REBOUND",
    "FOUL", "SHOT", "POR", "LAL", "BOS", "NYK", "MIA", "CHI",
];

/// Classification of one OCR read of the keyword region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenClass {
    EndScreen,
    Gameplay,
    Unknown,
}

impl std::fmt::Display for ScreenClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenClass::EndScreen => write!(f, "EndScreen"),
            ScreenClass::Gameplay => write!(f, "Gameplay"),
            ScreenClass::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One captured-and-recognized frame of the keyword region.
/// Created per poll and discarded right after classification.
#[derive(Debug, Clone)]
pub struct ScreenSample {
    pub text: String,
    pub captured_at: DateTime<Local>,
}

/// Classifies normalized (uppercased, space-stripped) keyword-region text.
///
/// End-of-match keywords are checked first: they are unambiguous, and a
/// gameplay signal word appearing in the same garbled read must not mask a
/// genuine end screen. The `:` fallback catches frames where no keyword is
/// legible but the game clock is rendered.
pub fn classify(text: &str) -> ScreenClass {
    if END_KEYWORDS.iter().any(|k| text.contains(k)) {
        return ScreenClass::EndScreen;
    }

    if GAMEPLAY_SIGNALS.iter().any(|k| text.contains(k)) || text.contains(':') {
        return ScreenClass::Gameplay;
    }

    ScreenClass::Unknown
}

/// Capture + OCR for the keyword region.
pub struct PerceptionService<G, R> {
    grabber: G,
    recognizer: R,
    region: Region,
    profile: OcrProfile,
}

impl<G: ScreenGrabber, R: TextRecognizer> PerceptionService<G, R> {
    pub fn new(grabber: G, recognizer: R, region: Region, profile: OcrProfile) -> Self {
        Self {
            grabber,
            recognizer,
            region,
            profile,
        }
    }

    /// Captures the keyword region and returns its normalized text.
    pub fn sample(&mut self) -> Result<ScreenSample> {
        let img = self.grabber.grab(&self.region)?;
        let raw = self.recognizer.recognize(&img, &self.profile)?;

        Ok(ScreenSample {
            text: raw.replace(' ', "").trim().to_string(),
            captured_at: Local::now(),
        })
    }
}
