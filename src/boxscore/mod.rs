//! Box-score extraction: capture, table OCR, parsing, plausibility gating.
//!
//! The extractor is best-effort by contract. It retries through a fallback
//! capture region and a bounded recheck budget, but it always hands the
//! controller *something* to log, even if that is a pair of empty fields
//! plus the raw diagnostic text for later human audit.

pub mod rows;
pub mod teams;

use std::time::Duration;

use crate::capture::ScreenGrabber;
use crate::config::{OcrProfile, Region, ScoreConfig};
use crate::ocr::TextRecognizer;
use rows::{parse_rows, pick_top_two};

/// Outcome of one extraction, plausible or not.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub team_a: Option<String>,
    pub score_a: Option<u32>,
    pub team_b: Option<String>,
    pub score_b: Option<u32>,
    /// Concatenated raw OCR text from every attempt, for auditing
    pub raw_text: String,
    /// Whether the scores passed the plausibility gate
    pub plausible: bool,
}

impl Extraction {
    fn empty(raw_text: String) -> Self {
        Self {
            team_a: None,
            score_a: None,
            team_b: None,
            score_b: None,
            raw_text,
            plausible: false,
        }
    }
}

/// True when both scores sit inside the configured bounds and their sum
/// clears the combined minimum. Guards against half-read tables producing
/// rows like "LAKERS 2".
pub fn scores_plausible(s1: u32, s2: u32, cfg: &ScoreConfig) -> bool {
    if s1 < cfg.min_score || s2 < cfg.min_score {
        return false;
    }
    if s1 > cfg.max_score || s2 > cfg.max_score {
        return false;
    }
    if s1 + s2 < cfg.min_total {
        return false;
    }
    true
}

/// Extracts (team, total) pairs from the on-screen box-score table.
pub struct BoxScoreExtractor<G, R> {
    grabber: G,
    recognizer: R,
    primary: Region,
    fallback: Region,
    profile: OcrProfile,
    scores: ScoreConfig,
}

impl<G: ScreenGrabber, R: TextRecognizer> BoxScoreExtractor<G, R> {
    pub fn new(
        grabber: G,
        recognizer: R,
        primary: Region,
        fallback: Region,
        profile: OcrProfile,
        scores: ScoreConfig,
    ) -> Self {
        Self {
            grabber,
            recognizer,
            primary,
            fallback,
            profile,
            scores,
        }
    }

    /// Captures and OCRs one region with the table profile, returning
    /// line-preserving normalized text. Capture or OCR failure degrades to
    /// empty text; the caller's retry budget handles it.
    fn read_region(&mut self, region: &Region) -> String {
        let img = match self.grabber.grab(region) {
            Ok(img) => img,
            Err(e) => {
                crate::log(&format!("Box score capture failed: {}", e));
                return String::new();
            }
        };

        let raw = match self.recognizer.recognize(&img, &self.profile) {
            Ok(text) => text,
            Err(e) => {
                crate::log(&format!("Box score OCR failed: {}", e));
                return String::new();
            }
        };

        // Common dropped-T miss on the column label
        let raw = raw.replace("OTAL", "TOTAL").replace("TTOTAL", "TOTAL");

        // Collapse whitespace per line but keep line breaks: the parser
        // works row by row
        raw.lines()
            .map(|ln| ln.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|ln| !ln.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parses one region's text into a (team, score, team, score) pair.
    fn parse_pair(raw: &str) -> Option<(String, u32, String, u32)> {
        let rows = parse_rows(raw).ok()?;
        let (a, b) = pick_top_two(rows)?;
        Some((a.team, a.total, b.team, b.total))
    }

    /// Runs the full pipeline: primary region, then the fallback region
    /// whenever the primary read fails to parse or fails the plausibility
    /// gate, under a bounded recheck budget. Keeps the most recent
    /// non-empty parse as the best-effort answer and returns it even when
    /// the gate never passes.
    pub fn extract(&mut self) -> Extraction {
        let mut best: Option<(String, u32, String, u32)> = None;
        let mut diagnostics = String::new();

        let primary = self.primary;
        let fallback = self.fallback;

        for attempt in 0..=self.scores.max_rechecks {
            let raw = self.read_region(&primary);
            let mut combined = raw.clone();
            let mut pair = Self::parse_pair(&raw);
            let mut ok = pair
                .as_ref()
                .is_some_and(|(_, s1, _, s2)| scores_plausible(*s1, *s2, &self.scores));

            if !ok {
                // Taller/wider window over the same table; catches the
                // second team row slipping out of the primary crop and
                // half-cropped rows that parse but fail the gate
                let raw2 = self.read_region(&fallback);
                combined = format!("{} || FALLBACK || {}", raw, raw2);
                let pair2 = Self::parse_pair(&raw2);
                let ok2 = pair2
                    .as_ref()
                    .is_some_and(|(_, s1, _, s2)| scores_plausible(*s1, *s2, &self.scores));
                if ok2 || pair.is_none() {
                    pair = pair2;
                    ok = ok2;
                }
            }

            if !diagnostics.is_empty() {
                diagnostics.push_str(" || RETRY || ");
            }
            diagnostics.push_str(&combined);

            if let Some((t1, s1, t2, s2)) = pair {
                best = Some((t1.clone(), s1, t2.clone(), s2));

                if ok {
                    return Extraction {
                        team_a: Some(t1),
                        score_a: Some(s1),
                        team_b: Some(t2),
                        score_b: Some(s2),
                        raw_text: diagnostics,
                        plausible: true,
                    };
                }
            }

            if attempt < self.scores.max_rechecks {
                crate::log(&format!(
                    "Implausible/missing box score, rechecking ({}/{})",
                    attempt + 1,
                    self.scores.max_rechecks
                ));
                std::thread::sleep(Duration::from_millis(self.scores.recheck_delay_ms));
            }
        }

        match best {
            Some((t1, s1, t2, s2)) => Extraction {
                team_a: Some(t1),
                score_a: Some(s1),
                team_b: Some(t2),
                score_b: Some(s2),
                raw_text: diagnostics,
                plausible: false,
            },
            None => Extraction::empty(diagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use image::RgbaImage;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Grabber that tags each image with the region it was asked for, so
    /// the fake recognizer can serve region-specific scripts.
    struct TaggingGrabber;

    impl ScreenGrabber for TaggingGrabber {
        fn grab(&mut self, region: &Region) -> Result<RgbaImage> {
            // Encode the region width in the image width for routing
            Ok(RgbaImage::new(region.width, 1))
        }
    }

    /// Recognizer that replays scripted text, keyed on image width
    /// (primary vs fallback region).
    struct ScriptedRecognizer {
        primary: RefCell<VecDeque<String>>,
        fallback: RefCell<VecDeque<String>>,
        primary_width: u32,
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, img: &RgbaImage, _profile: &OcrProfile) -> Result<String> {
            let queue = if img.width() == self.primary_width {
                &self.primary
            } else {
                &self.fallback
            };
            Ok(queue.borrow_mut().pop_front().unwrap_or_default())
        }
    }

    fn test_regions() -> (Region, Region) {
        let primary = Region {
            top: 60,
            left: 420,
            width: 520,
            height: 120,
        };
        let fallback = Region {
            top: 45,
            left: 360,
            width: 660,
            height: 200,
        };
        (primary, fallback)
    }

    fn make_extractor(
        primary_texts: &[&str],
        fallback_texts: &[&str],
    ) -> BoxScoreExtractor<TaggingGrabber, ScriptedRecognizer> {
        let (primary, fallback) = test_regions();
        let recognizer = ScriptedRecognizer {
            primary: RefCell::new(primary_texts.iter().map(|s| s.to_string()).collect()),
            fallback: RefCell::new(fallback_texts.iter().map(|s| s.to_string()).collect()),
            primary_width: primary.width,
        };
        let scores = ScoreConfig {
            recheck_delay_ms: 0,
            ..ScoreConfig::default()
        };
        BoxScoreExtractor::new(
            TaggingGrabber,
            recognizer,
            primary,
            fallback,
            OcrProfile::table_default(),
            scores,
        )
    }

    #[test]
    fn test_scores_plausible_bounds() {
        let cfg = ScoreConfig::default();
        assert!(scores_plausible(90, 85, &cfg));
        assert!(!scores_plausible(10, 90, &cfg)); // below min_score
        assert!(!scores_plausible(90, 200, &cfg)); // above max_score
        assert!(!scores_plausible(20, 20, &cfg)); // sum below min_total
        assert!(scores_plausible(20, 30, &cfg)); // exactly at min_total
    }

    #[test]
    fn test_extract_two_valid_rows_ignores_header() {
        let raw = "TEAM 1ST 2ND 3RD 4TH TOTAL\nLAKERS 28 30 26 24 0\nCELTICS 25 22 27 21 95";
        let mut ex = make_extractor(&[raw], &[]);
        let result = ex.extract();

        assert!(result.plausible);
        let teams = [result.team_a.unwrap(), result.team_b.unwrap()];
        assert!(teams.contains(&"LAKERS".to_string()));
        assert!(teams.contains(&"CELTICS".to_string()));
        // LAKERS total corrected from dropped 0 to quarter sum
        let scores = [result.score_a.unwrap(), result.score_b.unwrap()];
        assert!(scores.contains(&108));
        assert!(scores.contains(&95));
    }

    #[test]
    fn test_extract_falls_back_to_wider_region() {
        // Primary only catches one row; fallback catches both
        let primary = "LAKERS 28 30 26 24 108";
        let fallback = "LAKERS 28 30 26 24 108\nCELTICS 25 22 27 21 95";
        let mut ex = make_extractor(&[primary], &[fallback]);
        let result = ex.extract();

        assert!(result.plausible);
        assert!(result.raw_text.contains("|| FALLBACK ||"));
        assert_eq!(result.score_a.unwrap() + result.score_b.unwrap(), 203);
    }

    #[test]
    fn test_extract_implausible_primary_tries_fallback_same_attempt() {
        // Half-cropped primary parses but fails the gate; the wider window
        // shows the full rows and must be consulted before any recheck
        let cropped = "LAKERS 2 3 1 2 8\nCELTICS 1 2 2 2 7";
        let full = "LAKERS 28 30 26 24 108\nCELTICS 25 22 27 21 95";
        let mut ex = make_extractor(&[cropped], &[full]);
        let result = ex.extract();

        assert!(result.plausible);
        assert!(result.raw_text.contains("|| FALLBACK ||"));
        // No retry needed: the fallback rescued the first attempt
        assert!(!result.raw_text.contains("|| RETRY ||"));
        assert_eq!(result.score_a.unwrap() + result.score_b.unwrap(), 203);
    }

    #[test]
    fn test_extract_exhausted_budget_still_returns() {
        // Three attempts (1 + 2 rechecks), all garbage on both regions
        let mut ex = make_extractor(
            &["??", "??", "??"],
            &["noise", "noise", "noise"],
        );
        let result = ex.extract();

        assert!(!result.plausible);
        assert!(result.team_a.is_none());
        assert!(result.score_a.is_none());
        assert!(!result.raw_text.is_empty());
        assert!(result.raw_text.contains("|| RETRY ||"));
    }

    #[test]
    fn test_extract_keeps_best_effort_implausible_parse() {
        // Rows parse but never pass the gate: still reported, unflagged
        let raw = "LAKERS 2 3 1 2 8\nCELTICS 1 2 2 2 7";
        let mut ex = make_extractor(&[raw, raw, raw], &["", "", ""]);
        let result = ex.extract();

        assert!(!result.plausible);
        // Longer exact roster hit ranks first
        assert_eq!(result.team_a.as_deref(), Some("CELTICS"));
        assert_eq!(result.score_a, Some(7));
        assert_eq!(result.team_b.as_deref(), Some("LAKERS"));
        assert_eq!(result.score_b, Some(8));
    }

    #[test]
    fn test_extract_recovers_on_second_attempt() {
        let good = "LAKERS 28 30 26 24 108\nCELTICS 25 22 27 21 95";
        let mut ex = make_extractor(&["garbage", good], &["", ""]);
        let result = ex.extract();

        assert!(result.plausible);
        assert!(result.raw_text.contains("|| RETRY ||"));
    }
}
