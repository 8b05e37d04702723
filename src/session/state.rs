//! The match-loop state machine.
//!
//! One `step()` call performs one state's work and at most one transition.
//! The operator stop flag is checked once at the top of each step and never
//! mid-sequence: an in-flight input sequence always runs to completion so
//! the game's menus and our state stay consistent.

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{DetectionConfig, TimingConfig};
use crate::perception::{classify, ScreenClass};
use crate::results::{append_result, GameResult};
use crate::session::{MenuDriver, Perceiver, ScoreSource};

/// Session controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Polling the screen, waiting for the end-of-match screen
    AwaitingEnd,
    /// End screen confirmed; opening the postgame menu
    OpeningPostgameMenu,
    /// Postgame menu is up; decide whether to log stats or quit out
    PostgameHub,
    /// Navigating to the box score, extracting and logging the result
    LoggingStats,
    /// Quitting out of the finished match
    ConfirmingQuit,
    /// Entering quick-game setup, randomizing teams, starting the match
    QuickGameSetup,
    /// Match is loading/playing; screen polling suppressed by the lock
    MatchRunning,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::AwaitingEnd => write!(f, "Awaiting end screen"),
            SessionState::OpeningPostgameMenu => write!(f, "Opening postgame menu"),
            SessionState::PostgameHub => write!(f, "Postgame hub"),
            SessionState::LoggingStats => write!(f, "Logging stats"),
            SessionState::ConfirmingQuit => write!(f, "Confirming quit"),
            SessionState::QuickGameSetup => write!(f, "Quick game setup"),
            SessionState::MatchRunning => write!(f, "Match running"),
        }
    }
}

/// Session controller context: all mutable session state plus the
/// capability objects, owned by a single instance and threaded through
/// every step. Nothing here is global.
pub struct SessionContext<P, S, M> {
    pub state: SessionState,
    /// Consecutive end-screen classifications since the last reset
    end_hits: u32,
    /// When the post-start lockout expires; None outside MatchRunning
    game_lock_until: Option<Instant>,
    /// Whether this match's stats have been logged already
    stats_logged: bool,
    /// Last used result sequence number (recovered from the CSV on start)
    games_played: u32,

    perception: P,
    scores: S,
    menu: M,

    timing: TimingConfig,
    detection: DetectionConfig,
    csv_path: PathBuf,
    stop: Arc<AtomicBool>,
}

impl<P: Perceiver, S: ScoreSource, M: MenuDriver> SessionContext<P, S, M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        perception: P,
        scores: S,
        menu: M,
        timing: TimingConfig,
        detection: DetectionConfig,
        csv_path: PathBuf,
        games_played: u32,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            state: SessionState::AwaitingEnd,
            end_hits: 0,
            game_lock_until: None,
            stats_logged: false,
            games_played,
            perception,
            scores,
            menu,
            timing,
            detection,
            csv_path,
            stop,
        }
    }

    /// Number of results logged so far (monotonic, persisted).
    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` on operator stop.
    /// Errors only surface from the menu driver (a failed key injection);
    /// perception and extraction failures degrade instead of propagating.
    pub fn step(&mut self) -> Result<bool> {
        if self.stop.load(Ordering::SeqCst) {
            crate::log("Stop requested, halting session loop");
            return Ok(false);
        }

        match self.state {
            SessionState::AwaitingEnd => self.step_awaiting_end(),
            SessionState::OpeningPostgameMenu => {
                self.menu.open_postgame_menu()?;
                self.sleep_ms(self.timing.settle_short_ms);
                self.state = SessionState::PostgameHub;
                Ok(true)
            }
            SessionState::PostgameHub => {
                self.state = if !self.stats_logged {
                    SessionState::LoggingStats
                } else {
                    SessionState::ConfirmingQuit
                };
                Ok(true)
            }
            SessionState::LoggingStats => self.step_logging_stats(),
            SessionState::ConfirmingQuit => {
                self.menu.confirm_quit()?;
                self.sleep_ms(self.timing.settle_long_ms);
                self.state = SessionState::QuickGameSetup;
                Ok(true)
            }
            SessionState::QuickGameSetup => {
                self.menu.enter_quick_game()?;
                self.sleep_ms(self.timing.settle_long_ms);
                self.menu.randomize_and_start()?;

                self.game_lock_until =
                    Some(Instant::now() + Duration::from_millis(self.timing.game_lock_ms));
                self.state = SessionState::MatchRunning;
                crate::log(&format!(
                    "Match started, locked for {}s",
                    self.timing.game_lock_ms / 1000
                ));
                Ok(true)
            }
            SessionState::MatchRunning => self.step_match_running(),
        }
    }

    fn step_awaiting_end(&mut self) -> Result<bool> {
        let class = match self.perception.sample() {
            Ok(sample) => {
                crate::log(&format!("OCR: {}", sample.text));
                classify(&sample.text)
            }
            Err(e) => {
                // A failed capture/OCR poll is just noise; treat it like
                // an unreadable frame
                crate::log(&format!("Perception poll failed: {}", e));
                ScreenClass::Unknown
            }
        };

        match class {
            ScreenClass::Gameplay => {
                self.end_hits = 0;
            }
            ScreenClass::EndScreen => {
                self.end_hits += 1;
                crate::log(&format!(
                    "End screen hit {}/{}",
                    self.end_hits, self.detection.end_confirmations
                ));
                if self.end_hits >= self.detection.end_confirmations {
                    self.end_hits = 0;
                    self.stats_logged = false;
                    self.state = SessionState::OpeningPostgameMenu;
                    return Ok(true);
                }
            }
            ScreenClass::Unknown => {
                self.end_hits = 0;
            }
        }

        self.sleep_ms(self.timing.check_interval_ms);
        Ok(true)
    }

    fn step_logging_stats(&mut self) -> Result<bool> {
        self.menu.open_game_stats()?;
        self.sleep_ms(self.timing.settle_short_ms);

        self.menu.open_box_score()?;
        self.sleep_ms(self.timing.settle_short_ms);

        self.games_played += 1;
        let extraction = self.scores.extract();

        if !extraction.plausible {
            crate::log("Box score extraction implausible; logging best effort");
        }

        let result = GameResult {
            game_number: self.games_played,
            timestamp: Local::now(),
            team_a: extraction.team_a,
            score_a: extraction.score_a,
            team_b: extraction.team_b,
            score_b: extraction.score_b,
            raw_text: extraction.raw_text,
        };

        crate::log(&format!(
            "Game #{}: {} {} - {} {}",
            result.game_number,
            result.team_a.as_deref().unwrap_or("?"),
            result.score_a.map(|s| s.to_string()).unwrap_or_else(|| "?".into()),
            result.team_b.as_deref().unwrap_or("?"),
            result.score_b.map(|s| s.to_string()).unwrap_or_else(|| "?".into()),
        ));

        // A write failure is surfaced but the match still counts as
        // logged, otherwise the loop would retry forever
        if let Err(e) = append_result(&self.csv_path, &result) {
            crate::log(&format!("Failed to append result row: {}", e));
        }

        self.menu.back_one_screen()?;
        self.sleep_ms(self.timing.settle_short_ms);

        self.stats_logged = true;
        self.state = SessionState::PostgameHub;
        Ok(true)
    }

    fn step_match_running(&mut self) -> Result<bool> {
        match self.game_lock_until {
            Some(until) if Instant::now() < until => {
                self.sleep_ms(self.timing.lock_poll_ms);
            }
            Some(_) => {
                crate::log("Game lock expired, watching for end screen");
                self.game_lock_until = None;
                self.end_hits = 0;
                self.stats_logged = false;
                self.state = SessionState::AwaitingEnd;
            }
            None => {
                // Shouldn't happen: MatchRunning always sets the lock.
                // Reset rather than crash.
                self.recover();
            }
        }
        Ok(true)
    }

    /// Resets to AwaitingEnd with counters cleared, after a short delay.
    fn recover(&mut self) {
        crate::log(&format!(
            "Inconsistent session state ({}), resetting to AwaitingEnd",
            self.state
        ));
        self.sleep_ms(self.timing.settle_long_ms);
        self.end_hits = 0;
        self.game_lock_until = None;
        self.state = SessionState::AwaitingEnd;
    }
}
