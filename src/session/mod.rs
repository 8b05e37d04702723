//! Session controller: the top-level match loop state machine.
//!
//! The controller sees its collaborators through three narrow traits so
//! state transitions can be driven in tests with scripted screens, canned
//! extractions, and a recording menu driver, without real timing or I/O.

pub mod state;

#[cfg(windows)]
pub mod runner;

use anyhow::Result;

use crate::boxscore::{BoxScoreExtractor, Extraction};
use crate::capture::ScreenGrabber;
use crate::choreo::Choreographer;
use crate::input::KeyInjector;
use crate::ocr::TextRecognizer;
use crate::perception::{PerceptionService, ScreenSample};

pub use state::{SessionContext, SessionState};

/// Produces keyword-region samples.
pub trait Perceiver {
    fn sample(&mut self) -> Result<ScreenSample>;
}

impl<G: ScreenGrabber, R: TextRecognizer> Perceiver for PerceptionService<G, R> {
    fn sample(&mut self) -> Result<ScreenSample> {
        PerceptionService::sample(self)
    }
}

/// Produces box-score extractions.
pub trait ScoreSource {
    fn extract(&mut self) -> Extraction;
}

impl<G: ScreenGrabber, R: TextRecognizer> ScoreSource for BoxScoreExtractor<G, R> {
    fn extract(&mut self) -> Extraction {
        BoxScoreExtractor::extract(self)
    }
}

/// Runs the named menu-navigation sequences.
pub trait MenuDriver {
    fn open_postgame_menu(&mut self) -> Result<()>;
    fn open_game_stats(&mut self) -> Result<()>;
    fn open_box_score(&mut self) -> Result<()>;
    fn back_one_screen(&mut self) -> Result<()>;
    fn confirm_quit(&mut self) -> Result<()>;
    fn enter_quick_game(&mut self) -> Result<()>;
    fn randomize_and_start(&mut self) -> Result<()>;
}

impl<I: KeyInjector> MenuDriver for Choreographer<I> {
    fn open_postgame_menu(&mut self) -> Result<()> {
        Choreographer::open_postgame_menu(self)
    }
    fn open_game_stats(&mut self) -> Result<()> {
        Choreographer::open_game_stats(self)
    }
    fn open_box_score(&mut self) -> Result<()> {
        Choreographer::open_box_score(self)
    }
    fn back_one_screen(&mut self) -> Result<()> {
        Choreographer::back_one_screen(self)
    }
    fn confirm_quit(&mut self) -> Result<()> {
        Choreographer::confirm_quit(self)
    }
    fn enter_quick_game(&mut self) -> Result<()> {
        Choreographer::enter_quick_game(self)
    }
    fn randomize_and_start(&mut self) -> Result<()> {
        Choreographer::randomize_and_start(self)
    }
}
