//! Windows wiring for the session loop.
//!
//! Builds the real capture/OCR/input stack, recovers the game counter from
//! the results CSV, spawns the kill-key watcher, and drives the state
//! machine until it stops.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::boxscore::BoxScoreExtractor;
use crate::capture::GdiGrabber;
use crate::choreo::Choreographer;
use crate::config::get_config;
use crate::input::{is_key_down, SendInputInjector};
use crate::ocr::TesseractEngine;
use crate::paths;
use crate::perception::PerceptionService;
use crate::results::{init_csv, last_game_number};
use crate::session::SessionContext;

/// Poll interval for the kill-key watcher thread.
const KILL_POLL_MS: u64 = 200;

/// Watches the operator kill key on its own thread. The main loop can sit
/// in multi-second sleeps, so polling from there alone would make the kill
/// key feel dead.
fn spawn_kill_watcher(key: String, stop: Arc<AtomicBool>) {
    std::thread::spawn(move || loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        if is_key_down(&key) {
            crate::log(&format!("Kill key '{}' pressed", key));
            stop.store(true, Ordering::SeqCst);
            return;
        }
        std::thread::sleep(Duration::from_millis(KILL_POLL_MS));
    });
}

/// Builds the full stack and runs the session loop to completion.
pub fn run() -> Result<()> {
    let config = get_config();

    let csv_path = paths::get_results_csv();
    init_csv(&csv_path).context("Failed to initialize results CSV")?;
    let resumed = last_game_number(&csv_path);
    if resumed > 0 {
        crate::log(&format!("Resuming after game #{}", resumed));
    }

    let perception = PerceptionService::new(
        GdiGrabber::new(),
        TesseractEngine::new(),
        config.regions.keyword,
        config.ocr.keyword.clone(),
    );

    let extractor = BoxScoreExtractor::new(
        GdiGrabber::new(),
        TesseractEngine::new(),
        config.regions.box_score,
        config.regions.box_score_fallback,
        config.ocr.table.clone(),
        config.scores.clone(),
    );

    let choreo = Choreographer::new(
        SendInputInjector::new(),
        config.timing.clone(),
        config.keys.clone(),
    );

    let stop = Arc::new(AtomicBool::new(false));
    spawn_kill_watcher(config.keys.kill.clone(), stop.clone());
    crate::log(&format!(
        "Session loop running. Hold '{}' to stop.",
        config.keys.kill
    ));

    let mut ctx = SessionContext::new(
        perception,
        extractor,
        choreo,
        config.timing.clone(),
        config.detection.clone(),
        csv_path,
        resumed,
        stop,
    );

    loop {
        if !ctx.step()? {
            break;
        }
    }

    crate::log(&format!(
        "Session ended in state '{}' after {} logged games",
        ctx.state,
        ctx.games_played()
    ));
    Ok(())
}
