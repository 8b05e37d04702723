//! Court Loop
//!
//! Unattended CPU-vs-CPU match loop for an emulated basketball game:
//! watches the screen for the end-of-match screen via OCR, navigates the
//! postgame menus with timed key presses, logs the box score to a CSV, and
//! starts the next randomized match.

mod boxscore;
mod capture;
mod choreo;
mod config;
mod input;
mod ocr;
mod paths;
mod perception;
mod results;
mod session;

use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("courtloop.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        // Try to log even if paths module isn't initialized
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        if let Ok(exe_dir) = std::env::current_exe().map(|p| p.parent().unwrap().to_path_buf()) {
            let log_path = exe_dir.join("logs").join("courtloop.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
            {
                use std::io::Write;
                let _ = file.write_all(log_msg.as_bytes());
            }
        }
    }));

    // Ensure output directories exist
    paths::ensure_directories()?;

    // Load configuration
    config::init_config();

    log("Court Loop starting");

    run_session()
}

#[cfg(windows)]
fn run_session() -> Result<()> {
    session::runner::run()
}

#[cfg(not(windows))]
fn run_session() -> Result<()> {
    anyhow::bail!("Screen capture and input injection require Windows")
}
