//! Append-only match result log.
//!
//! One CSV row per completed match. The file is only ever appended to, so
//! the downstream statistics reader can tail it or re-scan it freely. Each
//! append opens the file fresh for crash safety; a row is either fully
//! written or absent.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// CSV header row.
const CSV_HEADER: &str = "game_number,timestamp,team1,score1,team2,score2,raw_boxscore_ocr";

/// One completed match, as extracted from the box score.
/// Team/score fields stay None when extraction failed outright; the raw
/// text is kept either way so a human can audit bad reads later.
#[derive(Debug, Clone)]
pub struct GameResult {
    pub game_number: u32,
    pub timestamp: DateTime<Local>,
    pub team_a: Option<String>,
    pub score_a: Option<u32>,
    pub team_b: Option<String>,
    pub score_b: Option<u32>,
    pub raw_text: String,
}

/// Initializes the CSV file with a header if it doesn't exist or is empty.
/// Existing data is never touched.
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing results CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create results CSV")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Flattens raw OCR text into a single CSV-safe field.
fn sanitize_raw(raw: &str) -> String {
    raw.replace(['\n', '\r'], " ").replace(',', ";")
}

/// Appends one result row. Opens in append mode per write so a crash
/// mid-session loses at most the in-flight row.
pub fn append_result(path: &Path, result: &GameResult) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open results CSV for append")?;

    let fmt_opt_str = |v: &Option<String>| v.clone().unwrap_or_default();
    let fmt_opt_num = |v: &Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();

    let line = format!(
        "{},{},{},{},{},{},{}",
        result.game_number,
        result.timestamp.format("%Y-%m-%d %H:%M:%S"),
        fmt_opt_str(&result.team_a),
        fmt_opt_num(&result.score_a),
        fmt_opt_str(&result.team_b),
        fmt_opt_num(&result.score_b),
        sanitize_raw(&result.raw_text),
    );

    writeln!(file, "{}", line).context("Failed to write results CSV row")?;
    Ok(())
}

/// Recovers the last persisted game number, so sequence numbers stay
/// contiguous across restarts. Returns 0 when the file is missing, empty,
/// or unreadable.
pub fn last_game_number(path: &Path) -> u32 {
    let Ok(file) = File::open(path) else {
        return 0;
    };

    let reader = BufReader::new(file);
    let mut last = 0;
    for line in reader.lines().map_while(|l| l.ok()).skip(1) {
        if let Some(first) = line.split(',').next() {
            if let Ok(n) = first.trim().parse::<u32>() {
                last = n;
            }
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_result(game_number: u32) -> GameResult {
        GameResult {
            game_number,
            timestamp: Local::now(),
            team_a: Some("LAKERS".to_string()),
            score_a: Some(108),
            team_b: Some("CELTICS".to_string()),
            score_b: Some(95),
            raw_text: "LAKERS 28 30 26 24 108\nCELTICS 25 22 27 21 95".to_string(),
        }
    }

    #[test]
    fn test_init_csv_creates_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        init_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(CSV_HEADER));
    }

    #[test]
    fn test_init_csv_preserves_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        std::fs::write(&path, "existing,data\n1,2,3\n").unwrap();
        init_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("existing,data"));
    }

    #[test]
    fn test_append_flattens_raw_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        init_csv(&path).unwrap();

        append_result(&path, &make_result(1)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        // Raw text newlines must not split the row
        assert!(lines[1].contains("LAKERS 28 30 26 24 108 CELTICS"));
    }

    #[test]
    fn test_append_failed_extraction_leaves_fields_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        init_csv(&path).unwrap();

        let result = GameResult {
            game_number: 7,
            timestamp: Local::now(),
            team_a: None,
            score_a: None,
            team_b: None,
            score_b: None,
            raw_text: "garbled".to_string(),
        };
        append_result(&path, &result).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[0], "7");
        assert_eq!(fields[2], "");
        assert_eq!(fields[3], "");
        assert_eq!(fields[6], "garbled");
    }

    #[test]
    fn test_last_game_number_recovers_across_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        init_csv(&path).unwrap();

        for n in 1..=3 {
            append_result(&path, &make_result(n)).unwrap();
        }

        // Simulates a process restart: recover from the file alone
        assert_eq!(last_game_number(&path), 3);

        append_result(&path, &make_result(last_game_number(&path) + 1)).unwrap();
        assert_eq!(last_game_number(&path), 4);
    }

    #[test]
    fn test_last_game_number_defaults_to_zero() {
        let dir = tempdir().unwrap();
        assert_eq!(last_game_number(&dir.path().join("missing.csv")), 0);

        let empty = dir.path().join("empty.csv");
        std::fs::write(&empty, "").unwrap();
        assert_eq!(last_game_number(&empty), 0);

        let garbage = dir.path().join("garbage.csv");
        std::fs::write(&garbage, "header\nnot-a-number,stuff\n").unwrap();
        assert_eq!(last_game_number(&garbage), 0);
    }
}
