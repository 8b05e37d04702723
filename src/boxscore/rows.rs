//! Box-score row parsing: header filtering, total correction, ranking.

use anyhow::Result;
use regex::Regex;

use crate::boxscore::teams::{normalize_team_name, KNOWN_TEAMS};

/// Column labels of the score table. Any row whose tokens intersect this
/// set is a header, never a team row.
const HEADER_WORDS: &[&str] = &["TEAM", "1ST", "2ND", "3RD", "4TH", "OT", "TOTAL"];

/// Scores in the table are 1-3 digit numbers; anything longer is garbage.
const NUM_PATTERN: &str = r"\b\d{1,3}\b";

/// Resolved names shorter than this are OCR debris, not teams.
const MIN_TEAM_LEN: usize = 4;

/// One candidate team row recovered from the table text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub team: String,
    pub total: u32,
    /// Whether the resolved name is an exact roster hit
    pub exact: bool,
}

/// Picks the row total from the OCR'd numbers.
///
/// The last number on the row is the printed TOTAL; the preceding numbers
/// are quarter scores. The dominant OCR failure mode is a dropped trailing
/// digit (110 read as 11, 90 as 9, sometimes 0), so when the printed total
/// is zero against a substantial quarter-sum, or the two disagree by more
/// than a point, the quarter-sum wins.
pub fn corrected_total(nums: &[u32]) -> u32 {
    let ocr_total = *nums.last().unwrap_or(&0);
    let qsum: u32 = nums[..nums.len().saturating_sub(1)].iter().sum();

    if qsum > 0 {
        if ocr_total == 0 && qsum >= 10 {
            return qsum;
        }
        if ocr_total.abs_diff(qsum) >= 2 {
            return qsum;
        }
    }

    ocr_total
}

/// Parses candidate team rows out of raw table OCR text.
///
/// Per line: strip non-alphanumerics, collapse whitespace, reject header
/// rows, require at least two numeric tokens (quarters plus total). The
/// non-numeric residue is the team token, resolved against the roster.
pub fn parse_rows(raw: &str) -> Result<Vec<TeamRow>> {
    let num_re = Regex::new(NUM_PATTERN)?;
    let mut rows = Vec::new();

    for line in raw.to_uppercase().lines() {
        let clean: String = line
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == ' ' {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let clean = clean.split_whitespace().collect::<Vec<_>>().join(" ");
        if clean.is_empty() {
            continue;
        }

        if clean
            .split_whitespace()
            .any(|tok| HEADER_WORDS.contains(&tok))
        {
            continue;
        }

        let nums: Vec<u32> = num_re
            .find_iter(&clean)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if nums.len() < 2 {
            // Need quarters + total at minimum
            continue;
        }

        let team_part = num_re.replace_all(&clean, " ");
        let team_part = team_part.split_whitespace().collect::<Vec<_>>().join(" ");

        let Some(team) = normalize_team_name(&team_part) else {
            continue;
        };
        if team.chars().count() < MIN_TEAM_LEN {
            continue;
        }

        let exact = KNOWN_TEAMS.contains(&team.as_str());
        rows.push(TeamRow {
            team,
            total: corrected_total(&nums),
            exact,
        });
    }

    Ok(rows)
}

/// Reduces candidates to the two most credible team rows.
///
/// Ranking is (exact roster hit, resolved-name length, total) descending.
/// With more than two plausible rows this can pick the wrong pair; the raw
/// text logged alongside every result makes such picks auditable.
pub fn pick_top_two(mut rows: Vec<TeamRow>) -> Option<(TeamRow, TeamRow)> {
    if rows.len() < 2 {
        return None;
    }

    rows.sort_by(|a, b| {
        (b.exact, b.team.len(), b.total).cmp(&(a.exact, a.team.len(), a.total))
    });

    let second = rows.swap_remove(1);
    let first = rows.swap_remove(0);
    Some((first, second))
}
