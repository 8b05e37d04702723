//! Team-name resolution against the canonical roster.
//!
//! OCR mangles team names in predictable ways (digits inside letter runs,
//! dropped leading characters, stray single-letter tokens). Cleanup is an
//! ordered list of data-driven rules followed by a fuzzy match, so each
//! rule is testable on its own and new miscorrections can be added without
//! touching control flow.

use strsim::normalized_levenshtein;

/// The fixed roster used as the fuzzy-match target set.
pub const KNOWN_TEAMS: &[&str] = &[
    "76ERS",
    "CAVALIERS",
    "BULLS",
    "CELTICS",
    "LAKERS",
    "CLIPPERS",
    "KINGS",
    "KNICKS",
    "HEAT",
    "MAGIC",
    "MAVERICKS",
    "NUGGETS",
    "PACERS",
    "PISTONS",
    "RAPTORS",
    "ROCKETS",
    "SPURS",
    "SUNS",
    "THUNDER",
    "TIMBERWOLVES",
    "TRAILBLAZERS",
    "WARRIORS",
    "WIZARDS",
    "HAWKS",
    "HORNETS",
    "JAZZ",
    "NETS",
    "BUCKS",
    "GRIZZLIES",
    "PELICANS",
    "SIXERS",
    "EAST ALL-STARS",
    "WEST ALL-STARS",
    "EAST ALLSTARS",
    "WEST ALLSTARS",
    "BOBCATS",
];

/// Digit-to-letter confusions seen inside letters-only names
/// (e.g. HAWKS read as 1AVYKS).
const CONFUSION_MAP: &[(char, char)] = &[('0', 'O'), ('1', 'H'), ('5', 'S'), ('8', 'B')];

/// Literal miscorrections that keep recurring in logs. Applied blindly,
/// which is safe because exact roster hits short-circuit before this step.
const LITERAL_FIXES: &[(&str, &str)] = &[
    ("6ERS", "76ERS"),
    ("AVALIERS", "CAVALIERS"),
    ("CAVALIER", "CAVALIERS"),
    ("SOBCATS", "BOBCATS"),
    ("VIZARDS", "WIZARDS"),
    ("SRIZZLIES", "GRIZZLIES"),
    ("HAVYKS", "HAWKS"),
    ("HA VKS", "HAWKS"),
    ("HAWK S", "HAWKS"),
    ("ALLSTARS", "ALL-STARS"),
    ("ALL STARS", "ALL-STARS"),
];

/// Minimum similarity for accepting a fuzzy roster match.
const FUZZY_CUTOFF: f64 = 0.55;

/// Strips everything but letters, digits and spaces, collapses whitespace.
fn clean(raw: &str) -> String {
    let kept: String = raw
        .to_uppercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops a trailing single-character token, a common OCR invention
/// (e.g. "LAKERS Z").
fn drop_trailing_single(t: &str) -> String {
    let parts: Vec<&str> = t.split_whitespace().collect();
    if parts.len() >= 2 && parts[parts.len() - 1].chars().count() == 1 {
        parts[..parts.len() - 1].join(" ")
    } else {
        t.to_string()
    }
}

fn apply_confusion_map(t: &str) -> String {
    t.chars()
        .map(|c| {
            CONFUSION_MAP
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

fn fuzzy_match(t: &str) -> Option<&'static str> {
    KNOWN_TEAMS
        .iter()
        .map(|team| (*team, normalized_levenshtein(t, team)))
        .filter(|(_, score)| *score >= FUZZY_CUTOFF)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(team, _)| team)
}

/// Resolves a raw OCR'd team token to a canonical roster name.
///
/// Returns None if nothing survives cleaning. A cleaned string that matches
/// no roster entry even fuzzily is passed through unchanged so the result
/// log still records something auditable.
pub fn normalize_team_name(raw: &str) -> Option<String> {
    let mut t = drop_trailing_single(&clean(raw));
    if t.is_empty() {
        return None;
    }

    // Exact hit before any rewriting: canonical names (including digit-
    // bearing ones like 76ERS) must come back untouched.
    if KNOWN_TEAMS.contains(&t.as_str()) {
        return Some(t);
    }

    t = apply_confusion_map(&t);
    for (from, to) in LITERAL_FIXES {
        t = t.replace(from, to);
    }

    if KNOWN_TEAMS.contains(&t.as_str()) {
        return Some(t);
    }

    match fuzzy_match(&t) {
        Some(team) => Some(team.to_string()),
        None => Some(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_are_fixed_points() {
        for team in KNOWN_TEAMS {
            assert_eq!(
                normalize_team_name(team).as_deref(),
                Some(*team),
                "{} should normalize to itself",
                team
            );
        }
    }

    #[test]
    fn test_digit_confusions_resolve() {
        // 1AVYKS is the classic HAWKS misread
        assert_eq!(normalize_team_name("1AVYKS").as_deref(), Some("HAWKS"));
        assert_eq!(normalize_team_name("LAKER5").as_deref(), Some("LAKERS"));
        assert_eq!(normalize_team_name("CELT1CS").as_deref(), Some("CELTICS"));
    }

    #[test]
    fn test_literal_fixes() {
        assert_eq!(normalize_team_name("SOBCATS").as_deref(), Some("BOBCATS"));
        assert_eq!(normalize_team_name("VIZARDS").as_deref(), Some("WIZARDS"));
        assert_eq!(
            normalize_team_name("SRIZZLIES").as_deref(),
            Some("GRIZZLIES")
        );
    }

    #[test]
    fn test_trailing_single_char_dropped() {
        assert_eq!(normalize_team_name("LAKERS Z").as_deref(), Some("LAKERS"));
    }

    #[test]
    fn test_punctuation_stripped() {
        assert_eq!(normalize_team_name("  sPuRs. ").as_deref(), Some("SPURS"));
    }

    #[test]
    fn test_fuzzy_match_close_variant() {
        assert_eq!(normalize_team_name("WARRIRS").as_deref(), Some("WARRIORS"));
        assert_eq!(normalize_team_name("PISTONSS").as_deref(), Some("PISTONS"));
    }

    #[test]
    fn test_unmatchable_passes_through() {
        assert_eq!(normalize_team_name("QQQQQQQQQQQQQQ").as_deref(), Some("QQQQQQQQQQQQQQ"));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(normalize_team_name(""), None);
        assert_eq!(normalize_team_name(" .,! "), None);
    }
}
