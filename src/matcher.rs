use chrono::NaiveDate;
use tracing::warn;

use crate::model::game::Game;

/// Curated alias groups for opponents whose names drift across sources and
/// manual entries. Two names match when any token of each lands in the same
/// group. Entries are compared post-[`normalize_name`].
static ALIAS_GROUPS: &[&[&str]] = &[
    &["ou", "oklahoma", "sooners"],
    &["osu", "ohio", "buckeyes"],
    &["tamu", "a&m", "aggies"],
    &["utsa", "roadrunners"],
    &["app", "appalachian"],
    &["miss", "mississippi"],
    &["uga", "georgia", "bulldogs"],
    &["lsu", "tigers"],
    &["ark", "arkansas", "razorbacks"],
    &["uk", "kentucky", "wildcats"],
    &["vandy", "vanderbilt", "commodores"],
    &["uf", "florida", "gators"],
];

/// Lowercase, drop the "state"/"university" filler tokens, collapse
/// whitespace. Both sides of every comparison go through this first.
pub fn normalize_name(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .filter(|token| *token != "state" && *token != "university")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fuzzy name equivalence: normalized equality, either-way substring
/// containment, or a shared alias-group token. Commutative by construction.
///
/// The substring rule can false-positive on short shared tokens ("Texas" vs
/// "Texas Tech"); that approximation is accepted rather than silently
/// tightened.
pub fn names_match(a: &str, b: &str) -> bool {
    let norm_a = normalize_name(a);
    let norm_b = normalize_name(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return false;
    }
    if norm_a == norm_b || norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        return true;
    }
    shares_alias(&norm_a, &norm_b)
}

fn alias_group(token: &str) -> Option<usize> {
    ALIAS_GROUPS
        .iter()
        .position(|group| group.contains(&token))
}

fn shares_alias(norm_a: &str, norm_b: &str) -> bool {
    for token_a in norm_a.split_whitespace() {
        let Some(group) = alias_group(token_a) else {
            continue;
        };
        for token_b in norm_b.split_whitespace() {
            if alias_group(token_b) == Some(group) {
                return true;
            }
        }
    }
    false
}

/// Resolve an incoming record to at most one stored game.
///
/// Tie-breaks when several stored games match the name: prefer an equal
/// `date`, then a game with no `external_id` yet (don't steal an
/// already-correlated record). A still-ambiguous result is treated as no
/// match — the caller takes the insert path — and logged for review.
pub fn resolve<'a>(opponent: &str, date: NaiveDate, stored: &'a [Game]) -> Option<&'a Game> {
    let mut matches: Vec<&Game> = stored
        .iter()
        .filter(|game| names_match(opponent, &game.opponent))
        .collect();

    if matches.len() > 1 {
        let same_date: Vec<&Game> = matches
            .iter()
            .copied()
            .filter(|game| game.date == date)
            .collect();
        if !same_date.is_empty() {
            matches = same_date;
        }
    }

    if matches.len() > 1 {
        let uncorrelated: Vec<&Game> = matches
            .iter()
            .copied()
            .filter(|game| game.external_id.is_none())
            .collect();
        if !uncorrelated.is_empty() {
            matches = uncorrelated;
        }
    }

    match matches.len() {
        0 => None,
        1 => Some(matches[0]),
        n => {
            warn!(
                opponent = %opponent,
                date = %date,
                candidates = n,
                "Ambiguous opponent match; treating as new contest"
            );
            None
        }
    }
}
