use chrono::{NaiveDate, Utc};

use gridiron_sync::matcher::{names_match, normalize_name, resolve};
use gridiron_sync::model::game::{Game, GameStatus, TBD};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn game(id: &str, opponent: &str, date: NaiveDate, external_id: Option<&str>) -> Game {
    let now = Utc::now();
    Game {
        id: id.to_string(),
        date,
        time: TBD.to_string(),
        opponent: opponent.to_string(),
        is_home: true,
        location: "DKR-Texas Memorial Stadium".to_string(),
        tv_network: TBD.to_string(),
        status: GameStatus::Scheduled,
        home_score: None,
        away_score: None,
        result: None,
        external_id: external_id.map(str::to_string),
        is_bowl_game: false,
        bowl_name: None,
        expected_attendance: 0,
        no_tailgate: false,
        last_synced_at: now,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn normalization_drops_filler_tokens() {
    assert_eq!(normalize_name("Ohio State University"), "ohio");
    assert_eq!(normalize_name("  Sam   Houston "), "sam houston");
    assert_eq!(normalize_name("UTEP"), "utep");
}

#[test]
fn equivalent_names_match_in_both_directions() {
    let pairs = [
        ("Oklahoma", "Oklahoma Sooners"),
        ("OU", "Oklahoma"),
        ("Ohio State", "Ohio State Buckeyes"),
        ("Texas A&M", "Aggies"),
        ("Florida", "Florida Gators"),
        ("San Jose State", "San Jose State Spartans"),
    ];
    for (a, b) in pairs {
        assert!(names_match(a, b), "{a} should match {b}");
        assert!(names_match(b, a), "{b} should match {a}");
    }
}

#[test]
fn unrelated_names_do_not_match() {
    assert!(!names_match("Oklahoma", "Ohio State"));
    assert!(!names_match("UTEP", "Sam Houston"));
    assert!(!names_match("", "Oklahoma"));
    assert!(!names_match("Oklahoma", ""));
}

#[test]
fn resolves_a_single_name_match() {
    let stored = vec![
        game("g1", "Oklahoma", date(2025, 10, 11), None),
        game("g2", "Florida", date(2025, 10, 4), None),
    ];
    let hit = resolve("Oklahoma Sooners", date(2025, 10, 11), &stored).unwrap();
    assert_eq!(hit.id, "g1");
}

#[test]
fn date_breaks_ties_between_repeat_opponents() {
    // Two meetings with the same opponent in one season (regular + playoff).
    let stored = vec![
        game("g1", "Georgia", date(2025, 10, 18), Some("a")),
        game("g2", "Georgia", date(2025, 12, 6), Some("b")),
    ];
    let hit = resolve("Georgia Bulldogs", date(2025, 12, 6), &stored).unwrap();
    assert_eq!(hit.id, "g2");
}

#[test]
fn uncorrelated_games_win_remaining_ties() {
    // Same name, same date: prefer the record the feed hasn't claimed yet.
    let stored = vec![
        game("g1", "Georgia", date(2025, 10, 18), Some("a")),
        game("g2", "Georgia", date(2025, 10, 18), None),
    ];
    let hit = resolve("Georgia", date(2025, 10, 18), &stored).unwrap();
    assert_eq!(hit.id, "g2");
}

#[test]
fn still_ambiguous_matches_resolve_to_none() {
    let stored = vec![
        game("g1", "Georgia", date(2025, 10, 18), None),
        game("g2", "Georgia", date(2025, 10, 18), None),
    ];
    assert!(resolve("Georgia", date(2025, 10, 18), &stored).is_none());
}

#[test]
fn unknown_opponents_resolve_to_none() {
    let stored = vec![game("g1", "Oklahoma", date(2025, 10, 11), None)];
    assert!(resolve("Clemson", date(2025, 10, 11), &stored).is_none());
}
