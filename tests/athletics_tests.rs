use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use gridiron_sync::athletics::AthleticsSource;
use gridiron_sync::clock::FixedClock;
use gridiron_sync::config::SyncConfig;
use gridiron_sync::model::game::{GameResult, GameStatus, TBD};
use gridiron_sync::normalize::{ScheduleSource, SourceTag};

const SCHEDULE_PAGE: &str = include_str!("fixtures/schedule_page.html");

fn source() -> AthleticsSource {
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap());
    AthleticsSource::new(&SyncConfig::for_team("251"), Arc::new(clock))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn reference() -> NaiveDate {
    date(2025, 8, 1)
}

#[test]
fn parses_game_rows_and_skips_malformed_ones() {
    let athletics = source();
    assert_eq!(athletics.name(), "athletics");

    let games = athletics.parse_schedule(SCHEDULE_PAGE, reference());
    // Four real rows; the bye-week row has no opponent and is dropped.
    assert_eq!(games.len(), 4);
    for game in &games {
        assert_eq!(game.source, SourceTag::Athletics);
        assert_eq!(game.external_id, None);
    }
}

#[test]
fn ranked_opponents_are_cleaned() {
    let games = source().parse_schedule(SCHEDULE_PAGE, reference());
    assert_eq!(games[0].opponent, "Ohio State");
    assert_eq!(games[1].opponent, "San Jose State");
}

#[test]
fn result_cells_complete_games_with_venue_relative_scores() {
    let games = source().parse_schedule(SCHEDULE_PAGE, reference());
    let ohio_state = &games[0];

    assert_eq!(ohio_state.date, date(2025, 8, 30));
    assert!(!ohio_state.is_home, "Columbus is not a home location");
    assert_eq!(ohio_state.status, GameStatus::Completed);
    assert_eq!(ohio_state.result, Some(GameResult::Loss));
    // "L 7-14" on the road: their 14 sits in the home slot.
    assert_eq!(ohio_state.home_score, Some(14));
    assert_eq!(ohio_state.away_score, Some(7));
    assert_eq!(ohio_state.time, "11:00 AM");
    assert_eq!(ohio_state.tv_network, "FOX");
    assert_eq!(ohio_state.location, "Columbus, Ohio");
}

#[test]
fn unannounced_time_and_network_become_placeholders() {
    let games = source().parse_schedule(SCHEDULE_PAGE, reference());
    let san_jose = &games[1];

    assert_eq!(san_jose.date, date(2025, 9, 6));
    assert!(san_jose.is_home);
    assert_eq!(san_jose.time, TBD);
    assert_eq!(san_jose.tv_network, TBD);
    // The venue cell wins over the city text.
    assert_eq!(san_jose.location, "DKR-Texas Memorial Stadium");
    assert_eq!(san_jose.status, GameStatus::Scheduled);
}

#[test]
fn dotted_meridiem_times_normalize() {
    let games = source().parse_schedule(SCHEDULE_PAGE, reference());
    let oklahoma = &games[2];

    assert_eq!(oklahoma.date, date(2025, 10, 11));
    assert!(!oklahoma.is_home);
    assert_eq!(oklahoma.time, "11:00 AM");
    assert_eq!(oklahoma.tv_network, "ABC");
}

#[test]
fn game_notes_flag_bowl_games() {
    let games = source().parse_schedule(SCHEDULE_PAGE, reference());
    let bowl = &games[3];

    assert!(bowl.is_bowl_game);
    assert_eq!(bowl.bowl_name.as_deref(), Some("Valero Alamo Bowl"));
    assert_eq!(bowl.opponent, "Colorado");
    assert_eq!(bowl.date, date(2025, 12, 30));
    assert_eq!(bowl.time, "7:30 PM");
}

#[test]
fn pages_without_game_rows_parse_to_empty_batches() {
    let games = source().parse_schedule("<html><body><p>offline</p></body></html>", reference());
    assert!(games.is_empty());
}
