use chrono::NaiveDate;

use gridiron_sync::config::SyncConfig;
use gridiron_sync::espn::EspnSource;
use gridiron_sync::model::game::{GameResult, GameStatus, TBD};
use gridiron_sync::normalize::{ScheduleSource, SourceTag};

const SCHEDULE_BODY: &str = include_str!("fixtures/espn_schedule.json");

fn source() -> EspnSource {
    EspnSource::new(&SyncConfig::for_team("251"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parses_every_event_in_the_feed() {
    let espn = source();
    assert_eq!(espn.name(), "espn");

    let candidates = espn.parse_schedule(SCHEDULE_BODY).unwrap();
    assert_eq!(candidates.len(), 4);
    for candidate in &candidates {
        assert_eq!(candidate.source, SourceTag::Espn);
        assert!(candidate.external_id.is_some());
    }
}

#[test]
fn completed_games_carry_venue_relative_scores() {
    let candidates = source().parse_schedule(SCHEDULE_BODY).unwrap();
    let ohio_state = &candidates[0];

    assert_eq!(ohio_state.opponent, "Ohio State Buckeyes");
    assert_eq!(ohio_state.date, date(2025, 8, 30));
    assert!(!ohio_state.is_home);
    assert_eq!(ohio_state.status, GameStatus::Completed);
    // We scored 7 on the road; the home slot belongs to Ohio State.
    assert_eq!(ohio_state.home_score, Some(14));
    assert_eq!(ohio_state.away_score, Some(7));
    assert_eq!(ohio_state.result, Some(GameResult::Loss));
    assert_eq!(ohio_state.location, "Ohio Stadium, Columbus, OH");
}

#[test]
fn scheduled_games_have_no_scores_and_default_venue() {
    let candidates = source().parse_schedule(SCHEDULE_BODY).unwrap();
    let san_jose = &candidates[1];

    assert_eq!(san_jose.opponent, "San Jose State Spartans");
    assert_eq!(san_jose.status, GameStatus::Scheduled);
    assert!(san_jose.is_home);
    assert_eq!(san_jose.home_score, None);
    assert_eq!(san_jose.away_score, None);
    assert_eq!(san_jose.result, None);
    // No broadcasts announced yet, no venue in the feed.
    assert_eq!(san_jose.tv_network, TBD);
    assert_eq!(san_jose.location, "DKR-Texas Memorial Stadium, Austin, TX");
}

#[test]
fn kickoff_renders_in_the_display_timezone() {
    let candidates = source().parse_schedule(SCHEDULE_BODY).unwrap();
    let oklahoma = &candidates[2];

    // 16:00Z in October is 11:00 AM in Chicago.
    assert_eq!(oklahoma.date, date(2025, 10, 11));
    assert_eq!(oklahoma.time, "11:00 AM");
    assert_eq!(oklahoma.tv_network, "ABC");
    assert_eq!(oklahoma.external_id.as_deref(), Some("401628397"));
}

#[test]
fn postseason_names_flag_bowl_games() {
    let candidates = source().parse_schedule(SCHEDULE_BODY).unwrap();
    let bowl = &candidates[3];

    assert!(bowl.is_bowl_game);
    assert_eq!(
        bowl.bowl_name.as_deref(),
        Some("Valero Alamo Bowl - Colorado Buffaloes vs Texas Longhorns")
    );
    // Media short name backs up an empty broadcast name list.
    assert_eq!(bowl.tv_network, "ESPN");
    assert_eq!(bowl.date, date(2025, 12, 30));
    assert_eq!(bowl.time, "2:00 PM");
}

#[test]
fn events_without_our_team_are_dropped() {
    let body = r#"{
        "events": [
            {
                "id": "1",
                "date": "2025-09-06T21:00Z",
                "competitions": [
                    {
                        "competitors": [
                            { "team": { "id": "7", "displayName": "Somebody" }, "homeAway": "home" },
                            { "team": { "id": "8", "displayName": "Somebody Else" }, "homeAway": "away" }
                        ]
                    }
                ]
            }
        ]
    }"#;
    let candidates = source().parse_schedule(body).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn malformed_bodies_are_an_error() {
    assert!(source().parse_schedule("not json").is_err());
}

#[test]
fn empty_event_lists_parse_to_empty_batches() {
    let candidates = source().parse_schedule(r#"{"events": []}"#).unwrap();
    assert!(candidates.is_empty());
}
