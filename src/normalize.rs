use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::model::espn::{Competition, Competitor, Event};
use crate::model::game::{GameResult, GameStatus, NewGame, TBD};

/// Which adapter produced a candidate. Carried through to the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    Espn,
    Athletics,
    Backup,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceTag::Espn => "espn",
            SourceTag::Athletics => "athletics",
            SourceTag::Backup => "backup",
        };
        f.write_str(name)
    }
}

/// Canonical, source-agnostic shape of one incoming record. Both adapters
/// normalize into this before the matcher or reconciler ever sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCandidate {
    pub date: NaiveDate,
    pub time: String,
    pub opponent: String,
    pub is_home: bool,
    pub location: String,
    pub tv_network: String,
    pub status: GameStatus,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub result: Option<GameResult>,
    pub external_id: Option<String>,
    pub is_bowl_game: bool,
    pub bowl_name: Option<String>,
    pub source: SourceTag,
}

impl GameCandidate {
    /// Insert shape for a contest with no stored counterpart.
    pub fn into_new_game(self) -> NewGame {
        NewGame {
            date: self.date,
            time: self.time,
            opponent: self.opponent,
            is_home: self.is_home,
            location: self.location,
            tv_network: self.tv_network,
            status: self.status,
            home_score: self.home_score,
            away_score: self.away_score,
            result: self.result,
            external_id: self.external_id,
            is_bowl_game: self.is_bowl_game,
            bowl_name: self.bowl_name,
            expected_attendance: 0,
        }
    }
}

/// Fetcher contract. Adapters never raise: a timeout, non-success response, or
/// parse failure logs and yields an empty list so the reconciler stays
/// source-agnostic and a slow source cannot stall a pass.
pub trait ScheduleSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn fetch_schedule(&self, season: i32) -> Vec<GameCandidate>;
    fn fetch_scores(&self, season: i32) -> Vec<GameCandidate>;
}

/// Postseason keyword check used for the bowl window.
pub fn is_bowl_label(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("bowl") || lower.contains("playoff") || lower.contains("championship")
}

/// Kickoff rendered 12-hour in the configured display timezone.
pub fn kickoff_time(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%-I:%M %p").to_string()
}

/// Map our-team/opponent scores onto the venue slots. The home slot belongs
/// to whichever competitor is at home, not to "our" team.
pub fn venue_scores(our_score: u32, opponent_score: u32, is_home: bool) -> (u32, u32) {
    if is_home {
        (our_score, opponent_score)
    } else {
        (opponent_score, our_score)
    }
}

/// W/L from the winner flags; tie only when the scores agree and neither flag
/// is set. Anything else stays undetermined.
pub fn derive_result(
    our_winner: Option<bool>,
    opponent_winner: Option<bool>,
    our_score: u32,
    opponent_score: u32,
) -> Option<GameResult> {
    if our_winner == Some(true) {
        Some(GameResult::Win)
    } else if opponent_winner == Some(true) {
        Some(GameResult::Loss)
    } else if our_winner.is_none() && opponent_winner.is_none() && our_score == opponent_score {
        Some(GameResult::Tie)
    } else {
        None
    }
}

/// Normalize one structured-feed event into a canonical candidate. Returns
/// `None` for records that are malformed for our purposes (no competition,
/// our team absent, unparseable date); the batch continues without them.
pub fn from_espn_event(
    event: &Event,
    our_team_id: &str,
    home_venue: &str,
    tz: Tz,
) -> Option<GameCandidate> {
    let competition = event.competitions.first()?;

    let ours = competition
        .competitors
        .iter()
        .find(|c| c.team.id == our_team_id)?;
    let opponent = competition
        .competitors
        .iter()
        .find(|c| c.team.id != our_team_id)?;

    let date_str = competition.date.as_deref().or(event.date.as_deref())?;
    let kickoff = parse_event_datetime(date_str).or_else(|| {
        debug!(date = %date_str, event = %event.id, "Skipping event with unparseable date");
        None
    })?;

    let is_home = ours.home_away.as_deref() == Some("home");
    let status = event_status(competition);

    let (home_score, away_score, result) = if status == GameStatus::Completed {
        let our_score = parse_score(ours);
        let opp_score = parse_score(opponent);
        let (home, away) = venue_scores(our_score, opp_score, is_home);
        let result = derive_result(ours.winner, opponent.winner, our_score, opp_score);
        (Some(home), Some(away), result)
    } else {
        (None, None, None)
    };

    let is_bowl = event.name.as_deref().map(is_bowl_label).unwrap_or(false);

    Some(GameCandidate {
        date: kickoff.with_timezone(&tz).date_naive(),
        time: kickoff_time(kickoff, tz),
        opponent: opponent.team.display_name.clone(),
        is_home,
        location: event_location(competition, is_home, home_venue),
        tv_network: broadcast_network(competition),
        status,
        home_score,
        away_score,
        result,
        external_id: Some(event.id.clone()),
        is_bowl_game: is_bowl,
        bowl_name: if is_bowl { event.name.clone() } else { None },
        source: SourceTag::Espn,
    })
}

/// The feed emits RFC 3339 timestamps, usually without seconds ("...T16:00Z").
fn parse_event_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .ok()
}

fn event_status(competition: &Competition) -> GameStatus {
    match competition.status.as_ref() {
        Some(status) if status.kind.completed => GameStatus::Completed,
        Some(status) if status.kind.state.as_deref() == Some("in") => GameStatus::InProgress,
        _ => GameStatus::Scheduled,
    }
}

fn parse_score(competitor: &Competitor) -> u32 {
    competitor
        .score
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn broadcast_network(competition: &Competition) -> String {
    let mut names: Vec<String> = competition
        .broadcasts
        .iter()
        .flat_map(|b| b.names.iter().cloned())
        .collect();
    if names.is_empty() {
        names.extend(
            competition
                .broadcasts
                .iter()
                .filter_map(|b| b.media.as_ref())
                .filter_map(|m| m.short_name.clone()),
        );
    }
    if names.is_empty() {
        TBD.to_string()
    } else {
        names.join(", ")
    }
}

fn event_location(competition: &Competition, is_home: bool, home_venue: &str) -> String {
    match competition.venue.as_ref() {
        Some(venue) => {
            let mut location = venue.full_name.clone();
            if let Some(addr) = &venue.address {
                if let (Some(city), Some(state)) = (&addr.city, &addr.state) {
                    location = format!("{}, {}, {}", location, city, state);
                }
            }
            location
        }
        None if is_home => home_venue.to_string(),
        None => "Away".to_string(),
    }
}
