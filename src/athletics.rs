use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use regex::Regex;
use tracing::{debug, error, info, info_span, instrument};

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::espn::timed_agent;
use crate::model::game::{GameResult, GameStatus, TBD};
use crate::normalize::{is_bowl_label, venue_scores, GameCandidate, ScheduleSource, SourceTag};

/// Adapter over the published HTML schedule page. The page structure is
/// assumed stable but is outside our control; any parse or fetch failure
/// degrades to an empty batch.
pub struct AthleticsSource {
    agent: ureq::Agent,
    schedule_url: String,
    home_venue: String,
    home_city_lower: String,
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl AthleticsSource {
    pub fn new(config: &SyncConfig, clock: Arc<dyn Clock>) -> Self {
        AthleticsSource {
            agent: timed_agent(config.fetch_timeout),
            schedule_url: config.schedule_page_url.clone(),
            home_venue: config.home_venue.clone(),
            home_city_lower: config.home_city.to_lowercase(),
            tz: config.timezone,
            clock,
        }
    }

    /// Parse the schedule page into candidates (no network). `reference` is
    /// the processing date used for year inference on partial dates.
    pub fn parse_schedule(&self, html: &str, reference: NaiveDate) -> Vec<GameCandidate> {
        let Some(block_re) = regex(
            r#"(?s)<li[^>]*class="(?:[^"]*\s)?sidearm-schedule-game(?:\s[^"]*)?"[^>]*>.*?</li>"#,
        ) else {
            return Vec::new();
        };

        let mut games = Vec::new();
        for block in block_re.find_iter(html) {
            match self.parse_game_block(block.as_str(), reference) {
                Some(game) => games.push(game),
                None => debug!("Skipping malformed schedule row"),
            }
        }
        games
    }

    fn parse_game_block(&self, block: &str, reference: NaiveDate) -> Option<GameCandidate> {
        let date_text = class_text(block, "sidearm-schedule-game-opponent-date")?;
        let opponent = clean_opponent(&class_text(block, "sidearm-schedule-game-opponent-name")?);
        if opponent.is_empty() {
            return None;
        }
        let date = parse_schedule_date(&date_text, reference)?;

        let location_text = class_text(block, "sidearm-schedule-game-location").unwrap_or_default();
        let lowered = location_text.to_lowercase();
        let is_home =
            lowered.is_empty() || lowered.contains(&self.home_city_lower) || lowered.contains("home");

        let time = format_kickoff(
            &class_text(block, "sidearm-schedule-game-time").unwrap_or_default(),
        );
        let tv_network = match class_text(block, "sidearm-schedule-game-tv") {
            Some(tv) if !tv.is_empty() && tv != "TBA" => tv,
            _ => TBD.to_string(),
        };

        let venue = class_text(block, "sidearm-schedule-game-venue").unwrap_or_default();
        let location = if !venue.is_empty() {
            venue
        } else if is_home {
            self.home_venue.clone()
        } else if !location_text.is_empty() {
            location_text
        } else {
            "Away".to_string()
        };

        let result_text = class_text(block, "sidearm-schedule-game-result").unwrap_or_default();
        let (status, home_score, away_score, result) = match parse_result(&result_text, is_home) {
            Some((home, away, result)) => {
                (GameStatus::Completed, Some(home), Some(away), Some(result))
            }
            None => (GameStatus::Scheduled, None, None, None),
        };

        let notes = class_text(block, "sidearm-schedule-game-name").unwrap_or_default();
        let is_bowl = is_bowl_label(&notes);

        Some(GameCandidate {
            date,
            time,
            opponent,
            is_home,
            location,
            tv_network,
            status,
            home_score,
            away_score,
            result,
            external_id: None,
            is_bowl_game: is_bowl,
            bowl_name: if is_bowl { Some(notes) } else { None },
            source: SourceTag::Athletics,
        })
    }
}

impl ScheduleSource for AthleticsSource {
    fn name(&self) -> &'static str {
        "athletics"
    }

    #[instrument(level = "info", skip(self))]
    fn fetch_schedule(&self, _season: i32) -> Vec<GameCandidate> {
        let response_result = {
            let _span = info_span!("athletics_fetch", url = %self.schedule_url).entered();
            self.agent.get(&self.schedule_url).call()
        };
        let body = match response_result {
            Ok(response) => {
                let status = response.status().as_u16();
                let mut body_reader = response.into_body();
                match body_reader.read_to_string() {
                    Ok(body) if (200..300).contains(&status) => body,
                    Ok(_) => {
                        error!(status, "Schedule page returned non-success; returning empty batch");
                        return Vec::new();
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read schedule page body; returning empty batch");
                        return Vec::new();
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Schedule page fetch failed; returning empty batch");
                return Vec::new();
            }
        };

        let reference = self.clock.today(self.tz);
        let games = self.parse_schedule(&body, reference);
        info!(count = games.len(), "Scraped schedule page");
        games
    }

    fn fetch_scores(&self, season: i32) -> Vec<GameCandidate> {
        self.fetch_schedule(season)
            .into_iter()
            .filter(|c| c.status == GameStatus::Completed)
            .collect()
    }
}

fn regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            error!(error = %e, "Invalid scrape pattern");
            None
        }
    }
}

/// Inner text of the first element carrying the given class, tags stripped
/// and whitespace collapsed.
fn class_text(block: &str, class: &str) -> Option<String> {
    let pattern = format!(
        r#"(?s)class="[^"]*{}[^"]*"[^>]*>(.*?)</"#,
        regex::escape(class)
    );
    let re = regex(&pattern)?;
    let captured = re.captures(block)?.get(1)?.as_str();
    let tag_re = regex(r"<[^>]*>")?;
    let text = tag_re.replace_all(captured, " ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed)
}

/// Strip ranking prefixes ("12 Oklahoma") and footnote asterisks.
fn clean_opponent(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('#');
    let no_rank = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    no_rank.trim_end_matches('*').trim().to_string()
}

/// Normalize the page's heterogeneous date strings ("9/7", "Saturday, Aug 31",
/// "December 15") into a calendar date. Partial dates take their year from
/// `reference`, rolling into the next year when an early-year month shows up
/// while the reference date is already in the fall.
fn parse_schedule_date(raw: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let trimmed = raw.trim();

    if let Some((month_str, day_str)) = trimmed.split_once('/') {
        if let (Ok(month), Ok(day)) = (month_str.trim().parse(), day_str.trim().parse::<u32>()) {
            return NaiveDate::from_ymd_opt(infer_year(month, reference), month, day);
        }
    }

    let lowered = trimmed.to_lowercase();
    for token in lowered.split(|c: char| c == ',' || c.is_whitespace()) {
        let Some(month) = month_number(token) else {
            continue;
        };
        let day: u32 = lowered
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())?
            .parse()
            .ok()?;
        return NaiveDate::from_ymd_opt(infer_year(month, reference), month, day);
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// A January/February game seen while processing in the fall belongs to the
/// next calendar year.
fn infer_year(month: u32, reference: NaiveDate) -> i32 {
    if month < 3 && reference.month() >= 9 {
        reference.year() + 1
    } else {
        reference.year()
    }
}

fn month_number(token: &str) -> Option<u32> {
    let month = match token {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Normalize kickoff-time strings to "H:MM AM"; timezone suffixes dropped,
/// bare hours padded. Unrecognized or unannounced times become "TBD".
fn format_kickoff(raw: &str) -> String {
    let cleaned = raw.trim().to_uppercase();
    if cleaned.is_empty() || cleaned == "TBA" || cleaned == TBD {
        return TBD.to_string();
    }

    let Some(time_re) = regex(r"(\d{1,2}):?(\d{0,2})\s*(AM|PM|A\.M\.|P\.M\.)") else {
        return TBD.to_string();
    };
    let Some(caps) = time_re.captures(&cleaned) else {
        return TBD.to_string();
    };

    let hour = caps.get(1).map(|m| m.as_str()).unwrap_or("0");
    let minutes = match caps.get(2).map(|m| m.as_str()) {
        Some("") | None => "00".to_string(),
        Some(m) if m.len() == 1 => format!("0{}", m),
        Some(m) => m.to_string(),
    };
    let period = caps
        .get(3)
        .map(|m| m.as_str().replace('.', ""))
        .unwrap_or_default();

    format!("{}:{} {}", hour, minutes, period)
}

/// Result cells look like "W 31-24". The winner's score is the larger number;
/// slots are assigned venue-relative.
fn parse_result(text: &str, is_home: bool) -> Option<(u32, u32, GameResult)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let score_re = regex(r"(\d+)-(\d+)")?;
    let caps = score_re.captures(trimmed)?;
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    let second: u32 = caps.get(2)?.as_str().parse().ok()?;

    let result = if trimmed.contains('W') {
        GameResult::Win
    } else if trimmed.contains('L') {
        GameResult::Loss
    } else if first == second {
        GameResult::Tie
    } else {
        return None;
    };

    let (our_score, opponent_score) = match result {
        GameResult::Win => (first.max(second), first.min(second)),
        GameResult::Loss => (first.min(second), first.max(second)),
        GameResult::Tie => (first, second),
    };
    let (home, away) = venue_scores(our_score, opponent_score, is_home);
    Some((home, away, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_slash_dates_against_reference_year() {
        let date = parse_schedule_date("9/7", reference(2025, 8, 1)).unwrap();
        assert_eq!(date, reference(2025, 9, 7));
    }

    #[test]
    fn parses_weekday_month_day() {
        let date = parse_schedule_date("Saturday, Aug 31", reference(2025, 8, 1)).unwrap();
        assert_eq!(date, reference(2025, 8, 31));
    }

    #[test]
    fn january_rolls_to_next_year_in_the_fall() {
        let date = parse_schedule_date("January 10", reference(2025, 11, 15)).unwrap();
        assert_eq!(date, reference(2026, 1, 10));

        // Same string early in the year stays in the current year.
        let date = parse_schedule_date("January 10", reference(2025, 1, 2)).unwrap();
        assert_eq!(date, reference(2025, 1, 10));
    }

    #[test]
    fn december_keeps_current_year() {
        let date = parse_schedule_date("December 15", reference(2025, 11, 15)).unwrap();
        assert_eq!(date, reference(2025, 12, 15));
    }

    #[test]
    fn kickoff_times_normalize() {
        assert_eq!(format_kickoff("2:30 PM CT"), "2:30 PM");
        assert_eq!(format_kickoff("7 PM"), "7:00 PM");
        assert_eq!(format_kickoff("11:00 a.m."), "11:00 AM");
        assert_eq!(format_kickoff("TBA"), TBD);
        assert_eq!(format_kickoff(""), TBD);
        assert_eq!(format_kickoff("noon-ish"), TBD);
    }

    #[test]
    fn result_scores_are_venue_relative() {
        // Home win: our (larger) score sits in the home slot.
        assert_eq!(
            parse_result("W 31-24", true),
            Some((31, 24, GameResult::Win))
        );
        // Away win: our score sits in the away slot.
        assert_eq!(
            parse_result("W 31-24", false),
            Some((24, 31, GameResult::Win))
        );
        // Away loss: opponent's (larger) score is the home score.
        assert_eq!(
            parse_result("L 14-35", false),
            Some((35, 14, GameResult::Loss))
        );
        assert_eq!(parse_result("", true), None);
    }

    #[test]
    fn opponent_names_are_cleaned() {
        assert_eq!(clean_opponent("12 Oklahoma"), "Oklahoma");
        assert_eq!(clean_opponent("#5 Georgia *"), "Georgia");
        assert_eq!(clean_opponent("Texas A&M"), "Texas A&M");
    }
}
