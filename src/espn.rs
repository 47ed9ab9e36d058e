use std::time::Duration;

use chrono_tz::Tz;
use tracing::{error, info, info_span, instrument};

use crate::config::SyncConfig;
use crate::model::espn::ScheduleResponse;
use crate::model::game::GameStatus;
use crate::normalize::{self, GameCandidate, ScheduleSource};

/// Adapter over the ESPN team-schedule feed. Fetches are blocking and
/// time-bounded; every failure degrades to an empty batch.
#[derive(Debug, Clone)]
pub struct EspnSource {
    agent: ureq::Agent,
    base_url: String,
    team_id: String,
    home_venue: String,
    tz: Tz,
}

impl EspnSource {
    pub fn new(config: &SyncConfig) -> Self {
        EspnSource {
            agent: timed_agent(config.fetch_timeout),
            base_url: config.espn_base_url.clone(),
            team_id: config.team_id.clone(),
            home_venue: config.home_venue.clone(),
            tz: config.timezone,
        }
    }

    /// Parse a raw schedule response body into candidates (no network).
    pub fn parse_schedule(&self, body: &str) -> Result<Vec<GameCandidate>, String> {
        let doc: ScheduleResponse = serde_json::from_str(body)
            .map_err(|e| format!("Failed to deserialize schedule response: {}", e))?;
        let candidates = doc
            .events
            .iter()
            .filter_map(|event| {
                normalize::from_espn_event(event, &self.team_id, &self.home_venue, self.tz)
            })
            .collect();
        Ok(candidates)
    }

    fn schedule_url(&self, season: i32) -> String {
        format!(
            "{}/teams/{}/schedule?season={}",
            self.base_url, self.team_id, season
        )
    }

    fn get(&self, url: &str) -> Result<String, String> {
        let response_result = {
            let _span = info_span!("espn_fetch", url = %url).entered();
            self.agent.get(url).call()
        };
        match response_result {
            Ok(response) => {
                let status = response.status().as_u16();
                let mut body_reader = response.into_body();
                match body_reader.read_to_string() {
                    Ok(body) if (200..300).contains(&status) => Ok(body),
                    Ok(_) => Err(format!("Non-success status {} from {}", status, url)),
                    Err(e) => Err(format!("Failed to read response body: {}", e)),
                }
            }
            Err(e) => Err(format!("Request failed: {}", e)),
        }
    }
}

impl ScheduleSource for EspnSource {
    fn name(&self) -> &'static str {
        "espn"
    }

    #[instrument(level = "info", skip(self))]
    fn fetch_schedule(&self, season: i32) -> Vec<GameCandidate> {
        let url = self.schedule_url(season);
        let body = match self.get(&url) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, season, "ESPN schedule fetch failed; returning empty batch");
                return Vec::new();
            }
        };
        match self.parse_schedule(&body) {
            Ok(candidates) => {
                info!(count = candidates.len(), season, "Fetched ESPN schedule");
                candidates
            }
            Err(e) => {
                error!(error = %e, season, "ESPN schedule parse failed; returning empty batch");
                Vec::new()
            }
        }
    }

    #[instrument(level = "info", skip(self))]
    fn fetch_scores(&self, season: i32) -> Vec<GameCandidate> {
        let completed: Vec<GameCandidate> = self
            .fetch_schedule(season)
            .into_iter()
            .filter(|c| c.status == GameStatus::Completed)
            .collect();
        info!(count = completed.len(), season, "Fetched ESPN completed scores");
        completed
    }
}

pub(crate) fn timed_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}
