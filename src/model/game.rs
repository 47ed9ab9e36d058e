use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for values the sources have not announced yet. Never allowed
/// to overwrite a concrete value during reconciliation.
pub const TBD: &str = "TBD";

/// Game lifecycle. The ordering matters: status only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl GameStatus {
    /// Whether a transition from `self` to `next` is a forward move.
    pub fn can_advance_to(self, next: GameStatus) -> bool {
        next > self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "T")]
    Tie,
}

/// One contest as persisted. Created by a reconciler insert op or by manual
/// entry elsewhere; mutated only through [`GamePatch`] updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub date: NaiveDate,
    /// Kickoff display string, or "TBD".
    pub time: String,
    pub opponent: String,
    pub is_home: bool,
    pub location: String,
    pub tv_network: String,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
    /// Correlation key from the structured feed; unique per season when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub is_bowl_game: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowl_name: Option<String>,
    #[serde(default)]
    pub expected_attendance: u32,
    /// Admin-set flag. Sync never writes it: [`GamePatch`] has no such field.
    #[serde(default)]
    pub no_tailgate: bool,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// Apply a field-restricted update. Timestamps are the store's concern.
    pub fn apply(&mut self, patch: &GamePatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = &patch.time {
            self.time = time.clone();
        }
        if let Some(tv) = &patch.tv_network {
            self.tv_network = tv.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(score) = patch.home_score {
            self.home_score = Some(score);
        }
        if let Some(score) = patch.away_score {
            self.away_score = Some(score);
        }
        if let Some(result) = patch.result {
            self.result = Some(result);
        }
        if let Some(eid) = &patch.external_id {
            self.external_id = Some(eid.clone());
        }
    }
}

/// Allow-listed mutable fields. Everything reconciliation may touch is here;
/// notably absent: `opponent`, `no_tailgate`, timestamps, `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePatch {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub tv_network: Option<String>,
    pub status: Option<GameStatus>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub result: Option<GameResult>,
    pub external_id: Option<String>,
}

impl GamePatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.time.is_none()
            && self.tv_network.is_none()
            && self.status.is_none()
            && self.home_score.is_none()
            && self.away_score.is_none()
            && self.result.is_none()
            && self.external_id.is_none()
    }
}

/// Insert shape for a newly discovered contest. The store assigns the id and
/// timestamps; `no_tailgate` starts false and stays out of sync's reach.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
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
    pub expected_attendance: u32,
}
