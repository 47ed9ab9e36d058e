use serde::{Deserialize, Serialize};

/// Wire shapes for the ESPN team-schedule endpoint. Only the fields the
/// normalizer reads are modeled; everything else is ignored on deserialize.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Competition {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<CompetitionStatus>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub broadcasts: Vec<Broadcast>,
    #[serde(default)]
    pub venue: Option<Venue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompetitionStatus {
    #[serde(rename = "type")]
    pub kind: StatusType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusType {
    #[serde(default)]
    pub completed: bool,
    /// "pre", "in", or "post".
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Competitor {
    pub team: Team,
    #[serde(rename = "homeAway", default)]
    pub home_away: Option<String>,
    /// Scores arrive as strings in this document.
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub winner: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub media: Option<Media>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "shortName", default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Venue {
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}
