use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::model::game::{Game, GamePatch, NewGame};
use crate::model::sync_log::SyncLogEntry;

/// Persistence gateway. The core only ever lists, inserts, updates by id, and
/// appends log entries; there is no bulk overwrite, so overlapping passes
/// converge per-field instead of clobbering each other.
pub trait GameStore: Send + Sync {
    fn list_games(&self) -> Result<Vec<Game>, StoreError>;
    fn insert_game(&self, new: NewGame) -> Result<String, StoreError>;
    fn update_game(&self, id: &str, patch: &GamePatch) -> Result<(), StoreError>;
    fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), StoreError>;
}

fn materialize(new: NewGame, id: String, clock: &dyn Clock) -> Game {
    let now = clock.now_utc();
    Game {
        id,
        date: new.date,
        time: new.time,
        opponent: new.opponent,
        is_home: new.is_home,
        location: new.location,
        tv_network: new.tv_network,
        status: new.status,
        home_score: new.home_score,
        away_score: new.away_score,
        result: new.result,
        external_id: new.external_id,
        is_bowl_game: new.is_bowl_game,
        bowl_name: new.bowl_name,
        expected_attendance: new.expected_attendance,
        no_tailgate: false,
        last_synced_at: now,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory store used by tests and ad-hoc runs.
pub struct MemoryStore {
    games: Mutex<HashMap<String, Game>>,
    logs: Mutex<Vec<SyncLogEntry>>,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MemoryStore {
            games: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            clock,
        }
    }

    pub fn seeded(games: Vec<Game>) -> Self {
        let store = Self::new();
        {
            let mut map = store.games.lock().unwrap();
            for game in games {
                map.insert(game.id.clone(), game);
            }
        }
        store
    }

    pub fn game(&self, id: &str) -> Option<Game> {
        self.games.lock().unwrap().get(id).cloned()
    }

    pub fn sync_logs(&self) -> Vec<SyncLogEntry> {
        self.logs.lock().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore for MemoryStore {
    fn list_games(&self) -> Result<Vec<Game>, StoreError> {
        let mut games: Vec<Game> = self.games.lock().unwrap().values().cloned().collect();
        games.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(games)
    }

    fn insert_game(&self, new: NewGame) -> Result<String, StoreError> {
        let id = format!("g{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let game = materialize(new, id.clone(), self.clock.as_ref());
        self.games.lock().unwrap().insert(id.clone(), game);
        Ok(id)
    }

    fn update_game(&self, id: &str, patch: &GamePatch) -> Result<(), StoreError> {
        let mut games = self.games.lock().unwrap();
        let game = games
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownGame(id.to_string()))?;
        game.apply(patch);
        let now = self.clock.now_utc();
        game.updated_at = now;
        game.last_synced_at = now;
        Ok(())
    }

    fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), StoreError> {
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    games: Vec<Game>,
    #[serde(default)]
    sync_logs: Vec<SyncLogEntry>,
    #[serde(default)]
    next_id: u64,
}

/// Store backed by a single JSON document on disk. Every mutation rewrites
/// the file; adequate for the one-process deployment this binary targets.
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<StoreDocument>,
    clock: Arc<dyn Clock>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let doc = if path.exists() {
            let body = std::fs::read_to_string(path)?;
            serde_json::from_str(&body)?
        } else {
            info!(path = %path.display(), "No store file yet; starting empty");
            StoreDocument {
                next_id: 1,
                ..StoreDocument::default()
            }
        };
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            doc: Mutex::new(doc),
            clock: Arc::new(SystemClock),
        })
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

impl GameStore for JsonFileStore {
    fn list_games(&self) -> Result<Vec<Game>, StoreError> {
        Ok(self.doc.lock().unwrap().games.clone())
    }

    fn insert_game(&self, new: NewGame) -> Result<String, StoreError> {
        let mut doc = self.doc.lock().unwrap();
        doc.next_id = doc.next_id.max(1);
        let id = format!("g{}", doc.next_id);
        doc.next_id += 1;
        let game = materialize(new, id.clone(), self.clock.as_ref());
        doc.games.push(game);
        self.save(&doc)?;
        Ok(id)
    }

    fn update_game(&self, id: &str, patch: &GamePatch) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().unwrap();
        let now = self.clock.now_utc();
        let game = doc
            .games
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| StoreError::UnknownGame(id.to_string()))?;
        game.apply(patch);
        game.updated_at = now;
        game.last_synced_at = now;
        self.save(&doc)?;
        Ok(())
    }

    fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().unwrap();
        doc.sync_logs.push(entry.clone());
        self.save(&doc)?;
        Ok(())
    }
}
