use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{error, info, instrument, warn};

use crate::athletics::AthleticsSource;
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::espn::EspnSource;
use crate::model::sync_log::{FieldChange, SyncLogEntry, SyncSource};
use crate::normalize::{GameCandidate, ScheduleSource};
use crate::reconcile::{self, GameOp, Reconciliation};
use crate::scheduler::{Cadence, JobOutcome, JobScheduler};
use crate::store::GameStore;

/// Result of one applied pass. Counts reflect what actually persisted.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub added: u32,
    pub updated: u32,
    pub errors: Vec<String>,
    pub source: SyncSource,
    pub changes: Vec<FieldChange>,
}

impl SyncOutcome {
    fn empty(source: SyncSource) -> Self {
        SyncOutcome {
            added: 0,
            updated: 0,
            errors: Vec::new(),
            source,
            changes: Vec::new(),
        }
    }

    fn failed(source: SyncSource, error: String) -> Self {
        let mut outcome = Self::empty(source);
        outcome.errors.push(error);
        outcome
    }

    fn absorb(&mut self, other: SyncOutcome) {
        self.added += other.added;
        self.updated += other.updated;
        self.errors.extend(other.errors);
        self.changes.extend(other.changes);
        if other.source == SyncSource::Fallback {
            self.source = SyncSource::Fallback;
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_changes(&self) -> u32 {
        self.added + self.updated
    }
}

/// Result of one comprehensive pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub timestamp: DateTime<Utc>,
    pub schedule: SyncOutcome,
    pub scores: SyncOutcome,
}

impl SyncReport {
    pub fn total_changes(&self) -> u32 {
        self.schedule.total_changes() + self.scores.total_changes()
    }

    pub fn errors(&self) -> Vec<String> {
        let mut errors = self.schedule.errors.clone();
        errors.extend(self.scores.errors.clone());
        errors
    }

    pub fn is_clean(&self) -> bool {
        self.schedule.is_clean() && self.scores.is_clean()
    }
}

/// Composes fetch, normalize, match, diff, and apply into full passes.
/// Everything it depends on is injected: sources, the persistence gateway,
/// and the clock.
pub struct SyncService {
    sources: Vec<Arc<dyn ScheduleSource>>,
    store: Arc<dyn GameStore>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
}

impl SyncService {
    /// Service with the default adapter pair: structured feed, then the
    /// scraped page (official announcements win later in the batch order).
    pub fn new(config: SyncConfig, store: Arc<dyn GameStore>, clock: Arc<dyn Clock>) -> Self {
        let espn = Arc::new(EspnSource::new(&config));
        let athletics = Arc::new(AthleticsSource::new(&config, clock.clone()));
        Self::with_sources(config, store, clock, vec![espn, athletics])
    }

    pub fn with_sources(
        config: SyncConfig,
        store: Arc<dyn GameStore>,
        clock: Arc<dyn Clock>,
        sources: Vec<Arc<dyn ScheduleSource>>,
    ) -> Self {
        SyncService {
            sources,
            store,
            clock,
            config,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.today(self.config.timezone)
    }

    fn season(&self) -> i32 {
        self.today().year()
    }

    /// Fetch from every source concurrently; batches come back in source
    /// order so the structured feed is processed first.
    async fn fetch_all(&self, season: i32, scores: bool) -> Vec<GameCandidate> {
        let mut handles = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            // Each blocking fetch owns its source handle.
            let source = source.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let batch = if scores {
                    source.fetch_scores(season)
                } else {
                    source.fetch_schedule(season)
                };
                (source.name(), batch)
            }));
        }

        let mut batch = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((name, candidates)) => {
                    info!(source = name, count = candidates.len(), scores, "Source batch fetched");
                    batch.extend(candidates);
                }
                Err(e) => error!(error = %e, "Fetch task failed"),
            }
        }
        batch
    }

    /// Issue the reconciler's ops as keyed upserts. A failed record lands in
    /// the error list and its count is rolled back; the rest still apply.
    fn apply(&self, recon: Reconciliation, source: SyncSource) -> SyncOutcome {
        let Reconciliation {
            mut added,
            mut updated,
            mut errors,
            changes,
            ops,
        } = recon;

        for op in ops {
            match op {
                GameOp::Insert(new_game) => {
                    let opponent = new_game.opponent.clone();
                    match self.store.insert_game(new_game) {
                        Ok(id) => info!(game = %id, opponent = %opponent, "Added game"),
                        Err(e) => {
                            errors.push(format!("insert {}: {}", opponent, e));
                            added = added.saturating_sub(1);
                        }
                    }
                }
                GameOp::Update { id, patch } => {
                    if let Err(e) = self.store.update_game(&id, &patch) {
                        errors.push(format!("update {}: {}", id, e));
                        updated = updated.saturating_sub(1);
                    }
                }
            }
        }

        SyncOutcome {
            added,
            updated,
            errors,
            source,
            changes,
        }
    }

    /// Schedule reconciliation: new contests, kickoff times, networks, date
    /// moves, feed correlation, plus bowl-window detection.
    #[instrument(level = "info", skip(self))]
    pub async fn run_schedule_sync(&self) -> SyncOutcome {
        let season = self.season();
        let incoming = self.fetch_all(season, false).await;
        let stored = match self.store.list_games() {
            Ok(games) => games,
            Err(e) => return SyncOutcome::failed(SyncSource::Live, format!("list games: {}", e)),
        };

        let recon = reconcile::reconcile_schedule(&incoming, &stored);
        let mut outcome = self.apply(recon, SyncSource::Live);

        if reconcile::is_bowl_window(self.today()) {
            outcome.absorb(self.run_bowl_detection(season).await);
        }

        info!(
            added = outcome.added,
            updated = outcome.updated,
            errors = outcome.errors.len(),
            "Schedule sync complete"
        );
        outcome
    }

    /// Re-fetch during the bowl window and insert any postseason contest the
    /// schedule pass has not already stored.
    async fn run_bowl_detection(&self, season: i32) -> SyncOutcome {
        let bowls: Vec<GameCandidate> = self
            .fetch_all(season, false)
            .await
            .into_iter()
            .filter(|candidate| candidate.is_bowl_game)
            .collect();
        if bowls.is_empty() {
            return SyncOutcome::empty(SyncSource::Live);
        }

        // Re-list so inserts from the pass we just applied are visible.
        let stored = match self.store.list_games() {
            Ok(games) => games,
            Err(e) => return SyncOutcome::failed(SyncSource::Live, format!("list games: {}", e)),
        };

        let recon = reconcile::reconcile_schedule(&bowls, &stored);
        let inserts_only = Reconciliation {
            added: recon.added,
            updated: 0,
            errors: recon.errors,
            changes: Vec::new(),
            ops: recon
                .ops
                .into_iter()
                .filter(|op| matches!(op, GameOp::Insert(_)))
                .collect(),
        };
        let outcome = self.apply(inserts_only, SyncSource::Live);
        if outcome.added > 0 {
            info!(added = outcome.added, "Bowl window added postseason games");
        }
        outcome
    }

    /// Score reconciliation. When every fetcher comes back empty the
    /// configured backup table keeps the pass moving, tagged as fallback.
    #[instrument(level = "info", skip(self))]
    pub async fn run_score_sync(&self) -> SyncOutcome {
        let season = self.season();
        let mut incoming = self.fetch_all(season, true).await;
        let mut source = SyncSource::Live;
        if incoming.is_empty() {
            warn!(
                season,
                backup = self.config.backup_scores.len(),
                "All score fetches failed; using backup score table"
            );
            incoming = self.config.backup_scores.clone();
            source = SyncSource::Fallback;
        }

        let stored = match self.store.list_games() {
            Ok(games) => games,
            Err(e) => return SyncOutcome::failed(source, format!("list games: {}", e)),
        };

        let recon = reconcile::reconcile_scores(&incoming, &stored);
        let outcome = self.apply(recon, source);
        info!(
            updated = outcome.updated,
            errors = outcome.errors.len(),
            source = ?outcome.source,
            "Score sync complete"
        );
        outcome
    }

    /// Full pass: schedule, then scores, then one log entry — a single unit
    /// for callers.
    #[instrument(level = "info", skip(self))]
    pub async fn run_comprehensive_sync(&self) -> SyncReport {
        let schedule = self.run_schedule_sync().await;
        let scores = self.run_score_sync().await;
        let report = SyncReport {
            timestamp: self.clock.now_utc(),
            schedule,
            scores,
        };

        let mut changes = report.schedule.changes.clone();
        changes.extend(report.scores.changes.clone());
        let entry = SyncLogEntry {
            timestamp: report.timestamp,
            added: report.schedule.added + report.scores.added,
            updated: report.schedule.updated + report.scores.updated,
            errors: report.errors(),
            source: report.scores.source,
            changes,
        };
        if let Err(e) = self.store.append_sync_log(&entry) {
            error!(error = %e, "Failed to append sync log entry");
        }

        info!(total = report.total_changes(), "Comprehensive sync complete");
        report
    }

    /// True iff some stored game is today in the configured timezone.
    pub fn is_game_day(&self) -> bool {
        let today = self.today();
        match self.store.list_games() {
            Ok(games) => games.iter().any(|game| game.date == today),
            Err(e) => {
                error!(error = %e, "Game-day check failed; assuming not a game day");
                false
            }
        }
    }
}

impl From<&SyncOutcome> for JobOutcome {
    fn from(outcome: &SyncOutcome) -> Self {
        JobOutcome::Completed {
            added: outcome.added,
            updated: outcome.updated,
            errors: outcome.errors.len() as u32,
        }
    }
}

impl From<&SyncReport> for JobOutcome {
    fn from(report: &SyncReport) -> Self {
        JobOutcome::Completed {
            added: report.schedule.added + report.scores.added,
            updated: report.schedule.updated + report.scores.updated,
            errors: report.errors().len() as u32,
        }
    }
}

/// Register the default job set: daily comprehensive pass, frequent
/// game-day-gated score pass, slower off-season comprehensive pass, and the
/// weekly deep pass.
pub fn register_default_jobs(scheduler: &JobScheduler, service: Arc<SyncService>) {
    let cadences = service.config.cadences.clone();

    register_comprehensive(scheduler, "daily-schedule-sync", cadences.daily_schedule, service.clone(), None);

    let score_service = service.clone();
    scheduler.register("game-day-score-sync", cadences.game_day_scores, move || {
        let service = score_service.clone();
        async move {
            if !service.is_game_day() {
                return JobOutcome::Skipped;
            }
            let outcome = service.run_score_sync().await;
            JobOutcome::from(&outcome)
        }
    });

    register_comprehensive(
        scheduler,
        "off-season-sync",
        cadences.off_season,
        service.clone(),
        Some(false),
    );
    register_comprehensive(scheduler, "weekly-deep-sync", cadences.weekly_deep, service, None);
}

/// Comprehensive job, optionally gated on `is_game_day()` equaling
/// `game_day_gate`.
fn register_comprehensive(
    scheduler: &JobScheduler,
    name: &str,
    cadence: Cadence,
    service: Arc<SyncService>,
    game_day_gate: Option<bool>,
) {
    scheduler.register(name, cadence, move || {
        let service = service.clone();
        async move {
            if let Some(required) = game_day_gate {
                if service.is_game_day() != required {
                    return JobOutcome::Skipped;
                }
            }
            let report = service.run_comprehensive_sync().await;
            JobOutcome::from(&report)
        }
    });
}
