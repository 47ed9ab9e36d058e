use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::matcher;
use crate::model::game::{Game, GamePatch, GameResult, GameStatus, NewGame, TBD};
use crate::model::sync_log::FieldChange;
use crate::normalize::GameCandidate;

/// Result of one pure reconciliation step. `added`/`updated` count the ops
/// emitted; the apply step adjusts them when persistence fails per-record.
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub added: u32,
    pub updated: u32,
    pub errors: Vec<String>,
    pub changes: Vec<FieldChange>,
    pub ops: Vec<GameOp>,
}

/// Persistence operations the apply step issues as keyed upserts.
#[derive(Debug, Clone, PartialEq)]
pub enum GameOp {
    Insert(NewGame),
    Update { id: String, patch: GamePatch },
}

/// Dec-Jan, judged on the processing date (not the game date).
pub fn is_bowl_window(today: NaiveDate) -> bool {
    matches!(today.month(), 12 | 1)
}

/// Diff incoming schedule records against stored state.
///
/// Matched records produce a field-restricted update (or nothing); unmatched
/// records produce an insert. Both kinds dedup inside the batch: an unmatched
/// record matching an insert already pending is dropped, and a later
/// candidate for an already-patched game diffs against the pending patch, so
/// two sources reporting the same change yield one op and one count. Pure:
/// no I/O, no clock.
pub fn reconcile_schedule(incoming: &[GameCandidate], stored: &[Game]) -> Reconciliation {
    let mut recon = Reconciliation::default();
    let mut pending_inserts: Vec<NewGame> = Vec::new();
    let mut pending_updates: HashMap<String, usize> = HashMap::new();

    for candidate in incoming {
        if candidate.opponent.trim().is_empty() {
            debug!(date = %candidate.date, source = %candidate.source, "Skipping record with empty opponent");
            continue;
        }

        match matcher::resolve(&candidate.opponent, candidate.date, stored) {
            Some(game) => {
                let effective = with_pending(game, &pending_updates, &recon.ops);
                let (patch, changes) = schedule_patch(&effective, candidate);
                if !patch.is_empty() {
                    recon.changes.extend(changes);
                    stage_update(&mut recon, &mut pending_updates, &game.id, patch);
                }
            }
            None => {
                let already_pending = pending_inserts
                    .iter()
                    .any(|pending| matcher::names_match(&pending.opponent, &candidate.opponent));
                if already_pending {
                    debug!(opponent = %candidate.opponent, source = %candidate.source, "Insert already pending for this contest");
                    continue;
                }
                let new_game = candidate.clone().into_new_game();
                pending_inserts.push(new_game.clone());
                recon.added += 1;
                recon.ops.push(GameOp::Insert(new_game));
            }
        }
    }

    recon
}

/// The stored game with the batch's pending patch (if any) already applied,
/// so a later candidate only diffs what is still different.
fn with_pending(game: &Game, pending: &HashMap<String, usize>, ops: &[GameOp]) -> Game {
    let mut effective = game.clone();
    if let Some(&idx) = pending.get(&game.id) {
        if let GameOp::Update { patch, .. } = &ops[idx] {
            effective.apply(patch);
        }
    }
    effective
}

/// Record an update op, folding into the game's pending op when one exists.
fn stage_update(
    recon: &mut Reconciliation,
    pending: &mut HashMap<String, usize>,
    id: &str,
    patch: GamePatch,
) {
    match pending.get(id) {
        Some(&idx) => {
            if let GameOp::Update { patch: staged, .. } = &mut recon.ops[idx] {
                merge_patch(staged, patch);
            }
        }
        None => {
            recon.updated += 1;
            pending.insert(id.to_string(), recon.ops.len());
            recon.ops.push(GameOp::Update {
                id: id.to_string(),
                patch,
            });
        }
    }
}

fn merge_patch(staged: &mut GamePatch, patch: GamePatch) {
    if patch.date.is_some() {
        staged.date = patch.date;
    }
    if patch.time.is_some() {
        staged.time = patch.time;
    }
    if patch.tv_network.is_some() {
        staged.tv_network = patch.tv_network;
    }
    if patch.status.is_some() {
        staged.status = patch.status;
    }
    if patch.home_score.is_some() {
        staged.home_score = patch.home_score;
    }
    if patch.away_score.is_some() {
        staged.away_score = patch.away_score;
    }
    if patch.result.is_some() {
        staged.result = patch.result;
    }
    if patch.external_id.is_some() {
        staged.external_id = patch.external_id;
    }
}

/// Allow-listed schedule diff: {time, tv_network, date, external_id-if-absent,
/// status forward to completed}. The TBD sentinel never overwrites a concrete
/// value.
fn schedule_patch(game: &Game, candidate: &GameCandidate) -> (GamePatch, Vec<FieldChange>) {
    let mut patch = GamePatch::default();
    let mut changes = Vec::new();
    let source = candidate.source.to_string();

    if candidate.time != TBD && !candidate.time.is_empty() && candidate.time != game.time {
        changes.push(change(game, "time", &game.time, &candidate.time, &source));
        patch.time = Some(candidate.time.clone());
    }

    if candidate.tv_network != TBD
        && !candidate.tv_network.is_empty()
        && candidate.tv_network != game.tv_network
    {
        changes.push(change(
            game,
            "tvNetwork",
            &game.tv_network,
            &candidate.tv_network,
            &source,
        ));
        patch.tv_network = Some(candidate.tv_network.clone());
    }

    if candidate.date != game.date {
        changes.push(change(
            game,
            "date",
            &game.date.to_string(),
            &candidate.date.to_string(),
            &source,
        ));
        patch.date = Some(candidate.date);
    }

    if let Some(eid) = &candidate.external_id {
        if game.external_id.is_none() {
            changes.push(change(game, "externalId", "", eid, &source));
            patch.external_id = Some(eid.clone());
        }
    }

    if candidate.status == GameStatus::Completed
        && game.status.can_advance_to(GameStatus::Completed)
    {
        changes.push(change(game, "status", "", "completed", &source));
        patch.status = Some(GameStatus::Completed);
    }

    (patch, changes)
}

/// Diff incoming completed records against stored state for score updates.
/// Already-completed, unchanged games produce no ops (idempotence); status
/// never regresses. Score records never insert.
pub fn reconcile_scores(incoming: &[GameCandidate], stored: &[Game]) -> Reconciliation {
    let mut recon = Reconciliation::default();
    let mut pending_updates: HashMap<String, usize> = HashMap::new();

    for candidate in incoming {
        if candidate.status != GameStatus::Completed {
            continue;
        }
        if candidate.opponent.trim().is_empty() {
            continue;
        }

        let Some(game) = matcher::resolve(&candidate.opponent, candidate.date, stored) else {
            debug!(opponent = %candidate.opponent, "Score record has no stored counterpart; ignoring");
            continue;
        };

        let effective = with_pending(game, &pending_updates, &recon.ops);
        let (patch, changes) = score_patch(&effective, candidate);
        if !patch.is_empty() {
            recon.changes.extend(changes);
            stage_update(&mut recon, &mut pending_updates, &game.id, patch);
        }
    }

    recon
}

fn score_patch(game: &Game, candidate: &GameCandidate) -> (GamePatch, Vec<FieldChange>) {
    let mut patch = GamePatch::default();
    let mut changes = Vec::new();
    let source = candidate.source.to_string();

    if let Some(score) = candidate.home_score {
        if game.home_score != Some(score) {
            changes.push(change(
                game,
                "homeScore",
                &display_score(game.home_score),
                &score.to_string(),
                &source,
            ));
            patch.home_score = Some(score);
        }
    }

    if let Some(score) = candidate.away_score {
        if game.away_score != Some(score) {
            changes.push(change(
                game,
                "awayScore",
                &display_score(game.away_score),
                &score.to_string(),
                &source,
            ));
            patch.away_score = Some(score);
        }
    }

    if game.status.can_advance_to(GameStatus::Completed) {
        changes.push(change(game, "status", "", "completed", &source));
        patch.status = Some(GameStatus::Completed);
    }

    if let Some(result) = candidate.result {
        if game.result != Some(result) {
            changes.push(change(
                game,
                "result",
                &display_result(game.result),
                result_code(result),
                &source,
            ));
            patch.result = Some(result);
        }
    }

    if let Some(eid) = &candidate.external_id {
        if game.external_id.is_none() {
            changes.push(change(game, "externalId", "", eid, &source));
            patch.external_id = Some(eid.clone());
        }
    }

    (patch, changes)
}

fn change(game: &Game, field: &str, old: &str, new: &str, source: &str) -> FieldChange {
    FieldChange {
        game_id: game.id.clone(),
        field: field.to_string(),
        old_value: old.to_string(),
        new_value: new.to_string(),
        source: source.to_string(),
    }
}

fn display_score(score: Option<u32>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

fn result_code(result: GameResult) -> &'static str {
    match result {
        GameResult::Win => "W",
        GameResult::Loss => "L",
        GameResult::Tie => "T",
    }
}

fn display_result(result: Option<GameResult>) -> String {
    result.map(|r| result_code(r).to_string()).unwrap_or_default()
}
