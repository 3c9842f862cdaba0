use crate::importer;
use crate::records::{CandidateMatch, MovementKind};
use crate::session::{AppState, Session};
use crate::stats::{aggregate, bankroll, segments};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use portable_atomic::Ordering::Relaxed;
use serde_json::json;
use std::sync::Arc;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBody {
    pub text: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBody {
    pub matches: Vec<CandidateMatch>,
    pub stake: f64,
}

#[derive(serde::Deserialize)]
pub struct SettleBody {
    pub observed: f64,
}

#[derive(serde::Deserialize)]
pub struct OddBody {
    pub odd: f64,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementBody {
    pub kind: MovementKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

/// Best-effort persistence after a successful mutation. The in-memory
/// session is authoritative; a failed save is logged, not surfaced.
async fn persist_wagers(state: &Arc<AppState>, session: &Session) {
    if let Err(e) = state.store.save_wagers(&session.wagers).await {
        tracing::warn!(error = %e, "wager save failed");
    }
}

async fn persist_movements(state: &Arc<AppState>, session: &Session) {
    if let Err(e) = state.store.save_movements(&session.movements).await {
        tracing::warn!(error = %e, "movement save failed");
    }
}

/// GET /api/state -- session phase plus the bankroll snapshot
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let session = state.session.read().await;
    let now = chrono::Utc::now();
    let snapshot = bankroll::snapshot(&session.movements, &session.wagers, now);
    Json(json!({
        "phase": session.phase,
        "bankroll": snapshot,
        "wagerCount": session.wagers.len(),
        "movementCount": session.movements.len(),
    }))
}

/// GET /api/stats -- KPIs and model accuracy, filterable
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<aggregate::StatsFilter>,
) -> Json<serde_json::Value> {
    let session = state.session.read().await;
    let wagers = filter.apply(&session.wagers);
    Json(json!({
        "kpis": aggregate::compute_kpis(&wagers),
        "accuracy": aggregate::accuracy_report(&wagers),
    }))
}

/// GET /api/series -- cumulative and daily profit series
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<aggregate::StatsFilter>,
) -> Json<serde_json::Value> {
    let session = state.session.read().await;
    let wagers = filter.apply(&session.wagers);
    let cumulative = aggregate::cumulative_series(&wagers);
    let daily = aggregate::daily_series(&wagers);
    let volatility = aggregate::rolling_volatility(&daily, aggregate::VOLATILITY_WINDOW);
    Json(json!({
        "cumulative": cumulative,
        "daily": daily,
        "volatility": volatility,
    }))
}

/// GET /api/segments -- odds bands, referee breakdown, side split
pub async fn get_segments(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let session = state.session.read().await;
    Json(json!({
        "oddsBands": segments::odds_bands(&session.wagers),
        "referees": segments::referee_breakdown(&session.wagers, state.config.referee_display_limit),
        "sides": segments::side_split(&session.wagers),
    }))
}

#[derive(serde::Deserialize)]
pub struct WagersQuery {
    pub status: Option<String>,
}

/// GET /api/wagers -- optionally narrowed to ?status=open|settled
pub async fn get_wagers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WagersQuery>,
) -> Json<serde_json::Value> {
    let session = state.session.read().await;
    let wagers: Vec<_> = match params.status.as_deref() {
        Some("open") => session.wagers.iter().filter(|w| w.is_open()).collect(),
        Some("settled") => session.wagers.iter().filter(|w| w.is_settled()).collect(),
        _ => session.wagers.iter().collect(),
    };
    Json(json!({ "wagers": wagers }))
}

/// GET /api/movements
pub async fn get_movements(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let session = state.session.read().await;
    Json(json!({ "movements": session.movements }))
}

/// GET /api/counters -- operation and sync counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "imports_parsed": state.counters.imports_parsed.load(Relaxed),
        "bets_placed": state.counters.bets_placed.load(Relaxed),
        "settlements": state.counters.settlements.load(Relaxed),
        "local_saves": state.store.counters.local_saves.load(Relaxed),
        "mirror_saves": state.store.counters.mirror_saves.load(Relaxed),
        "mirror_failures": state.store.counters.mirror_failures.load(Relaxed),
    }))
}

/// POST /api/import -- parse pasted text into candidate matches.
/// Nothing is placed; the caller reviews and submits to POST /api/wagers.
pub async fn post_import(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImportBody>,
) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let parsed = match body.format.as_deref() {
        Some("csv") => importer::parse_csv(&body.text, now),
        _ => importer::parse_free_text(&body.text, now),
    };
    match parsed {
        Ok(matches) => {
            state.counters.imports_parsed.fetch_add(matches.len() as u64, Relaxed);
            Json(json!({ "matches": matches }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/wagers -- place bets on parsed candidates
pub async fn post_wagers(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlaceBody>,
) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let mut session = state.session.write().await;
    match session.place_bets(body.matches, body.stake, now) {
        Ok(ids) => {
            state.counters.bets_placed.fetch_add(ids.len() as u64, Relaxed);
            persist_wagers(&state, &session).await;
            Json(json!({ "placed": ids, "balance": session.balance(now) }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/wagers/{id}/settle
pub async fn post_settle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SettleBody>,
) -> Json<serde_json::Value> {
    let mut session = state.session.write().await;
    match session.settle_wager(&id, body.observed) {
        Ok(wager) => {
            state.counters.settlements.fetch_add(1, Relaxed);
            persist_wagers(&state, &session).await;
            Json(json!({ "wager": wager }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/wagers/{id}/reset -- undo a same-day settlement
pub async fn post_reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let mut session = state.session.write().await;
    match session.reset_wager(&id, now) {
        Ok(wager) => {
            persist_wagers(&state, &session).await;
            Json(json!({ "wager": wager }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/wagers/{id}/odd -- correct a priced odd
pub async fn post_odd(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OddBody>,
) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let mut session = state.session.write().await;
    match session.reprice_wager(&id, body.odd, now) {
        Ok(changed) => {
            if changed {
                persist_wagers(&state, &session).await;
            }
            Json(json!({ "changed": changed }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// DELETE /api/wagers/{id} -- same-day only
pub async fn delete_wager(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let mut session = state.session.write().await;
    match session.delete_wager(&id, now) {
        Ok(()) => {
            persist_wagers(&state, &session).await;
            Json(json!({ "deleted": id, "balance": session.balance(now) }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/movements -- record a deposit or withdrawal
pub async fn post_movement(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MovementBody>,
) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let mut session = state.session.write().await;
    match session.record_movement(body.kind, body.amount, body.description, now) {
        Ok(id) => {
            persist_movements(&state, &session).await;
            Json(json!({ "id": id, "balance": session.balance(now) }))
        }
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/reload -- re-run the initial load. The recovery path when
/// the session is stuck in LoadFailed.
pub async fn post_reload(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.run_initial_load().await;
    let session = state.session.read().await;
    Json(json!({ "phase": session.phase }))
}
