use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use ladder_engine::{Ladder, RecordedMatch};
use ladder_log::Transaction;
use ladder_types::{MatchOutcome, Player, PlayerId, SetScore, TransactionId};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ladder: Arc<Ladder>,
    pub config: Arc<ServerConfig>,
}

/// Run a synchronous engine call on the blocking pool.
async fn engine<T, F>(state: &AppState, call: F) -> ServerResult<T>
where
    F: FnOnce(&Ladder) -> ladder_engine::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let ladder = Arc::clone(&state.ladder);
    let result = tokio::task::spawn_blocking(move || call(&ladder))
        .await
        .map_err(|e| ServerError::Internal(format!("engine task failed: {e}")))?;
    Ok(result?)
}

#[derive(Debug, Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordMatchRequest {
    pub side_a: String,
    pub side_b: String,
    pub winner: String,
    /// Set scores in text form, e.g. `"11-5"` or `"4-D"`.
    pub set_scores: Vec<String>,
}

impl RecordMatchRequest {
    fn into_outcome(self) -> ServerResult<MatchOutcome> {
        let set_scores = self
            .set_scores
            .iter()
            .map(|s| s.parse::<SetScore>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        Ok(MatchOutcome {
            side_a: self.side_a.into(),
            side_b: self.side_b.into(),
            winner: self.winner.into(),
            set_scores,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TransactionAck {
    pub transaction_id: TransactionId,
}

#[derive(Debug, Serialize)]
pub struct PlayersEnvelope {
    pub players: Vec<Player>,
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<serde_json::Value>> {
    let players = engine(&state, |l| l.standings()).await?.len();
    Ok(Json(json!({
        "name": "ladder-server",
        "version": env!("CARGO_PKG_VERSION"),
        "players": players,
        "log_path": state.config.log.path.display().to_string(),
    })))
}

pub async fn list_players(State(state): State<AppState>) -> ServerResult<Json<Vec<Player>>> {
    Ok(Json(engine(&state, |l| l.list_players()).await?))
}

/// `GET /api/players`, kept for clients that expect the players wrapped in
/// an object.
pub async fn list_players_envelope(
    State(state): State<AppState>,
) -> ServerResult<Json<PlayersEnvelope>> {
    let players = engine(&state, |l| l.list_players()).await?;
    Ok(Json(PlayersEnvelope { players }))
}

pub async fn add_player(
    State(state): State<AppState>,
    Json(req): Json<AddPlayerRequest>,
) -> ServerResult<(StatusCode, Json<Player>)> {
    let id = req.id.map(PlayerId::from);
    let player = engine(&state, move |l| l.add_player(&req.name, id)).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn remove_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<TransactionAck>> {
    let id = PlayerId::from(id);
    let transaction_id = engine(&state, move |l| l.remove_player(&id)).await?;
    Ok(Json(TransactionAck { transaction_id }))
}

pub async fn record_match(
    State(state): State<AppState>,
    Json(req): Json<RecordMatchRequest>,
) -> ServerResult<(StatusCode, Json<TransactionAck>)> {
    let outcome = req.into_outcome()?;
    let transaction_id = engine(&state, move |l| l.record_match(outcome)).await?;
    Ok((StatusCode::CREATED, Json(TransactionAck { transaction_id })))
}

pub async fn list_matches(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ServerResult<Json<Vec<RecordedMatch>>> {
    let limit = state.config.recent_limit(q.limit);
    Ok(Json(
        engine(&state, move |l| l.list_recent_matches(limit)).await?,
    ))
}

pub async fn invalidate_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<TransactionAck>> {
    let target: TransactionId = id
        .parse()
        .map_err(|e: ladder_types::TypeError| ServerError::BadRequest(e.to_string()))?;
    let transaction_id = engine(&state, move |l| l.invalidate_match(target)).await?;
    Ok(Json(TransactionAck { transaction_id }))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ServerResult<Json<Vec<Transaction>>> {
    let limit = state.config.recent_limit(q.limit);
    Ok(Json(engine(&state, move |l| l.history(limit)).await?))
}
