use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{ApiError, SessionError},
    middleware::SessionContext,
    models::SeatId,
    seats::{normalize_all, ToggleOutcome},
    services::sessions::SessionSnapshot,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/selections", post(create_selection))
        .route("/selections/{id}", get(get_selection).delete(delete_selection))
        .route("/selections/{id}/reload", post(reload_selection))
        .route("/selections/{id}/toggle", patch(toggle_seat))
        .route("/selections/{id}/checkout", post(checkout))
}

/* ---------- helpers ---------- */

/// Загружает места для сессии под билетом. Устаревший ответ не трогает состояние.
async fn load_seats(state: &AppState, ctx: &SessionContext, id: Uuid) -> Result<bool, ApiError> {
    let (bus_id, ticket) = state.selections.begin_load(id).await?;
    let raw = state.backend.fetch_seats(ctx, bus_id).await?;
    let seats = normalize_all(&raw);
    let count = seats.len();

    let applied = state.selections.apply_load(id, ticket, seats).await?;
    if applied {
        info!("Loaded {} seats for bus {} into session {}", count, bus_id, id);
    }
    Ok(applied)
}

/* ---------- SELECTIONS ---------- */

// POST /api/selections
#[derive(Debug, Deserialize, Validate)]
struct CreateSelectionRequest {
    #[validate(range(min = 1, message = "bus_id must be > 0"))]
    pub bus_id: i64,
}

async fn create_selection(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Json(req): Json<CreateSelectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let id = state.selections.create(req.bus_id).await;
    if let Err(e) = load_seats(&state, &ctx, id).await {
        // Сессия без мест клиенту не нужна
        state.selections.remove(id).await;
        return Err(e);
    }

    let snapshot = state.selections.snapshot(id).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

// GET /api/selections/{id}
async fn get_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.selections.snapshot(id).await?))
}

// DELETE /api/selections/{id}
async fn delete_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.selections.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::NotFound(id).into())
    }
}

// POST /api/selections/{id}/reload
#[derive(Debug, Serialize)]
struct ReloadResponse {
    stale: bool,
    #[serde(flatten)]
    session: SessionSnapshot,
}

async fn reload_selection(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let applied = load_seats(&state, &ctx, id).await?;
    let session = state.selections.snapshot(id).await?;

    Ok(Json(ReloadResponse {
        stale: !applied,
        session,
    }))
}

// PATCH /api/selections/{id}/toggle
#[derive(Debug, Deserialize)]
struct ToggleRequest {
    pub seat_id: SeatId,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    outcome: ToggleOutcome,
    #[serde(flatten)]
    session: SessionSnapshot,
}

async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let (outcome, session) = state.selections.toggle(id, &req.seat_id).await?;
    Ok(Json(ToggleResponse { outcome, session }))
}

// POST /api/selections/{id}/checkout
async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let handoff = state.selections.checkout(id).await?;
    info!(
        "Session {} handed {} seats to payment, total {}",
        id,
        handoff.seat_ids.len(),
        handoff.total_amount
    );
    Ok(Json(handoff))
}
