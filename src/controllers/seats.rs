use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::ApiError,
    middleware::SessionContext,
    models::{AvailabilitySummary, BusAvailability, BusDetails, CanonicalSeat},
    seats::{aisle_rows, normalize_all, AisleRow},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/buses/{bus_id}/seats", get(get_seat_map))
}

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub bus: Option<BusDetails>,
    pub seats: Vec<CanonicalSeat>,
    pub rows: Vec<AisleRow>,
    pub summary: AvailabilitySummary,
    pub bus_summary: Option<BusAvailability>,
}

// GET /api/buses/{bus_id}/seats
async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(bus_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if bus_id <= 0 {
        return Err(ApiError::Validation("bus_id must be > 0".to_string()));
    }

    // Карточка автобуса и места грузятся параллельно
    let (bus, raw_seats) = futures::join!(
        state.backend.fetch_bus(&ctx, bus_id),
        state.backend.fetch_seats(&ctx, bus_id)
    );

    // Карточка нужна только для отображения, без неё схема всё равно строится
    let bus = bus
        .map_err(|e| warn!("Bus {} details unavailable: {}", bus_id, e))
        .ok();

    let seats = normalize_all(&raw_seats?);
    info!("Loaded {} seats for bus {}", seats.len(), bus_id);

    Ok(Json(SeatMapResponse {
        bus_summary: bus.as_ref().and_then(BusAvailability::from_bus),
        bus,
        rows: aisle_rows(&seats),
        summary: AvailabilitySummary::from_seats(&seats),
        seats,
    }))
}
