//! sessions.rs
//!
//! Хранилище сессий выбора мест. Одна сессия - один пользователь, смотрящий один автобус.
//!
//! Загрузки списка мест могут перегонять друг друга, поэтому каждая загрузка
//! получает билет (`LoadTicket`) до похода в бэкенд. Ответ применяется только если
//! его билет новее последнего применённого; опоздавшие ответы выбрасываются.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::{AvailabilitySummary, CanonicalSeat, PaymentHandoff, SeatId};
use crate::seats::{aisle_rows, AisleRow, SelectionState, ToggleOutcome, MAX_SELECTABLE};

const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone)]
pub struct SelectionSession {
    pub id: Uuid,
    pub bus_id: i64,
    pub selection: SelectionState,
    pub seats: Vec<CanonicalSeat>,
    issued_load: u64,
    applied_load: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl SelectionSession {
    pub fn new(bus_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bus_id,
            selection: SelectionState::new(),
            seats: Vec::new(),
            issued_load: 0,
            applied_load: 0,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_load += 1;
        LoadTicket(self.issued_load)
    }

    /// Устанавливает свежий список и сверяет с ним выбор.
    /// Принимается только ответ на последний выданный билет, даже если более
    /// новая загрузка завершилась ошибкой. Возвращает `false`, если ответ выброшен.
    pub fn apply_load(&mut self, ticket: LoadTicket, seats: Vec<CanonicalSeat>) -> bool {
        if ticket.0 != self.issued_load || ticket.0 <= self.applied_load {
            debug!(
                "Discarding stale seat load {} for session {} (issued {}, applied {})",
                ticket.0, self.id, self.issued_load, self.applied_load
            );
            return false;
        }

        self.applied_load = ticket.0;
        let dropped = self.selection.reconcile(&seats);
        if dropped > 0 {
            debug!("Reconcile dropped {} selected seats in session {}", dropped, self.id);
        }
        self.seats = seats;
        true
    }

    pub fn toggle(&mut self, seat_id: &SeatId) -> Result<ToggleOutcome, SessionError> {
        let seat = self
            .seats
            .iter()
            .find(|s| s.id == *seat_id)
            .ok_or_else(|| SessionError::SeatNotFound(seat_id.clone()))?;

        Ok(self.selection.toggle(seat)?)
    }

    pub fn checkout(&self) -> Result<PaymentHandoff, SessionError> {
        Ok(self.selection.checkout(self.bus_id, &self.seats)?)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            bus_id: self.bus_id,
            rows: aisle_rows(&self.seats),
            summary: AvailabilitySummary::from_seats(&self.seats),
            selected_ids: self.selection.selected_ids().to_vec(),
            selected_seats: self
                .selection
                .selected_seats(&self.seats)
                .into_iter()
                .cloned()
                .collect(),
            total: self.selection.total(&self.seats),
            count: self.selection.len(),
            max: MAX_SELECTABLE,
            seats: self.seats.clone(),
        }
    }
}

/// То, что видит клиент: схема салона и текущий выбор.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub bus_id: i64,
    pub seats: Vec<CanonicalSeat>,
    pub rows: Vec<AisleRow>,
    pub summary: AvailabilitySummary,
    pub selected_ids: Vec<SeatId>,
    pub selected_seats: Vec<CanonicalSeat>,
    pub total: f64,
    pub count: usize,
    pub max: usize,
}

#[derive(Clone)]
pub struct SelectionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SelectionSession>>>,
    ttl: Duration,
}

impl SelectionStore {
    /// TTL проверяется при загрузке конфигурации; недопустимое значение
    /// заменяется значением по умолчанию.
    pub fn new(ttl_minutes: i64) -> Self {
        let ttl = Duration::try_minutes(ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .unwrap_or_else(|| {
                warn!(
                    "Invalid session TTL {} minutes, using {}",
                    ttl_minutes, DEFAULT_SESSION_TTL_MINUTES
                );
                Duration::minutes(DEFAULT_SESSION_TTL_MINUTES)
            });

        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self, bus_id: i64) -> Uuid {
        let session = SelectionSession::new(bus_id);
        let id = session.id;
        self.sessions.write().await.insert(id, session);
        info!("Selection session {} opened for bus {}", id, bus_id);
        id
    }

    /// Выдаёт билет на загрузку. Возвращает автобус сессии, чтобы знать, что загружать.
    pub async fn begin_load(&self, id: Uuid) -> Result<(i64, LoadTicket), SessionError> {
        self.with_session(id, |session| Ok((session.bus_id, session.begin_load())))
            .await
    }

    pub async fn apply_load(
        &self,
        id: Uuid,
        ticket: LoadTicket,
        seats: Vec<CanonicalSeat>,
    ) -> Result<bool, SessionError> {
        self.with_session(id, |session| Ok(session.apply_load(ticket, seats)))
            .await
    }

    pub async fn toggle(
        &self,
        id: Uuid,
        seat_id: &SeatId,
    ) -> Result<(ToggleOutcome, SessionSnapshot), SessionError> {
        self.with_session(id, |session| {
            let outcome = session.toggle(seat_id)?;
            debug!("Session {}: seat {} {:?}", id, seat_id, outcome);
            Ok((outcome, session.snapshot()))
        })
        .await
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        self.with_session(id, |session| Ok(session.snapshot())).await
    }

    pub async fn checkout(&self, id: Uuid) -> Result<PaymentHandoff, SessionError> {
        self.with_session(id, |session| session.checkout()).await
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Удаляет сессии, простаивающие дольше TTL.
    pub async fn purge_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_activity <= self.ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            info!("Purged {} idle selection sessions", purged);
        }
        purged
    }

    async fn with_session<T, F>(&self, id: Uuid, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut SelectionSession) -> Result<T, SessionError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.last_activity = Utc::now();
        f(session)
    }
}
