use serde::Serialize;

use crate::error::SelectionError;
use crate::models::{CanonicalSeat, PaymentHandoff, SeatId};

/// Максимум мест в одном бронировании.
pub const MAX_SELECTABLE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
}

/// Текущий выбор пользователя: множество id без повторов, не больше `MAX_SELECTABLE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Vec<SeatId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, seat: &CanonicalSeat) -> Result<ToggleOutcome, SelectionError> {
        if !seat.available {
            return Err(SelectionError::SeatUnavailable {
                seat_id: seat.id.clone(),
            });
        }

        if let Some(pos) = self.selected.iter().position(|id| *id == seat.id) {
            self.selected.remove(pos);
            return Ok(ToggleOutcome::Deselected);
        }

        if self.selected.len() >= MAX_SELECTABLE {
            return Err(SelectionError::CapacityExceeded { max: MAX_SELECTABLE });
        }

        self.selected.push(seat.id.clone());
        Ok(ToggleOutcome::Selected)
    }

    /// Оставляет только места, которые есть в свежем списке и всё ещё свободны.
    /// Возвращает, сколько мест выпало из выбора.
    pub fn reconcile(&mut self, seats: &[CanonicalSeat]) -> usize {
        let before = self.selected.len();
        self.selected
            .retain(|id| seats.iter().any(|s| s.id == *id && s.available));
        before - self.selected.len()
    }

    pub fn selected_ids(&self) -> &[SeatId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &SeatId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Выбранные места в порядке схемы салона.
    pub fn selected_seats<'a>(&self, seats: &'a [CanonicalSeat]) -> Vec<&'a CanonicalSeat> {
        seats.iter().filter(|s| self.is_selected(&s.id)).collect()
    }

    /// Сумма цен выбранных мест. Цена по умолчанию уже подставлена при нормализации.
    pub fn total(&self, seats: &[CanonicalSeat]) -> f64 {
        self.selected_seats(seats).iter().map(|s| s.price).sum()
    }

    /// Собирает данные для оплаты. Пустой выбор дальше не пропускаем.
    pub fn checkout(&self, bus_id: i64, seats: &[CanonicalSeat]) -> Result<PaymentHandoff, SelectionError> {
        let chosen = self.selected_seats(seats);
        if chosen.is_empty() {
            return Err(SelectionError::EmptySelection);
        }

        Ok(PaymentHandoff {
            bus_id,
            seat_ids: chosen.iter().map(|s| s.id.clone()).collect(),
            seat_numbers: chosen.iter().map(|s| s.seat_number.clone()).collect(),
            total_amount: chosen.iter().map(|s| s.price).sum(),
        })
    }
}
