use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{lenient, CanonicalSeat};

/// Метаданные автобуса. Используются только для отображения,
/// в нормализацию мест не попадают.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusDetails {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub base_fare: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub boarding_point: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub seats_left: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub booked_seats: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub reserved_seats: Option<f64>,
    // Остальные поля пробрасываем клиенту без изменений
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BusDetails {
    /// Число свободных мест по метаданным автобуса, когда списка мест под рукой нет.
    pub fn seats_available(&self) -> Option<u64> {
        if let Some(n) = self.available_seats.or(self.seats_left) {
            return Some(n.max(0.0) as u64);
        }

        let total = self.total_seats?;
        let booked = self.booked_seats.or(self.reserved_seats).unwrap_or(0.0);
        Some((total - booked).max(0.0) as u64)
    }

    /// Процент свободных мест, если известна вместимость.
    pub fn percent_available(&self, available: u64) -> Option<u32> {
        match self.total_seats {
            Some(total) if total > 0.0 => Some((available as f64 / total * 100.0).round() as u32),
            _ => None,
        }
    }
}

/// Свободные места по метаданным автобуса.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusAvailability {
    pub seats_available: u64,
    pub percent_available: Option<u32>,
}

impl BusAvailability {
    pub fn from_bus(bus: &BusDetails) -> Option<Self> {
        let seats_available = bus.seats_available()?;
        Some(Self {
            seats_available,
            percent_available: bus.percent_available(seats_available),
        })
    }
}

/// Сводка по занятости для карточки рейса.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySummary {
    pub total: usize,
    pub available: usize,
    pub booked: usize,
    pub percent_available: Option<u32>,
}

impl AvailabilitySummary {
    pub fn from_seats(seats: &[CanonicalSeat]) -> Self {
        let total = seats.len();
        let available = seats.iter().filter(|s| s.available).count();
        let percent_available = if total > 0 {
            Some((available as f64 / total as f64 * 100.0).round() as u32)
        } else {
            None
        };

        Self {
            total,
            available,
            booked: total - available,
            percent_available,
        }
    }
}
