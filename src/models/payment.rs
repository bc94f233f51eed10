use serde::{Deserialize, Serialize};

use super::SeatId;

/// Всё, что уходит платёжному модулю после подтверждения выбора.
/// `seat_ids` и `seat_numbers` выровнены попарно и идут в порядке схемы салона.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHandoff {
    pub bus_id: i64,
    pub seat_ids: Vec<SeatId>,
    pub seat_numbers: Vec<String>,
    pub total_amount: f64,
}
