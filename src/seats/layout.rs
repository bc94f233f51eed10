use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::CanonicalSeat;

/// Мест в ряду при разбиении без подсказок.
pub const ROW_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Хотя бы у одного места задан `row`.
    RowHinted,
    /// Ряды по `ROW_WIDTH` мест подряд.
    Chunked,
}

pub fn layout_mode(seats: &[CanonicalSeat]) -> LayoutMode {
    if seats.iter().any(|s| s.row.is_some()) {
        LayoutMode::RowHinted
    } else {
        LayoutMode::Chunked
    }
}

/// Раскладывает уже отсортированные места по рядам.
pub fn build_rows(seats: &[CanonicalSeat]) -> Vec<Vec<&CanonicalSeat>> {
    match layout_mode(seats) {
        LayoutMode::RowHinted => {
            let mut groups: BTreeMap<i64, Vec<&CanonicalSeat>> = BTreeMap::new();
            for seat in seats {
                groups.entry(seat.row.unwrap_or(0)).or_default().push(seat);
            }
            groups.into_values().collect()
        }
        LayoutMode::Chunked => seats
            .chunks(ROW_WIDTH)
            .map(|chunk| chunk.iter().collect())
            .collect(),
    }
}

/// Делит ряд на левую пару и всё, что правее прохода.
pub fn split_aisle<T>(row: &[T]) -> (&[T], &[T]) {
    row.split_at(row.len().min(2))
}

/// Ряд, уже разделённый проходом, в том виде, в каком его рисует клиент.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AisleRow {
    pub left: Vec<CanonicalSeat>,
    pub right: Vec<CanonicalSeat>,
}

pub fn aisle_rows(seats: &[CanonicalSeat]) -> Vec<AisleRow> {
    build_rows(seats)
        .iter()
        .map(|row| {
            let (left, right) = split_aisle(row);
            AisleRow {
                left: left.iter().map(|s| (*s).clone()).collect(),
                right: right.iter().map(|s| (*s).clone()).collect(),
            }
        })
        .collect()
}
