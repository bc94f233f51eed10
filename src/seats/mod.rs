//! Ядро выбора мест: нормализация ответа бэкенда, состояние выбора
//! и раскладка по рядам для схемы салона.

pub mod layout;
pub mod normalizer;
pub mod selection;

pub use layout::{aisle_rows, build_rows, split_aisle, AisleRow, LayoutMode, ROW_WIDTH};
pub use normalizer::{normalize, normalize_all, DEFAULT_FARE};
pub use selection::{SelectionState, ToggleOutcome, MAX_SELECTABLE};
