use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Идентификатор места. Бэкенд отдаёт то число, то строку,
/// поэтому сравнение идёт по строковому представлению: `1` и `"1"` - одно и то же место.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeatId {
    Number(i64),
    Text(String),
}

impl SeatId {
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            SeatId::Number(n) => Cow::Owned(n.to_string()),
            SeatId::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl PartialEq for SeatId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SeatId {}

impl Hash for SeatId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<i64> for SeatId {
    fn from(n: i64) -> Self {
        SeatId::Number(n)
    }
}

impl From<&str> for SeatId {
    fn from(s: &str) -> Self {
        SeatId::Text(s.to_string())
    }
}

/// Категория места. Явные значения от бэкенда, которые не попали
/// в известный список, сохраняются как есть.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeatType {
    Window,
    Aisle,
    Standard,
    Premium,
    Other(String),
}

impl SeatType {
    pub fn as_str(&self) -> &str {
        match self {
            SeatType::Window => "Window",
            SeatType::Aisle => "Aisle",
            SeatType::Standard => "Standard",
            SeatType::Premium => "Premium",
            SeatType::Other(label) => label,
        }
    }

}

impl From<String> for SeatType {
    fn from(label: String) -> Self {
        match label.to_lowercase().as_str() {
            "window" => SeatType::Window,
            "aisle" => SeatType::Aisle,
            "standard" => SeatType::Standard,
            "premium" => SeatType::Premium,
            _ => SeatType::Other(label),
        }
    }
}

impl From<SeatType> for String {
    fn from(seat_type: SeatType) -> Self {
        seat_type.as_str().to_string()
    }
}

impl fmt::Display for SeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Место после нормализации - единственное представление,
/// с которым работают выбор и раскладка по рядам.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSeat {
    pub id: SeatId,
    pub seat_number: String,
    pub available: bool,
    pub price: f64,
    #[serde(rename = "type")]
    pub seat_type: SeatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<i64>,
}
