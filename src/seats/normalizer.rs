//! normalizer.rs
//!
//! Приведение "сырых" записей мест от бэкенда к `CanonicalSeat`.
//!
//! Бэкенд присылает места в разных формах: идентификатор может лежать в `id`,
//! `seatId` или `_id`, признак занятости - в одном из флагов или в строке статуса.
//! Для каждого атрибута задан упорядоченный список правил извлечения,
//! правила применяются сверху вниз, первое сработавшее побеждает.

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::error::MalformedRecord;
use crate::models::{CanonicalSeat, SeatId, SeatType};

/// Цена места, если бэкенд её не прислал.
pub const DEFAULT_FARE: f64 = 600.0;

const ID_FIELDS: &[&str] = &["id", "seatId", "_id"];
const SEAT_NUMBER_FIELDS: &[&str] = &["seatNumber", "number", "label"];
const EXPLICIT_AVAILABILITY_FIELDS: &[&str] = &["available", "isAvailable"];
const BOOKED_FLAG_FIELDS: &[&str] = &["booked", "isBooked", "reserved", "locked", "occupied"];
const STATUS_FIELDS: &[&str] = &["status", "state", "availability"];
const PRICE_FIELDS: &[&str] = &["price", "fare", "amount"];
const TYPE_FIELDS: &[&str] = &["type", "seatType"];

const UNAVAILABLE_STATUSES: &[&str] = &["booked", "reserved", "sold", "occupied", "unavailable", "locked"];
const AVAILABLE_STATUSES: &[&str] = &["available", "free", "vacant"];

/// Правила определения доступности в порядке приоритета.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityRule {
    /// Булево `available`/`isAvailable` - берётся как есть.
    ExplicitBoolean,
    /// Любой из флагов занятости равен `true` - место занято.
    BookedFlag,
    /// Строка статуса сверяется со словарём.
    StatusVocabulary,
}

pub const AVAILABILITY_RULES: [AvailabilityRule; 3] = [
    AvailabilityRule::ExplicitBoolean,
    AvailabilityRule::BookedFlag,
    AvailabilityRule::StatusVocabulary,
];

impl AvailabilityRule {
    /// `None` означает, что правило не нашло в записи своих данных.
    pub fn apply(self, record: &Map<String, Value>) -> Option<bool> {
        match self {
            AvailabilityRule::ExplicitBoolean => EXPLICIT_AVAILABILITY_FIELDS
                .iter()
                .find_map(|field| record.get(*field).and_then(Value::as_bool)),
            AvailabilityRule::BookedFlag => BOOKED_FLAG_FIELDS
                .iter()
                .any(|field| record.get(*field) == Some(&Value::Bool(true)))
                .then_some(false),
            AvailabilityRule::StatusVocabulary => {
                let status = first_present(record, STATUS_FIELDS).and_then(scalar_text)?;
                let status = status.to_lowercase();
                if status.is_empty() {
                    return None;
                }
                if UNAVAILABLE_STATUSES.contains(&status.as_str()) {
                    Some(false)
                } else if AVAILABLE_STATUSES.contains(&status.as_str()) {
                    Some(true)
                } else {
                    // TODO: сверить словарь статусов с бэкендом, пока неизвестное считаем свободным
                    debug!("Unrecognised seat status '{}', treating seat as available", status);
                    Some(true)
                }
            }
        }
    }
}

/// Нормализует одну запись. `index` - позиция записи в ответе бэкенда,
/// нужна для синтетического идентификатора.
pub fn normalize(raw: &Value, index: usize) -> Result<CanonicalSeat, MalformedRecord> {
    let record = raw.as_object().ok_or(MalformedRecord {
        index,
        reason: "record is not an object",
    })?;

    let id = resolve_id(record, index);
    let seat_number = resolve_seat_number(record).unwrap_or_else(|| id.to_string());
    let seat_type = resolve_type(record).unwrap_or_else(|| infer_seat_type(&seat_number));

    Ok(CanonicalSeat {
        available: resolve_availability(record),
        price: resolve_price(record),
        row: resolve_row(record),
        id,
        seat_number,
        seat_type,
    })
}

/// Нормализует весь ответ: битые записи и повторы идентификатора отбрасываются,
/// результат отсортирован по номеру места.
pub fn normalize_all(raw: &[Value]) -> Vec<CanonicalSeat> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut seats: Vec<CanonicalSeat> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match normalize(record, index) {
            Ok(seat) => Some(seat),
            Err(e) => {
                debug!("Dropping seat record: {}", e);
                None
            }
        })
        // Идентификатор уникален в пределах автобуса: побеждает первая запись
        .filter(|seat| {
            let fresh = seen.insert(seat.id.key().into_owned());
            if !fresh {
                debug!("Dropping seat record {}: duplicate id", seat.id);
            }
            fresh
        })
        .collect();

    sort_seats(&mut seats);
    seats
}

/// Сортировка по первому числу в номере места; места без числа идут в конце.
/// При равенстве - лексикографически по номеру.
pub fn sort_seats(seats: &mut [CanonicalSeat]) {
    seats.sort_by(compare_seat_numbers);
}

fn compare_seat_numbers(a: &CanonicalSeat, b: &CanonicalSeat) -> Ordering {
    let by_number = match (first_number(&a.seat_number), first_number(&b.seat_number)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_number.then_with(|| a.seat_number.cmp(&b.seat_number))
}

pub fn resolve_id(record: &Map<String, Value>, index: usize) -> SeatId {
    if let Some(id) = ID_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(scalar_id))
    {
        return id;
    }

    match record.get("seatNumber") {
        Some(value) if is_truthy(value) => {
            let number = scalar_text(value).unwrap_or_default();
            SeatId::Text(format!("sn-{number}"))
        }
        _ => SeatId::Text(format!("idx-{index}")),
    }
}

pub fn resolve_seat_number(record: &Map<String, Value>) -> Option<String> {
    SEAT_NUMBER_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(scalar_text))
}

pub fn resolve_availability(record: &Map<String, Value>) -> bool {
    AVAILABILITY_RULES
        .iter()
        .find_map(|rule| rule.apply(record))
        .unwrap_or(true)
}

pub fn resolve_price(record: &Map<String, Value>) -> f64 {
    PRICE_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_f64))
        .unwrap_or(DEFAULT_FARE)
}

pub fn resolve_type(record: &Map<String, Value>) -> Option<SeatType> {
    TYPE_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))
        .map(|label| SeatType::from(label.to_string()))
}

pub fn resolve_row(record: &Map<String, Value>) -> Option<i64> {
    match record.get("row")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Тип места по первому числу в номере: n mod 4 in {0, 1} - окно, {2, 3} - проход.
/// Номер без числа или с нулём считается обычным местом.
pub fn infer_seat_type(seat_number: &str) -> SeatType {
    match first_number(seat_number) {
        None | Some(0) => SeatType::Standard,
        Some(n) if n % 4 == 0 || n % 4 == 1 => SeatType::Window,
        Some(_) => SeatType::Aisle,
    }
}

/// Первая последовательность цифр в строке.
pub fn first_number(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: &str = &s[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    // Слишком длинные номера упираются в потолок, но остаются числовыми
    Some(digits[..end].parse().unwrap_or(u64::MAX))
}

fn first_present<'a>(record: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .find_map(|field| record.get(*field).filter(|v| !v.is_null()))
}

fn scalar_id(value: &Value) -> Option<SeatId> {
    match value {
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => SeatId::Number(i),
            None => SeatId::Text(n.to_string()),
        }),
        Value::String(s) => Some(SeatId::Text(s.clone())),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
