//! Wire shapes for the HTTP surface.
//!
//! Each entity has an input shape (validated on creation) and a persisted
//! shape (input fields plus the assigned id). Pagination is its own shape.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::EngineError;
use crate::limits::{DEFAULT_PAGE_SIZE, MAX_NAME_LEN, MIN_NAME_LEN};
use crate::model::*;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TableCreate {
    #[validate(length(min = 2))]
    pub name: String,
    #[validate(range(min = 1))]
    pub seats: i64,
    #[validate(length(min = 2))]
    pub location: String,
}

impl TableCreate {
    pub fn check(&self) -> Result<(), EngineError> {
        self.validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        reject_blank("name", &self.name)?;
        reject_blank("location", &self.location)?;
        cap_length(&self.name)?;
        cap_length(&self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub seats: u32,
    pub location: String,
}

impl From<&TableState> for Table {
    fn from(ts: &TableState) -> Self {
        Self {
            id: ts.id,
            name: ts.name.clone(),
            seats: ts.seats,
            location: ts.location.clone(),
        }
    }
}

/// `duration_minutes` positivity is enforced when the interval is built, not here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReservationCreate {
    #[validate(length(min = 2))]
    pub customer_name: String,
    #[validate(range(min = 1))]
    pub table_id: TableId,
    pub reservation_time: NaiveDateTime,
    pub duration_minutes: i64,
}

impl ReservationCreate {
    pub fn check(&self) -> Result<(), EngineError> {
        self.validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        reject_blank("customer_name", &self.customer_name)?;
        cap_length(&self.customer_name)
    }

    pub fn span(&self) -> Result<Span, EngineError> {
        Span::from_minutes(naive_to_ms(self.reservation_time), self.duration_minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_name: String,
    pub table_id: TableId,
    pub reservation_time: NaiveDateTime,
    pub duration_minutes: i64,
}

impl From<&ReservationRecord> for Reservation {
    fn from(r: &ReservationRecord) -> Self {
        Self {
            id: r.id,
            customer_name: r.customer_name.clone(),
            table_id: r.table_id,
            reservation_time: ms_to_naive(r.span.start),
            duration_minutes: r.span.duration_minutes(),
        }
    }
}

/// `?skip=&limit=`: both optional, both non-negative. Applied as given, with no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn reject_blank(field: &str, value: &str) -> Result<(), EngineError> {
    if value.trim().chars().count() < MIN_NAME_LEN {
        return Err(EngineError::Validation(format!(
            "{field}: must contain at least 2 non-blank characters"
        )));
    }
    Ok(())
}

fn cap_length(value: &str) -> Result<(), EngineError> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("text field too long"));
    }
    Ok(())
}

/// Naive timestamps are read as UTC.
pub fn naive_to_ms(t: NaiveDateTime) -> Ms {
    t.and_utc().timestamp_millis()
}

pub fn ms_to_naive(ms: Ms) -> NaiveDateTime {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(duration_minutes: i64) -> ReservationCreate {
        ReservationCreate {
            customer_name: "Alice".into(),
            table_id: 1,
            reservation_time: "2023-12-31T19:00:00".parse().unwrap(),
            duration_minutes,
        }
    }

    #[test]
    fn table_create_accepts_valid_input() {
        let t = TableCreate {
            name: "T1".into(),
            seats: 4,
            location: "window".into(),
        };
        assert!(t.check().is_ok());
    }

    #[test]
    fn table_create_rejects_short_fields_and_bad_seats() {
        let short_name = TableCreate {
            name: "T".into(),
            seats: 4,
            location: "window".into(),
        };
        assert!(matches!(short_name.check(), Err(EngineError::Validation(_))));

        let blank_location = TableCreate {
            name: "T1".into(),
            seats: 4,
            location: "   ".into(),
        };
        assert!(matches!(blank_location.check(), Err(EngineError::Validation(_))));

        for seats in [0, -3] {
            let t = TableCreate {
                name: "T1".into(),
                seats,
                location: "window".into(),
            };
            assert!(matches!(t.check(), Err(EngineError::Validation(_))), "seats={seats}");
        }
    }

    #[test]
    fn reservation_create_validates_fields() {
        assert!(reservation(60).check().is_ok());

        let mut r = reservation(60);
        r.customer_name = "A".into();
        assert!(matches!(r.check(), Err(EngineError::Validation(_))));

        let mut r = reservation(60);
        r.table_id = 0;
        assert!(matches!(r.check(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn non_positive_duration_fails_at_interval_construction() {
        let r = reservation(-5);
        assert!(r.check().is_ok());
        assert!(matches!(r.span(), Err(EngineError::InvalidInterval)));
        assert!(matches!(reservation(0).span(), Err(EngineError::InvalidInterval)));
    }

    #[test]
    fn span_uses_reservation_time_as_utc() {
        let span = reservation(60).span().unwrap();
        let expected = "2023-12-31T19:00:00Z"
            .parse::<DateTime<chrono::Utc>>()
            .unwrap()
            .timestamp_millis();
        assert_eq!(span.start, expected);
        assert_eq!(span.duration_minutes(), 60);
    }

    #[test]
    fn record_converts_back_to_wire_shape() {
        let create = reservation(90);
        let record = ReservationRecord {
            id: 3,
            table_id: 1,
            customer_name: create.customer_name.clone(),
            span: create.span().unwrap(),
        };
        let wire = Reservation::from(&record);
        assert_eq!(wire.reservation_time, create.reservation_time);
        assert_eq!(wire.duration_minutes, 90);
        assert_eq!(wire.id, 3);
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p, Pagination::new(0, DEFAULT_PAGE_SIZE));
        let p: Pagination = serde_json::from_str(r#"{"skip": 5, "limit": 1000000}"#).unwrap();
        assert_eq!(p, Pagination::new(5, 1_000_000));
    }

    #[test]
    fn large_seats_and_long_durations_are_accepted() {
        let table = TableCreate {
            name: "Banquet".into(),
            seats: 1001,
            location: "hall".into(),
        };
        assert!(table.check().is_ok());

        let long = reservation(10_081);
        assert!(long.check().is_ok());
        assert_eq!(long.span().unwrap().duration_minutes(), 10_081);
    }

    #[test]
    fn oversized_text_hits_the_limit() {
        let table = TableCreate {
            name: "x".repeat(MAX_NAME_LEN + 1),
            seats: 4,
            location: "hall".into(),
        };
        assert!(matches!(table.check(), Err(EngineError::LimitExceeded(_))));

        let mut input = reservation(60);
        input.customer_name = "y".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(input.check(), Err(EngineError::LimitExceeded(_))));
        input.customer_name = "y".repeat(MAX_NAME_LEN);
        assert!(input.check().is_ok());
    }
}
