use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Unix milliseconds. The only time type.
pub type Ms = i64;

pub type TableId = i64;
pub type ReservationId = i64;

pub const MS_PER_MINUTE: Ms = 60_000;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Build `[start, start + duration_minutes)`. Non-positive durations are rejected.
    pub fn from_minutes(start: Ms, duration_minutes: i64) -> Result<Self, EngineError> {
        if duration_minutes <= 0 {
            return Err(EngineError::InvalidInterval);
        }
        let end = duration_minutes
            .checked_mul(MS_PER_MINUTE)
            .and_then(|d| start.checked_add(d))
            .ok_or(EngineError::InvalidInterval)?;
        Ok(Self { start, end })
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_ms() / MS_PER_MINUTE
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A stored reservation. The end instant is derived from the span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: ReservationId,
    pub table_id: TableId,
    pub customer_name: String,
    pub span: Span,
}

/// One table and its timeline.
#[derive(Debug, Clone)]
pub struct TableState {
    pub id: TableId,
    pub name: String,
    pub seats: u32,
    pub location: String,
    /// Reservations on this table, sorted by `span.start`. Pairwise non-overlapping.
    pub reservations: Vec<ReservationRecord>,
}

impl TableState {
    pub fn new(id: TableId, name: String, seats: u32, location: String) -> Self {
        Self {
            id,
            name,
            seats,
            location,
            reservations: Vec::new(),
        }
    }

    /// Insert reservation maintaining sort order by span.start.
    pub fn insert_reservation(&mut self, record: ReservationRecord) {
        let pos = self
            .reservations
            .binary_search_by_key(&record.span.start, |r| r.span.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, record);
    }

    pub fn remove_reservation(&mut self, id: ReservationId) -> Option<ReservationRecord> {
        let pos = self.reservations.iter().position(|r| r.id == id)?;
        Some(self.reservations.remove(pos))
    }

    /// Return only reservations whose span overlaps the query window.
    /// Uses binary search to skip reservations starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &ReservationRecord> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.span.start < query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.span.overlaps(query))
    }
}

/// The event types: flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    TableCreated {
        id: TableId,
        name: String,
        seats: u32,
        location: String,
    },
    /// Removes the table together with every reservation on it.
    TableDeleted {
        id: TableId,
    },
    ReservationCreated {
        id: ReservationId,
        table_id: TableId,
        customer_name: String,
        span: Span,
    },
    ReservationCancelled {
        id: ReservationId,
        table_id: TableId,
    },
    /// Written at the head of a compacted WAL so ids of deleted rows are never reissued.
    SequenceCheckpoint {
        next_table_id: TableId,
        next_reservation_id: ReservationId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: ReservationId, start: Ms, end: Ms) -> ReservationRecord {
        ReservationRecord {
            id,
            table_id: 1,
            customer_name: "Alice".into(),
            span: Span::new(start, end),
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert_eq!(Span::new(0, 90 * MS_PER_MINUTE).duration_minutes(), 90);
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
        assert!(!c.overlaps(&a));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn from_minutes_builds_end() {
        let s = Span::from_minutes(0, 90).unwrap();
        assert_eq!(s.end, 90 * MS_PER_MINUTE);
        assert_eq!(s.duration_minutes(), 90);
    }

    #[test]
    fn from_minutes_rejects_non_positive() {
        assert!(matches!(Span::from_minutes(0, 0), Err(EngineError::InvalidInterval)));
        assert!(matches!(Span::from_minutes(0, -5), Err(EngineError::InvalidInterval)));
    }

    #[test]
    fn from_minutes_rejects_overflow() {
        assert!(matches!(
            Span::from_minutes(Ms::MAX - 10, 1),
            Err(EngineError::InvalidInterval)
        ));
        assert!(matches!(
            Span::from_minutes(0, i64::MAX),
            Err(EngineError::InvalidInterval)
        ));
    }

    #[test]
    fn reservation_ordering() {
        let mut ts = TableState::new(1, "T1".into(), 4, "window".into());
        ts.insert_reservation(record(1, 300, 400));
        ts.insert_reservation(record(2, 100, 200));
        ts.insert_reservation(record(3, 200, 300));
        let starts: Vec<Ms> = ts.reservations.iter().map(|r| r.span.start).collect();
        assert_eq!(starts, vec![100, 200, 300]);
    }

    #[test]
    fn remove_nonexistent_returns_none() {
        let mut ts = TableState::new(1, "T1".into(), 4, "window".into());
        ts.insert_reservation(record(1, 100, 200));
        assert!(ts.remove_reservation(42).is_none());
        assert_eq!(ts.reservations.len(), 1);
        assert_eq!(ts.remove_reservation(1).map(|r| r.id), Some(1));
        assert!(ts.reservations.is_empty());
    }

    #[test]
    fn overlapping_skips_past_and_future() {
        let mut ts = TableState::new(1, "T1".into(), 4, "window".into());
        ts.insert_reservation(record(1, 100, 200));
        ts.insert_reservation(record(2, 450, 600));
        ts.insert_reservation(record(3, 1000, 1100));

        let hits: Vec<_> = ts.overlapping(&Span::new(500, 800)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        let mut ts = TableState::new(1, "T1".into(), 4, "window".into());
        ts.insert_reservation(record(1, 100, 200));
        assert_eq!(ts.overlapping(&Span::new(200, 300)).count(), 0);
        assert_eq!(ts.overlapping(&Span::new(0, 100)).count(), 0);
    }

    #[test]
    fn overlapping_single_ms_overlap() {
        let mut ts = TableState::new(1, "T1".into(), 4, "window".into());
        ts.insert_reservation(record(1, 100, 201));
        assert_eq!(ts.overlapping(&Span::new(200, 300)).count(), 1);
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::ReservationCreated {
            id: 7,
            table_id: 1,
            customer_name: "Bob".into(),
            span: Span::new(0, MS_PER_MINUTE),
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
