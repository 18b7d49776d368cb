use thiserror::Error;

use crate::model::{ReservationId, TableId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid interval: duration must be a positive number of minutes")]
    InvalidInterval,
    #[error("table name already taken: {0}")]
    DuplicateName(String),
    #[error("unknown table: {0}")]
    UnknownTable(TableId),
    #[error("table {table_id} is already booked for the requested time (conflicts with reservation {conflicting})")]
    SchedulingConflict {
        table_id: TableId,
        conflicting: ReservationId,
    },
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("storage error: {0}")]
    Storage(String),
}
