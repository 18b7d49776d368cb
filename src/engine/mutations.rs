use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::limits::*;
use crate::model::*;
use crate::observability;
use crate::schema::{Reservation, ReservationCreate, Table, TableCreate};

use super::conflict::find_conflict;
use super::{Engine, EngineError};

impl Engine {
    pub async fn create_table(&self, input: TableCreate) -> Result<Table, EngineError> {
        input.check().inspect_err(|_| reject_counter("table"))?;
        let seats = u32::try_from(input.seats)
            .map_err(|_| EngineError::Validation("seats: out of range".into()))?;

        let _registry = self.registry.lock().await;
        if self.tables.len() >= MAX_TABLES {
            return Err(EngineError::LimitExceeded("too many tables"));
        }
        if self.names.contains_key(&input.name) {
            return Err(EngineError::DuplicateName(input.name));
        }

        let id = self.allocate_table_id();
        let event = Event::TableCreated {
            id,
            name: input.name.clone(),
            seats,
            location: input.location.clone(),
        };
        self.wal_append(&event).await?;

        let ts = TableState::new(id, input.name, seats, input.location);
        let table = Table::from(&ts);
        self.names.insert(ts.name.clone(), id);
        self.tables.insert(id, Arc::new(RwLock::new(ts)));

        metrics::counter!(observability::TABLES_CREATED_TOTAL).increment(1);
        self.record_gauges();
        info!(table_id = id, name = %table.name, "table created");
        Ok(table)
    }

    /// Delete a table and, with it, every reservation on it.
    /// `Ok(None)` when no such table exists.
    pub async fn delete_table(&self, id: TableId) -> Result<Option<Table>, EngineError> {
        let _registry = self.registry.lock().await;
        let Some(ts) = self.get_table(id) else {
            return Ok(None);
        };
        // Held through removal so a racing reservation create observes the table gone.
        let guard = ts.write().await;

        self.wal_append(&Event::TableDeleted { id }).await?;

        self.tables.remove(&id);
        self.names.remove(&guard.name);
        for r in &guard.reservations {
            self.reservation_to_table.remove(&r.id);
        }

        metrics::counter!(observability::TABLES_DELETED_TOTAL).increment(1);
        self.record_gauges();
        info!(
            table_id = id,
            cascaded = guard.reservations.len(),
            "table deleted"
        );
        Ok(Some(Table::from(&*guard)))
    }

    /// Validate, confirm the table exists, check for conflicts, persist.
    /// The last three steps run under the table's write lock, so two creates
    /// on one table can never both pass the conflict check.
    pub async fn create_reservation(&self, input: ReservationCreate) -> Result<Reservation, EngineError> {
        input.check().inspect_err(|_| reject_counter("reservation"))?;
        let span = input.span().inspect_err(|_| reject_counter("reservation"))?;
        let table_id = input.table_id;

        let ts = self
            .get_table(table_id)
            .ok_or(EngineError::UnknownTable(table_id))?;
        let mut guard = ts.write().await;
        if !self.tables.contains_key(&table_id) {
            return Err(EngineError::UnknownTable(table_id));
        }
        if guard.reservations.len() >= MAX_RESERVATIONS_PER_TABLE {
            return Err(EngineError::LimitExceeded("too many reservations on table"));
        }

        if let Some(conflicting) = find_conflict(&guard, &span) {
            metrics::counter!(observability::SCHEDULING_CONFLICTS_TOTAL).increment(1);
            info!(table_id, conflicting, "reservation rejected: time slot taken");
            return Err(EngineError::SchedulingConflict {
                table_id,
                conflicting,
            });
        }

        let id = self.allocate_reservation_id();
        let event = Event::ReservationCreated {
            id,
            table_id,
            customer_name: input.customer_name,
            span,
        };
        self.persist_and_apply(&mut guard, &event).await?;

        let reservation = guard
            .reservations
            .iter()
            .find(|r| r.id == id)
            .map(Reservation::from)
            .ok_or_else(|| EngineError::Storage(format!("reservation {id} missing after apply")))?;

        metrics::counter!(observability::RESERVATIONS_CREATED_TOTAL).increment(1);
        self.record_gauges();
        info!(reservation_id = id, table_id, "reservation created");
        Ok(reservation)
    }

    /// Cancel a reservation. `Ok(None)` when no such reservation exists.
    pub async fn delete_reservation(&self, id: ReservationId) -> Result<Option<Reservation>, EngineError> {
        let Some(table_id) = self.table_for_reservation(id) else {
            return Ok(None);
        };
        let Some(ts) = self.get_table(table_id) else {
            return Ok(None);
        };
        let mut guard = ts.write().await;
        // Re-check under the lock: a concurrent cancel or cascade may have won.
        let Some(reservation) = guard
            .reservations
            .iter()
            .find(|r| r.id == id)
            .map(Reservation::from)
        else {
            return Ok(None);
        };

        let event = Event::ReservationCancelled { id, table_id };
        self.persist_and_apply(&mut guard, &event).await?;

        metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        self.record_gauges();
        info!(reservation_id = id, table_id, "reservation cancelled");
        Ok(Some(reservation))
    }

    /// Rewrite the WAL with only the events needed to recreate the current state.
    ///
    /// Holds the registry lock and every table's read lock until the rewrite
    /// lands, so no mutation can slip in between snapshot and swap.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        if !self.is_durable() {
            return Ok(());
        }
        let _registry = self.registry.lock().await;

        let mut ids: Vec<TableId> = self.tables.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(ts) = self.get_table(id) {
                guards.push(ts.read_owned().await);
            }
        }

        let mut events = vec![self.sequence_checkpoint()];
        for guard in &guards {
            events.push(Event::TableCreated {
                id: guard.id,
                name: guard.name.clone(),
                seats: guard.seats,
                location: guard.location.clone(),
            });
            for r in &guard.reservations {
                events.push(Event::ReservationCreated {
                    id: r.id,
                    table_id: r.table_id,
                    customer_name: r.customer_name.clone(),
                    span: r.span,
                });
            }
        }

        let count = events.len();
        self.send_compact(events).await?;
        info!(events = count, "WAL compacted");
        Ok(())
    }
}

fn reject_counter(entity: &'static str) {
    metrics::counter!(observability::VALIDATION_REJECTIONS_TOTAL, "entity" => entity).increment(1);
}
