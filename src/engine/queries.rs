use crate::model::*;
use crate::schema::{Pagination, Reservation, Table};

use super::Engine;

impl Engine {
    /// Tables in creation (id) order, paged.
    pub async fn list_tables(&self, page: Pagination) -> Vec<Table> {
        let mut ids: Vec<TableId> = self.tables.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();

        let mut out = Vec::new();
        for id in ids.into_iter().skip(page.skip).take(page.limit) {
            // Deleted between the id snapshot and here: skip it.
            if let Some(ts) = self.get_table(id) {
                out.push(Table::from(&*ts.read().await));
            }
        }
        out
    }

    /// Reservations across all tables in creation (id) order, paged.
    pub async fn list_reservations(&self, page: Pagination) -> Vec<Reservation> {
        let mut ids: Vec<(ReservationId, TableId)> = self
            .reservation_to_table
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect();
        ids.sort_unstable();

        let mut out = Vec::new();
        for (id, table_id) in ids.into_iter().skip(page.skip).take(page.limit) {
            let Some(ts) = self.get_table(table_id) else {
                continue;
            };
            let guard = ts.read().await;
            if let Some(r) = guard.reservations.iter().find(|r| r.id == id) {
                out.push(Reservation::from(r));
            }
        }
        out
    }

    /// One table's timeline, sorted by start. `None` if the table doesn't exist.
    pub async fn reservations_for_table(&self, table_id: TableId) -> Option<Vec<ReservationRecord>> {
        let ts = self.get_table(table_id)?;
        let guard = ts.read().await;
        Some(guard.reservations.clone())
    }
}
