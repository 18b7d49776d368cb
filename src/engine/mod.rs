mod conflict;
mod error;
mod mutations;
mod queries;

pub use conflict::{admits, has_conflict};
pub use error::EngineError;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tracing::info;

use crate::config::StoreUrl;
use crate::model::*;
use crate::wal::Wal;

pub type SharedTableState = Arc<RwLock<TableState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Drain every Append already queued behind it.
/// 3. One flush_sync for the whole batch, then answer every sender.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];
                let mut deferred = None;
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                        Ok(other) => {
                            deferred = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }
                commit_batch(&mut wal, &mut batch);
                if let Some(other) = deferred {
                    handle_non_append(&mut wal, other);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Flush even after an append error so half-written bytes don't leak into the next batch.
    let flush_result = wal.flush_sync();
    match append_err {
        Some(e) => Err(e),
        None => flush_result,
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { event, response } => {
            let mut batch = vec![(event, response)];
            commit_batch(wal, &mut batch);
        }
    }
}

/// The store handle: table registry plus every table's reservation timeline.
///
/// Each table's timeline sits behind its own `RwLock`, so the
/// check-conflict-then-insert sequence for one table is serialized while
/// different tables proceed in parallel.
pub struct Engine {
    pub(super) tables: DashMap<TableId, SharedTableState>,
    /// Unique name index.
    pub(super) names: DashMap<String, TableId>,
    /// Reverse lookup: reservation id → table id
    pub(super) reservation_to_table: DashMap<ReservationId, TableId>,
    /// Serializes table creation and deletion (name uniqueness, cascade).
    pub(super) registry: Mutex<()>,
    next_table_id: AtomicI64,
    next_reservation_id: AtomicI64,
    /// `None` for the volatile in-memory store.
    wal_tx: Option<mpsc::Sender<WalCommand>>,
}

/// Apply a reservation event to a table (no locking; caller holds the lock).
fn apply_to_table(ts: &mut TableState, event: &Event, index: &DashMap<ReservationId, TableId>) {
    match event {
        Event::ReservationCreated {
            id,
            table_id,
            customer_name,
            span,
        } => {
            ts.insert_reservation(ReservationRecord {
                id: *id,
                table_id: *table_id,
                customer_name: customer_name.clone(),
                span: *span,
            });
            index.insert(*id, *table_id);
        }
        Event::ReservationCancelled { id, .. } => {
            ts.remove_reservation(*id);
            index.remove(id);
        }
        // Table lifecycle and checkpoints are handled at the registry level
        Event::TableCreated { .. } | Event::TableDeleted { .. } | Event::SequenceCheckpoint { .. } => {}
    }
}

impl Engine {
    fn empty(wal_tx: Option<mpsc::Sender<WalCommand>>) -> Self {
        Self {
            tables: DashMap::new(),
            names: DashMap::new(),
            reservation_to_table: DashMap::new(),
            registry: Mutex::new(()),
            next_table_id: AtomicI64::new(1),
            next_reservation_id: AtomicI64::new(1),
            wal_tx,
        }
    }

    /// Volatile store. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self::empty(None)
    }

    /// Durable store backed by the WAL at `wal_path`. Replays existing events
    /// and spawns the group-commit writer, so this must run inside a tokio runtime.
    pub fn open(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self::empty(Some(wal_tx));
        for event in &events {
            engine.replay_event(event);
        }
        info!(
            events = events.len(),
            path = %wal_path.display(),
            tables = engine.tables.len(),
            reservations = engine.reservation_to_table.len(),
            "replayed WAL"
        );
        Ok(engine)
    }

    /// Open whichever backing store the URL selects.
    pub fn connect(url: &StoreUrl) -> io::Result<Self> {
        match url {
            StoreUrl::Memory => Ok(Self::in_memory()),
            StoreUrl::Wal(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)?;
                }
                Self::open(path.clone())
            }
        }
    }

    pub fn is_durable(&self) -> bool {
        self.wal_tx.is_some()
    }

    // We're the sole owner of these Arcs during replay, so try_read/try_write
    // never contend. Blocking lock calls would panic inside the runtime.
    fn replay_event(&self, event: &Event) {
        match event {
            Event::TableCreated { id, name, seats, location } => {
                let ts = TableState::new(*id, name.clone(), *seats, location.clone());
                self.tables.insert(*id, Arc::new(RwLock::new(ts)));
                self.names.insert(name.clone(), *id);
                self.bump_table_id(*id + 1);
            }
            Event::TableDeleted { id } => {
                if let Some((_, ts)) = self.tables.remove(id)
                    && let Ok(guard) = ts.try_read()
                {
                    self.names.remove(&guard.name);
                    for r in &guard.reservations {
                        self.reservation_to_table.remove(&r.id);
                    }
                }
            }
            Event::SequenceCheckpoint { next_table_id, next_reservation_id } => {
                self.bump_table_id(*next_table_id);
                self.bump_reservation_id(*next_reservation_id);
            }
            Event::ReservationCreated { id, table_id, .. } | Event::ReservationCancelled { id, table_id } => {
                if matches!(event, Event::ReservationCreated { .. }) {
                    self.bump_reservation_id(*id + 1);
                }
                if let Some(entry) = self.tables.get(table_id) {
                    let ts = entry.value().clone();
                    drop(entry);
                    if let Ok(mut guard) = ts.try_write() {
                        apply_to_table(&mut guard, event, &self.reservation_to_table);
                    }
                }
            }
        }
    }

    fn bump_table_id(&self, at_least: TableId) {
        self.next_table_id.fetch_max(at_least, Ordering::SeqCst);
    }

    fn bump_reservation_id(&self, at_least: ReservationId) {
        self.next_reservation_id.fetch_max(at_least, Ordering::SeqCst);
    }

    pub(super) fn allocate_table_id(&self) -> TableId {
        self.next_table_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(super) fn allocate_reservation_id(&self) -> ReservationId {
        self.next_reservation_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(super) fn sequence_checkpoint(&self) -> Event {
        Event::SequenceCheckpoint {
            next_table_id: self.next_table_id.load(Ordering::SeqCst),
            next_reservation_id: self.next_reservation_id.load(Ordering::SeqCst),
        }
    }

    /// Write event to WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let Some(wal_tx) = &self.wal_tx else {
            return Ok(());
        };
        let (tx, rx) = oneshot::channel();
        wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::Storage("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Storage("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    /// WAL-append then apply. Memory is only touched once the event is durable.
    pub(super) async fn persist_and_apply(
        &self,
        ts: &mut TableState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_table(ts, event, &self.reservation_to_table);
        Ok(())
    }

    pub fn get_table(&self, id: TableId) -> Option<SharedTableState> {
        self.tables.get(&id).map(|e| e.value().clone())
    }

    pub fn table_for_reservation(&self, id: ReservationId) -> Option<TableId> {
        self.reservation_to_table.get(&id).map(|e| *e.value())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservation_to_table.len()
    }

    pub(super) fn record_gauges(&self) {
        metrics::gauge!(crate::observability::TABLES_ACTIVE).set(self.tables.len() as f64);
        metrics::gauge!(crate::observability::RESERVATIONS_ACTIVE)
            .set(self.reservation_to_table.len() as f64);
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let Some(wal_tx) = &self.wal_tx else {
            return 0;
        };
        let (tx, rx) = oneshot::channel();
        if wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    pub(super) async fn send_compact(&self, events: Vec<Event>) -> Result<(), EngineError> {
        let Some(wal_tx) = &self.wal_tx else {
            return Ok(());
        };
        let (tx, rx) = oneshot::channel();
        wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::Storage("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Storage("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::Storage(e.to_string()))
    }
}
