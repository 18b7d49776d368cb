use std::net::SocketAddr;

// ── Business counters ───────────────────────────────────────────

/// Counter: tables created.
pub const TABLES_CREATED_TOTAL: &str = "tablebook_tables_created_total";

/// Counter: tables deleted (reservations on them go too).
pub const TABLES_DELETED_TOTAL: &str = "tablebook_tables_deleted_total";

/// Counter: reservations created.
pub const RESERVATIONS_CREATED_TOTAL: &str = "tablebook_reservations_created_total";

/// Counter: reservations cancelled by id.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "tablebook_reservations_cancelled_total";

/// Counter: creates rejected because the slot was taken.
pub const SCHEDULING_CONFLICTS_TOTAL: &str = "tablebook_scheduling_conflicts_total";

/// Counter: creates rejected by field validation. Labels: entity.
pub const VALIDATION_REJECTIONS_TOTAL: &str = "tablebook_validation_rejections_total";

// ── Resource utilization ────────────────────────────────────────

/// Gauge: live tables.
pub const TABLES_ACTIVE: &str = "tablebook_tables_active";

/// Gauge: live reservations.
pub const RESERVATIONS_ACTIVE: &str = "tablebook_reservations_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "tablebook_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "tablebook_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> anyhow::Result<()> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(port, "metrics endpoint listening on /metrics");
    Ok(())
}
