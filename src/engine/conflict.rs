use crate::model::*;

/// True if any reservation on `table_id` overlaps `candidate`.
///
/// Records belonging to other tables are skipped: overlap is only meaningful
/// within one table's timeline.
pub fn has_conflict<'a, I>(table_id: TableId, candidate: &Span, existing: I) -> bool
where
    I: IntoIterator<Item = &'a ReservationRecord>,
{
    existing
        .into_iter()
        .filter(|r| r.table_id == table_id)
        .any(|r| r.span.overlaps(candidate))
}

/// Whether `candidate` may join a single table's existing reservations.
pub fn admits(existing: &[ReservationRecord], candidate: &Span) -> bool {
    existing.iter().all(|r| !r.span.overlaps(candidate))
}

/// Write-path check: first reservation on the table overlapping `candidate`, if any.
///
/// The sorted index only narrows the scan; the verdict comes from `has_conflict`.
pub(crate) fn find_conflict(ts: &TableState, candidate: &Span) -> Option<ReservationId> {
    ts.overlapping(candidate)
        .find(|r| has_conflict(ts.id, candidate, [*r]))
        .map(|r| r.id)
}
