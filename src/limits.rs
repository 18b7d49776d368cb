//! Hard caps applied before anything touches the store.

/// Shortest accepted name, location or customer name after trimming.
pub const MIN_NAME_LEN: usize = 2;
/// Longest accepted text field, in chars. Keeps every WAL frame well under its size bound.
pub const MAX_NAME_LEN: usize = 4096;
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_TABLES: usize = 100_000;
pub const MAX_RESERVATIONS_PER_TABLE: usize = 100_000;
