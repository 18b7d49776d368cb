pub mod api;
pub mod compactor;
pub mod config;
pub mod engine;
pub mod limits;
pub mod logging;
pub mod model;
pub mod observability;
pub mod schema;
pub mod wal;
