// logsift - core/mod.rs
//
// The scanning, matching, and aggregation engine. Everything here is
// invoked with explicit parameters — no process-wide path or config state.

pub mod archive;
pub mod classify;
pub mod engine;
pub mod model;
pub mod report;
pub mod resolver;
pub mod summary;
pub mod vehicle;
