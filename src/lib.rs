// logsift - lib.rs
//
// Library entry point, exposing the engine, configuration, and cache
// modules for integration testing and programmatic use.
//
// The CLI surface lives in `main.rs` and is not part of the library.

pub mod cache;
pub mod config;
pub mod core;
pub mod util;
