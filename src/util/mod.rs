// logsift - util/mod.rs
//
// Shared utilities: error hierarchy, logging, named constants.

pub mod constants;
pub mod error;
pub mod logging;
