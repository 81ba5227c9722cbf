//! Infrastructure adapters for files, configuration, and logging.

pub mod config;
pub mod fs;
pub mod logging;
