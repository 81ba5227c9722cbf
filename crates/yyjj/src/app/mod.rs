//! Application layer orchestrating domain logic and infrastructure.

pub mod convert;
pub mod debounce;
pub mod export;
pub mod io;
pub mod sync;
