//! Domain types shared by the engine, converters, and views.

pub mod errors;
pub mod model;
