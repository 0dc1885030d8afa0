//! Air-quality dashboard core: loading, filtering and aggregation of hourly
//! station observations, independent of the egui front end.

pub mod config;
pub mod data;
