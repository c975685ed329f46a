pub mod bus;
pub mod compensation;
pub mod config;
pub mod error;
pub mod geospatial;
pub mod gtfs_rt_handlers;
pub mod journey;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod postgres_tools;
pub mod schema;
pub mod store;
pub mod workflow;
