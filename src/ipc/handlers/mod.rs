pub mod auth;
pub mod core;
pub mod data_source;
pub mod events;
pub mod lists;
pub mod preferences;
pub mod routes;
