pub mod cache;
pub mod client;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod preferences;
pub mod recommendation;
pub mod routes;
pub mod selector;
pub mod utils;

#[cfg(test)]
mod testing;
