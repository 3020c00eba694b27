pub mod authentication;
pub mod configuration;
pub mod domain;
pub mod fingerprint;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
