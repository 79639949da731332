pub mod routes;
pub mod configuration;
pub mod startup;
pub mod telemetry;
pub mod domain;
pub mod mail;
