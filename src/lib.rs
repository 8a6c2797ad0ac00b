// Library for tests to access modules

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod status_service;
pub mod telemetry;
pub mod version;
pub mod worker;
