pub mod config;
pub mod database;
pub mod discovery;
pub mod entities;
pub mod errors;
pub mod governor;
pub mod harvest;
pub mod job_scheduling;
pub mod models;
pub mod ranking;
pub mod services;
pub mod speed_test;
pub mod utils;
