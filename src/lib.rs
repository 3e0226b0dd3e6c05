pub mod api;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod data_models;
pub mod db;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod query;
pub mod rate_limit;
