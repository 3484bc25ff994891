pub mod aggregator;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod data_models;
pub mod db;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod ranking;
pub mod session;
pub mod source;
