pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod qris;
pub mod services;
pub mod store;
