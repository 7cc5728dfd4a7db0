pub mod common;
pub mod config;
pub mod console;
pub mod database;
pub mod errors;
pub mod services;
pub mod traversal;

#[cfg(feature = "server")]
pub mod server;
