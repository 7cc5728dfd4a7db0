pub mod connection;
pub mod entities;
pub mod migrate;
pub mod migrations;
pub mod seed_data;
pub mod test_utils;

pub use connection::*;
pub use entities::*;
pub use migrate::{migrate_database, MigrateDirection};
