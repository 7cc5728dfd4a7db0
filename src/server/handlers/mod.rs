pub mod health;
pub mod options;
pub mod scenarios;
