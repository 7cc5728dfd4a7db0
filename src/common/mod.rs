//! Utilities shared by the HTTP API, the CLI and the chat console.

pub mod db_errors;
