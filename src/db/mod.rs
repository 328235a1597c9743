//! Database connectivity for the executor

pub mod connection;

pub use connection::DatabaseConnection;
