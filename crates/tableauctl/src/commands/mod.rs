//! Command implementations

pub mod connection;
pub mod job;
pub mod list;
pub mod refresh;
