//! Campus console library
//!
//! Serves the role-gated web console in front of the campus backend API.
//! The binary entry point is in main.rs.

pub mod config;
pub mod console;
pub mod server;
