//! Request authorization and session lifecycle for the server.
//!
//! This module provides:
//! - The access-control middleware in front of static site delivery
//! - Session issue (development only) and revocation routes
//! - The PostgreSQL session backend
//!
//! Identity-provider exchanges happen outside this server; it only consumes
//! the sessions they produce.

pub mod db;
pub mod middleware;
pub mod routes;

pub use middleware::access_control;
pub use routes::{dev_login, logout};
