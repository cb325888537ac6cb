//! pagewarden web server.
//!
//! Serves a statically generated documentation site, deciding per request
//! whether the requester may read it. The decision itself lives in
//! `pagewarden-access`; this crate wires it into axum, loads configuration,
//! and manages session lifecycle.

pub mod app;
pub mod auth;
pub mod config;
pub mod maintenance;
pub mod state;
