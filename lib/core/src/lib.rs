//! Core types shared by the pagewarden crates.
//!
//! This crate provides the identifier newtypes, the clock abstraction used
//! for every expiry comparison, and the rootcause-based `Result` alias.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Result;
pub use id::{SessionId, UserId};
