//! Shared `Result` alias.
//!
//! Domain crates define plain error enums (`StoreError`, `ConfigError`, ...)
//! and return them wrapped in a [`Report`], which records where the failure
//! was raised. Absence is modelled with `Option`, never with an error.

use rootcause::Report;

/// `Result` whose error is a [`Report`] over the domain error `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
