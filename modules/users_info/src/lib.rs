//! In-memory user directory: list, look up and create users.
//!
//! Other crates should depend on [`contract`] only. Everything under the
//! hidden modules is wiring for the server binary and the tests.

pub mod contract;
pub use contract::{client, error, model};

pub mod module;
pub use module::UsersInfo;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
