//! Core business logic, independent of any user interface.
//!
//! Functions take a `&DatabaseConnection` and return [`crate::errors::Result`].

pub mod access;
pub mod analytics;
pub mod catalog;
pub mod ledger;
pub mod sale;
pub mod snapshot;
pub mod user;
