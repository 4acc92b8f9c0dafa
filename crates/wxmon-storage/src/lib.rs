//! Relational persistence for alert rules, the location directory, and
//! administrator system alerts.
//!
//! Backed by SeaORM over SQLite (WAL mode); the schema is managed by the
//! workspace `migration` crate and applied on connect. [`store::AlertStore`]
//! is the single access layer and also implements the `wxmon-alert` trait
//! seams ([`wxmon_alert::RuleStore`], [`wxmon_alert::LocationDirectory`]).

pub mod entities;
pub mod error;
pub mod store;

#[cfg(test)]
mod tests;

pub use store::AlertStore;
