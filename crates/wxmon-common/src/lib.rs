//! Shared domain types and localization for the wxmon workspace.
//!
//! Everything that crosses a crate boundary lives here: the closed set of
//! weather metrics, alert rules and their transient trigger events, the
//! wire payloads pushed to clients, and the static `vi`/`en` translation
//! registry used by the notification formatter.

pub mod i18n;
pub mod types;
