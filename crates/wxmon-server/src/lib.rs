//! HTTP server for the weather alert monitor.
//!
//! Exposes the REST surface (rules, locations, system alerts, on-demand
//! checks) and the WebSocket endpoint that live notifications are pushed
//! through. The background monitor loop is owned by the server process
//! and wired together in `main`.

pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod state;
pub mod ws;
