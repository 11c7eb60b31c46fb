//! HTTP and WebSocket server for live care-home bingo sessions.
//!
//! The binary wires an in-memory store into the `care_bingo` managers and
//! serves them through [`api::create_router`].

pub mod api;
pub mod config;
pub mod demo;
pub mod logging;
pub mod metrics;
