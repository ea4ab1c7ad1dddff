//! HTTP exposition layer for the mitherm sensor session.
//!
//! The binary in this crate wires a [`mitherm_core::SensorSession`] to an
//! optional axum server that publishes the latest reading as JSON.

pub mod api;
pub mod state;

pub use state::AppState;
