//! # Feast server
//! This crate hosts the HTTP surface of the Feast marketplace backend. It is responsible for:
//! * Receiving payment verification calls and turning them into orders.
//! * Serving the order transition and lookup endpoints.
//! * Fanning out notifications (email, WhatsApp, live updates) for every accepted transition.
//! * Serving seller settlement reports.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notifier;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
