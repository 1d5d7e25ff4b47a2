//! Backend runtime entry point and public API surface.
//!
//! This crate owns the backend lifecycle: it routes bridge messages to
//! services, keeps the per-session counter store, maintains the push
//! channel, and reconciles against the document server's REST API.

pub mod api;
mod app;
pub mod config;
pub mod push;
mod runtime;
mod services;
mod session;
mod state;
pub mod store;

pub(crate) use crate::app::AppContext;
pub use crate::runtime::{BackendOptions, run};
