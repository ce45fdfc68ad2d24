//! PlaceBoard Application
//!
//! Browser client for the shared pixel board: input handling, camera and
//! the DOM shell around a [`placeboard_core::Session`].

mod app;
mod event_handler;
mod params;
mod shortcuts;

pub use app::{App, AppConfig, Status};
pub use event_handler::EventHandler;
pub use params::parse_endpoint;
pub use shortcuts::{KeyAction, Shortcut, ShortcutRegistry};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
