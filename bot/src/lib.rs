//! Seasonal events chat bot: command dispatch, HTTP API and configuration
//! on top of the `season-engine` core.

pub mod app;
pub mod background;
pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod server;

pub use bootstrap::init_foundation;
