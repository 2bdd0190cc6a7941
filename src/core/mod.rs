//! Core building blocks
//!
//! Configuration, the crate error type and the shared application state.

pub mod app_state;
pub mod config;
pub mod error;
pub mod factory;

pub use app_state::AppState;
pub use config::Config;
pub use error::{Error, Result};
