//! Babel Common - Shared types and utilities for the Babel translation relay.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Startup error types
//! - Logging setup
//! - String helpers for safe logging and message limits

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub use config::{Config, ObservabilityConfig, TelegramConfig, TranslatorConfig};
pub use error::{Error, Result};
