//! Configuration and shared error types for otolith.
//!
//! This crate contains the configuration structures (TOML-loadable, with
//! defaults matching the reference firmware setup) used across the otolith
//! workspace.

pub mod config;
pub mod error;

pub use config::{AppConfig, CaptureConfig, TrainConfig, load_config};
pub use error::CoreError;
