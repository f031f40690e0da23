//! Calibration workspace for an analog gauge reading service
//!
//! The headless core (configuration, interaction controller, service client,
//! image intake) builds without any UI. The libcosmic window and its
//! persisted settings live behind the `gui` feature.

pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod session;

#[cfg(feature = "gui")]
pub mod core;
#[cfg(feature = "gui")]
pub mod settings;
#[cfg(feature = "gui")]
pub mod widget;

pub use config::{CalibrationConfig, ConfigDocument};
pub use error::{CalibrationError, Result};
pub use session::Workspace;
