//! Image intake
//!
//! This module consolidates:
//! - Gauge image payloads (image.rs)
//! - The history gallery (history.rs)

pub mod history;
pub mod image;
