//! Reading service contract
//!
//! This module contains:
//! - Wire types for the three endpoints (protocol.rs)
//! - Decoded results (reading.rs)
//! - The `ReadingService` trait and its HTTP client (client.rs)

pub mod client;
pub mod protocol;
pub mod reading;

pub use client::{HttpReadingClient, ReadingService};
pub use reading::DebugReading;
