//! Pure domain types with minimal dependencies
//!
//! Types here have no framework dependencies (cosmic, iced, ureq) so the
//! calibration math can be used and tested headless.

pub mod action;
pub mod geometry;

pub use action::*;
pub use geometry::*;
