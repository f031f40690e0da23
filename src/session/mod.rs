//! Calibration session
//!
//! This module contains:
//! - The interaction controller (armed actions and click handling)
//! - The workspace tying configuration, image, history and service together
//! - Window message types and keyboard shortcuts (gui feature)

#[cfg(feature = "gui")]
pub mod messages;
#[cfg(feature = "gui")]
pub mod shortcuts;
pub mod state;
pub mod workspace;

pub use state::{ArmPolicy, ArmState, CalibrationController, FieldUpdate, Firing};
pub use workspace::{Status, Submission, Workspace};
