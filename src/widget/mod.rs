//! Custom widgets for the calibration window

pub mod click_capture;
pub mod toolbar;

pub use click_capture::ClickCapture;
