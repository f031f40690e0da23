//! Message types for the calibration window
//!
//! This module contains:
//! - Msg enum with nested sub-enums for organized message handling
//! - Shorthand constructors used by views and shortcuts

use std::path::PathBuf;

use crate::capture::image::GaugeImage;
use crate::domain::{CalibrationAction, PointerPos};
use crate::error::Result;
use crate::service::DebugReading;

// ============================================================================
// Calibration
// ============================================================================

/// Arming and image clicks
#[derive(Debug, Clone)]
pub enum CalibrateMsg {
    /// Arm the action, or disarm it if already armed
    Toggle(CalibrationAction),
    /// Cancel every armed action
    DisarmAll,
    /// Left click on the displayed image, image-local pixels
    Click(PointerPos),
    /// Switch between one armed action and several
    SetExclusive(bool),
}

// ============================================================================
// Image intake
// ============================================================================

#[derive(Debug, Clone)]
pub enum ImageMsg {
    /// Show the file picker
    OpenDialog,
    /// Picker closed; None when cancelled
    Picked(Option<PathBuf>),
    /// File read and decoded off the UI thread
    Loaded(Result<GaugeImage>),
    /// Gallery entry clicked
    SelectHistory(usize),
    /// One-time history fetch finished
    HistoryLoaded(Result<Vec<GaugeImage>>),
}

// ============================================================================
// Reading service
// ============================================================================

#[derive(Debug, Clone)]
pub enum ServiceMsg {
    /// Submit for a debug reading
    Execute,
    /// Submit for the value only
    QuickReading,
    /// Results carry the image generation they were requested for
    DebugReadingDone(u64, Result<DebugReading>),
    ValueDone(u64, Result<Option<f64>>),
}

#[derive(Debug, Clone)]
pub enum Msg {
    Calibrate(CalibrateMsg),
    Image(ImageMsg),
    Service(ServiceMsg),
    /// Configuration editor action
    ConfigEdit(cosmic::iced_widget::text_editor::Action),
    /// Replace the text with the built-in configuration
    ResetConfig,
    /// Raw keyboard event, and whether a focused widget already took it
    Keyboard(cosmic::iced::keyboard::Event, bool),
}

impl Msg {
    pub fn toggle(action: CalibrationAction) -> Self {
        Self::Calibrate(CalibrateMsg::Toggle(action))
    }
    pub fn disarm_all() -> Self {
        Self::Calibrate(CalibrateMsg::DisarmAll)
    }
    pub fn click(x: f32, y: f32) -> Self {
        Self::Calibrate(CalibrateMsg::Click(PointerPos::new(x as f64, y as f64)))
    }
    pub fn set_exclusive(exclusive: bool) -> Self {
        Self::Calibrate(CalibrateMsg::SetExclusive(exclusive))
    }

    pub fn open_dialog() -> Self {
        Self::Image(ImageMsg::OpenDialog)
    }
    pub fn select_history(index: usize) -> Self {
        Self::Image(ImageMsg::SelectHistory(index))
    }

    pub fn execute() -> Self {
        Self::Service(ServiceMsg::Execute)
    }
    pub fn quick_reading() -> Self {
        Self::Service(ServiceMsg::QuickReading)
    }
}
