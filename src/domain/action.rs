//! Calibration action kinds

use std::fmt;

/// One calibration click the user can arm
///
/// Each action owns exactly one field of the configuration and is the only
/// thing that writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationAction {
    /// Absolute top-left corner of the crop window
    CropStart,
    /// Absolute bottom-right corner of the crop window
    CropEnd,
    /// Needle pivot, relative to the crop's top-left corner
    Center,
    /// Angle of the minimum reading
    StartAngle,
    /// Angle of the maximum reading, ordered after the start angle
    EndAngle,
}

impl CalibrationAction {
    pub const ALL: [CalibrationAction; 5] = [
        CalibrationAction::CropStart,
        CalibrationAction::CropEnd,
        CalibrationAction::Center,
        CalibrationAction::StartAngle,
        CalibrationAction::EndAngle,
    ];

    /// Stable identifier, matching the workspace's button ids
    pub fn id(self) -> &'static str {
        match self {
            CalibrationAction::CropStart => "select_crop_start",
            CalibrationAction::CropEnd => "select_crop_end",
            CalibrationAction::Center => "select_center",
            CalibrationAction::StartAngle => "select_start_angle",
            CalibrationAction::EndAngle => "select_end_angle",
        }
    }

    /// Button label
    pub fn label(self) -> &'static str {
        match self {
            CalibrationAction::CropStart => "Select crop start",
            CalibrationAction::CropEnd => "Select crop end",
            CalibrationAction::Center => "Select center",
            CalibrationAction::StartAngle => "Select start angle",
            CalibrationAction::EndAngle => "Select end angle",
        }
    }

    /// Configuration field written when the action fires
    pub fn field(self) -> &'static str {
        match self {
            CalibrationAction::CropStart => "crop.top_left",
            CalibrationAction::CropEnd => "crop.bottom_right",
            CalibrationAction::Center => "center",
            CalibrationAction::StartAngle => "start_angle",
            CalibrationAction::EndAngle => "end_angle",
        }
    }
}

impl fmt::Display for CalibrationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
