use std::cell::RefCell;
use std::path::{Path, PathBuf};

use gaugecal::capture::image::{GaugeImage, ImageSource};
use gaugecal::config::CalibrationConfig;
use gaugecal::domain::{CalibrationAction, Point, PointerPos};
use gaugecal::error::{CalibrationError, Result};
use gaugecal::service::{DebugReading, ReadingService};
use gaugecal::session::{ArmPolicy, ArmState, Status, Workspace};

/// Records every configuration it is sent
struct RecordingService {
    sent: RefCell<Vec<CalibrationConfig>>,
    reply: Option<f64>,
}

impl RecordingService {
    fn new(reply: Option<f64>) -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            reply,
        }
    }
}

fn png_file(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::new(width, height).save(&path).unwrap();
    path
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    std::fs::read(png_file(dir.path(), "tmp.png", width, height)).unwrap()
}

impl ReadingService for RecordingService {
    fn debug_reading(&self, _image: &GaugeImage, config: &CalibrationConfig) -> Result<DebugReading> {
        self.sent.borrow_mut().push(config.clone());
        Ok(DebugReading {
            value: self.reply,
            overlay: self.reply.map(|_| png_bytes(2, 2)),
            threshold: png_bytes(2, 2),
        })
    }

    fn gauge_value(&self, _image: &GaugeImage, config: &CalibrationConfig) -> Result<Option<f64>> {
        self.sent.borrow_mut().push(config.clone());
        Ok(self.reply)
    }

    fn last_images(&self) -> Result<Vec<GaugeImage>> {
        Ok(vec![
            GaugeImage::from_bytes(png_bytes(40, 30), ImageSource::History(0))?,
            GaugeImage::from_bytes(png_bytes(50, 50), ImageSource::History(1))?,
        ])
    }
}

/// Service that is never reachable
struct Offline;

impl ReadingService for Offline {
    fn debug_reading(&self, _: &GaugeImage, _: &CalibrationConfig) -> Result<DebugReading> {
        Err(CalibrationError::ServiceUnavailable {
            message: "connection refused".to_string(),
            source: None,
        })
    }

    fn gauge_value(&self, _: &GaugeImage, _: &CalibrationConfig) -> Result<Option<f64>> {
        Err(CalibrationError::ServiceUnavailable {
            message: "connection refused".to_string(),
            source: None,
        })
    }

    fn last_images(&self) -> Result<Vec<GaugeImage>> {
        Err(CalibrationError::ServiceUnavailable {
            message: "connection refused".to_string(),
            source: None,
        })
    }
}

fn arm_and_click(workspace: &mut Workspace, action: CalibrationAction, x: f64, y: f64) {
    workspace.arm(action).unwrap();
    let firings = workspace.pointer_click(PointerPos::new(x, y));
    assert_eq!(firings.len(), 1);
    assert!(firings[0].outcome.is_ok(), "{action} failed: {:?}", firings[0].outcome);
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_calibrate_a_dial_from_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let path = png_file(dir.path(), "dial.png", 400, 300);

    let mut seed = CalibrationConfig::empty();
    seed.axis = Some(Point::new(75, 95));
    let mut workspace = Workspace::new(seed, ArmPolicy::Concurrent);
    workspace.load_image_file(&path).unwrap();
    assert_eq!(workspace.status().text(), "Loaded dial.png (400x300)");

    arm_and_click(&mut workspace, CalibrationAction::CropStart, 180.0, 90.0);
    arm_and_click(&mut workspace, CalibrationAction::CropEnd, 330.0, 280.0);
    arm_and_click(&mut workspace, CalibrationAction::Center, 252.0, 190.0);
    // down-left of the pivot: 135°
    arm_and_click(&mut workspace, CalibrationAction::StartAngle, 242.0, 200.0);
    // down-right: 45°, pushed past the seam to stay after the start
    arm_and_click(&mut workspace, CalibrationAction::EndAngle, 262.0, 200.0);
    assert_eq!(workspace.arm_state(), ArmState::Idle);

    let service = RecordingService::new(Some(6.42));
    workspace.execute(&service).unwrap();

    let sent = service.sent.borrow();
    assert_eq!(sent.len(), 1);
    let config = &sent[0];
    let crop = config.crop.as_ref().unwrap();
    assert_eq!(crop.top_left, Some(Point::new(180, 90)));
    assert_eq!(crop.bottom_right, Some(Point::new(330, 280)));
    assert_eq!(config.center, Some(Point::new(72, 100)));
    assert_eq!(config.axis, Some(Point::new(75, 95)));
    assert!(approx(config.start_angle.unwrap(), 135.0));
    assert!(approx(config.end_angle.unwrap(), 405.0));

    assert_eq!(workspace.status().text(), "Value: 6.42");
    assert!(workspace.reading().unwrap().overlay.is_some());
    // the text mirrors what was sent
    assert_eq!(&CalibrationConfig::from_json(workspace.config_text()).unwrap(), config);
}

#[test]
fn test_actions_must_follow_dependency_order() {
    let mut workspace = Workspace::new(CalibrationConfig::empty(), ArmPolicy::Concurrent);
    workspace
        .load_image_base64(&GaugeImage::from_bytes(png_bytes(10, 10), ImageSource::Inline)
            .unwrap()
            .data_uri())
        .unwrap();

    for action in [
        CalibrationAction::Center,
        CalibrationAction::StartAngle,
        CalibrationAction::EndAngle,
    ] {
        let err = workspace.arm(action).unwrap_err();
        assert!(matches!(err, CalibrationError::ConfigIncomplete { .. }));
    }
    assert_eq!(workspace.arm_state(), ArmState::Idle);
    assert!(workspace.status().is_error());
}

#[test]
fn test_exclusive_policy_keeps_one_action() {
    let mut workspace = Workspace::new(CalibrationConfig::default(), ArmPolicy::Exclusive);
    workspace
        .load_image_base64(&GaugeImage::from_bytes(png_bytes(10, 10), ImageSource::Inline)
            .unwrap()
            .to_base64())
        .unwrap();

    workspace.arm(CalibrationAction::CropStart).unwrap();
    workspace.arm(CalibrationAction::Center).unwrap();
    assert_eq!(
        workspace.arm_state(),
        ArmState::Armed(vec![CalibrationAction::Center])
    );
}

#[test]
fn test_offline_service_leaves_workspace_usable() {
    let dir = tempfile::tempdir().unwrap();
    let mut workspace = Workspace::default();
    workspace
        .load_image_file(png_file(dir.path(), "dial.png", 400, 300))
        .unwrap();
    let before = workspace.config_text().to_string();

    assert!(workspace.load_history(&Offline).is_err());
    let err = workspace.execute(&Offline).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(workspace.status(), Status::Error(_)));
    assert_eq!(workspace.config_text(), before);

    // a later request goes through with the same configuration
    let service = RecordingService::new(None);
    assert_eq!(workspace.quick_reading(&service).unwrap(), None);
    assert_eq!(workspace.status().text(), "Value: no needle found");
    assert_eq!(service.sent.borrow()[0], CalibrationConfig::default());
}

#[test]
fn test_history_entry_becomes_active_image() {
    let mut workspace = Workspace::default();
    let service = RecordingService::new(Some(1.0));
    assert_eq!(workspace.load_history(&service).unwrap(), 2);

    workspace.arm(CalibrationAction::CropStart).unwrap_err();
    workspace.select_history_entry(1).unwrap();
    assert_eq!(workspace.image().unwrap().width(), 50);

    workspace.arm(CalibrationAction::CropStart).unwrap();
    workspace.select_history_entry(0).unwrap();
    assert_eq!(workspace.arm_state(), ArmState::Idle);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut workspace = Workspace::default();
    let err = workspace
        .load_image_file(dir.path().join("missing.png"))
        .unwrap_err();
    assert!(matches!(err, CalibrationError::ImageLoad { .. }));
    assert!(workspace.image().is_none());
    assert!(workspace.status().is_error());
}
