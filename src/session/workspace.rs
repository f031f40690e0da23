//! The calibration workspace
//!
//! Owns the single configuration document, the interaction controller, the
//! active image and the last service result. Every operation returns its
//! `Result` and also records failures in [`Status`], so the front-end can
//! show them without the workspace ever losing its configuration.

use std::path::Path;

use crate::capture::history::HistoryPanel;
use crate::capture::image::{GaugeImage, ImageSource};
use crate::config::{CalibrationConfig, ConfigDocument};
use crate::domain::{CalibrationAction, PointerPos};
use crate::error::{CalibrationError, Result};
use crate::service::{DebugReading, ReadingService};
use crate::session::state::{ArmPolicy, ArmState, CalibrationController, Firing};

/// Status line shown under the controls
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Status {
    #[default]
    Idle,
    Info(String),
    Error(String),
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Idle => "",
            Status::Info(text) | Status::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

/// Owned copies of everything a service request needs
#[derive(Debug, Clone)]
pub struct Submission {
    pub image: GaugeImage,
    pub config: CalibrationConfig,
    /// Image generation the request was made for
    pub generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    document: ConfigDocument,
    controller: CalibrationController,
    image: Option<GaugeImage>,
    history: HistoryPanel,
    reading: Option<DebugReading>,
    quick_value: Option<f64>,
    status: Status,
    /// Bumped every time the active image changes
    generation: u64,
}

impl Workspace {
    pub fn new(config: CalibrationConfig, policy: ArmPolicy) -> Self {
        Self {
            document: ConfigDocument::new(config),
            controller: CalibrationController::new(policy),
            ..Default::default()
        }
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn config_text(&self) -> &str {
        self.document.text()
    }

    pub fn arm_state(&self) -> ArmState {
        self.controller.state()
    }

    pub fn is_armed(&self, action: CalibrationAction) -> bool {
        self.controller.is_armed(action)
    }

    /// Clicks on the image are only captured while this is true
    pub fn has_armed(&self) -> bool {
        !self.controller.armed().is_empty()
    }

    pub fn policy(&self) -> ArmPolicy {
        self.controller.policy()
    }

    pub fn set_policy(&mut self, policy: ArmPolicy) {
        self.controller.set_policy(policy);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self) -> Option<&GaugeImage> {
        self.image.as_ref()
    }

    pub fn history(&self) -> &HistoryPanel {
        &self.history
    }

    pub fn reading(&self) -> Option<&DebugReading> {
        self.reading.as_ref()
    }

    pub fn quick_value(&self) -> Option<f64> {
        self.quick_value
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Status::Info(text.into());
    }

    /// Record a failure in the status line and hand it back
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            log::warn!("{err}");
            self.status = Status::Error(err.to_string());
        }
        result
    }

    /// Hand edit of the configuration text
    ///
    /// The text is kept even when it does not parse.
    pub fn edit_config_text(&mut self, text: impl Into<String>) -> Result<()> {
        let result = self.document.set_text(text);
        if result.is_ok() && self.status.is_error() {
            self.status = Status::Idle;
        }
        self.track(result)
    }

    /// Start over from `config`, discarding the text
    pub fn reset_config(&mut self, config: CalibrationConfig) {
        self.controller.disarm_all();
        self.document.replace(config);
        self.info("Configuration reset");
    }

    /// Arm a single click capture on the image
    pub fn arm(&mut self, action: CalibrationAction) -> Result<()> {
        let result = self.arm_inner(action);
        if result.is_ok() {
            self.info(format!("{}: click on the image", action.label()));
        }
        self.track(result)
    }

    fn arm_inner(&mut self, action: CalibrationAction) -> Result<()> {
        if self.image.is_none() {
            return Err(CalibrationError::NoImage);
        }
        let config = self.document.parse()?;
        self.controller.arm(action, &config)
    }

    pub fn disarm(&mut self, action: CalibrationAction) -> bool {
        self.controller.disarm(action)
    }

    /// Arm if idle, disarm if armed; what the action buttons do
    pub fn toggle(&mut self, action: CalibrationAction) -> Result<()> {
        if self.disarm(action) {
            self.info(format!("{} cancelled", action.label()));
            return Ok(());
        }
        self.arm(action)
    }

    pub fn disarm_all(&mut self) {
        self.controller.disarm_all();
    }

    /// A click on the displayed image, in image-local pixels
    ///
    /// Returns one firing per armed action; the status line summarises them.
    pub fn pointer_click(&mut self, click: PointerPos) -> Vec<Firing> {
        let firings = self.controller.handle_click(click, &mut self.document);
        if firings.is_empty() {
            return firings;
        }

        let errors: Vec<String> = firings
            .iter()
            .filter_map(|firing| {
                firing
                    .outcome
                    .as_ref()
                    .err()
                    .map(|err| format!("{}: {err}", firing.action.label()))
            })
            .collect();
        if errors.is_empty() {
            let fields: Vec<&str> = firings.iter().map(|firing| firing.action.field()).collect();
            self.info(format!("Updated {}", fields.join(", ")));
        } else {
            self.status = Status::Error(errors.join("; "));
        }
        firings
    }

    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.apply_loaded_image(GaugeImage::from_path(path))
    }

    /// Result of a file read done elsewhere, e.g. off the UI thread
    pub fn apply_loaded_image(&mut self, result: Result<GaugeImage>) -> Result<()> {
        let image = self.track(result)?;
        self.set_image(image);
        Ok(())
    }

    /// Plain base64 or a data URI
    pub fn load_image_base64(&mut self, encoded: &str) -> Result<()> {
        let result = GaugeImage::from_base64(encoded, ImageSource::Inline);
        let image = self.track(result)?;
        self.set_image(image);
        Ok(())
    }

    /// Make `image` the active image; armed actions belong to the old one
    pub fn set_image(&mut self, image: GaugeImage) {
        self.controller.disarm_all();
        self.reading = None;
        self.quick_value = None;
        self.generation += 1;
        let label = match &image.source {
            ImageSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ImageSource::History(index) => format!("history #{}", index + 1),
            ImageSource::Inline => "image".to_string(),
        };
        self.info(format!(
            "Loaded {label} ({}x{})",
            image.width(),
            image.height()
        ));
        self.image = Some(image);
    }

    /// Store the result of the one-time history fetch
    pub fn set_history(&mut self, result: Result<Vec<GaugeImage>>) -> Result<usize> {
        let result = self.history.set_result(result);
        self.track(result)
    }

    pub fn load_history(&mut self, service: &dyn ReadingService) -> Result<usize> {
        let result = service.last_images();
        self.set_history(result)
    }

    /// Same effect as picking that image from disk
    pub fn select_history_entry(&mut self, index: usize) -> Result<()> {
        let result = self.history.select(index);
        let image = self.track(result)?;
        self.set_image(image);
        Ok(())
    }

    /// Snapshot image and configuration for a request
    ///
    /// Fails without touching anything if there is no image, the text does
    /// not parse, or a field the service needs is missing.
    pub fn prepare_submission(&mut self) -> Result<Submission> {
        let result = self.prepare_inner();
        let submission = self.track(result)?;
        if submission
            .config
            .crop
            .as_ref()
            .is_some_and(|crop| !crop.is_well_formed())
        {
            log::warn!("Submitting an inverted crop window");
            self.info("Submitting… (crop corners look inverted)");
        } else {
            self.info("Submitting…");
        }
        Ok(submission)
    }

    fn prepare_inner(&self) -> Result<Submission> {
        let image = self.image.clone().ok_or(CalibrationError::NoImage)?;
        let config = self.document.snapshot()?;
        config.validate_for_submission()?;
        Ok(Submission {
            image,
            config,
            generation: self.generation,
        })
    }

    /// Results for an image that is no longer active are dropped
    fn is_stale(&self, generation: u64) -> bool {
        if generation != self.generation {
            log::debug!(
                "Dropping result for image generation {generation}, now at {}",
                self.generation
            );
            return true;
        }
        false
    }

    /// Store a debug reading; a failure keeps the previous one on screen
    pub fn apply_debug_reading(
        &mut self,
        generation: u64,
        result: Result<DebugReading>,
    ) -> Result<()> {
        if self.is_stale(generation) {
            return Ok(());
        }
        let reading = self.track(result)?;
        self.info(format!("Value: {}", reading.value_text()));
        self.reading = Some(reading);
        Ok(())
    }

    pub fn apply_quick_value(&mut self, generation: u64, result: Result<Option<f64>>) -> Result<()> {
        if self.is_stale(generation) {
            return Ok(());
        }
        let value = self.track(result)?;
        self.quick_value = value;
        match value {
            Some(value) => self.info(format!("Value: {value:.2}")),
            None => self.info("Value: no needle found"),
        }
        Ok(())
    }

    /// Submit for a debug reading and store the result
    pub fn execute(&mut self, service: &dyn ReadingService) -> Result<()> {
        let submission = self.prepare_submission()?;
        let result = service.debug_reading(&submission.image, &submission.config);
        self.apply_debug_reading(submission.generation, result)
    }

    /// Value-only request
    pub fn quick_reading(&mut self, service: &dyn ReadingService) -> Result<Option<f64>> {
        let submission = self.prepare_submission()?;
        let result = service.gauge_value(&submission.image, &submission.config);
        self.apply_quick_value(submission.generation, result)?;
        Ok(self.quick_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::image::tests::png_bytes;
    use crate::domain::Point;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeService {
        seen: RefCell<Vec<CalibrationConfig>>,
        fail: bool,
    }

    impl ReadingService for FakeService {
        fn debug_reading(
            &self,
            _image: &GaugeImage,
            config: &CalibrationConfig,
        ) -> Result<DebugReading> {
            self.seen.borrow_mut().push(config.clone());
            if self.fail {
                return Err(CalibrationError::ServiceUnavailable {
                    message: "down".to_string(),
                    source: None,
                });
            }
            Ok(DebugReading {
                value: Some(5.0),
                overlay: None,
                threshold: png_bytes(1, 1),
            })
        }

        fn gauge_value(
            &self,
            _image: &GaugeImage,
            config: &CalibrationConfig,
        ) -> Result<Option<f64>> {
            self.seen.borrow_mut().push(config.clone());
            Ok(Some(2.5))
        }

        fn last_images(&self) -> Result<Vec<GaugeImage>> {
            Ok(vec![
                GaugeImage::from_bytes(png_bytes(2, 2), ImageSource::History(0)).unwrap(),
            ])
        }
    }

    fn with_image() -> Workspace {
        let mut workspace = Workspace::default();
        let image = GaugeImage::from_bytes(png_bytes(400, 300), ImageSource::Inline).unwrap();
        workspace.set_image(image);
        workspace
    }

    #[test]
    fn test_arming_needs_an_image() {
        let mut workspace = Workspace::default();
        let err = workspace.arm(CalibrationAction::CropStart).unwrap_err();
        assert!(matches!(err, CalibrationError::NoImage));
        assert!(workspace.status().is_error());
    }

    #[test]
    fn test_arming_with_malformed_text_is_refused() {
        let mut workspace = with_image();
        let _ = workspace.edit_config_text("{,}");
        let err = workspace.arm(CalibrationAction::Center).unwrap_err();
        assert!(matches!(err, CalibrationError::ConfigParse { .. }));
        assert_eq!(workspace.arm_state(), ArmState::Idle);
        assert_eq!(workspace.config_text(), "{,}");
    }

    #[test]
    fn test_toggle_and_click() {
        let mut workspace = with_image();
        workspace.toggle(CalibrationAction::Center).unwrap();
        assert!(workspace.is_armed(CalibrationAction::Center));
        workspace.toggle(CalibrationAction::Center).unwrap();
        assert!(!workspace.is_armed(CalibrationAction::Center));

        workspace.toggle(CalibrationAction::Center).unwrap();
        let firings = workspace.pointer_click(PointerPos::new(252.0, 190.0));
        assert_eq!(firings.len(), 1);
        assert_eq!(workspace.status(), &Status::Info("Updated center".to_string()));
        assert_eq!(
            workspace.document().last_valid().center,
            Some(Point::new(72, 100))
        );
    }

    #[test]
    fn test_unarmed_click_is_ignored() {
        let mut workspace = with_image();
        let before = workspace.config_text().to_string();
        assert!(workspace.pointer_click(PointerPos::new(1.0, 1.0)).is_empty());
        assert_eq!(workspace.config_text(), before);
    }

    #[test]
    fn test_new_image_disarms() {
        let mut workspace = with_image();
        workspace.arm(CalibrationAction::CropEnd).unwrap();
        workspace.set_image(GaugeImage::from_bytes(png_bytes(1, 1), ImageSource::Inline).unwrap());
        assert_eq!(workspace.arm_state(), ArmState::Idle);
    }

    #[test]
    fn test_execute_sends_snapshot_and_stores_reading() {
        let mut workspace = with_image();
        let service = FakeService::default();
        workspace.execute(&service).unwrap();
        assert_eq!(workspace.reading().and_then(|r| r.value), Some(5.0));
        assert_eq!(service.seen.borrow()[0], CalibrationConfig::default());
        assert_eq!(workspace.status().text(), "Value: 5.00");
    }

    #[test]
    fn test_failed_execute_keeps_config() {
        let mut workspace = with_image();
        let text = workspace.config_text().to_string();
        let service = FakeService {
            fail: true,
            ..Default::default()
        };
        let err = workspace.execute(&service).unwrap_err();
        assert!(err.is_retryable());
        assert!(workspace.status().is_error());
        assert_eq!(workspace.config_text(), text);
        assert!(workspace.reading().is_none());
    }

    #[test]
    fn test_incomplete_config_is_not_submitted() {
        let mut workspace = with_image();
        let mut config = CalibrationConfig::default();
        config.axis = None;
        workspace.reset_config(config);
        let service = FakeService::default();
        let err = workspace.quick_reading(&service).unwrap_err();
        assert!(matches!(err, CalibrationError::ConfigIncomplete { field: "axis" }));
        assert!(service.seen.borrow().is_empty());
    }

    #[test]
    fn test_quick_reading() {
        let mut workspace = with_image();
        let value = workspace.quick_reading(&FakeService::default()).unwrap();
        assert_eq!(value, Some(2.5));
        assert_eq!(workspace.quick_value(), Some(2.5));
    }

    #[test]
    fn test_history_selection_replaces_image() {
        let mut workspace = Workspace::default();
        assert_eq!(workspace.load_history(&FakeService::default()).unwrap(), 1);
        workspace.select_history_entry(0).unwrap();
        assert_eq!(workspace.image().map(|img| img.width()), Some(2));
        assert_eq!(workspace.status().text(), "Loaded history #1 (2x2)");
        assert!(workspace.select_history_entry(4).is_err());
    }

    #[test]
    fn test_result_for_previous_image_is_dropped() {
        let mut workspace = with_image();
        let submission = workspace.prepare_submission().unwrap();
        let service = FakeService::default();
        let result = service.debug_reading(&submission.image, &submission.config);
        let value = service.gauge_value(&submission.image, &submission.config);

        // user switches image while the requests are in flight
        workspace.set_image(GaugeImage::from_bytes(png_bytes(8, 8), ImageSource::Inline).unwrap());
        assert_ne!(workspace.generation(), submission.generation);

        workspace.apply_debug_reading(submission.generation, result).unwrap();
        workspace.apply_quick_value(submission.generation, value).unwrap();
        assert!(workspace.reading().is_none());
        assert_eq!(workspace.quick_value(), None);
        assert_eq!(workspace.status().text(), "Loaded image (8x8)");

        // a stale failure does not overwrite the status either
        let failure = Err(CalibrationError::ServiceUnavailable {
            message: "down".to_string(),
            source: None,
        });
        workspace.apply_debug_reading(submission.generation, failure).unwrap();
        assert!(!workspace.status().is_error());
    }

    #[test]
    fn test_switching_policy_to_exclusive() {
        let mut workspace = with_image();
        assert_eq!(workspace.policy(), ArmPolicy::Concurrent);
        workspace.arm(CalibrationAction::CropStart).unwrap();
        workspace.arm(CalibrationAction::Center).unwrap();
        workspace.set_policy(ArmPolicy::Exclusive);
        assert_eq!(workspace.arm_state(), ArmState::Armed(vec![CalibrationAction::Center]));
    }

    #[test]
    fn test_fixing_text_clears_error() {
        let mut workspace = with_image();
        let good = workspace.config_text().to_string();
        assert!(workspace.edit_config_text("{").is_err());
        assert!(workspace.status().is_error());
        workspace.edit_config_text(good).unwrap();
        assert_eq!(workspace.status(), &Status::Idle);
    }
}
