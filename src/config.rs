//! Calibration configuration model and its editable text form
//!
//! The configuration is partially typed: the fields calibration reads and
//! writes are strongly typed, everything else (threshold and line-detection
//! tuning) is kept in an opaque bag and passed through to the service
//! untouched.
//!
//! Serialization is pretty-printed JSON with 2-space indentation. Typed keys
//! come first in declaration order, followed by the pass-through keys in the
//! order they were parsed. Keys added by hand inside nested objects (`crop`,
//! `center`, ...) have no typed field; [`ConfigDocument::update`] carries them
//! over from the previous text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Point;
use crate::error::{CalibrationError, Result};

/// Values the reading service falls back to when an optional key is missing
pub mod service_defaults {
    pub const START_RANGE: f64 = 0.0;
    pub const END_RANGE: f64 = 100.0;
    pub const MIN_LINE_LENGTH: i64 = 100;
    pub const MAX_LINE_GAP: i64 = 10;
    pub const THRESHOLD_VALUE: i64 = 120;
    pub const THRESHOLD_BRIGHTNESS: i64 = 255;
    pub const THRESHOLD_REVERSE: bool = false;
}

/// Crop window in the coordinates of the displayed, uncropped image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right: Option<Point>,
}

impl CropConfig {
    pub fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left: Some(top_left),
            bottom_right: Some(bottom_right),
        }
    }

    /// Both corners set and bottom-right strictly below and right of top-left
    pub fn is_well_formed(&self) -> bool {
        match (self.top_left, self.bottom_right) {
            (Some(tl), Some(br)) => br.x > tl.x && br.y > tl.y,
            _ => false,
        }
    }
}

/// Service-only tuning keys (`threshold_value`, `min_line_length`, ...)
///
/// Opaque to calibration; unknown keys land here too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendParams(pub Map<String, Value>);

impl BackendParams {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Integer parameter as the service will see it
    pub fn effective_i64(&self, key: &str, fallback: i64) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or(fallback)
    }

    /// Boolean parameter as the service will see it
    pub fn effective_bool(&self, key: &str, fallback: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(fallback)
    }
}

/// The single configuration driving calibration and service requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropConfig>,
    /// Needle pivot, relative to `crop.top_left`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Point>,
    /// Secondary reference point, same space as `center`; only edited by hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_range: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_range: Option<f64>,
    #[serde(flatten)]
    pub backend: BackendParams,
}

impl CalibrationConfig {
    /// A configuration with nothing calibrated and no tuning keys
    pub fn empty() -> Self {
        Self {
            crop: None,
            center: None,
            axis: None,
            start_angle: None,
            end_angle: None,
            start_range: None,
            end_range: None,
            backend: BackendParams::default(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(CalibrationError::config_parse)
    }

    /// Pretty-printed JSON, 2-space indentation
    pub fn to_json(&self) -> String {
        // plain data with string keys, serializing into a String cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Origin of the cropped image, required by everything downstream of the crop
    pub fn crop_origin(&self) -> Result<Point> {
        self.crop
            .as_ref()
            .and_then(|crop| crop.top_left)
            .ok_or(CalibrationError::incomplete("crop.top_left"))
    }

    pub fn require_center(&self) -> Result<Point> {
        self.center.ok_or(CalibrationError::incomplete("center"))
    }

    pub fn require_start_angle(&self) -> Result<f64> {
        self.start_angle
            .ok_or(CalibrationError::incomplete("start_angle"))
    }

    /// Check every field the reading service declares mandatory
    pub fn validate_for_submission(&self) -> Result<()> {
        self.crop_origin()?;
        self.crop
            .as_ref()
            .and_then(|crop| crop.bottom_right)
            .ok_or(CalibrationError::incomplete("crop.bottom_right"))?;
        self.require_center()?;
        self.axis.ok_or(CalibrationError::incomplete("axis"))?;
        self.require_start_angle()?;
        self.end_angle
            .ok_or(CalibrationError::incomplete("end_angle"))?;
        Ok(())
    }

    pub fn crop_mut(&mut self) -> &mut CropConfig {
        self.crop.get_or_insert_with(CropConfig::default)
    }

    /// Effective value range the service will interpolate over
    pub fn effective_range(&self) -> (f64, f64) {
        (
            self.start_range.unwrap_or(service_defaults::START_RANGE),
            self.end_range.unwrap_or(service_defaults::END_RANGE),
        )
    }

    /// Value range and tuning keys as the service will apply them
    ///
    /// Missing keys show the service's own fallback.
    pub fn effective_tuning(&self) -> Vec<(&'static str, String)> {
        let (start, end) = self.effective_range();
        let int = |key: &str, fallback: i64| self.backend.effective_i64(key, fallback).to_string();
        vec![
            ("range", format!("{start} to {end}")),
            (
                "min_line_length",
                int("min_line_length", service_defaults::MIN_LINE_LENGTH),
            ),
            ("max_line_gap", int("max_line_gap", service_defaults::MAX_LINE_GAP)),
            (
                "threshold_value",
                int("threshold_value", service_defaults::THRESHOLD_VALUE),
            ),
            (
                "threshold_brightness",
                int("threshold_brightness", service_defaults::THRESHOLD_BRIGHTNESS),
            ),
            (
                "threshold_reverse",
                self.backend
                    .effective_bool("threshold_reverse", service_defaults::THRESHOLD_REVERSE)
                    .to_string(),
            ),
        ]
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        let mut backend = BackendParams::default();
        // Line detection tuning for the reference dial
        backend.insert("min_line_length", 40);
        backend.insert("max_line_gap", 1);
        backend.insert("threshold_value", 90);
        backend.insert("threshold_brightness", 255);
        backend.insert("threshold_reverse", false);

        Self {
            // Reference dial sits roughly in the middle of a 640x480 frame
            crop: Some(CropConfig::new(Point::new(180, 90), Point::new(330, 280))),
            center: Some(Point::new(72, 100)),
            axis: Some(Point::new(131, 180)),
            // Span crosses 0°, hence the end angle past 360
            start_angle: Some(144.5),
            end_angle: Some(404.0),
            start_range: Some(0.4),
            end_range: Some(10.0),
            backend,
        }
    }
}

/// The human-editable text form of the configuration
///
/// Holds both the text (which may be mid-edit and invalid) and the last
/// configuration that parsed. Mutations parse the current text, change one
/// field and write the text back in one step, so hand edits to other fields
/// survive.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    text: String,
    last_valid: CalibrationConfig,
}

impl ConfigDocument {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            text: config.to_json(),
            last_valid: config,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last configuration that parsed successfully
    pub fn last_valid(&self) -> &CalibrationConfig {
        &self.last_valid
    }

    /// Replace the text with a hand edit
    ///
    /// The text is always kept. Returns the parse error if it does not
    /// describe a configuration; the last valid configuration is untouched
    /// in that case.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.text = text.into();
        let parsed = self.parse()?;
        self.last_valid = parsed;
        Ok(())
    }

    pub fn parse(&self) -> Result<CalibrationConfig> {
        CalibrationConfig::from_json(&self.text)
    }

    /// Owned copy of the current configuration for a service request
    pub fn snapshot(&self) -> Result<CalibrationConfig> {
        self.parse()
    }

    /// Read, mutate and write back as one step
    ///
    /// Nothing changes if the text does not parse or `mutate` fails. Keys
    /// the previous text had inside nested objects survive the rewrite.
    pub fn update<T>(
        &mut self,
        mutate: impl FnOnce(&mut CalibrationConfig) -> Result<T>,
    ) -> Result<T> {
        let mut config = self.parse()?;
        let out = mutate(&mut config)?;
        self.text = render_over(&config, &self.text);
        self.last_valid = config;
        Ok(out)
    }

    /// Discard the text and start over from `config`
    pub fn replace(&mut self, config: CalibrationConfig) {
        *self = Self::new(config);
    }
}

/// Render `config`, keeping nested keys from `previous` it has no field for
fn render_over(config: &CalibrationConfig, previous: &str) -> String {
    let (Ok(mut rendered), Ok(previous)) = (
        serde_json::to_value(config),
        serde_json::from_str::<Value>(previous),
    ) else {
        return config.to_json();
    };
    // top-level unknown keys already live in `backend`
    if let (Value::Object(rendered), Value::Object(previous)) = (&mut rendered, &previous) {
        for (key, value) in rendered.iter_mut() {
            if let Some(old) = previous.get(key) {
                keep_missing_keys(value, old);
            }
        }
    }
    serde_json::to_string_pretty(&rendered).unwrap_or_else(|_| config.to_json())
}

fn keep_missing_keys(value: &mut Value, previous: &Value) {
    let (Value::Object(map), Value::Object(old)) = (value, previous) else {
        return;
    };
    for (key, old_value) in old {
        match map.get_mut(key) {
            Some(value) => keep_missing_keys(value, old_value),
            None => {
                map.insert(key.clone(), old_value.clone());
            }
        }
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}
