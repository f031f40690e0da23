//! Wire types of the reading service
//!
//! Requests always carry the full image (base64, no data-URI prefix) and the
//! full configuration; the service crops and thresholds by itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::CalibrationConfig;

/// Value, debug overlay and threshold visualisation
pub const DEBUG_IMAGE_PATH: &str = "/debug_image";
/// Value only
pub const GAUGE_VALUE_PATH: &str = "/gauge_value";
/// Previously submitted images
pub const LAST_IMAGES_PATH: &str = "/last_images";

/// Body of `POST /debug_image` and `POST /gauge_value`
#[derive(Debug, Serialize)]
pub struct ReadingRequest<'a> {
    pub image: &'a str,
    pub config: &'a CalibrationConfig,
}

/// `value` and `image` are null when the service found no needle
#[derive(Debug, Clone, Deserialize)]
pub struct DebugImageResponse {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    pub debug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GaugeValueResponse {
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastImagesResponse {
    pub images: Vec<HistoryEntry>,
}

/// One previously submitted image; keys we do not know are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
