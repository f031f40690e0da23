//! Decoded service results

use crate::capture::image::decode_base64;
use crate::error::{CalibrationError, Result};
use crate::service::protocol::DebugImageResponse;

/// Result of `POST /debug_image` with the images already decoded
#[derive(Debug, Clone, PartialEq)]
pub struct DebugReading {
    /// None when the service found no needle
    pub value: Option<f64>,
    /// Crop with the detected needle and angle span drawn on it
    pub overlay: Option<Vec<u8>>,
    /// Thresholded crop with every detected line
    pub threshold: Vec<u8>,
}

/// Decode one base64 image field, which must hold a known image format
fn decode_image(what: &str, encoded: &str) -> Result<Vec<u8>> {
    let bytes = decode_base64(encoded)
        .map_err(|err| CalibrationError::bad_response(format!("{what}: {err}")))?;
    let format = image::guess_format(&bytes)
        .map_err(|_| CalibrationError::bad_response(format!("{what}: not an image")))?;
    log::trace!("{what}: {} ({} bytes)", format.to_mime_type(), bytes.len());
    Ok(bytes)
}

impl DebugReading {
    pub fn from_response(response: DebugImageResponse) -> Result<Self> {
        let overlay = response
            .image
            .as_deref()
            .map(|encoded| decode_image("overlay image", encoded))
            .transpose()?;
        let threshold = decode_image("threshold image", &response.debug)?;
        Ok(Self {
            value: response.value,
            overlay,
            threshold,
        })
    }

    /// Text for the value label
    pub fn value_text(&self) -> String {
        match self.value {
            Some(value) => format!("{value:.2}"),
            None => "no needle found".to_string(),
        }
    }
}
