//! Gauge image payloads
//!
//! Images are kept as the original encoded bytes (never re-encoded) so what
//! the service receives is exactly the file the user picked.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{ImageFormat, ImageReader};

use crate::error::{CalibrationError, Result};

/// Where the active image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(std::path::PathBuf),
    History(usize),
    Inline,
}

/// An encoded image plus an optional value the service computed earlier
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    pub value: Option<f64>,
    pub source: ImageSource,
}

impl GaugeImage {
    /// Validate encoded bytes and read the dimensions from the header
    pub fn from_bytes(bytes: Vec<u8>, source: ImageSource) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|err| CalibrationError::decode(err.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| CalibrationError::decode("unrecognised image format"))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|err| CalibrationError::decode(err.to_string()))?;
        log::debug!("GaugeImage loaded: {width}x{height} {format:?} ({} bytes)", bytes.len());
        Ok(Self {
            bytes,
            format,
            width,
            height,
            value: None,
            source,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CalibrationError::ImageLoad {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::from_bytes(bytes, ImageSource::File(path.to_path_buf()))
    }

    /// Accepts plain base64 or a `data:<mime>;base64,` URI
    pub fn from_base64(encoded: &str, source: ImageSource) -> Result<Self> {
        let bytes = decode_base64(encoded)?;
        Self::from_bytes(bytes, source)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Transport form: base64 without any data-URI prefix
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.to_mime_type(), self.to_base64())
    }
}

/// Drop a leading `data:...,` prefix if there is one
pub fn strip_data_uri_prefix(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, payload)| payload),
        None => trimmed,
    }
}

/// Decode base64 image data, tolerating a data-URI prefix
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(strip_data_uri_prefix(encoded))
        .map_err(|err| CalibrationError::decode(format!("invalid base64: {err}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small encoded PNG for tests
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_from_bytes_reads_dimensions() {
        let img = GaugeImage::from_bytes(png_bytes(6, 4), ImageSource::Inline).unwrap();
        assert_eq!((img.width(), img.height()), (6, 4));
        assert_eq!(img.format(), ImageFormat::Png);
        assert!(img.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = GaugeImage::from_bytes(b"definitely not a picture".to_vec(), ImageSource::Inline)
            .unwrap_err();
        assert!(matches!(err, CalibrationError::ImageDecode { .. }));
    }

    #[test]
    fn test_data_uri_prefix_is_stripped() {
        assert_eq!(strip_data_uri_prefix("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri_prefix("QUJD"), "QUJD");
        let img = GaugeImage::from_bytes(png_bytes(2, 2), ImageSource::Inline).unwrap();
        let again = GaugeImage::from_base64(&img.data_uri(), ImageSource::Inline).unwrap();
        assert_eq!(again.bytes(), img.bytes());
        assert!(!img.to_base64().starts_with("data:"));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GaugeImage::from_path(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, CalibrationError::ImageLoad { .. }));
    }

    #[test]
    fn test_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dial.png");
        std::fs::write(&path, png_bytes(3, 3)).unwrap();
        let img = GaugeImage::from_path(&path).unwrap();
        assert_eq!(img.source, ImageSource::File(path));
    }

}
