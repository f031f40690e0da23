//! Gallery of previously submitted images
//!
//! Fetched once; entries are read-only and selecting one is the same as
//! picking a fresh file.

use crate::capture::image::{GaugeImage, ImageSource};
use crate::error::{CalibrationError, Result};
use crate::service::protocol::HistoryEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum HistoryStatus {
    #[default]
    NotLoaded,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct HistoryPanel {
    entries: Vec<GaugeImage>,
    status: HistoryStatus,
}

impl HistoryPanel {
    /// Decode wire entries; undecodable ones are skipped and logged
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Vec<GaugeImage> {
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                match GaugeImage::from_base64(&entry.content, ImageSource::History(index)) {
                    Ok(mut image) => {
                        image.value = entry.value;
                        Some(image)
                    }
                    Err(err) => {
                        log::warn!("Skipping history entry {index}: {err}");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn status(&self) -> &HistoryStatus {
        &self.status
    }

    pub fn entries(&self) -> &[GaugeImage] {
        &self.entries
    }

    pub fn is_loaded(&self) -> bool {
        self.status == HistoryStatus::Loaded
    }

    /// Store the result of the one-time fetch
    pub fn set_result(&mut self, result: Result<Vec<GaugeImage>>) -> Result<usize> {
        match result {
            Ok(entries) => {
                log::info!("History loaded with {} image(s)", entries.len());
                self.entries = entries;
                self.status = HistoryStatus::Loaded;
                Ok(self.entries.len())
            }
            Err(err) => {
                log::warn!("Failed to load history: {err}");
                self.status = HistoryStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Copy of an entry, ready to become the active image
    pub fn select(&self, index: usize) -> Result<GaugeImage> {
        self.entries
            .get(index)
            .cloned()
            .ok_or(CalibrationError::UnknownHistoryEntry { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::image::tests::png_bytes;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde_json::Map;

    fn entry(content: String, value: Option<f64>) -> HistoryEntry {
        HistoryEntry {
            content,
            value,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let good = BASE64.encode(png_bytes(2, 2));
        let images = HistoryPanel::from_entries(vec![
            entry("!!!".to_string(), None),
            entry(good, Some(7.5)),
        ]);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].value, Some(7.5));
        assert_eq!(images[0].source, ImageSource::History(1));
    }

    #[test]
    fn test_failed_load_keeps_status() {
        let mut panel = HistoryPanel::default();
        let result = panel.set_result(Err(CalibrationError::bad_response("nope")));
        assert!(result.is_err());
        assert!(matches!(panel.status(), HistoryStatus::Failed(_)));
        assert!(panel.entries().is_empty());
    }

    #[test]
    fn test_select_out_of_range() {
        let mut panel = HistoryPanel::default();
        let images = HistoryPanel::from_entries(vec![entry(BASE64.encode(png_bytes(1, 1)), None)]);
        assert_eq!(panel.set_result(Ok(images)).unwrap(), 1);
        assert!(panel.is_loaded());
        assert!(panel.select(0).is_ok());
        assert!(matches!(
            panel.select(3),
            Err(CalibrationError::UnknownHistoryEntry { index: 3 })
        ));
    }
}
