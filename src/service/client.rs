//! HTTP client for the gauge reading service
//!
//! Calls are blocking; the desktop front-end runs them on tokio's blocking
//! pool so the UI thread never waits on the network.

use std::io::Read;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::capture::history::HistoryPanel;
use crate::capture::image::GaugeImage;
use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, Result};
use crate::service::protocol::{
    DEBUG_IMAGE_PATH, DebugImageResponse, GAUGE_VALUE_PATH, GaugeValueResponse, LAST_IMAGES_PATH,
    LastImagesResponse, ReadingRequest,
};
use crate::service::reading::DebugReading;

/// The request/response contract with the reading service
///
/// The configuration is sent by value: implementations serialize the
/// snapshot they are given and never keep a reference to it.
pub trait ReadingService {
    /// Value plus debug overlay and threshold visualisation
    fn debug_reading(
        &self,
        image: &GaugeImage,
        config: &CalibrationConfig,
    ) -> Result<DebugReading>;

    /// Value only
    fn gauge_value(&self, image: &GaugeImage, config: &CalibrationConfig) -> Result<Option<f64>>;

    /// Previously submitted images, fetched once for the history gallery
    fn last_images(&self) -> Result<Vec<GaugeImage>>;
}

#[derive(Debug, Clone)]
pub struct HttpReadingClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpReadingClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        log::debug!("POST {}", self.url(path));
        let response = self.agent.post(&self.url(path)).send_json(body);
        read_json(path, response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        log::debug!("GET {}", self.url(path));
        let response = self.agent.get(&self.url(path)).call();
        read_json(path, response)
    }
}

fn read_json<T: DeserializeOwned>(
    path: &str,
    response: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<T> {
    let response = match response {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            log::warn!("{path} answered HTTP {code}");
            return Err(CalibrationError::ServiceUnavailable {
                message: format!("{path} returned HTTP {code} {}", response.status_text()),
                source: None,
            });
        }
        Err(ureq::Error::Transport(transport)) => {
            log::warn!("{path} unreachable: {transport}");
            return Err(CalibrationError::ServiceUnavailable {
                message: format!("{path} unreachable: {transport}"),
                source: None,
            });
        }
    };

    // non-UTF-8 bodies fail in the JSON decoder, not here
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|err| CalibrationError::unavailable(format!("{path} body interrupted"), err))?;

    serde_json::from_slice(&body).map_err(|err| {
        let preview: String = String::from_utf8_lossy(&body).chars().take(120).collect();
        log::warn!("{path} sent unexpected body: {preview}");
        CalibrationError::bad_response(format!("{path}: {err}"))
    })
}

impl ReadingService for HttpReadingClient {
    fn debug_reading(
        &self,
        image: &GaugeImage,
        config: &CalibrationConfig,
    ) -> Result<DebugReading> {
        let encoded = image.to_base64();
        let response: DebugImageResponse = self.post_json(
            DEBUG_IMAGE_PATH,
            &ReadingRequest {
                image: &encoded,
                config,
            },
        )?;
        let reading = DebugReading::from_response(response)?;
        log::info!("Debug reading: {}", reading.value_text());
        Ok(reading)
    }

    fn gauge_value(&self, image: &GaugeImage, config: &CalibrationConfig) -> Result<Option<f64>> {
        let encoded = image.to_base64();
        let response: GaugeValueResponse = self.post_json(
            GAUGE_VALUE_PATH,
            &ReadingRequest {
                image: &encoded,
                config,
            },
        )?;
        Ok(response.value)
    }

    fn last_images(&self) -> Result<Vec<GaugeImage>> {
        let response: LastImagesResponse = self.get_json(LAST_IMAGES_PATH)?;
        Ok(HistoryPanel::from_entries(response.images))
    }
}
