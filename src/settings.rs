//! Application settings persisted between sessions
//!
//! Only how to reach the reading service and how the action buttons arm
//! live here. The calibration configuration itself is never persisted.

use cosmic_config::{CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};

use crate::session::ArmPolicy;

/// Environment variable overriding the service URL
pub const SERVICE_URL_ENV: &str = "GAUGECAL_SERVICE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmicConfigEntry)]
#[version = 1]
pub struct AppSettings {
    /// Base URL of the reading service
    pub service_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Fetch the history gallery when the workspace opens
    pub history_on_startup: bool,
    /// Arming one action cancels the others
    pub exclusive_arming: bool,
}

impl AppSettings {
    /// Configuration ID for cosmic-config
    pub const ID: &'static str = "io.github.gaugecal";

    /// Load settings, or return defaults if unavailable
    pub fn load() -> Self {
        match cosmic_config::Config::new(Self::ID, Self::VERSION) {
            Ok(config) => match Self::get_entry(&config) {
                Ok(entry) => entry,
                Err((errs, entry)) => {
                    log::warn!("Error loading settings, using defaults: {:?}", errs);
                    entry
                }
            },
            Err(err) => {
                log::warn!("Failed to create settings handler: {:?}", err);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        match cosmic_config::Config::new(Self::ID, Self::VERSION) {
            Ok(config) => {
                if let Err(err) = self.write_entry(&config) {
                    log::error!("Failed to save settings: {:?}", err);
                }
            }
            Err(err) => {
                log::error!("Failed to create settings handler: {:?}", err);
            }
        }
    }

    /// URL to talk to; `GAUGECAL_SERVICE_URL` wins over the stored one
    ///
    /// The override is never written back by [`AppSettings::save`].
    pub fn effective_service_url(&self) -> String {
        self.resolve_service_url(std::env::var(SERVICE_URL_ENV).ok())
    }

    fn resolve_service_url(&self, env_url: Option<String>) -> String {
        match env_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                log::info!("Service URL overridden from {SERVICE_URL_ENV}: {url}");
                url.trim().to_string()
            }
            None => self.service_url.clone(),
        }
    }

    pub fn arm_policy(&self) -> ArmPolicy {
        if self.exclusive_arming {
            ArmPolicy::Exclusive
        } else {
            ArmPolicy::Concurrent
        }
    }

    pub fn set_arm_policy(&mut self, policy: ArmPolicy) {
        self.exclusive_arming = policy == ArmPolicy::Exclusive;
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            history_on_startup: true,
            exclusive_arming: false,
        }
    }
}
