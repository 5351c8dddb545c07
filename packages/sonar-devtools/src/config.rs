use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sonar_core::{
    DEFAULT_BUBBLE_MARKER, DEFAULT_RETRY_DELAY_MS, DEFAULT_SEARCH_MIN_LEN, StoreOptions, Visibility,
};
use sonar_listener::{CAPTURE_STATE_SINCE, SemVer, TrackerOptions};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Allows evaluating edit expressions in the page.
    pub code_execution: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub retry_delay_ms: f64,
    pub capabilities: Capabilities,
    pub visibility: Visibility,
    pub search_min_len: usize,
    pub bubble_marker: String,
    pub capture_state_since: String,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            capabilities: Capabilities::default(),
            visibility: Visibility::default(),
            search_min_len: DEFAULT_SEARCH_MIN_LEN,
            bubble_marker: DEFAULT_BUBBLE_MARKER.to_string(),
            capture_state_since: CAPTURE_STATE_SINCE.to_string(),
        }
    }
}

impl InspectorConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: InspectorConfig = serde_json::from_str(text)?;
        if !config.retry_delay_ms.is_finite() || config.retry_delay_ms < 0.0 {
            return Err(ConfigError::RetryDelay(config.retry_delay_ms));
        }
        Ok(config)
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            store: StoreOptions {
                retry_delay_ms: self.retry_delay_ms,
                bubble_marker: self.bubble_marker.clone(),
                visibility: self.visibility.clone(),
            },
            capture_state_since: SemVer::parse(&self.capture_state_since),
        }
    }
}
