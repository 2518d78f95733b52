use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::processor::{DEFAULT_POLL_INTERVAL, DispatchStrategy, EngineConfig};

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfigDto {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub dispatch: DispatchStrategy,
}

impl Default for EngineConfigDto {
    fn default() -> Self {
        Self { poll_interval_ms: default_poll_interval_ms(), dispatch: DispatchStrategy::default() }
    }
}

impl From<EngineConfigDto> for EngineConfig {
    fn from(dto: EngineConfigDto) -> Self {
        EngineConfig { poll_interval: Duration::from_millis(dto.poll_interval_ms), dispatch: dto.dispatch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let dto: EngineConfigDto = serde_json::from_str("{}").unwrap();
        assert_eq!(EngineConfig::from(dto), EngineConfig::default());

        let dto: EngineConfigDto = serde_json::from_str(r#"{"pollIntervalMs": 5, "dispatch": "queued"}"#).unwrap();
        let config = EngineConfig::from(dto);
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.dispatch, DispatchStrategy::Queued);
    }
}
