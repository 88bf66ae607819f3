//! YAML device configuration.
//!
//! The bridge reads a flat list of device descriptors, one entry per
//! Grenton object. Each entry carries a display name, the HAlistener
//! endpoint URL, and the compound identifier; sensors add their optional
//! sub-type and presentation fields.

use std::path::Path;

use serde::Deserialize;

use crate::command::GrentonType;

pub const DEFAULT_API_ENDPOINT: &str = "http://192.168.0.4/HAlistener";

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "device_type", rename_all = "snake_case")]
pub enum DeviceConfig {
    Light {
        name: String,
        #[serde(default = "default_api_endpoint")]
        api_endpoint: String,
        grenton_id: String,
    },
    Switch {
        name: String,
        #[serde(default = "default_api_endpoint")]
        api_endpoint: String,
        grenton_id: String,
    },
    Sensor {
        name: String,
        #[serde(default = "default_api_endpoint")]
        api_endpoint: String,
        grenton_id: String,
        #[serde(default)]
        grenton_type: GrentonType,
        #[serde(default)]
        device_class: Option<String>,
        #[serde(default)]
        unit_of_measurement: Option<String>,
        #[serde(default)]
        state_class: Option<String>,
    },
    BinarySensor {
        name: String,
        #[serde(default = "default_api_endpoint")]
        api_endpoint: String,
        grenton_id: String,
        #[serde(default)]
        grenton_type: GrentonType,
    },
}

impl DeviceConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Light { name, .. }
            | Self::Switch { name, .. }
            | Self::Sensor { name, .. }
            | Self::BinarySensor { name, .. } => name,
        }
    }

    pub fn grenton_id(&self) -> &str {
        match self {
            Self::Light { grenton_id, .. }
            | Self::Switch { grenton_id, .. }
            | Self::Sensor { grenton_id, .. }
            | Self::BinarySensor { grenton_id, .. } => grenton_id,
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: BridgeConfig = serde_yaml::from_str(&contents)?;
    Ok(config)
}
