//! Numeric sensor adapter. Reads through the sensor path and publishes the
//! raw number; device class, unit, and state class pass straight through
//! from the configuration to the hub attributes.

use std::sync::Mutex;

use serde_json::Value;

use crate::address::GrentonId;
use crate::command::{self, GrentonType};
use crate::gateway;

use super::base_attrs;

#[derive(Debug)]
pub struct GrentonSensor {
    endpoint: String,
    id: GrentonId,
    grenton_type: GrentonType,
    name: String,
    unique_id: String,
    device_class: Option<String>,
    unit_of_measurement: Option<String>,
    state_class: Option<String>,
    value: Mutex<Option<f64>>,
}

impl GrentonSensor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        endpoint: String,
        id: GrentonId,
        grenton_type: GrentonType,
        name: String,
        device_class: Option<String>,
        unit_of_measurement: Option<String>,
        state_class: Option<String>,
    ) -> Self {
        let unique_id = id.unique_id();
        Self {
            endpoint,
            id,
            grenton_type,
            name,
            unique_id,
            device_class,
            unit_of_measurement,
            state_class,
            value: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn value(&self) -> Option<f64> {
        *self.value.lock().unwrap()
    }

    /// Poll the CLU. An absent `status` field leaves the value unset, so a
    /// malformed reply shows up as `unknown` rather than a stale zero.
    pub async fn refresh(&self) {
        let expression = command::read_expression(&self.id, self.grenton_type);
        match gateway::read(&self.endpoint, &expression).await {
            Ok(reply) => {
                *self.value.lock().unwrap() = reply.status;
            }
            Err(err) => {
                tracing::warn!(sensor = %self.name, "Failed to update the sensor value: {}", err);
            }
        }
    }

    pub fn snapshot(&self) -> (String, serde_json::Map<String, Value>) {
        let mut attrs = base_attrs(&self.name, &self.id, &self.unique_id);
        if let Some(device_class) = &self.device_class {
            attrs.insert(
                "device_class".to_string(),
                Value::String(device_class.clone()),
            );
        }
        if let Some(unit) = &self.unit_of_measurement {
            attrs.insert(
                "unit_of_measurement".to_string(),
                Value::String(unit.clone()),
            );
        }
        if let Some(state_class) = &self.state_class {
            attrs.insert(
                "state_class".to_string(),
                Value::String(state_class.clone()),
            );
        }
        let state = match self.value() {
            Some(value) => format!("{value}"),
            None => "unknown".to_string(),
        };
        (state, attrs)
    }
}
