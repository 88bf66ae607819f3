//! Switch adapter: plain on/off writes plus the output status read path.

use std::sync::Mutex;

use serde_json::Value;

use crate::address::GrentonId;
use crate::command::{self, LightKind};
use crate::gateway;

use super::{base_attrs, onoff_state};

#[derive(Debug)]
pub struct GrentonSwitch {
    endpoint: String,
    id: GrentonId,
    name: String,
    unique_id: String,
    is_on: Mutex<Option<bool>>,
}

impl GrentonSwitch {
    pub fn new(endpoint: String, id: GrentonId, name: String) -> Self {
        let unique_id = id.unique_id();
        Self {
            endpoint,
            id,
            name,
            unique_id,
            is_on: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn is_on(&self) -> Option<bool> {
        *self.is_on.lock().unwrap()
    }

    pub async fn turn_on(&self) {
        let expression = command::turn_on_expression(&self.id, LightKind::OnOff, None);
        match gateway::send(&self.endpoint, &expression).await {
            Ok(()) => *self.is_on.lock().unwrap() = Some(true),
            Err(err) => {
                tracing::warn!(switch = %self.name, "Failed to turn on the switch: {}", err);
            }
        }
    }

    pub async fn turn_off(&self) {
        let expression = command::turn_off_expression(&self.id, LightKind::OnOff);
        match gateway::send(&self.endpoint, &expression).await {
            Ok(()) => *self.is_on.lock().unwrap() = Some(false),
            Err(err) => {
                tracing::warn!(switch = %self.name, "Failed to turn off the switch: {}", err);
            }
        }
    }

    pub async fn refresh(&self) {
        let expression = command::output_status_expression(&self.id);
        match gateway::read(&self.endpoint, &expression).await {
            Ok(reply) => {
                *self.is_on.lock().unwrap() = Some(command::decode_state(reply.object_value));
            }
            Err(err) => {
                tracing::warn!(switch = %self.name, "Failed to update the switch state: {}", err);
            }
        }
    }

    pub fn snapshot(&self) -> (String, serde_json::Map<String, Value>) {
        let attrs = base_attrs(&self.name, &self.id, &self.unique_id);
        (onoff_state(self.is_on()), attrs)
    }
}
