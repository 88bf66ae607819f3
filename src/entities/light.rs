//! Light adapter.
//!
//! The light's capability kind (on/off, dimmable, RGB) is decided once at
//! construction from the identifier's object prefix. Reads go through the
//! output status expression and come back in `object_value`; RGB lights
//! additionally decode their brightness from the same fraction.

use std::sync::Mutex;

use serde_json::Value;

use crate::address::GrentonId;
use crate::command::{self, LightKind};
use crate::gateway;

use super::{base_attrs, onoff_state};

#[derive(Debug)]
pub struct GrentonLight {
    endpoint: String,
    id: GrentonId,
    kind: LightKind,
    name: String,
    unique_id: String,
    state: Mutex<LightState>,
}

#[derive(Debug, Default, Clone, Copy)]
struct LightState {
    is_on: Option<bool>,
    brightness: Option<u8>,
}

impl GrentonLight {
    pub fn new(endpoint: String, id: GrentonId, name: String) -> Self {
        let kind = LightKind::of(&id);
        let unique_id = id.unique_id();
        Self {
            endpoint,
            id,
            kind,
            name,
            unique_id,
            state: Mutex::new(LightState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn is_on(&self) -> Option<bool> {
        self.state.lock().unwrap().is_on
    }

    pub fn brightness(&self) -> Option<u8> {
        self.state.lock().unwrap().brightness
    }

    /// Turn the light on, at the given brightness for dimmable/RGB kinds
    /// (full brightness when unspecified). On success the commanded
    /// brightness is recorded; on failure the state is left untouched.
    pub async fn turn_on(&self, brightness: Option<u8>) {
        let expression = command::turn_on_expression(&self.id, self.kind, brightness);
        match gateway::send(&self.endpoint, &expression).await {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                state.is_on = Some(true);
                state.brightness = match self.kind {
                    LightKind::OnOff => None,
                    LightKind::Dimmable | LightKind::Rgb => Some(brightness.unwrap_or(u8::MAX)),
                };
            }
            Err(err) => {
                tracing::warn!(light = %self.name, "Failed to turn on the light: {}", err);
            }
        }
    }

    pub async fn turn_off(&self) {
        let expression = command::turn_off_expression(&self.id, self.kind);
        match gateway::send(&self.endpoint, &expression).await {
            Ok(()) => {
                self.state.lock().unwrap().is_on = Some(false);
            }
            Err(err) => {
                tracing::warn!(light = %self.name, "Failed to turn off the light: {}", err);
            }
        }
    }

    pub async fn refresh(&self) {
        let expression = command::output_status_expression(&self.id);
        match gateway::read(&self.endpoint, &expression).await {
            Ok(reply) => {
                let mut state = self.state.lock().unwrap();
                state.is_on = Some(command::decode_state(reply.object_value));
                if self.kind == LightKind::Rgb {
                    state.brightness = reply.object_value.map(command::decode_brightness);
                }
            }
            Err(err) => {
                tracing::warn!(light = %self.name, "Failed to update the light state: {}", err);
            }
        }
    }

    pub fn snapshot(&self) -> (String, serde_json::Map<String, Value>) {
        let state = *self.state.lock().unwrap();
        let mut attrs = base_attrs(&self.name, &self.id, &self.unique_id);
        let color_mode = match self.kind {
            LightKind::OnOff => "onoff",
            LightKind::Dimmable => "brightness",
            LightKind::Rgb => "rgb",
        };
        attrs.insert(
            "color_mode".to_string(),
            Value::String(color_mode.to_string()),
        );
        if let Some(brightness) = state.brightness {
            attrs.insert("brightness".to_string(), serde_json::json!(brightness));
        }
        (onoff_state(state.is_on), attrs)
    }
}
