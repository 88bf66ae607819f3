//! Grenton entity adapters.
//!
//! One adapter per device type, each wrapping the command builders and the
//! gateway round trip into the hub's entity surface: a unique id, a display
//! name, and at most three operations (turn_on, turn_off, refresh), each of
//! which is exactly one outbound HTTP call.

pub mod binary_sensor;
pub mod light;
pub mod sensor;
pub mod switch;

pub use binary_sensor::GrentonBinarySensor;
pub use light::GrentonLight;
pub use sensor::GrentonSensor;
pub use switch::GrentonSwitch;

use serde_json::Value;

use crate::address::{GrentonId, InvalidIdentifier};
use crate::config::DeviceConfig;

/// A configured Grenton entity of any device type.
#[derive(Debug)]
pub enum Entity {
    Light(GrentonLight),
    Switch(GrentonSwitch),
    Sensor(GrentonSensor),
    BinarySensor(GrentonBinarySensor),
}

impl Entity {
    /// Build an entity from its config entry. Identifier parsing happens
    /// here, so a malformed grenton_id fails construction rather than
    /// surfacing on every poll cycle.
    pub fn from_config(device: &DeviceConfig) -> Result<Self, InvalidIdentifier> {
        let id = GrentonId::parse(device.grenton_id())?;
        Ok(match device {
            DeviceConfig::Light {
                name, api_endpoint, ..
            } => Self::Light(GrentonLight::new(api_endpoint.clone(), id, name.clone())),
            DeviceConfig::Switch {
                name, api_endpoint, ..
            } => Self::Switch(GrentonSwitch::new(api_endpoint.clone(), id, name.clone())),
            DeviceConfig::Sensor {
                name,
                api_endpoint,
                grenton_type,
                device_class,
                unit_of_measurement,
                state_class,
                ..
            } => Self::Sensor(GrentonSensor::new(
                api_endpoint.clone(),
                id,
                *grenton_type,
                name.clone(),
                device_class.clone(),
                unit_of_measurement.clone(),
                state_class.clone(),
            )),
            DeviceConfig::BinarySensor {
                name,
                api_endpoint,
                grenton_type,
                ..
            } => Self::BinarySensor(GrentonBinarySensor::new(
                api_endpoint.clone(),
                id,
                *grenton_type,
                name.clone(),
            )),
        })
    }

    pub fn domain(&self) -> &'static str {
        match self {
            Self::Light(_) => "light",
            Self::Switch(_) => "switch",
            Self::Sensor(_) => "sensor",
            Self::BinarySensor(_) => "binary_sensor",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Light(light) => light.name(),
            Self::Switch(switch) => switch.name(),
            Self::Sensor(sensor) => sensor.name(),
            Self::BinarySensor(sensor) => sensor.name(),
        }
    }

    /// Hub entity id, e.g. `light.kitchen_spots`.
    pub fn entity_id(&self) -> String {
        format!("{}.{}", self.domain(), slugify(self.name()))
    }

    /// Poll the CLU for the entity's current value.
    pub async fn refresh(&self) {
        match self {
            Self::Light(light) => light.refresh().await,
            Self::Switch(switch) => switch.refresh().await,
            Self::Sensor(sensor) => sensor.refresh().await,
            Self::BinarySensor(sensor) => sensor.refresh().await,
        }
    }

    /// Current hub state string plus attributes, for publishing to the
    /// state machine.
    pub fn snapshot(&self) -> (String, serde_json::Map<String, Value>) {
        match self {
            Self::Light(light) => light.snapshot(),
            Self::Switch(switch) => switch.snapshot(),
            Self::Sensor(sensor) => sensor.snapshot(),
            Self::BinarySensor(sensor) => sensor.snapshot(),
        }
    }
}

/// Hub state string for an on/off value; `None` means never read.
pub(crate) fn onoff_state(is_on: Option<bool>) -> String {
    match is_on {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "unknown".to_string(),
    }
}

/// Attributes every Grenton entity publishes.
pub(crate) fn base_attrs(
    name: &str,
    id: &GrentonId,
    unique_id: &str,
) -> serde_json::Map<String, Value> {
    let mut attrs = serde_json::Map::new();
    attrs.insert("friendly_name".to_string(), Value::String(name.to_string()));
    attrs.insert(
        "integration".to_string(),
        Value::String("grenton".to_string()),
    );
    attrs.insert(
        "grenton_id".to_string(),
        Value::String(id.as_str().to_string()),
    );
    attrs.insert(
        "unique_id".to_string(),
        Value::String(unique_id.to_string()),
    );
    attrs
}

/// Convert a name to a URL/entity-safe slug.
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-test stand-in for a CLU's HAlistener endpoint: records every
    //! request body and answers with a canned JSON reply.

    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{Method, StatusCode};
    use axum::routing::any;
    use axum::{Json, Router};
    use serde_json::Value;

    #[derive(Debug, Clone)]
    pub(crate) struct RecordedRequest {
        pub method: String,
        pub body: Value,
    }

    #[derive(Clone)]
    struct Shared {
        status: StatusCode,
        reply: Value,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    pub(crate) struct MockClu {
        pub endpoint: String,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl MockClu {
        pub async fn start(reply: Value) -> Self {
            Self::with_status(StatusCode::OK, reply).await
        }

        /// A listener that answers every request with 500.
        pub async fn failing() -> Self {
            Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, Value::Null).await
        }

        async fn with_status(status: StatusCode, reply: Value) -> Self {
            async fn handler(
                State(shared): State<Shared>,
                method: Method,
                Json(body): Json<Value>,
            ) -> (StatusCode, Json<Value>) {
                shared.requests.lock().unwrap().push(RecordedRequest {
                    method: method.to_string(),
                    body,
                });
                (shared.status, Json(shared.reply.clone()))
            }

            let shared = Shared {
                status,
                reply,
                requests: Arc::new(Mutex::new(Vec::new())),
            };
            let requests = shared.requests.clone();

            let app = Router::new()
                .route("/HAlistener", any(handler))
                .with_state(shared);

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = format!("http://{}/HAlistener", listener.local_addr().unwrap());
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self { endpoint, requests }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::GrentonType;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Kitchen Spots"), "kitchen_spots");
        assert_eq!(slugify("Boiler Temp #1"), "boiler_temp_1");
        assert_eq!(slugify("  Garden  Pump  "), "garden_pump");
        assert_eq!(slugify("DIN0000"), "din0000");
    }

    #[test]
    fn test_entity_from_config() {
        let device = DeviceConfig::BinarySensor {
            name: "Door Contact".to_string(),
            api_endpoint: "http://192.168.0.4/HAlistener".to_string(),
            grenton_id: "CLU220000000->DIN0000".to_string(),
            grenton_type: GrentonType::DefaultSensor,
        };
        let entity = Entity::from_config(&device).unwrap();
        assert_eq!(entity.domain(), "binary_sensor");
        assert_eq!(entity.entity_id(), "binary_sensor.door_contact");
    }

    #[test]
    fn test_entity_from_config_rejects_bad_id() {
        let device = DeviceConfig::Light {
            name: "Broken".to_string(),
            api_endpoint: "http://192.168.0.4/HAlistener".to_string(),
            grenton_id: "CLU1->CLU2->DIM0001".to_string(),
        };
        assert!(Entity::from_config(&device).is_err());
    }

    #[test]
    fn test_initial_snapshot_unknown() {
        let device = DeviceConfig::Switch {
            name: "Pump".to_string(),
            api_endpoint: "http://192.168.0.4/HAlistener".to_string(),
            grenton_id: "CLU1->DOU0001".to_string(),
        };
        let entity = Entity::from_config(&device).unwrap();
        let (state, attrs) = entity.snapshot();
        assert_eq!(state, "unknown");
        assert_eq!(
            attrs.get("unique_id").and_then(|v| v.as_str()),
            Some("grenton_DOU0001")
        );
        assert_eq!(
            attrs.get("integration").and_then(|v| v.as_str()),
            Some("grenton")
        );
    }
}
