//! Binary sensor adapter: the sensor read path with the gateway sub-type's
//! accessor index, decoded to on/off from the `status` reply field.

use std::sync::Mutex;

use serde_json::Value;

use crate::address::GrentonId;
use crate::command::{self, GrentonType};
use crate::gateway;

use super::{base_attrs, onoff_state};

#[derive(Debug)]
pub struct GrentonBinarySensor {
    endpoint: String,
    id: GrentonId,
    grenton_type: GrentonType,
    name: String,
    unique_id: String,
    is_on: Mutex<Option<bool>>,
}

impl GrentonBinarySensor {
    pub fn new(endpoint: String, id: GrentonId, grenton_type: GrentonType, name: String) -> Self {
        let unique_id = id.unique_id();
        Self {
            endpoint,
            id,
            grenton_type,
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

    pub async fn refresh(&self) {
        let expression = command::read_expression(&self.id, self.grenton_type);
        match gateway::read(&self.endpoint, &expression).await {
            Ok(reply) => {
                *self.is_on.lock().unwrap() = Some(command::decode_state(reply.status));
            }
            Err(err) => {
                tracing::warn!(sensor = %self.name, "Failed to update the sensor value: {}", err);
            }
        }
    }

    pub fn snapshot(&self) -> (String, serde_json::Map<String, Value>) {
        let attrs = base_attrs(&self.name, &self.id, &self.unique_id);
        (onoff_state(self.is_on()), attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::MockClu;

    fn sensor(endpoint: &str, grenton_id: &str, grenton_type: GrentonType) -> GrentonBinarySensor {
        GrentonBinarySensor::new(
            endpoint.to_string(),
            GrentonId::parse(grenton_id).unwrap(),
            grenton_type,
            "Test Binary Sensor".to_string(),
        )
    }

    #[tokio::test]
    async fn test_refresh_on() {
        let clu = MockClu::start(serde_json::json!({"status": 1})).await;
        let sensor = sensor(&clu.endpoint, "CLU220000000->DIN0000", GrentonType::DefaultSensor);

        sensor.refresh().await;

        assert_eq!(sensor.is_on(), Some(true));
        assert_eq!(sensor.unique_id(), "grenton_DIN0000");

        let requests = clu.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].body,
            serde_json::json!({"status": "return CLU220000000:execute(0, 'DIN0000:get(0)')"})
        );
    }

    #[tokio::test]
    async fn test_refresh_off() {
        let clu = MockClu::start(serde_json::json!({"status": 0})).await;
        let sensor = sensor(&clu.endpoint, "CLU220000000->DIN0000", GrentonType::DefaultSensor);

        sensor.refresh().await;

        assert_eq!(sensor.is_on(), Some(false));
        assert_eq!(
            clu.requests()[0].body,
            serde_json::json!({"status": "return CLU220000000:execute(0, 'DIN0000:get(0)')"})
        );
    }

    #[tokio::test]
    async fn test_refresh_modbus_type_uses_table_index() {
        let clu = MockClu::start(serde_json::json!({"status": 1})).await;
        let sensor = sensor(&clu.endpoint, "CLU1->MOD0001", GrentonType::ModbusRtu);

        sensor.refresh().await;

        assert_eq!(
            clu.requests()[0].body,
            serde_json::json!({"status": "return CLU1:execute(0, 'MOD0001:get(22)')"})
        );
    }

    #[tokio::test]
    async fn test_refresh_missing_field_decodes_off() {
        let clu = MockClu::start(serde_json::json!({})).await;
        let sensor = sensor(&clu.endpoint, "CLU1->DIN0001", GrentonType::DefaultSensor);

        sensor.refresh().await;

        assert_eq!(sensor.is_on(), Some(false));
    }

    #[tokio::test]
    async fn test_failed_request_leaves_state_unchanged() {
        let clu = MockClu::failing().await;
        let sensor = sensor(&clu.endpoint, "CLU1->DIN0001", GrentonType::DefaultSensor);

        sensor.refresh().await;

        assert_eq!(sensor.is_on(), None);
    }
}
