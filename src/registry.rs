//! Entity registry: builds one entity per configured device, dispatches
//! service calls, and publishes entity snapshots to the state machine.

use std::sync::Arc;

use anyhow::Context as _;
use dashmap::DashMap;

use crate::config::BridgeConfig;
use crate::entities::Entity;
use crate::state::{EntityState, StateMachine};

#[derive(Debug)]
pub struct EntityRegistry {
    entities: DashMap<String, Arc<Entity>>,
    state_machine: Arc<StateMachine>,
}

impl EntityRegistry {
    /// Construct every configured entity up front. A malformed identifier
    /// aborts the whole build so misconfiguration surfaces at startup.
    pub fn from_config(
        config: &BridgeConfig,
        state_machine: Arc<StateMachine>,
    ) -> anyhow::Result<Self> {
        let registry = Self {
            entities: DashMap::new(),
            state_machine,
        };

        for device in &config.devices {
            let entity = Entity::from_config(device).with_context(|| {
                format!(
                    "invalid grenton_id {:?} for device {:?}",
                    device.grenton_id(),
                    device.name()
                )
            })?;
            let entity = Arc::new(entity);
            let entity_id = entity.entity_id();
            tracing::info!(entity_id = %entity_id, grenton_id = %device.grenton_id(), "Registered Grenton entity");
            // Publish the initial unknown state so the entity is visible
            // before the first poll completes.
            registry.publish(&entity);
            registry.entities.insert(entity_id, entity);
        }

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    fn publish(&self, entity: &Entity) -> EntityState {
        let (state, attrs) = entity.snapshot();
        self.state_machine.set(entity.entity_id(), state, attrs)
    }

    /// Refresh every entity in turn and publish the results.
    pub async fn refresh_all(&self) {
        let entities: Vec<Arc<Entity>> = self
            .entities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for entity in entities {
            entity.refresh().await;
            self.publish(&entity);
        }
    }

    /// Dispatch a service call to the named entity. Returns the published
    /// state after the entity's HTTP round trip completes, or `None` for
    /// unknown entities, domain mismatches, and unsupported services.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
        brightness: Option<u8>,
    ) -> Option<EntityState> {
        let entity = self
            .entities
            .get(entity_id)
            .map(|entry| entry.value().clone())?;

        if entity.domain() != domain {
            tracing::warn!(entity_id = %entity_id, domain = %domain, "Domain does not match entity");
            return None;
        }

        match (entity.as_ref(), service) {
            (Entity::Light(light), "turn_on") => light.turn_on(brightness).await,
            (Entity::Light(light), "turn_off") => light.turn_off().await,
            (Entity::Light(light), "toggle") => {
                if light.is_on().unwrap_or(false) {
                    light.turn_off().await
                } else {
                    light.turn_on(brightness).await
                }
            }
            (Entity::Switch(switch), "turn_on") => switch.turn_on().await,
            (Entity::Switch(switch), "turn_off") => switch.turn_off().await,
            (Entity::Switch(switch), "toggle") => {
                if switch.is_on().unwrap_or(false) {
                    switch.turn_off().await
                } else {
                    switch.turn_on().await
                }
            }
            (_, "refresh") => entity.refresh().await,
            _ => {
                tracing::warn!(domain = %domain, service = %service, "Unknown service");
                return None;
            }
        }

        Some(self.publish(&entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::entities::testing::MockClu;

    fn config_with(devices: Vec<DeviceConfig>) -> BridgeConfig {
        BridgeConfig {
            poll_interval_secs: 30,
            devices,
        }
    }

    fn light_device(endpoint: &str, grenton_id: &str, name: &str) -> DeviceConfig {
        DeviceConfig::Light {
            name: name.to_string(),
            api_endpoint: endpoint.to_string(),
            grenton_id: grenton_id.to_string(),
        }
    }

    #[test]
    fn test_fail_fast_on_malformed_identifier() {
        let config = config_with(vec![light_device(
            "http://192.168.0.4/HAlistener",
            "CLU1->CLU2->DIM0001",
            "Broken",
        )]);
        let result = EntityRegistry::from_config(&config, Arc::new(StateMachine::new(16)));
        assert!(result.is_err());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Broken"), "{message}");
    }

    #[test]
    fn test_initial_states_published() {
        let state_machine = Arc::new(StateMachine::new(16));
        let config = config_with(vec![light_device(
            "http://192.168.0.4/HAlistener",
            "CLU1->DIM0001",
            "Kitchen Spots",
        )]);
        let registry = EntityRegistry::from_config(&config, state_machine.clone()).unwrap();

        assert_eq!(registry.len(), 1);
        let state = state_machine.get("light.kitchen_spots").unwrap();
        assert_eq!(state.state, "unknown");
    }

    #[tokio::test]
    async fn test_call_service_turn_on_publishes() {
        let clu = MockClu::start(serde_json::json!({})).await;
        let state_machine = Arc::new(StateMachine::new(16));
        let config = config_with(vec![light_device(&clu.endpoint, "CLU1->DIM0001", "Kitchen Spots")]);
        let registry = EntityRegistry::from_config(&config, state_machine.clone()).unwrap();

        let published = registry
            .call_service("light", "turn_on", "light.kitchen_spots", Some(128))
            .await
            .unwrap();

        assert_eq!(published.state, "on");
        assert_eq!(
            published.attributes.get("brightness").and_then(|v| v.as_u64()),
            Some(128)
        );
        assert_eq!(
            clu.requests()[0].body,
            serde_json::json!({"command": "CLU1->DIM0001:set(0, 0.5019607843137255)"})
        );
    }

    #[tokio::test]
    async fn test_call_service_toggle() {
        let clu = MockClu::start(serde_json::json!({})).await;
        let state_machine = Arc::new(StateMachine::new(16));
        let config = config_with(vec![DeviceConfig::Switch {
            name: "Pump".to_string(),
            api_endpoint: clu.endpoint.clone(),
            grenton_id: "CLU1->DOU0001".to_string(),
        }]);
        let registry = EntityRegistry::from_config(&config, state_machine).unwrap();

        // Unknown state toggles on, then off.
        let first = registry
            .call_service("switch", "toggle", "switch.pump", None)
            .await
            .unwrap();
        assert_eq!(first.state, "on");
        let second = registry
            .call_service("switch", "toggle", "switch.pump", None)
            .await
            .unwrap();
        assert_eq!(second.state, "off");

        let bodies: Vec<_> = clu.requests().iter().map(|r| r.body.clone()).collect();
        assert_eq!(
            bodies,
            vec![
                serde_json::json!({"command": "CLU1->DOU0001:set(0, 1)"}),
                serde_json::json!({"command": "CLU1->DOU0001:set(0, 0)"}),
            ]
        );
    }

    #[tokio::test]
    async fn test_call_service_refresh_all_domains() {
        let clu = MockClu::start(serde_json::json!({"status": 1})).await;
        let state_machine = Arc::new(StateMachine::new(16));
        let config = config_with(vec![DeviceConfig::BinarySensor {
            name: "Door Contact".to_string(),
            api_endpoint: clu.endpoint.clone(),
            grenton_id: "CLU220000000->DIN0000".to_string(),
            grenton_type: Default::default(),
        }]);
        let registry = EntityRegistry::from_config(&config, state_machine).unwrap();

        let published = registry
            .call_service("binary_sensor", "refresh", "binary_sensor.door_contact", None)
            .await
            .unwrap();
        assert_eq!(published.state, "on");
    }

    #[tokio::test]
    async fn test_call_service_rejects_mismatches() {
        let state_machine = Arc::new(StateMachine::new(16));
        let config = config_with(vec![light_device(
            "http://192.168.0.4/HAlistener",
            "CLU1->DIM0001",
            "Kitchen Spots",
        )]);
        let registry = EntityRegistry::from_config(&config, state_machine).unwrap();

        assert!(registry
            .call_service("switch", "turn_on", "light.kitchen_spots", None)
            .await
            .is_none());
        assert!(registry
            .call_service("light", "explode", "light.kitchen_spots", None)
            .await
            .is_none());
        assert!(registry
            .call_service("light", "turn_on", "light.nope", None)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_refresh_all_publishes() {
        let clu = MockClu::start(serde_json::json!({"object_value": 1})).await;
        let state_machine = Arc::new(StateMachine::new(16));
        let config = config_with(vec![light_device(&clu.endpoint, "CLU1->DOU0002", "Hall")]);
        let registry = EntityRegistry::from_config(&config, state_machine.clone()).unwrap();

        registry.refresh_all().await;

        assert_eq!(state_machine.get("light.hall").unwrap().state, "on");
    }
}
