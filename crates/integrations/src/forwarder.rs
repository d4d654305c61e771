//! Forwarder — validate, map and deliver one message at a time.

use tracing::info;

use frontleaf_core::config::AppConfig;
use frontleaf_core::error::FrontleafResult;
use frontleaf_core::types::{Message, Payload};

use crate::adaptor::{EventAdaptor, FrontleafAdaptor};
use crate::dispatcher::{Delivery, Dispatcher};

pub struct Forwarder {
    adaptor: FrontleafAdaptor,
    dispatcher: Dispatcher,
}

impl Forwarder {
    pub fn new(adaptor: FrontleafAdaptor, dispatcher: Dispatcher) -> Self {
        Self {
            adaptor,
            dispatcher,
        }
    }

    /// Build a forwarder from loaded configuration. Fails if the settings
    /// are incomplete.
    pub fn from_config(config: &AppConfig) -> FrontleafResult<Self> {
        let adaptor = FrontleafAdaptor::new(config.settings.clone());
        adaptor.validate_config()?;
        let dispatcher = Dispatcher::new(&config.endpoint, config.retry.clone())?;

        info!(
            platform = adaptor.platform(),
            base_url = %dispatcher.base_url(),
            stream = %adaptor.settings().stream,
            "Forwarder configured"
        );
        Ok(Self::new(adaptor, dispatcher))
    }

    pub fn adaptor(&self) -> &FrontleafAdaptor {
        &self.adaptor
    }

    /// Validate and map without sending.
    pub fn prepare(&self, message: &Message) -> FrontleafResult<Payload> {
        self.adaptor.transform(message)
    }

    pub async fn forward(&self, message: &Message) -> FrontleafResult<Delivery> {
        let payload = self.prepare(message)?;
        self.dispatcher.send(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontleaf_core::types::Settings;
    use frontleaf_core::FrontleafError;
    use serde_json::json;

    fn test_config() -> AppConfig {
        AppConfig {
            settings: Settings::new("tok", "test"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_from_config_requires_settings() {
        assert!(Forwarder::from_config(&test_config()).is_ok());

        let err = Forwarder::from_config(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, FrontleafError::Validation(_)));
    }

    #[tokio::test]
    async fn test_forward_rejects_invalid_message_without_sending() {
        // Unroutable base URL: any network attempt would surface as a transport error.
        let mut config = test_config();
        config.endpoint.base_url = "http://127.0.0.1:9/api/track".into();
        let forwarder = Forwarder::from_config(&config).unwrap();

        let message: Message =
            serde_json::from_value(json!({ "type": "identify", "traits": {} })).unwrap();
        let err = forwarder.forward(&message).await.unwrap_err();
        assert!(matches!(err, FrontleafError::Validation(_)));
    }

    #[test]
    fn test_prepare_builds_payload() {
        let forwarder = Forwarder::from_config(&test_config()).unwrap();
        let message: Message = serde_json::from_value(json!({
            "type": "group",
            "userId": "u1",
            "groupId": "g1",
            "traits": { "name": "Initech" }
        }))
        .unwrap();

        let payload = forwarder.prepare(&message).unwrap();
        assert_eq!(payload.endpoint_path(), "/identify");
        assert_eq!(payload.to_json().unwrap()["accountName"], "Initech");
        assert_eq!(forwarder.adaptor().settings().stream, "test");
    }
}
