//! Adaptors for translating inbound analytics messages into a destination's
//! request format.
//!
//! [`FrontleafAdaptor`] is the only destination today. Validation happens in
//! the adaptor so the mapper only ever sees messages it can map.

use tracing::debug;

use frontleaf_core::error::{FrontleafError, FrontleafResult};
use frontleaf_core::types::{Message, Payload, Settings, SERVER_CHANNEL};

use crate::mapper::map_message;

/// Adaptor trait — transforms messages into a destination-specific payload.
pub trait EventAdaptor: Send + Sync {
    /// Destination identifier (e.g. "frontleaf").
    fn platform(&self) -> &str;

    /// Check that the adaptor's settings are usable.
    fn validate_config(&self) -> FrontleafResult<()>;

    /// Check that a message can be sent to this destination.
    fn validate_message(&self, message: &Message) -> FrontleafResult<()>;

    /// Transform a message into the destination payload.
    fn transform(&self, message: &Message) -> FrontleafResult<Payload>;

    /// Transform a slice of messages. Default implementation transforms one-by-one.
    fn transform_batch(&self, messages: &[Message]) -> FrontleafResult<Vec<Payload>> {
        messages.iter().map(|m| self.transform(m)).collect()
    }
}

/// Frontleaf data collection API adaptor.
#[derive(Debug, Clone)]
pub struct FrontleafAdaptor {
    settings: Settings,
}

impl FrontleafAdaptor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl EventAdaptor for FrontleafAdaptor {
    fn platform(&self) -> &str {
        "frontleaf"
    }

    fn validate_config(&self) -> FrontleafResult<()> {
        if self.settings.stream.is_empty() {
            return Err(FrontleafError::Validation(
                "settings.stream must not be empty".into(),
            ));
        }
        if self.settings.token.is_empty() {
            return Err(FrontleafError::Validation(
                "settings.token must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn validate_message(&self, message: &Message) -> FrontleafResult<()> {
        if message.user_id().map_or(true, str::is_empty) {
            return Err(FrontleafError::Validation(
                "message.userId must not be empty".into(),
            ));
        }
        if message.channel() != SERVER_CHANNEL {
            return Err(FrontleafError::Validation(format!(
                "unsupported channel '{}', expected '{}'",
                message.channel(),
                SERVER_CHANNEL
            )));
        }
        Ok(())
    }

    fn transform(&self, message: &Message) -> FrontleafResult<Payload> {
        self.validate_config()?;
        self.validate_message(message)?;

        let payload = map_message(message, &self.settings);
        debug!(
            kind = %message.kind(),
            path = payload.endpoint_path(),
            token = %self.settings.masked_token(),
            "Frontleaf payload built"
        );
        Ok(payload)
    }
}
