//! Shared types for the Frontleaf forwarder: inbound messages, settings,
//! output payloads, configuration and errors.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{FrontleafError, FrontleafResult};
pub use types::{Message, MessageKind, Payload, Settings};
