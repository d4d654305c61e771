//! Message, settings and payload types shared by the mapper and dispatcher.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form trait/property mapping as it arrives on a message.
pub type Attributes = Map<String, Value>;

/// Flattened attribute mapping: single level, scalar values only.
pub type CleanData = BTreeMap<String, Scalar>;

/// Channel the integration accepts messages from.
pub const SERVER_CHANNEL: &str = "server";

fn default_channel() -> String {
    SERVER_CHANNEL.to_string()
}

// ─── Messages ───────────────────────────────────────────────────────────────

/// Inbound analytics message. The JSON form is tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Identify(Identify),
    Group(Group),
    Track(Track),
}

/// Which of the three message variants a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Identify,
    Group,
    Track,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Identify => "identify",
            MessageKind::Group => "group",
            MessageKind::Track => "track",
        }
    }

    /// Ingestion API route for this kind, relative to the base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            MessageKind::Identify | MessageKind::Group => "/identify",
            MessageKind::Track => "/event",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub traits: Attributes,
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Identify {
    /// Display name: `traits.name`, else `firstName lastName` when both are set.
    pub fn name(&self) -> Option<String> {
        if let Some(name) = trait_str(&self.traits, "name") {
            return Some(name.trim().to_string());
        }
        let first = trait_str(&self.traits, "firstName").map(str::trim);
        let last = trait_str(&self.traits, "lastName").map(str::trim);
        match (first, last) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(format!("{} {}", first, last))
            }
            _ => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        trait_str(&self.traits, "username")
    }
}

/// Group/account association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub user_id: Option<String>,
    pub group_id: String,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub traits: Attributes,
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Group {
    /// Account name, taken verbatim from the group traits. Any scalar is
    /// passed through; objects, arrays and null are not a name.
    pub fn name(&self) -> Option<Scalar> {
        match self.traits.get("name")? {
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            _ => None,
        }
    }
}

/// Behavioral event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default)]
    pub user_id: Option<String>,
    pub event: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub traits: Attributes,
    #[serde(default)]
    pub properties: Attributes,
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Track {
    /// Session identifier, falling back to `properties.sessionId`.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .or_else(|| trait_str(&self.properties, "sessionId"))
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Identify(_) => MessageKind::Identify,
            Message::Group(_) => MessageKind::Group,
            Message::Track(_) => MessageKind::Track,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Message::Identify(m) => m.user_id.as_deref(),
            Message::Group(m) => m.user_id.as_deref(),
            Message::Track(m) => m.user_id.as_deref(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Message::Identify(m) => m.timestamp,
            Message::Group(m) => m.timestamp,
            Message::Track(m) => m.timestamp,
        }
    }

    pub fn traits(&self) -> &Attributes {
        match self {
            Message::Identify(m) => &m.traits,
            Message::Group(m) => &m.traits,
            Message::Track(m) => &m.traits,
        }
    }

    pub fn channel(&self) -> &str {
        match self {
            Message::Identify(m) => &m.channel,
            Message::Group(m) => &m.channel,
            Message::Track(m) => &m.channel,
        }
    }
}

fn trait_str<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

// ─── Settings ───────────────────────────────────────────────────────────────

/// Per-destination credentials sent with every payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub stream: String,
}

impl Settings {
    pub fn new(token: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            stream: stream.into(),
        }
    }

    /// Token safe for log output.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

// ─── Payload ────────────────────────────────────────────────────────────────

/// Leaf value of a cleaned attribute mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

/// Request body for the ingestion API. The base fields are common to every
/// call; `body` carries the variant-specific fields at the same level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub token: String,
    pub stream: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(flatten)]
    pub body: PayloadBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadBody {
    Identify(IdentifyFields),
    Group(GroupFields),
    Track(TrackFields),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub user_data: CleanData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<Scalar>,
    pub account_data: CleanData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_data: CleanData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    pub event: String,
    pub event_data: CleanData,
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self.body {
            PayloadBody::Identify(_) => MessageKind::Identify,
            PayloadBody::Group(_) => MessageKind::Group,
            PayloadBody::Track(_) => MessageKind::Track,
        }
    }

    pub fn endpoint_path(&self) -> &'static str {
        self.kind().endpoint_path()
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
