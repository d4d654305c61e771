//! Message mapping — builds the Frontleaf request body for each message
//! variant. Settings are passed in explicitly; nothing here keeps state.

use tracing::debug;

use frontleaf_core::types::{
    Group, GroupFields, Identify, IdentifyFields, Message, Payload, PayloadBody, Settings, Track,
    TrackFields,
};

use crate::cleaner::clean;

/// Map any message to its payload.
pub fn map_message(message: &Message, settings: &Settings) -> Payload {
    match message {
        Message::Identify(identify) => map_identify(identify, settings),
        Message::Group(group) => map_group(group, settings),
        Message::Track(track) => map_track(track, settings),
    }
}

/// Identify: `userName` prefers the resolved name and falls back to the
/// username when the name is absent or empty.
pub fn map_identify(identify: &Identify, settings: &Settings) -> Payload {
    let user_name = identify
        .name()
        .filter(|name| !name.is_empty())
        .or_else(|| identify.username().map(str::to_string));

    let fields = IdentifyFields {
        user_id: identify.user_id.clone(),
        user_name,
        user_data: clean(&identify.traits),
    };
    debug!(user_data_keys = fields.user_data.len(), "identify mapped");

    base_payload(identify.timestamp, settings, PayloadBody::Identify(fields))
}

pub fn map_group(group: &Group, settings: &Settings) -> Payload {
    let fields = GroupFields {
        user_id: group.user_id.clone(),
        account_id: group.group_id.clone(),
        account_name: group.name(),
        account_data: clean(&group.traits),
    };
    debug!(
        account_id = %fields.account_id,
        account_data_keys = fields.account_data.len(),
        "group mapped"
    );

    base_payload(group.timestamp, settings, PayloadBody::Group(fields))
}

/// Track: `userData` comes from the traits, `eventData` from the properties.
pub fn map_track(track: &Track, settings: &Settings) -> Payload {
    let fields = TrackFields {
        user_id: track.user_id.clone(),
        user_data: clean(&track.traits),
        session: track.session_id().map(str::to_string),
        event: track.event.clone(),
        event_data: clean(&track.properties),
    };
    debug!(
        event = %fields.event,
        event_data_keys = fields.event_data.len(),
        "track mapped"
    );

    base_payload(track.timestamp, settings, PayloadBody::Track(fields))
}

/// Fields needed for every Frontleaf API call.
fn base_payload(
    timestamp: chrono::DateTime<chrono::Utc>,
    settings: &Settings,
    body: PayloadBody,
) -> Payload {
    Payload {
        token: settings.token.clone(),
        stream: settings.stream.clone(),
        timestamp: timestamp.timestamp_millis(),
        body,
    }
}
