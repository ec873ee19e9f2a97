//! Object-created events delivered by the storage event bus.
//!
//! Events follow the Event Grid schema. Only `eventType` and `subject` drive
//! behavior; the remaining fields are carried for log context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::ObjectName;

/// Event type emitted when a blob is created.
pub const BLOB_CREATED: &str = "Microsoft.Storage.BlobCreated";

/// Event type of the webhook subscription handshake.
pub const SUBSCRIPTION_VALIDATION: &str = "Microsoft.EventGrid.SubscriptionValidationEvent";

/// A storage event as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub event_type: String,
    pub subject: String,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Result of filtering an event against the configured container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMatch {
    /// The event targets a blob in the configured container.
    Matched(ObjectName),
    /// `eventType` is not [`BLOB_CREATED`].
    WrongType,
    /// The subject does not reference the configured container.
    WrongContainer,
    /// The subject names the container but nothing follows the marker.
    EmptyName,
}

/// Subject fragment that precedes the object name for `container`.
#[must_use]
pub fn container_marker(container: &str) -> String {
    format!("/containers/{container}/blobs/")
}

impl BlobEvent {
    /// Build a blob-created event for `object` in `container`.
    pub fn blob_created(container: &str, object: &str) -> Self {
        Self {
            id: None,
            event_type: BLOB_CREATED.to_string(),
            subject: format!(
                "/blobServices/default{}{object}",
                container_marker(container)
            ),
            event_time: None,
            data: None,
        }
    }

    /// Classify this event against `container`.
    #[must_use]
    pub fn match_container(&self, container: &str) -> EventMatch {
        if self.event_type != BLOB_CREATED {
            return EventMatch::WrongType;
        }
        let marker = container_marker(container);
        match self.subject.find(&marker) {
            None => EventMatch::WrongContainer,
            Some(start) => {
                let name = &self.subject[start + marker.len()..];
                if name.is_empty() {
                    EventMatch::EmptyName
                } else {
                    EventMatch::Matched(ObjectName::new(name))
                }
            }
        }
    }

    /// Validation code carried by a subscription handshake event.
    #[must_use]
    pub fn validation_code(&self) -> Option<&str> {
        if self.event_type != SUBSCRIPTION_VALIDATION {
            return None;
        }
        self.data.as_ref()?.get("validationCode")?.as_str()
    }
}

/// Parse either a single event object or an array of events.
///
/// # Errors
/// Returns an error if the payload is not valid event JSON.
pub fn parse_events(payload: &[u8]) -> serde_json::Result<Vec<BlobEvent>> {
    let value: Value = serde_json::from_slice(payload)?;
    match value {
        Value::Array(_) => serde_json::from_value(value),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}
