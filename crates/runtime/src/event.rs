//! Event base capabilities and the shared envelope format.
//!
//! Every event kind serializes into the same single-line JSON envelope:
//!
//! ```text
//! {"_":"account.Created","meta":{"timestamp":"...","user_id":"..."},"payload":{...}}
//! ```
//!
//! Replay decodes the envelope first and then hands the payload to the
//! allocator registered for `_`. Kinds this build does not know become an
//! [`UnknownEvent`] instead of an error.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::AllocatorMap;

/// Append-only metadata carried by every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl EventMeta {
    pub fn new(timestamp: DateTime<Utc>, user_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            user_id: user_id.into(),
        }
    }

    /// Metadata stamped with the current time.
    pub fn now(user_id: impl Into<String>) -> Self {
        Self::new(Utc::now(), user_id)
    }

    /// Wrap `event` in the shared envelope. Generated `serialize_event`
    /// implementations delegate here so all kinds share one format.
    pub fn encode_envelope<E>(&self, event: &E) -> Result<String, EventError>
    where
        E: Event + Serialize,
    {
        let envelope = EnvelopeRef {
            kind: event.meta_type(),
            meta: self,
            payload: event,
        };
        serde_json::to_string(&envelope).map_err(EventError::Serialize)
    }
}

/// Base capability of every event kind.
pub trait Event: fmt::Debug {
    /// Position/ordering metadata.
    fn meta(&self) -> &EventMeta;

    /// Stable type discriminator, e.g. `account.Created`.
    fn meta_type(&self) -> &str;

    /// Serialize into the shared envelope format.
    fn serialize_event(&self) -> Result<String, EventError>;
}

/// Decoded envelope with the payload still untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "_")]
    pub kind: String,
    pub meta: EventMeta,
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn parse(line: &str) -> Result<Self, EventError> {
        serde_json::from_str(line).map_err(EventError::Envelope)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, E> {
    #[serde(rename = "_")]
    kind: &'a str,
    meta: &'a EventMeta,
    payload: &'a E,
}

/// An event whose kind is absent from the running build's schema.
///
/// Holds the line it was decoded from; [`Event::serialize_event`] returns
/// that line as-is, so meta keys, timestamp precision and payload key order
/// written by a newer build survive a rewrite of the log.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownEvent {
    envelope: Envelope,
    raw: String,
}

impl UnknownEvent {
    /// `line` must be the text `envelope` was parsed from.
    pub fn from_line(line: &str, envelope: Envelope) -> Self {
        Self {
            envelope,
            raw: line.trim_end_matches(['\r', '\n']).to_string(),
        }
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.envelope.payload
    }

    /// The line as read, without its line terminator.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn into_envelope(self) -> Envelope {
        self.envelope
    }
}

impl Event for UnknownEvent {
    fn meta(&self) -> &EventMeta {
        &self.envelope.meta
    }

    fn meta_type(&self) -> &str {
        &self.envelope.kind
    }

    fn serialize_event(&self) -> Result<String, EventError> {
        Ok(self.raw.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed payload for event {kind}: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize event: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Decoder stored in a generated event registry. Every call builds a fresh
/// instance from the envelope's metadata and payload.
pub type Allocator<E> = fn(EventMeta, serde_json::Value) -> Result<E, serde_json::Error>;

/// Decode one envelope line through `allocators`.
///
/// A kind missing from the registry is wrapped by `unknown` rather than
/// rejected, so logs written by newer builds still replay.
pub fn decode<E>(
    allocators: &AllocatorMap<Allocator<E>>,
    line: &str,
    unknown: fn(UnknownEvent) -> E,
) -> Result<E, EventError> {
    let envelope = Envelope::parse(line)?;

    let Some(allocate) = allocators.get(&envelope.kind) else {
        debug!(kind = %envelope.kind, "Event kind unknown to this build.");
        return Ok(unknown(UnknownEvent::from_line(line, envelope)));
    };

    let Envelope {
        kind,
        meta,
        payload,
    } = envelope;
    allocate(meta, payload).map_err(|source| EventError::Payload { kind, source })
}
