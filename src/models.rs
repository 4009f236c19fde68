// Core data structures for the herald dispatcher

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum repeat interval between deliveries, in minutes
pub const MIN_INTERVAL_MINUTES: i64 = 5;
/// Maximum repeat interval between deliveries, in minutes
pub const MAX_INTERVAL_MINUTES: i64 = 1440;
/// Minimum broadcast lifetime, in minutes
pub const MIN_DURATION_MINUTES: i64 = 5;
/// Maximum broadcast lifetime, in minutes (7 days)
pub const MAX_DURATION_MINUTES: i64 = 10080;

/// Kind of media attached to a broadcast payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Animation,
}

impl MediaKind {
    /// Get string representation (as stored in the database)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Animation => "animation",
        }
    }

    /// Parse from the stored string representation
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            "animation" => Some(Self::Animation),
            _ => None,
        }
    }
}

/// Inline button rendered under a delivered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub url: String,
}

/// Message content of a broadcast
///
/// Opaque to the scheduling logic: the engine never inspects the payload,
/// it only hands it to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Message text (caption when media is present)
    pub text: String,

    /// Optional attached media
    pub media_kind: Option<MediaKind>,

    /// Provider-side reference to the media file
    pub media_ref: Option<String>,

    /// Optional thread/topic within the destination
    pub thread_id: Option<i64>,

    /// Optional inline button
    pub button: Option<InlineButton>,
}

impl Payload {
    /// Create a plain text payload
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_kind: None,
            media_ref: None,
            thread_id: None,
            button: None,
        }
    }

    /// Attach media to the payload
    pub fn with_media(mut self, kind: MediaKind, file_ref: impl Into<String>) -> Self {
        self.media_kind = Some(kind);
        self.media_ref = Some(file_ref.into());
        self
    }

    /// Set the thread/topic id
    pub fn with_thread(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Attach an inline button
    pub fn with_button(mut self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.button = Some(InlineButton {
            text: text.into(),
            url: url.into(),
        });
        self
    }
}

/// A scheduled broadcast: repeated delivery of one payload into one
/// destination, bounded by an interval and a total lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Store-assigned identifier, immutable after creation
    pub id: i64,

    /// Owning destination
    pub destination_id: i64,

    /// Message content
    pub payload: Payload,

    /// Minimum gap between consecutive deliveries, in minutes
    pub interval_minutes: i64,

    /// Total lifetime measured from `created_at`, in minutes
    pub duration_minutes: i64,

    /// Deliveries are only considered while true
    pub is_active: bool,

    /// Epoch seconds, set once at creation
    pub created_at: i64,

    /// Epoch seconds of the last successful delivery, monotonically
    /// non-decreasing while present
    pub last_sent_at: Option<i64>,
}

/// Parameters for creating a broadcast; the store assigns the id and
/// stamps `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBroadcast {
    pub destination_id: i64,
    pub payload: Payload,
    pub interval_minutes: i64,
    pub duration_minutes: i64,
}

impl NewBroadcast {
    /// Validate scheduling parameters against the allowed ranges.
    ///
    /// Out-of-range parameters are rejected here and never reach the store.
    pub fn validate(&self) -> Result<()> {
        validate_schedule(self.interval_minutes, self.duration_minutes)
    }
}

impl Broadcast {
    /// Validate scheduling parameters (used by update paths).
    pub fn validate(&self) -> Result<()> {
        validate_schedule(self.interval_minutes, self.duration_minutes)
    }
}

/// Range-check interval and duration
pub fn validate_schedule(interval_minutes: i64, duration_minutes: i64) -> Result<()> {
    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
        return Err(Error::validation(format!(
            "interval_minutes must be in [{MIN_INTERVAL_MINUTES}, {MAX_INTERVAL_MINUTES}], got {interval_minutes}"
        )));
    }
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(Error::validation(format!(
            "duration_minutes must be in [{MIN_DURATION_MINUTES}, {MAX_DURATION_MINUTES}], got {duration_minutes}"
        )));
    }
    Ok(())
}

/// A delivery target and its enabled/disabled state
///
/// Destinations are created implicitly on first contact and disabled, never
/// hard-deleted, when delivery permanently fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,

    /// When false, no broadcast under this destination is dispatched
    pub is_enabled: bool,

    /// Identifiers permitted to manage broadcasts for this destination;
    /// read by the authorization collaborator, not by the dispatch core
    pub operator_ids: Vec<i64>,
}

impl Destination {
    /// Create an enabled destination with no operators
    pub fn new(id: i64) -> Self {
        Self {
            id,
            is_enabled: true,
            operator_ids: Vec::new(),
        }
    }

    /// Set the operator list
    pub fn with_operators(mut self, operator_ids: Vec<i64>) -> Self {
        self.operator_ids = operator_ids;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_builders() {
        let payload = Payload::text("hello")
            .with_media(MediaKind::Photo, "file-123")
            .with_thread(7)
            .with_button("More", "https://example.com");

        assert_eq!(payload.text, "hello");
        assert_eq!(payload.media_kind, Some(MediaKind::Photo));
        assert_eq!(payload.media_ref.as_deref(), Some("file-123"));
        assert_eq!(payload.thread_id, Some(7));
        assert_eq!(payload.button.as_ref().unwrap().text, "More");
    }

    #[test]
    fn test_media_kind_roundtrip() {
        for kind in [MediaKind::Photo, MediaKind::Video, MediaKind::Animation] {
            assert_eq!(MediaKind::from_str_opt(kind.as_str()), Some(kind));
        }
        assert_eq!(MediaKind::from_str_opt("document"), None);
    }

    #[test]
    fn test_validate_schedule_bounds() {
        assert!(validate_schedule(5, 5).is_ok());
        assert!(validate_schedule(1440, 10080).is_ok());
        assert!(validate_schedule(60, 1440).is_ok());

        assert!(validate_schedule(4, 1440).is_err());
        assert!(validate_schedule(1441, 1440).is_err());
        assert!(validate_schedule(60, 4).is_err());
        assert!(validate_schedule(60, 10081).is_err());
    }

    #[test]
    fn test_new_broadcast_validate() {
        let new = NewBroadcast {
            destination_id: -100,
            payload: Payload::text("ad"),
            interval_minutes: 30,
            duration_minutes: 120,
        };
        assert!(new.validate().is_ok());

        let bad = NewBroadcast {
            interval_minutes: 0,
            ..new
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_destination_builder() {
        let dest = Destination::new(-100).with_operators(vec![1, 2]);
        assert!(dest.is_enabled);
        assert_eq!(dest.operator_ids, vec![1, 2]);
    }
}
