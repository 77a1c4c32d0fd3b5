use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `vivah.{domain}.{entity}.{action}`
/// Example: `vivah.matching.like.received`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            user_id: None,
            data,
        }
    }

    /// The user the event is addressed to.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    pub const MATCHING_LIKE_RECEIVED: &str = "vivah.matching.like.received";
}

pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Someone liked `recipient_user_id`. The liker is identified only by
    /// public profile id and display name.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LikeReceived {
        pub recipient_user_id: Uuid,
        pub liker_profile_id: i64,
        pub liker_display_name: String,
    }
}
