// [libs/domain/models/src/events.rs]
/*!
 * Event stream payloads broadcast by the orchestrator (spec.md §4.J,
 * §6 "Event stream format"). `EventEnvelope` is the wire shape; its
 * `id` is monotonic per subscription, not global.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    PhaseStarted { campaign_id: Uuid, phase: String },
    PhaseProgress { campaign_id: Uuid, phase: String, processed: u64, total: u64 },
    PhaseCompleted { campaign_id: Uuid, phase: String },
    PhaseFailed { campaign_id: Uuid, phase: String, reason: String },
    CampaignCompleted { campaign_id: Uuid },
    CampaignCancelled { campaign_id: Uuid },
    EntityCreated { entity: String, entity_id: Uuid },
    EntityUpdated { entity: String, entity_id: Uuid },
    EntityDeleted { entity: String, entity_id: Uuid },
    SlowSubscriber { dropped_event_count: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Monotonic within one subscription (spec.md §8.10); not a global
    /// sequence number.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub campaign_id: Option<Uuid>,
    #[serde(flatten)]
    pub kind: EventKind,
}
