use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Simple broadcast hub wrapper used by the SSE services.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// One hub per household, created lazily on first subscription.
pub struct HouseholdHubs {
    hubs: DashMap<Uuid, SseHub>,
    capacity: usize,
}

impl HouseholdHubs {
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    pub fn subscribe(&self, household_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(household_id)
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Deliver `event` to the household's listeners. Households nobody listens to are skipped.
    pub fn broadcast(&self, household_id: Uuid, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(&household_id) {
            hub.broadcast(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_stay_within_their_household() {
        let hubs = HouseholdHubs::new(4);
        let home = Uuid::new_v4();
        let cabin = Uuid::new_v4();
        let mut home_rx = hubs.subscribe(home);
        let mut cabin_rx = hubs.subscribe(cabin);

        hubs.broadcast(home, ServerEvent::new(Some("ownership.added".into()), "{}".into()));

        let received = home_rx.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("ownership.added"));
        assert!(cabin_rx.try_recv().is_err());
    }
}
