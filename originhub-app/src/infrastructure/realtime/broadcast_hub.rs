use crate::domain::IdeaEvent;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;

/// Per-idea fan-out of realtime updates. Delivery is best-effort: slow
/// subscribers lag and drop events, and publishing never fails the caller.
#[derive(Clone)]
pub struct BroadcastHub {
    channels: Arc<DashMap<Uuid, broadcast::Sender<IdeaEvent>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }

    pub fn subscribe(&self, idea_id: Uuid) -> broadcast::Receiver<IdeaEvent> {
        self.channels
            .entry(idea_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Returns how many subscribers the event reached.
    pub fn publish(&self, event: IdeaEvent) -> usize {
        let idea_id = event.idea_id();
        let Some(sender) = self.channels.get(&idea_id).map(|s| s.value().clone()) else {
            return 0;
        };

        match sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                // Every receiver is gone.
                self.channels
                    .remove_if(&idea_id, |_, s| s.receiver_count() == 0);
                tracing::debug!(%idea_id, "Dropped update channel without subscribers");
                0
            }
        }
    }

    /// Drops channels whose subscribers have all disconnected.
    pub fn prune(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }

    #[cfg(test)]
    pub(crate) fn watched_ideas(&self) -> usize {
        self.channels.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
