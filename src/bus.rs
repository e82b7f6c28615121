use crate::events::{Event, Tick, TriggerEvent};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) -> Result<usize, broadcast::error::SendError<Event>> {
        self.tx.send(event)
    }

    pub fn publish_tick(&self, tick: Tick) -> Result<usize, broadcast::error::SendError<Event>> {
        self.publish(Event::Tick(tick))
    }

    pub fn publish_trigger(&self, trigger: TriggerEvent) -> Result<usize, broadcast::error::SendError<Event>> {
        self.publish(Event::Trigger(Arc::new(trigger)))
    }
}
