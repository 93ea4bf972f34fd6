//! In-process live update bus.
//!
//! Rooms are plain strings (`customer:{id}`, `order:{id}`, `seller:{id}`) mapped to tokio broadcast channels. A
//! broadcast into a room nobody is watching is dropped, not an error; SSE clients that fall behind miss the oldest
//! events first.

use std::{collections::HashMap, sync::{Arc, RwLock}};

use log::*;
use tokio::sync::broadcast;

const ROOM_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct LiveEvent {
    pub event: String,
    pub data: String,
}

pub trait LiveBus: Send + Sync {
    /// Fire-and-forget broadcast into a room.
    fn broadcast(&self, room: &str, event: &str, payload: String);

    /// Attach a new listener to a room, creating the room if it does not exist yet.
    fn subscribe(&self, room: &str) -> broadcast::Receiver<LiveEvent>;
}

impl<T: LiveBus> LiveBus for Arc<T> {
    fn broadcast(&self, room: &str, event: &str, payload: String) {
        self.as_ref().broadcast(room, event, payload)
    }

    fn subscribe(&self, room: &str) -> broadcast::Receiver<LiveEvent> {
        self.as_ref().subscribe(room)
    }
}

#[derive(Default)]
pub struct InMemoryLiveBus {
    rooms: RwLock<HashMap<String, broadcast::Sender<LiveEvent>>>,
}

impl InMemoryLiveBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiveBus for InMemoryLiveBus {
    fn broadcast(&self, room: &str, event: &str, payload: String) {
        let rooms = match self.rooms.read() {
            Ok(rooms) => rooms,
            Err(e) => {
                error!("📡️ Live bus lock is poisoned. Dropping broadcast to {room}. {e}");
                return;
            },
        };
        match rooms.get(room) {
            Some(sender) => {
                let n = sender.send(LiveEvent { event: event.to_string(), data: payload }).unwrap_or(0);
                trace!("📡️ Broadcast {event} to {n} listener(s) in {room}");
            },
            None => trace!("📡️ No listeners in {room}. Dropping {event}."),
        }
    }

    fn subscribe(&self, room: &str) -> broadcast::Receiver<LiveEvent> {
        let mut rooms = match self.rooms.write() {
            Ok(rooms) => rooms,
            Err(e) => {
                error!("📡️ Live bus lock is poisoned. Returning a dead receiver for {room}. {e}");
                // A fresh channel whose sender is dropped immediately; the receiver sees Closed.
                return broadcast::channel(1).1;
            },
        };
        let sender = rooms.entry(room.to_string()).or_insert_with(|| broadcast::channel(ROOM_BUFFER).0);
        debug!("📡️ New listener in {room}");
        sender.subscribe()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn broadcasts_reach_every_room_listener() {
        let bus = InMemoryLiveBus::new();
        let mut rx1 = bus.subscribe("order:FEAST-1");
        let mut rx2 = bus.subscribe("order:FEAST-1");
        bus.broadcast("order:FEAST-1", "status_update", "{}".to_string());
        let ev1 = rx1.recv().await.unwrap();
        let ev2 = rx2.recv().await.unwrap();
        assert_eq!(ev1.event, "status_update");
        assert_eq!(ev2.data, "{}");
    }

    #[tokio::test]
    async fn an_empty_room_swallows_the_event() {
        let bus = InMemoryLiveBus::new();
        bus.broadcast("customer:nobody", "status_update", "{}".to_string());
        // a later subscriber sees nothing from before it joined
        let mut rx = bus.subscribe("customer:nobody");
        bus.broadcast("customer:nobody", "order_accepted", "{}".to_string());
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.event, "order_accepted");
    }
}
