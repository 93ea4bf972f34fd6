//! Simple stateless pub-sub event handler
//!
//! This module provides a simple hook system that lets components of the marketplace subscribe to order engine
//! events and react to them. The event handler is stateless, i.e. the handlers have no access to the internal state
//! of the engine. All that is received is the event itself.
//!
//! Events for a single handler are processed strictly in the order they were published. Notification fan-out relies
//! on this: within a delivery channel, notifications for an order must follow the order of its transitions, so the
//! handler awaits each callback before picking up the next event rather than spawning a task per event.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // drop the internal sender so that when the last subscriber is dropped, we can automatically shut down the
        // handler
        drop(self.sender);
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            (self.handler)(ev).await;
            trace!("📬️ Event handled");
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn events_are_handled_in_publication_order() {
        let _ = env_logger::try_init();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = Arc::new(move |v: u64| {
            let sink = Arc::clone(&sink);
            Box::pin(async move {
                debug!("Handler received {v}");
                sink.lock().unwrap().push(v);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(16, handler);
        let producer = event_handler.subscribe();
        tokio::spawn(async move {
            for v in 0..10u64 {
                producer.publish_event(v).await;
            }
        });

        event_handler.start_handler().await;
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<u64>>());
    }
}
