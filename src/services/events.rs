//! Broadcast hub for library change events.
//!
//! `addBook` publishes here and the `bookAdded` subscription listens. Slow
//! subscribers that fall more than the channel capacity behind lose the
//! oldest events.

use tokio::sync::broadcast;

use crate::store::BookRecord;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum LibraryEvent {
    BookAdded(BookRecord),
}

#[derive(Clone)]
pub struct LibraryEvents {
    sender: broadcast::Sender<LibraryEvent>,
}

impl LibraryEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: LibraryEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::trace!(receivers, "Library event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.sender.subscribe()
    }
}

impl Default for LibraryEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> BookRecord {
        BookRecord {
            id: "b1".to_string(),
            title: "Demons".to_string(),
            published: 1872,
            author_id: "a1".to_string(),
            genres: vec!["classic".to_string()],
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = LibraryEvents::default();
        events.publish(LibraryEvent::BookAdded(book()));
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let events = LibraryEvents::default();
        let mut rx = events.subscribe();
        events.publish(LibraryEvent::BookAdded(book()));

        let LibraryEvent::BookAdded(received) = rx.recv().await.unwrap();
        assert_eq!(received.title, "Demons");
    }
}
