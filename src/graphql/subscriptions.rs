//! GraphQL subscriptions for real-time updates
//!
//! Subscriptions allow clients to receive push updates over WebSocket.

use async_graphql::{Context, Subscription};
use futures::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::services::{LibraryEvent, LibraryEvents};

use super::types::Book;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Every book added after the subscription starts
    async fn book_added<'ctx>(&self, ctx: &Context<'ctx>) -> impl Stream<Item = Book> + 'ctx {
        let events = ctx.data_unchecked::<LibraryEvents>();
        let receiver = events.subscribe();

        BroadcastStream::new(receiver).filter_map(|result| match result {
            Ok(LibraryEvent::BookAdded(book)) => Some(Book::from(book)),
            Err(e) => {
                tracing::warn!(error = %e, "bookAdded subscriber lagged");
                None
            }
        })
    }
}
