//! In-process change feed.
//!
//! Every write to the `requests` table publishes a [`RequestChange`] tagged
//! with the restaurant it belongs to. Each dashboard stream subscribes once
//! and only sees its own restaurant's changes.

use futures::{Stream, stream};
use models::change::RequestChange;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

/// Large enough to absorb a bulk clear without lagging subscribers
const BROADCAST_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct RestaurantChange {
    restaurant_id: Uuid,
    change: RequestChange,
}

/// What a subscriber receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedItem {
    Change(RequestChange),
    /// The subscriber fell behind and missed this many notifications; it
    /// has to refetch its baseline
    Lagged(u64),
}

#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RestaurantChange>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, restaurant_id: Uuid, change: RequestChange) {
        log::debug!("Publishing {change}");
        // No subscribers is not an error
        let _ = self.tx.send(RestaurantChange {
            restaurant_id,
            change,
        });
    }

    pub fn publish_all<I>(&self, restaurant_id: Uuid, changes: I)
    where
        I: IntoIterator<Item = RequestChange>,
    {
        for change in changes {
            self.publish(restaurant_id, change);
        }
    }

    pub fn subscribe(&self, restaurant_id: Uuid) -> RestaurantFeed {
        RestaurantFeed {
            restaurant_id,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One subscriber's view of the hub, filtered to a single restaurant
pub struct RestaurantFeed {
    restaurant_id: Uuid,
    rx: broadcast::Receiver<RestaurantChange>,
}

impl RestaurantFeed {
    /// Waits for the next item of this restaurant. `None` once the hub is
    /// gone.
    pub async fn next(&mut self) -> Option<FeedItem> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.restaurant_id == self.restaurant_id => {
                    return Some(FeedItem::Change(event.change));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    log::warn!(
                        "Change feed for restaurant {} lagged by {missed} messages",
                        self.restaurant_id
                    );
                    return Some(FeedItem::Lagged(missed));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = FeedItem> {
        stream::unfold(self, |mut feed| async move {
            let item = feed.next().await?;
            Some((item, feed))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_feed_only_sees_own_restaurant() {
        let hub = RealtimeHub::new();
        let ours = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        let mut feed = hub.subscribe(ours);

        let foreign = RequestChange::insert(Uuid::new_v4(), Uuid::new_v4());
        let own = RequestChange::update(Uuid::new_v4(), Uuid::new_v4());
        hub.publish(theirs, foreign);
        hub.publish(ours, own);

        assert_eq!(feed.next().await, Some(FeedItem::Change(own)));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told_to_resync() {
        let hub = RealtimeHub::new();
        let restaurant = Uuid::new_v4();
        let mut feed = hub.subscribe(restaurant);

        let changes: Vec<_> = (0..BROADCAST_CAPACITY + 5)
            .map(|_| RequestChange::delete(Uuid::new_v4(), Uuid::new_v4()))
            .collect();
        hub.publish_all(restaurant, changes.clone());

        assert_eq!(feed.next().await, Some(FeedItem::Lagged(5)));
        assert_eq!(feed.next().await, Some(FeedItem::Change(changes[5])));
    }

    #[tokio::test]
    async fn test_stream_ends_when_hub_is_dropped() {
        let hub = RealtimeHub::new();
        let restaurant = Uuid::new_v4();
        let stream = hub.subscribe(restaurant).into_stream();
        assert_eq!(hub.subscriber_count(), 1);

        let change = RequestChange::insert(Uuid::new_v4(), Uuid::new_v4());
        hub.publish(restaurant, change);
        drop(hub);

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items, vec![FeedItem::Change(change)]);
    }
}
