use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use homedeck_api::models::{DeviceResponse, Id};
use homedeck_api::{Registry, Result};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Latest state published by a [`Poller`].
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Last successful fetch, `None` until one succeeds
    pub data: Option<T>,
    /// Failure of the most recent fetch, cleared by the next success
    pub error: Option<String>,
    pub refreshed_at: Option<OffsetDateTime>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            refreshed_at: None,
        }
    }
}

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Re-fetches a collection on a fixed interval until dropped.
pub struct Poller<T> {
    receiver: watch::Receiver<Snapshot<T>>,
    handle: JoinHandle<()>,
}

impl<T> Poller<T>
where
    T: Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(interval: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send,
    {
        let (sender, receiver) = watch::channel(Snapshot::default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match fetch().await {
                    Ok(data) => sender.send_modify(|snapshot| {
                        snapshot.data = Some(data);
                        snapshot.error = None;
                        snapshot.refreshed_at = Some(OffsetDateTime::now_utc());
                    }),
                    Err(e) => {
                        tracing::debug!("poll failed, keeping previous snapshot: {}", e);
                        sender.send_modify(|snapshot| snapshot.error = Some(e.to_string()));
                    }
                }
            }
        });

        Self { receiver, handle }
    }

    /// Waits for the next published snapshot.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.receiver.clone()
    }
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn latest(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }
}

impl Poller<Vec<DeviceResponse>> {
    /// Polls the devices of one room.
    pub fn devices(registry: Arc<dyn Registry>, room_id: Id, interval: Duration) -> Self {
        Self::spawn(interval, move || {
            let registry = registry.clone();
            async move { registry.list_devices(room_id).await }
        })
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use homedeck_api::Error;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_publishes_on_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut poller = Poller::spawn(Duration::from_secs(2), move || {
            let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(count) }
        });

        assert!(poller.changed().await);
        assert_eq!(poller.latest().data, Some(1));

        assert!(poller.changed().await);
        assert_eq!(poller.latest().data, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut poller = Poller::spawn(Duration::from_secs(2), move || {
            let count = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match count {
                    0 => Ok("first"),
                    _ => Err(Error::transport("connection reset")),
                }
            }
        });

        assert!(poller.changed().await);
        assert!(poller.changed().await);

        let snapshot = poller.latest();
        assert_eq!(snapshot.data, Some("first"));
        assert!(snapshot.error.unwrap().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_ticks() {
        let mut poller = Poller::spawn(Duration::ZERO, || async { Ok(7) });

        assert!(poller.changed().await);
        assert_eq!(poller.latest().data, Some(7));
        assert!(poller.changed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut poller = Poller::spawn(Duration::from_secs(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        assert!(poller.changed().await);
        drop(poller);

        let before = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }
}
