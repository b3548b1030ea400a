//! Cancellable polling tasks. Each poller owns one timer loop whose
//! lifecycle is tied to the wallet session: started on connect, stopped on
//! disconnect or drop, never outliving its relevance.

use std::{
    future::Future,
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time,
};
use tracing::debug;

pub struct Poller {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn a loop that awaits `task` once per `period`. The first tick
    /// fires immediately.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        debug!(name, period_secs = period.as_secs(), "poller started");
        Self { name, handle }
    }

    pub fn stop(&self) {
        debug!(name = self.name, "poller stopped");
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{
            AtomicU32,
            Ordering,
        },
    };

    #[tokio::test]
    async fn poller__ticks_and_stops() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = count.clone();
        let poller = Poller::spawn("test", Duration::from_millis(10), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_millis(35)).await;
        poller.stop();
        let at_stop = count.load(Ordering::SeqCst);
        assert!(at_stop >= 2, "expected at least two ticks, got {at_stop}");

        time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop, "ticked after stop");
    }
}
