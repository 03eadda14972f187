//! Fan-out / fan-in of provider queries
//!
//! Each query runs as its own tokio task and reports exactly once through an
//! mpsc queue sized to the number of producers. The collector counts results
//! rather than identifying them, so callers must only merge or sum what comes
//! back.
//!
//! On the first error the shared `CancellationToken` is cancelled and the
//! `JoinSet` holding the remaining tasks is dropped, which aborts them. No
//! query keeps running after the operation has already failed.

use crate::error::{TracerError, TracerResult};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct FanOut<T> {
    tx: mpsc::Sender<TracerResult<T>>,
    rx: mpsc::Receiver<TracerResult<T>>,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    expected: usize,
}

impl<T: Send + 'static> FanOut<T> {
    /// `producers` sizes the result queue; spawning more is allowed but may
    /// make senders wait for the collector
    pub fn new(producers: usize) -> Self {
        Self::with_token(producers, CancellationToken::new())
    }

    /// Cancelling `parent` cancels every query spawned here
    pub fn with_parent(producers: usize, parent: &CancellationToken) -> Self {
        Self::with_token(producers, parent.child_token())
    }

    fn with_token(producers: usize, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(producers.max(1));
        Self {
            tx,
            rx,
            tasks: JoinSet::new(),
            cancel,
            expected: 0,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.expected
    }

    pub fn is_empty(&self) -> bool {
        self.expected == 0
    }

    /// Start `query` immediately on its own task
    pub fn spawn<F>(&mut self, label: &'static str, query: F)
    where
        F: Future<Output = TracerResult<T>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        self.expected += 1;

        log::debug!("↗️  Spawning query: {}", label);
        self.tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("Query cancelled: {}", label);
                    return;
                }
                outcome = query => outcome,
            };
            if let Err(e) = &outcome {
                log::debug!("Query failed: {} ({})", label, e);
            }
            // The collector may already have returned on another failure
            let _ = tx.send(outcome).await;
        });
    }

    /// Wait for every spawned query, or for the first failure
    ///
    /// # Returns
    /// * `Ok(results)` - one entry per spawned query, in arrival order
    /// * `Err(e)` - the first error received; all other queries are cancelled
    pub async fn collect(self) -> TracerResult<Vec<T>> {
        let FanOut {
            tx,
            mut rx,
            tasks,
            cancel,
            expected,
        } = self;
        drop(tx);

        let mut results = Vec::with_capacity(expected);
        while results.len() < expected {
            match rx.recv().await {
                Some(Ok(value)) => results.push(value),
                Some(Err(e)) => {
                    log::warn!(
                        "❌ Query failed after {}/{} results, cancelling the rest: {}",
                        results.len(),
                        expected,
                        e
                    );
                    cancel.cancel();
                    drop(tasks);
                    return Err(e);
                }
                None => {
                    // Every sender is gone without a full set of answers
                    drop(tasks);
                    return Err(if cancel.is_cancelled() {
                        TracerError::Cancelled
                    } else {
                        TracerError::DataSource(format!(
                            "query task ended without a result ({}/{} received)",
                            results.len(),
                            expected
                        ))
                    });
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_collects_every_result() {
        let mut fan = FanOut::new(3);
        for i in 0..3u32 {
            fan.spawn("value", async move { Ok(i) });
        }
        assert_eq!(fan.len(), 3);

        let mut results = fan.collect().await.unwrap();
        results.sort();
        assert_eq!(results, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_fan_out() {
        let fan: FanOut<u32> = FanOut::new(0);
        assert!(fan.is_empty());
        assert!(fan.collect().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_error_wins_regardless_of_others() {
        let mut fan = FanOut::new(4);
        fan.spawn("ok", async { Ok(1u32) });
        fan.spawn("ok", async { Ok(2u32) });
        fan.spawn("bad", async { Err(TracerError::DataSource("down".to_string())) });
        fan.spawn("ok", async { Ok(3u32) });

        let err = fan.collect().await.unwrap_err();
        assert_eq!(err, TracerError::DataSource("down".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_cancels_slow_siblings() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut fan = FanOut::new(3);
        let token = fan.cancellation_token();

        for _ in 0..2 {
            let finished = finished.clone();
            fan.spawn("slow", async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        fan.spawn("bad", async {
            Err(TracerError::AccountNotFound("0xa".to_string()))
        });

        let err = fan.collect().await.unwrap_err();
        assert_eq!(err, TracerError::AccountNotFound("0xa".to_string()));
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parent_cancellation_stops_collection() {
        let parent = CancellationToken::new();
        let mut fan: FanOut<()> = FanOut::with_parent(1, &parent);
        fan.spawn("never", std::future::pending());

        parent.cancel();
        assert_eq!(fan.collect().await.unwrap_err(), TracerError::Cancelled);
    }

    #[tokio::test]
    async fn test_panicking_query_is_an_error() {
        let mut fan: FanOut<u32> = FanOut::new(1);
        fan.spawn("panics", async {
            let value: Option<u32> = None;
            Ok(value.expect("provider bug"))
        });
        assert!(matches!(
            fan.collect().await.unwrap_err(),
            TracerError::DataSource(_)
        ));
    }
}
