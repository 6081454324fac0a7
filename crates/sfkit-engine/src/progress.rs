//! Progress reporting
//!
//! Operations report through a [`ProgressCallback`]. [`subprogress`] maps a
//! child operation onto a slice of a parent's range so multi-phase workflows
//! can report one continuous percentage, and [`progress_channel`] turns the
//! callback into a [`Stream`] for callers that prefer to poll.

use futures::Stream;
use sfkit_types::{ProgressCallback, ProgressEvent};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Scale a child's progress onto `[start, end]` of the parent's range.
///
/// A child event at `percent` reaches the parent as
/// `start + (percent / 100) * (end - start)`; `done` and `total` pass through.
pub fn subprogress(parent: ProgressCallback, start: f64, end: f64) -> ProgressCallback {
    Arc::new(move |event: ProgressEvent| {
        parent(ProgressEvent {
            percent: start + (event.percent / 100.0) * (end - start),
            done: event.done,
            total: event.total,
        });
    })
}

/// Callback that drops every event
pub fn noop() -> ProgressCallback {
    Arc::new(|_: ProgressEvent| {})
}

/// Shared completion counter for one operation.
///
/// Incrementing and emitting happen under one lock, so events reach the
/// callback in increasing `done` order even when jobs finish concurrently.
pub struct ProgressCounter {
    done: Mutex<u64>,
    total: u64,
    callback: Option<ProgressCallback>,
}

impl ProgressCounter {
    /// Counter for `total` units of work
    pub fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            done: Mutex::new(0),
            total,
            callback,
        }
    }

    /// Record one completed unit and emit the resulting event
    pub fn advance(&self) -> ProgressEvent {
        let mut done = self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *done += 1;
        let event = ProgressEvent::new(*done, self.total);
        if let Some(callback) = &self.callback {
            callback(event);
        }
        event
    }

    /// Units completed so far
    pub fn done(&self) -> u64 {
        *self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Units the operation will process
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl std::fmt::Debug for ProgressCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressCounter")
            .field("done", &self.done())
            .field("total", &self.total)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Stream of progress events fed by the callback from [`progress_channel`].
///
/// Ends once every clone of that callback has been dropped.
#[derive(Debug)]
pub struct ProgressStream {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Create a callback whose events can be consumed as a [`ProgressStream`]
pub fn progress_channel() -> (ProgressCallback, ProgressStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| {
        // Receiver gone means nobody is listening
        let _ = sender.send(event);
    });
    (callback, ProgressStream { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use proptest::prelude::*;

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| sink.lock().unwrap().push(event));
        (callback, seen)
    }

    #[test]
    fn test_subprogress_maps_midpoint() {
        let (parent, seen) = recorder();
        let child = subprogress(parent, 20.0, 40.0);

        child(ProgressEvent {
            percent: 50.0,
            done: 5,
            total: 10,
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!((seen[0].percent - 30.0).abs() < 1e-9);
        assert_eq!(seen[0].done, 5);
        assert_eq!(seen[0].total, 10);
    }

    #[test]
    fn test_subprogress_composes() {
        let (parent, seen) = recorder();
        // Second half of the parent, then the first half of that
        let child = subprogress(subprogress(parent, 50.0, 100.0), 0.0, 50.0);

        child(ProgressEvent::new(1, 1));

        assert!((seen.lock().unwrap()[0].percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_is_monotonic_across_threads() {
        let (callback, seen) = recorder();
        let counter = Arc::new(ProgressCounter::new(400, Some(callback)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        counter.advance();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 400);
        assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!(seen.windows(2).all(|w| w[0].done < w[1].done));
        let last = seen.last().unwrap();
        assert_eq!(last.done, last.total);
        assert_eq!(counter.done(), 400);
    }

    #[tokio::test]
    async fn test_progress_channel_stream_ends() {
        let (callback, stream) = progress_channel();
        let counter = ProgressCounter::new(3, Some(callback));
        for _ in 0..3 {
            counter.advance();
        }
        drop(counter);

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 3);
        assert!(events[2].is_complete());
    }

    proptest! {
        #[test]
        fn test_subprogress_stays_within_range(
            start in 0.0f64..100.0,
            span in 0.0f64..100.0,
            done in 0u64..1000,
            extra in 0u64..1000,
        ) {
            let end = (start + span).min(100.0);
            let (parent, seen) = recorder();
            let child = subprogress(parent, start, end);

            child(ProgressEvent::new(done, done + extra));

            let percent = seen.lock().unwrap()[0].percent;
            prop_assert!(percent >= start - 1e-9);
            prop_assert!(percent <= end + 1e-9);
        }
    }
}
