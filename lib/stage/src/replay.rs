use crate::{StageError, StageResult, ValueStream};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// A stage that buffers its values such that several consumers can read them.
///
/// The upstream producer runs once, driven by whichever consumer is the furthest ahead. Slower
/// consumers read from the buffer. The buffer keeps every value until the [Replayable] and all
/// of its streams are dropped.
pub struct Replayable<T> {
    shared: Arc<Mutex<ReplayState<T>>>,
}

struct ReplayState<T> {
    upstream: Option<ValueStream<T>>,
    buffer: Vec<T>,
    error: Option<StageError>,
    wakers: Vec<Waker>,
}

impl<T> Clone for Replayable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Replayable<T> {
    /// Creates a new [Replayable] that buffers `upstream`.
    pub fn new(upstream: ValueStream<T>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ReplayState {
                upstream: Some(upstream),
                buffer: Vec::new(),
                error: None,
                wakers: Vec::new(),
            })),
        }
    }

    /// Returns a stream over all values, starting with the first one.
    pub fn stream(&self) -> ValueStream<T> {
        ReplayStream {
            shared: Arc::clone(&self.shared),
            position: 0,
            finished: false,
        }
        .boxed()
    }
}

struct ReplayStream<T> {
    shared: Arc<Mutex<ReplayState<T>>>,
    position: usize,
    finished: bool,
}

impl<T: Clone> Stream for ReplayStream<T> {
    type Item = StageResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        let mut guard = this.shared.lock();
        let state = &mut *guard;

        if let Some(value) = state.buffer.get(this.position) {
            this.position += 1;
            return Poll::Ready(Some(Ok(value.clone())));
        }

        let Some(upstream) = state.upstream.as_mut() else {
            this.finished = true;
            return Poll::Ready(state.error.clone().map(Err));
        };

        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(value))) => {
                state.buffer.push(value.clone());
                this.position += 1;
                wake_all(&mut state.wakers);
                Poll::Ready(Some(Ok(value)))
            }
            Poll::Ready(Some(Err(error))) => {
                state.upstream = None;
                state.error = Some(error.clone());
                this.finished = true;
                wake_all(&mut state.wakers);
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                state.upstream = None;
                this.finished = true;
                wake_all(&mut state.wakers);
                Poll::Ready(None)
            }
            Poll::Pending => {
                if !state.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    state.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T> Drop for ReplayStream<T> {
    fn drop(&mut self) {
        // Upstream may hold the waker of this consumer only. Another consumer has to poll it.
        wake_all(&mut self.shared.lock().wakers);
    }
}

fn wake_all(wakers: &mut Vec<Waker>) {
    for waker in wakers.drain(..) {
        waker.wake();
    }
}
