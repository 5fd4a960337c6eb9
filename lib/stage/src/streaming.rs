use crate::{Emitter, StageEngine, StageError, StageResult, ValueStream};
use futures::future::ready;
use futures::{stream, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A [StageEngine] that streams values one at a time through the plan.
///
/// Stages only suspend where a producer waits for external I/O. Operators like
/// [StageEngine::limit] stop polling their input once they are satisfied, which cancels the
/// remaining upstream work. Merged stages are polled concurrently and their values interleave in
/// no particular order.
///
/// Every stage is fused after its first error: the error is the last item of the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingEngine;

impl StageEngine for StreamingEngine {
    type Stage<T: Send + 'static> = ValueStream<T>;

    fn name(&self) -> &'static str {
        "streaming"
    }

    fn empty<T: Send + 'static>(&self) -> ValueStream<T> {
        stream::empty().boxed()
    }

    fn of<T: Send + 'static>(&self, values: Vec<T>) -> ValueStream<T> {
        stream::iter(values.into_iter().map(Ok)).boxed()
    }

    fn fail<T: Send + 'static>(&self, error: StageError) -> ValueStream<T> {
        stream::once(ready(Err(error))).boxed()
    }

    fn from_stream<T: Send + 'static>(&self, stream: ValueStream<T>) -> ValueStream<T> {
        Terminating::new(stream).boxed()
    }

    fn from_future<T, F>(&self, future: F) -> ValueStream<T>
    where
        T: Send + 'static,
        F: Future<Output = StageResult<T>> + Send + 'static,
    {
        stream::once(future).boxed()
    }

    fn create<T, F>(&self, producer: F) -> ValueStream<T>
    where
        T: Send + 'static,
        F: FnOnce(Emitter<T>) + Send + 'static,
    {
        stream::once(async move {
            let (emitter, receiver) = Emitter::channel();
            producer(emitter);
            receiver
        })
        .flatten()
        .boxed()
    }

    fn into_stream<T: Send + 'static>(&self, stage: ValueStream<T>) -> ValueStream<T> {
        stage
    }

    fn map<T, U, F>(&self, stage: ValueStream<T>, mut f: F) -> ValueStream<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        stage.map(move |item| item.map(&mut f)).boxed()
    }

    fn filter<T, F>(&self, stage: ValueStream<T>, mut predicate: F) -> ValueStream<T>
    where
        T: Send + 'static,
        F: FnMut(&T) -> bool + Send + 'static,
    {
        stage
            .filter_map(move |item| {
                ready(match item {
                    Ok(value) => predicate(&value).then_some(Ok(value)),
                    Err(error) => Some(Err(error)),
                })
            })
            .boxed()
    }

    fn flat_map<T, U, F>(&self, stage: ValueStream<T>, mut f: F) -> ValueStream<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> Vec<U> + Send + 'static,
    {
        stage
            .flat_map(move |item| {
                let items: Vec<StageResult<U>> = match item {
                    Ok(value) => f(value).into_iter().map(Ok).collect(),
                    Err(error) => vec![Err(error)],
                };
                stream::iter(items)
            })
            .boxed()
    }

    fn merge_map<T, U, F>(&self, stage: ValueStream<T>, mut f: F) -> ValueStream<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> ValueStream<U> + Send + 'static,
    {
        let merged = stage
            .map(move |item| match item {
                Ok(value) => f(value),
                Err(error) => stream::once(ready(Err(error))).boxed(),
            })
            .flatten_unordered(None)
            .boxed();
        Terminating::new(merged).boxed()
    }

    fn merge<T: Send + 'static>(&self, stages: Vec<ValueStream<T>>) -> ValueStream<T> {
        Terminating::new(stream::select_all(stages).boxed()).boxed()
    }

    fn reduce<T, A, F>(&self, mut stage: ValueStream<T>, initial: A, mut f: F) -> ValueStream<A>
    where
        T: Send + 'static,
        A: Send + 'static,
        F: FnMut(A, T) -> A + Send + 'static,
    {
        stream::once(async move {
            let mut accumulator = initial;
            while let Some(item) = stage.next().await {
                accumulator = f(accumulator, item?);
            }
            Ok(accumulator)
        })
        .boxed()
    }

    fn buffer_count<T: Send + 'static>(
        &self,
        stage: ValueStream<T>,
        size: usize,
    ) -> ValueStream<Vec<T>> {
        let size = size.max(1);
        stream::unfold(Some(stage), move |stage| async move {
            let mut stage = stage?;
            let mut batch = Vec::with_capacity(size);
            while batch.len() < size {
                match stage.next().await {
                    Some(Ok(value)) => batch.push(value),
                    Some(Err(error)) => return Some((Err(error), None)),
                    None => return (!batch.is_empty()).then_some((Ok(batch), None)),
                }
            }
            Some((Ok(batch), Some(stage)))
        })
        .boxed()
    }

    fn skip<T: Send + 'static>(&self, stage: ValueStream<T>, count: usize) -> ValueStream<T> {
        // Only values count toward `count`. Errors are always forwarded.
        let mut remaining = count;
        let skipped = stage
            .filter(move |item| {
                let keep = item.is_err() || remaining == 0;
                if !keep {
                    remaining -= 1;
                }
                ready(keep)
            })
            .boxed();
        Terminating::new(skipped).boxed()
    }

    fn limit<T: Send + 'static>(&self, stage: ValueStream<T>, count: usize) -> ValueStream<T> {
        stage.take(count).boxed()
    }

    fn default_values<T: Send + 'static>(
        &self,
        stage: ValueStream<T>,
        values: Vec<T>,
    ) -> ValueStream<T> {
        let mut stage = stage.peekable();
        stream::once(async move {
            if Pin::new(&mut stage).peek().await.is_some() {
                stage.boxed()
            } else {
                stream::iter(values.into_iter().map(Ok)).boxed()
            }
        })
        .flatten()
        .boxed()
    }

    fn catch<T, F>(&self, stage: ValueStream<T>, handler: F) -> ValueStream<T>
    where
        T: Send + 'static,
        F: FnOnce(StageError) -> ValueStream<T> + Send + 'static,
    {
        let mut handler = Some(handler);
        stage
            .map(move |item| match item {
                Ok(value) => stream::once(ready(Ok(value))).boxed(),
                Err(error) => match handler.take() {
                    Some(handler) => handler(error),
                    None => stream::once(ready(Err(error))).boxed(),
                },
            })
            .flatten()
            .boxed()
    }

    fn finalize<T, F>(&self, stage: ValueStream<T>, callback: F) -> ValueStream<T>
    where
        T: Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        Finalize {
            inner: stage,
            callback: Some(Box::new(callback)),
        }
        .boxed()
    }

    fn end_with<T: Send + 'static>(&self, stage: ValueStream<T>, values: Vec<T>) -> ValueStream<T> {
        let chained = stage.chain(stream::iter(values.into_iter().map(Ok))).boxed();
        Terminating::new(chained).boxed()
    }
}

/// Ends a stream after its first error.
pub(crate) struct Terminating<T> {
    inner: Option<ValueStream<T>>,
}

impl<T> Terminating<T> {
    pub(crate) fn new(inner: ValueStream<T>) -> Self {
        Self { inner: Some(inner) }
    }
}

impl<T> Stream for Terminating<T> {
    type Item = StageResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Err(error))) => {
                self.inner = None;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

/// Runs a callback when the stream ends or is dropped, whichever happens first.
struct Finalize<T> {
    inner: ValueStream<T>,
    callback: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Stream for Finalize<T> {
    type Item = StageResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(None) = polled {
            if let Some(callback) = self.callback.take() {
                callback();
            }
        }
        polled
    }
}

impl<T> Drop for Finalize<T> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}
