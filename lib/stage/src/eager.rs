use crate::{Emitter, StageEngine, StageError, StageResult, ValueStream};
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use std::future::Future;

/// A [StageEngine] that fully materializes every stage before the next operator composes on it.
///
/// Peak memory is proportional to the largest intermediate result and upstream work cannot be
/// cancelled (e.g., a limit still computes the whole input). In return, the order of all values
/// is deterministic: merged stages are concatenated in the order they were given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EagerEngine;

/// The stage of the [EagerEngine]: a future that resolves to all values of the stage.
pub struct EagerStage<T> {
    values: BoxFuture<'static, StageResult<Vec<T>>>,
}

impl<T: Send + 'static> EagerStage<T> {
    fn new(values: impl Future<Output = StageResult<Vec<T>>> + Send + 'static) -> Self {
        Self {
            values: values.boxed(),
        }
    }

    /// Resolves all values of this stage.
    pub async fn resolve(self) -> StageResult<Vec<T>> {
        self.values.await
    }
}

impl StageEngine for EagerEngine {
    type Stage<T: Send + 'static> = EagerStage<T>;

    fn name(&self) -> &'static str {
        "eager"
    }

    fn empty<T: Send + 'static>(&self) -> EagerStage<T> {
        self.of(Vec::new())
    }

    fn of<T: Send + 'static>(&self, values: Vec<T>) -> EagerStage<T> {
        EagerStage::new(async move { Ok(values) })
    }

    fn fail<T: Send + 'static>(&self, error: StageError) -> EagerStage<T> {
        EagerStage::new(async move { Err(error) })
    }

    fn from_stream<T: Send + 'static>(&self, stream: ValueStream<T>) -> EagerStage<T> {
        EagerStage::new(stream.try_collect())
    }

    fn from_future<T, F>(&self, future: F) -> EagerStage<T>
    where
        T: Send + 'static,
        F: Future<Output = StageResult<T>> + Send + 'static,
    {
        EagerStage::new(async move { Ok(vec![future.await?]) })
    }

    fn create<T, F>(&self, producer: F) -> EagerStage<T>
    where
        T: Send + 'static,
        F: FnOnce(Emitter<T>) + Send + 'static,
    {
        EagerStage::new(async move {
            let (emitter, receiver) = Emitter::channel();
            producer(emitter);
            receiver.try_collect().await
        })
    }

    fn into_stream<T: Send + 'static>(&self, stage: EagerStage<T>) -> ValueStream<T> {
        stream::once(stage.values)
            .flat_map(|result| match result {
                Ok(values) => stream::iter(values.into_iter().map(Ok)).boxed(),
                Err(error) => stream::iter(vec![Err(error)]).boxed(),
            })
            .boxed()
    }

    fn to_vec<T: Send + 'static>(
        &self,
        stage: EagerStage<T>,
    ) -> BoxFuture<'static, StageResult<Vec<T>>> {
        stage.values
    }

    fn map<T, U, F>(&self, stage: EagerStage<T>, f: F) -> EagerStage<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        EagerStage::new(async move { Ok(stage.values.await?.into_iter().map(f).collect()) })
    }

    fn filter<T, F>(&self, stage: EagerStage<T>, predicate: F) -> EagerStage<T>
    where
        T: Send + 'static,
        F: FnMut(&T) -> bool + Send + 'static,
    {
        EagerStage::new(async move {
            let mut values = stage.values.await?;
            values.retain(predicate);
            Ok(values)
        })
    }

    fn flat_map<T, U, F>(&self, stage: EagerStage<T>, f: F) -> EagerStage<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> Vec<U> + Send + 'static,
    {
        EagerStage::new(async move { Ok(stage.values.await?.into_iter().flat_map(f).collect()) })
    }

    fn merge_map<T, U, F>(&self, stage: EagerStage<T>, mut f: F) -> EagerStage<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> EagerStage<U> + Send + 'static,
    {
        EagerStage::new(async move {
            let mut result = Vec::new();
            for value in stage.values.await? {
                result.extend(f(value).values.await?);
            }
            Ok(result)
        })
    }

    fn merge<T: Send + 'static>(&self, stages: Vec<EagerStage<T>>) -> EagerStage<T> {
        EagerStage::new(async move {
            let mut result = Vec::new();
            for stage in stages {
                result.extend(stage.values.await?);
            }
            Ok(result)
        })
    }

    fn reduce<T, A, F>(&self, stage: EagerStage<T>, initial: A, f: F) -> EagerStage<A>
    where
        T: Send + 'static,
        A: Send + 'static,
        F: FnMut(A, T) -> A + Send + 'static,
    {
        EagerStage::new(async move { Ok(vec![stage.values.await?.into_iter().fold(initial, f)]) })
    }

    fn buffer_count<T: Send + 'static>(
        &self,
        stage: EagerStage<T>,
        size: usize,
    ) -> EagerStage<Vec<T>> {
        let size = size.max(1);
        EagerStage::new(async move {
            let mut values = stage.values.await?.into_iter().peekable();
            let mut batches = Vec::new();
            while values.peek().is_some() {
                batches.push(values.by_ref().take(size).collect());
            }
            Ok(batches)
        })
    }

    fn skip<T: Send + 'static>(&self, stage: EagerStage<T>, count: usize) -> EagerStage<T> {
        EagerStage::new(async move { Ok(stage.values.await?.into_iter().skip(count).collect()) })
    }

    fn limit<T: Send + 'static>(&self, stage: EagerStage<T>, count: usize) -> EagerStage<T> {
        EagerStage::new(async move {
            let mut values = stage.values.await?;
            values.truncate(count);
            Ok(values)
        })
    }

    fn default_values<T: Send + 'static>(
        &self,
        stage: EagerStage<T>,
        values: Vec<T>,
    ) -> EagerStage<T> {
        EagerStage::new(async move {
            let result = stage.values.await?;
            Ok(if result.is_empty() { values } else { result })
        })
    }

    fn catch<T, F>(&self, stage: EagerStage<T>, handler: F) -> EagerStage<T>
    where
        T: Send + 'static,
        F: FnOnce(StageError) -> EagerStage<T> + Send + 'static,
    {
        EagerStage::new(async move {
            match stage.values.await {
                Ok(values) => Ok(values),
                Err(error) => handler(error).values.await,
            }
        })
    }

    fn finalize<T, F>(&self, stage: EagerStage<T>, callback: F) -> EagerStage<T>
    where
        T: Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        EagerStage::new(async move {
            let result = stage.values.await;
            callback();
            result
        })
    }

    fn end_with<T: Send + 'static>(&self, stage: EagerStage<T>, values: Vec<T>) -> EagerStage<T> {
        EagerStage::new(async move {
            let mut result = stage.values.await?;
            result.extend(values);
            Ok(result)
        })
    }
}
