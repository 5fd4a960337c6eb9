use crate::{Emitter, Replayable, StageError, StageResult};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt, TryStreamExt};
use rustc_hash::FxHashSet;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

/// A stream of values that may terminate with an error.
///
/// This is the common exchange format between the engines and the components that perform
/// external I/O (e.g., a triple store).
pub type ValueStream<T> = BoxStream<'static, StageResult<T>>;

/// Builds and transforms [StageEngine::Stage]s.
///
/// Every method consumes its input stages and returns a new stage. Nothing is computed until the
/// resulting stage is consumed via [StageEngine::into_stream], [StageEngine::subscribe], or
/// [StageEngine::to_vec].
///
/// # Contract
///
/// - A successful stage signals its completion exactly once.
/// - An error terminates the stage. No value is emitted after the error.
/// - [StageEngine::merge] and [StageEngine::merge_map] do not guarantee any order between the
///   merged branches beyond what the engine documents.
/// - Consuming a stage twice is impossible as consumption takes ownership. Use
///   [StageEngine::replayable] to share a stage between several consumers.
pub trait StageEngine: Clone + Debug + Send + Sync + 'static {
    /// The stage representation of this engine.
    type Stage<T: Send + 'static>: Send + 'static;

    /// Returns a short name of the engine, used for diagnostics.
    fn name(&self) -> &'static str;

    //
    // Construction
    //

    /// Creates a stage that completes without values.
    fn empty<T: Send + 'static>(&self) -> Self::Stage<T>;

    /// Creates a stage that emits `values` in order.
    fn of<T: Send + 'static>(&self, values: Vec<T>) -> Self::Stage<T>;

    /// Creates a stage that immediately fails with `error`.
    fn fail<T: Send + 'static>(&self, error: StageError) -> Self::Stage<T>;

    /// Creates a stage from an external stream (e.g., the result of a store lookup).
    fn from_stream<T: Send + 'static>(&self, stream: ValueStream<T>) -> Self::Stage<T>;

    /// Creates a stage that emits the single result of `future`.
    fn from_future<T, F>(&self, future: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        F: Future<Output = StageResult<T>> + Send + 'static;

    /// Creates a stage whose values are pushed by `producer`.
    ///
    /// The producer is invoked once the stage is consumed. It may move the [Emitter] elsewhere
    /// (e.g., into a spawned task) to push values asynchronously.
    fn create<T, F>(&self, producer: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        F: FnOnce(Emitter<T>) + Send + 'static;

    //
    // Consumption
    //

    /// Converts `stage` into a stream that can be iterated.
    fn into_stream<T: Send + 'static>(&self, stage: Self::Stage<T>) -> ValueStream<T>;

    /// Consumes `stage` and reports every signal to the given callbacks.
    ///
    /// Exactly one of `on_error` and `on_complete` is called.
    fn subscribe<T, N, E, C>(
        &self,
        stage: Self::Stage<T>,
        mut on_next: N,
        on_error: E,
        on_complete: C,
    ) -> BoxFuture<'static, ()>
    where
        T: Send + 'static,
        N: FnMut(T) + Send + 'static,
        E: FnOnce(StageError) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let mut stream = self.into_stream(stage);
        async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(value) => on_next(value),
                    Err(error) => {
                        on_error(error);
                        return;
                    }
                }
            }
            on_complete();
        }
        .boxed()
    }

    /// Consumes `stage` and collects all values.
    fn to_vec<T: Send + 'static>(
        &self,
        stage: Self::Stage<T>,
    ) -> BoxFuture<'static, StageResult<Vec<T>>> {
        self.into_stream(stage).try_collect().boxed()
    }

    //
    // Operators
    //

    /// Applies `f` to every value.
    fn map<T, U, F>(&self, stage: Self::Stage<T>, f: F) -> Self::Stage<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static;

    /// Retains the values for which `predicate` returns `true`.
    fn filter<T, F>(&self, stage: Self::Stage<T>, predicate: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        F: FnMut(&T) -> bool + Send + 'static;

    /// Replaces every value with the values returned by `f`.
    fn flat_map<T, U, F>(&self, stage: Self::Stage<T>, f: F) -> Self::Stage<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> Vec<U> + Send + 'static;

    /// Replaces every value with the stage returned by `f` and merges all of these stages.
    fn merge_map<T, U, F>(&self, stage: Self::Stage<T>, f: F) -> Self::Stage<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> Self::Stage<U> + Send + 'static;

    /// Merges the values of all `stages` into one stage.
    fn merge<T: Send + 'static>(&self, stages: Vec<Self::Stage<T>>) -> Self::Stage<T>;

    /// Folds all values into a single value that is emitted on completion.
    fn reduce<T, A, F>(&self, stage: Self::Stage<T>, initial: A, f: F) -> Self::Stage<A>
    where
        T: Send + 'static,
        A: Send + 'static,
        F: FnMut(A, T) -> A + Send + 'static;

    /// Gathers all values into a single [Vec].
    fn collect<T: Send + 'static>(&self, stage: Self::Stage<T>) -> Self::Stage<Vec<T>> {
        self.reduce(stage, Vec::new(), |mut values, value| {
            values.push(value);
            values
        })
    }

    /// Groups the values into batches of `size` values. The last batch may be smaller.
    ///
    /// A `size` of zero is treated as one.
    fn buffer_count<T: Send + 'static>(
        &self,
        stage: Self::Stage<T>,
        size: usize,
    ) -> Self::Stage<Vec<T>>;

    /// Removes values whose key (computed by `key`) has already been seen.
    fn distinct<T, K, F>(&self, stage: Self::Stage<T>, mut key: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        K: Eq + Hash + Send + 'static,
        F: FnMut(&T) -> K + Send + 'static,
    {
        let mut seen = FxHashSet::default();
        self.filter(stage, move |value| seen.insert(key(value)))
    }

    /// Drops the first `count` values.
    fn skip<T: Send + 'static>(&self, stage: Self::Stage<T>, count: usize) -> Self::Stage<T>;

    /// Emits at most `count` values.
    fn limit<T: Send + 'static>(&self, stage: Self::Stage<T>, count: usize) -> Self::Stage<T>;

    /// Emits only the first value.
    fn first<T: Send + 'static>(&self, stage: Self::Stage<T>) -> Self::Stage<T> {
        self.limit(stage, 1)
    }

    /// Emits `values` instead if `stage` completes without any value.
    fn default_values<T: Send + 'static>(
        &self,
        stage: Self::Stage<T>,
        values: Vec<T>,
    ) -> Self::Stage<T>;

    /// Calls `f` for every value without changing the stage.
    fn tap<T, F>(&self, stage: Self::Stage<T>, mut f: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        F: FnMut(&T) + Send + 'static,
    {
        self.map(stage, move |value| {
            f(&value);
            value
        })
    }

    /// Continues with the stage returned by `handler` if `stage` fails.
    fn catch<T, F>(&self, stage: Self::Stage<T>, handler: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        F: FnOnce(StageError) -> Self::Stage<T> + Send + 'static;

    /// Calls `callback` once the stage completed or failed.
    ///
    /// The [StreamingEngine](crate::StreamingEngine) also calls it if a partially consumed stage
    /// is dropped.
    fn finalize<T, F>(&self, stage: Self::Stage<T>, callback: F) -> Self::Stage<T>
    where
        T: Send + 'static,
        F: FnOnce() + Send + 'static;

    /// Emits `values` after `stage` completed successfully.
    fn end_with<T: Send + 'static>(
        &self,
        stage: Self::Stage<T>,
        values: Vec<T>,
    ) -> Self::Stage<T>;

    //
    // Sharing
    //

    /// Buffers `stage` such that it can be consumed by several downstream branches while its
    /// producer only runs once.
    fn replayable<T>(&self, stage: Self::Stage<T>) -> Replayable<T>
    where
        T: Clone + Send + 'static,
    {
        Replayable::new(self.into_stream(stage))
    }

    /// Creates a new stage that emits every value of `replayable` from the beginning.
    fn replay<T>(&self, replayable: &Replayable<T>) -> Self::Stage<T>
    where
        T: Clone + Send + 'static,
    {
        self.from_stream(replayable.stream())
    }
}
