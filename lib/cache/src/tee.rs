use crate::{BgpCache, WriterId};
use futures::{Stream, StreamExt};
use rdf_weave_model::{Bgp, Binding};
use rdf_weave_stage::{StageResult, ValueStream};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

impl BgpCache {
    /// Copies every binding of `stream` into the cache entry of `bgp` while passing it on.
    ///
    /// The entry is claimed when the returned stream is first polled, not when it is created.
    /// Building a stage therefore never makes an entry visible to readers. The entry is committed
    /// once `stream` completes. It is deleted if `stream` fails or if the returned stream is
    /// dropped before `stream` completed. If another writer already owns an entry for `bgp` at
    /// the first poll, the bindings are passed on without being cached.
    pub fn tee(
        self: &Arc<Self>,
        bgp: Bgp,
        writer: WriterId,
        stream: ValueStream<Binding>,
    ) -> ValueStream<Binding> {
        self.tee_routed(vec![bgp], writer, stream, |_| Some(0))
    }

    /// Like [BgpCache::tee] but for a stream that carries the solutions of several BGPs.
    ///
    /// `route` returns the position in `bgps` of the BGP a binding belongs to. Bindings that are
    /// not routed to any BGP are only passed on. All entries are committed together once
    /// `stream` completes.
    pub fn tee_routed<R>(
        self: &Arc<Self>,
        bgps: Vec<Bgp>,
        writer: WriterId,
        stream: ValueStream<Binding>,
        route: R,
    ) -> ValueStream<Binding>
    where
        R: Fn(&Binding) -> Option<usize> + Send + 'static,
    {
        CacheTee {
            inner: stream,
            cache: Arc::clone(self),
            writer,
            targets: bgps.into_iter().map(Some).collect(),
            route: Box::new(route),
            state: TeeState::Unclaimed,
        }
        .boxed()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TeeState {
    /// Not polled yet. No entry has been claimed.
    Unclaimed,
    /// Owns at least one entry and records the bindings.
    Writing,
    /// Only forwards the bindings.
    Done,
}

/// Forwards the values of `inner` and records them in the cache until the stream is done.
struct CacheTee {
    inner: ValueStream<Binding>,
    cache: Arc<BgpCache>,
    writer: WriterId,
    /// The BGPs this tee writes to. [None] for BGPs owned by another writer.
    targets: Vec<Option<Bgp>>,
    route: Box<dyn Fn(&Binding) -> Option<usize> + Send>,
    state: TeeState,
}

impl CacheTee {
    fn claim(&mut self) {
        for target in &mut self.targets {
            if let Some(bgp) = target {
                if !self.cache.begin(bgp, self.writer) {
                    tracing::trace!(writer = %self.writer, bgp = %bgp, "Entry is owned by another writer, not caching");
                    *target = None;
                }
            }
        }
        self.state = if self.targets.iter().any(Option::is_some) {
            TeeState::Writing
        } else {
            TeeState::Done
        };
    }

    fn finish(&mut self, commit: bool) {
        self.state = TeeState::Done;
        for bgp in self.targets.iter().flatten() {
            if commit {
                self.cache.commit(bgp, self.writer);
            } else {
                self.cache.delete(bgp, self.writer);
            }
        }
    }
}

impl Stream for CacheTee {
    type Item = StageResult<Binding>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.state == TeeState::Unclaimed {
            this.claim();
        }
        if this.state == TeeState::Done {
            return this.inner.poll_next_unpin(cx);
        }

        let item = ready!(this.inner.poll_next_unpin(cx));
        match &item {
            Some(Ok(binding)) => {
                let target = (this.route)(binding)
                    .and_then(|position| this.targets.get(position))
                    .and_then(Option::as_ref);
                if let Some(bgp) = target {
                    this.cache.update(bgp, binding.clone(), this.writer);
                }
            }
            Some(Err(_)) => this.finish(false),
            None => this.finish(true),
        }
        Poll::Ready(item)
    }
}

impl Drop for CacheTee {
    fn drop(&mut self) {
        if self.state == TeeState::Writing {
            tracing::trace!(writer = %self.writer, "Cached stream dropped before completion");
            self.finish(false);
        }
    }
}
