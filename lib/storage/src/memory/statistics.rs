use std::sync::atomic::{AtomicUsize, Ordering};

/// The number of requests a [MemTripleStore](crate::MemTripleStore) has answered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub find_requests: usize,
    pub bgp_requests: usize,
    pub union_requests: usize,
    pub estimate_requests: usize,
}

#[derive(Debug, Default)]
pub(crate) struct RequestCounters {
    find: AtomicUsize,
    bgp: AtomicUsize,
    union: AtomicUsize,
    estimate: AtomicUsize,
}

pub(crate) enum Request {
    Find,
    Bgp,
    Union,
    Estimate,
}

impl RequestCounters {
    pub(crate) fn record(&self, request: Request) {
        let counter = match request {
            Request::Find => &self.find,
            Request::Bgp => &self.bgp,
            Request::Union => &self.union,
            Request::Estimate => &self.estimate,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StoreStatistics {
        StoreStatistics {
            find_requests: self.find.load(Ordering::Relaxed),
            bgp_requests: self.bgp.load(Ordering::Relaxed),
            union_requests: self.union.load(Ordering::Relaxed),
            estimate_requests: self.estimate.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [&self.find, &self.bgp, &self.union, &self.estimate] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
