//! Latest-request-wins bookkeeping for overlapping searches.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out increasing tickets; only the newest ticket is current.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every ticket issued before it.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}

/// Outcome of a sequenced search.
#[derive(Debug, PartialEq)]
pub enum Sequenced<T> {
    Current(T),
    /// A newer request was issued while this one was in flight.
    Superseded,
}

impl<T> Sequenced<T> {
    pub fn into_current(self) -> Option<T> {
        match self {
            Self::Current(value) => Some(value),
            Self::Superseded => None,
        }
    }
}
