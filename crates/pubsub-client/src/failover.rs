//! # Failover Collaborator
//!
//! Owns the region cursor: which region is active and what the candidate
//! order is. Only this collaborator mutates the cursor; the poller and
//! backend read it. Keeping the trip heuristic behind a trait lets it be
//! tested in isolation from the polling loop.

use crate::config::Region;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use tracing::info;

/// The failover seam the poller consumes.
pub trait FailoverPolicy: Send + Sync {
    /// The currently active region.
    fn current_region(&self) -> Region;

    /// Record a successful backend interaction in the current region.
    fn record_success(&self);

    /// Record a failed backend interaction in the current region.
    fn record_failure(&self);

    /// Move to the next candidate region and return it.
    fn advance(&self) -> Region;

    /// Consecutive failures since the last success.
    fn consecutive_failures(&self) -> u32;
}

/// Sequential wraparound cursor over an ordered region list.
///
/// The cursor never exhausts: advancing past the last candidate wraps to
/// the first, so the polling loop can retry indefinitely rather than
/// terminate when every region has failed once.
#[derive(Debug)]
pub struct RegionCursor {
    regions: Vec<Region>,
    index: AtomicUsize,
    consecutive_failures: AtomicU32,
}

impl RegionCursor {
    /// Build a cursor over a non-empty candidate list.
    ///
    /// # Panics
    ///
    /// Panics if `regions` is empty; `ClientConfig::validate` rejects
    /// that before a cursor is ever built.
    #[must_use]
    pub fn new(regions: Vec<Region>) -> Self {
        assert!(!regions.is_empty(), "region list must not be empty");
        Self {
            regions,
            index: AtomicUsize::new(0),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// The ordered candidate list.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl FailoverPolicy for RegionCursor {
    fn current_region(&self) -> Region {
        let index = self.index.load(Ordering::Relaxed) % self.regions.len();
        self.regions[index].clone()
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn advance(&self) -> Region {
        let previous = self.current_region();
        self.index.fetch_add(1, Ordering::Relaxed);
        let next = self.current_region();

        info!(from = %previous, to = %next, "Advancing to next region");
        next
    }

    fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}
