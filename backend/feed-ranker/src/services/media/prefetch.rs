// ============================================
// Prefetch Coordinator
// ============================================
//
// On every focus change, fetch media for the next `lookahead` items:
//
//   for d in 1..=lookahead:
//       ref = stories[focus + d]
//       skip if absent or already cached
//       fetch(ref); on success cache.put(ref)
//
// Fetches inside one sweep run one after another. Sweeps themselves are
// spawned and never awaited by the caller.
//
// Every focus()/update_stories() bumps a generation counter. A sweep
// remembers the generation it was started with and stops as soon as a
// newer one exists, discarding any fetch that completed late. Rapid
// scrolling therefore leaves at most one sweep doing useful work.

use super::cache::{SharedMediaCache, DEFAULT_ENTRY_BYTES};
use super::MediaFetcher;
use crate::config::MediaConfig;
use crate::models::CandidateItem;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Result of one sweep, mostly for tests and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub generation: u64,
    /// Focus index the sweep started from
    pub focus: usize,
    /// References fetched and registered in the cache
    pub fetched: Vec<String>,
    /// Already resident, not fetched
    pub skipped: usize,
    pub failed: usize,
    /// Sweep stopped because a newer generation started
    pub superseded: bool,
}

#[derive(Debug, Default)]
struct FeedPosition {
    media_refs: Vec<String>,
    focus: usize,
}

pub struct PrefetchCoordinator {
    fetcher: Arc<dyn MediaFetcher>,
    cache: SharedMediaCache,
    lookahead: usize,
    position: Mutex<FeedPosition>,
    generation: Arc<AtomicU64>,
}

impl PrefetchCoordinator {
    pub const DEFAULT_LOOKAHEAD: usize = 3;

    pub fn new(fetcher: Arc<dyn MediaFetcher>, cache: SharedMediaCache) -> Self {
        Self {
            fetcher,
            cache,
            lookahead: Self::DEFAULT_LOOKAHEAD,
            position: Mutex::new(FeedPosition::default()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Coordinator with its own cache, sized and tuned from config.
    pub fn from_config(config: &MediaConfig, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self::new(fetcher, SharedMediaCache::new(config.cache_max_bytes))
            .with_lookahead(config.lookahead)
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn cache(&self) -> &SharedMediaCache {
        &self.cache
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn focus_index(&self) -> usize {
        self.position.lock().focus
    }

    /// Replace the held list and sweep from the current focus.
    pub fn update_stories(&self, stories: &[CandidateItem]) -> JoinHandle<SweepOutcome> {
        let (outcome, targets) = {
            let mut position = self.position.lock();
            position.media_refs = stories.iter().map(|s| s.media_ref.clone()).collect();
            self.start_sweep(&position)
        };
        self.dispatch(outcome, targets)
    }

    /// Move focus to `index` and sweep ahead of it.
    pub fn focus(&self, index: usize) -> JoinHandle<SweepOutcome> {
        let (outcome, targets) = {
            let mut position = self.position.lock();
            position.focus = index;
            self.start_sweep(&position)
        };
        self.dispatch(outcome, targets)
    }

    fn targets(&self, position: &FeedPosition) -> Vec<String> {
        (1..=self.lookahead)
            .filter_map(|d| position.focus.checked_add(d))
            .filter_map(|idx| position.media_refs.get(idx).cloned())
            .collect()
    }

    /// Takes the guard so generation order always matches the order in
    /// which position changes were applied.
    fn start_sweep(&self, position: &FeedPosition) -> (SweepOutcome, Vec<String>) {
        let outcome = SweepOutcome {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            focus: position.focus,
            ..Default::default()
        };
        (outcome, self.targets(position))
    }

    fn dispatch(&self, mut outcome: SweepOutcome, targets: Vec<String>) -> JoinHandle<SweepOutcome> {
        let generation = outcome.generation;
        let current = Arc::clone(&self.generation);
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();

        tokio::spawn(async move {
            for media_ref in targets {
                if current.load(Ordering::SeqCst) != generation {
                    outcome.superseded = true;
                    break;
                }

                if cache.has(&media_ref) {
                    outcome.skipped += 1;
                    continue;
                }

                let result = fetcher.fetch(&media_ref).await;

                if current.load(Ordering::SeqCst) != generation {
                    debug!(media_ref = %media_ref, "Discarding prefetch from superseded sweep");
                    outcome.superseded = true;
                    break;
                }

                match result {
                    Ok(()) => {
                        cache.put(&media_ref, DEFAULT_ENTRY_BYTES);
                        outcome.fetched.push(media_ref);
                    }
                    Err(e) => {
                        debug!(media_ref = %media_ref, error = %e, "Prefetch failed");
                        outcome.failed += 1;
                    }
                }
            }

            outcome
        })
    }
}
