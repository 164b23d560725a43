//! Anchor centers for a multi-stride feature pyramid.
//!
//! Anchors are laid out row by row, column by column, with `num_anchors`
//! identical copies of `(col * stride, row * stride)` per grid cell. They are
//! stored flat as `[x0, y0, x1, y1, ...]`.
//!
//! [`AnchorCache`] shares generated grids between detectors and threads and
//! drops a grid after it has not been used for a while.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::{Duration, Instant};

use log::debug;

use crate::shared::constants::DEFAULT_ANCHOR_SLIDING_EXPIRATION;
use crate::shared::geometry::{PointF, Size};

/// Number of anchors for one stride.
pub fn anchor_count(input_size: Size, stride: u32, num_anchors: usize) -> usize {
    assert!(stride > 0, "stride must be positive");
    (input_size.height / stride) as usize * (input_size.width / stride) as usize * num_anchors
}

pub fn generate_anchor_centers(input_size: Size, stride: u32, num_anchors: usize) -> Vec<f32> {
    let mut centers = Vec::with_capacity(anchor_count(input_size, stride, num_anchors) * 2);
    let rows = input_size.height / stride;
    let cols = input_size.width / stride;
    for row in 0..rows {
        let y = (row * stride) as f32;
        for col in 0..cols {
            let x = (col * stride) as f32;
            for _ in 0..num_anchors {
                centers.push(x);
                centers.push(y);
            }
        }
    }
    centers
}

/// Center of anchor `index` without materializing the grid. Agrees exactly
/// with element `index` of [`generate_anchor_centers`].
pub fn anchor_center(input_size: Size, stride: u32, num_anchors: usize, index: usize) -> PointF {
    assert!(stride > 0 && num_anchors > 0, "stride and anchor count must be positive");
    let cols = (input_size.width / stride) as usize;
    let per_row = cols * num_anchors;
    let row = index / per_row;
    let col = (index % per_row) / num_anchors;
    PointF::new((col as u32 * stride) as f32, (row as u32 * stride) as f32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnchorKey {
    pub input_size: Size,
    pub stride: u32,
    pub num_anchors: usize,
}

impl AnchorKey {
    pub fn new(input_size: Size, stride: u32, num_anchors: usize) -> Self {
        Self {
            input_size,
            stride,
            num_anchors,
        }
    }
}

struct CacheEntry {
    anchors: Arc<[f32]>,
    last_access_ms: AtomicU64,
}

/// Thread-safe anchor cache with per-entry sliding expiration.
///
/// Hits only take the read lock; an entry's access time is refreshed
/// atomically. Misses take the write lock, which also evicts stale entries.
pub struct AnchorCache {
    entries: RwLock<HashMap<AnchorKey, CacheEntry>>,
    sliding_expiration: Duration,
    epoch: Instant,
}

impl Default for AnchorCache {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR_SLIDING_EXPIRATION)
    }
}

impl AnchorCache {
    pub fn new(sliding_expiration: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            sliding_expiration,
            epoch: Instant::now(),
        }
    }

    /// Process-wide cache with the default expiration.
    pub fn global() -> Arc<AnchorCache> {
        static GLOBAL: OnceLock<Arc<AnchorCache>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(AnchorCache::default()))
            .clone()
    }

    pub fn get_or_create(&self, key: AnchorKey) -> Arc<[f32]> {
        let now = self.now_ms();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                if !self.is_expired(entry, now) {
                    entry.last_access_ms.store(now, Ordering::Relaxed);
                    return Arc::clone(&entry.anchors);
                }
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| !self.is_expired(e, now));
        let entry = entries.entry(key).or_insert_with(|| {
            let anchors: Arc<[f32]> =
                generate_anchor_centers(key.input_size, key.stride, key.num_anchors).into();
            debug!(
                "Generated {} anchors for {} at stride {}",
                anchors.len() / 2,
                key.input_size,
                key.stride
            );
            CacheEntry {
                anchors,
                last_access_ms: AtomicU64::new(now),
            }
        });
        entry.last_access_ms.store(now, Ordering::Relaxed);
        Arc::clone(&entry.anchors)
    }

    /// Drop every entry whose sliding window has elapsed.
    pub fn purge_expired(&self) {
        let now = self.now_ms();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| !self.is_expired(e, now));
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        let idle = now.saturating_sub(entry.last_access_ms.load(Ordering::Relaxed));
        idle > self.sliding_expiration.as_millis() as u64
    }
}
