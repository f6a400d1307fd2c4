//! Learned per-(group, hour) dimmer baselines.
//!
//! The map is immutable once published. `BaselineCache` holds the current map
//! behind an `ArcSwap`, so the corrector always reads either the previous map
//! or the complete new one. `rebuild` recomputes baselines from history,
//! writes only rows that are new or different, then publishes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Timelike, Utc};
use lumen_traits::{BaselineEntry, GroupName, HistoricalRecord, HistoryStore};

use crate::error::CoreError;
use crate::percentile::percentile;

/// Hour-of-day (0..=23, UTC) of a timestamp.
#[inline]
pub fn hour_bucket(at: DateTime<Utc>) -> u8 {
    // hour() is always < 24
    at.hour() as u8
}

/// Immutable `(group, hour) -> dimmer` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaselineMap {
    values: HashMap<(GroupName, u8), u8>,
}

impl BaselineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I: IntoIterator<Item = BaselineEntry>>(entries: I) -> Self {
        let mut map = Self::new();
        for e in entries {
            map.insert(e.group, e.hour, e.value);
        }
        map
    }

    pub fn get(&self, group: &GroupName, hour: u8) -> Option<u8> {
        self.values.get(&(group.clone(), hour)).copied()
    }

    pub fn insert(&mut self, group: GroupName, hour: u8, value: u8) -> Option<u8> {
        self.values.insert((group, hour), value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries sorted by group, then hour.
    pub fn entries(&self) -> Vec<BaselineEntry> {
        let mut out: Vec<BaselineEntry> = self
            .values
            .iter()
            .map(|((group, hour), value)| BaselineEntry {
                group: group.clone(),
                hour: *hour,
                value: *value,
            })
            .collect();
        out.sort_by(|a, b| a.group.cmp(&b.group).then(a.hour.cmp(&b.hour)));
        out
    }
}

/// Shared, atomically replaced baseline map.
#[derive(Debug)]
pub struct BaselineCache {
    current: ArcSwap<BaselineMap>,
}

impl Default for BaselineCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::from_map(BaselineMap::new())
    }

    pub fn from_map(map: BaselineMap) -> Self {
        Self {
            current: ArcSwap::from_pointee(map),
        }
    }

    /// Build a cache from the durable baseline table.
    pub fn load(store: &dyn HistoryStore) -> Result<Self, CoreError> {
        let rows = store
            .load_baselines()
            .map_err(|e| CoreError::Store(e.to_string()))?;
        let map = BaselineMap::from_entries(rows);
        tracing::info!(entries = map.len(), "baseline table loaded");
        Ok(Self::from_map(map))
    }

    /// The map as of now. Later publishes do not affect the returned value.
    pub fn snapshot(&self) -> Arc<BaselineMap> {
        self.current.load_full()
    }

    pub fn publish(&self, map: BaselineMap) {
        self.current.store(Arc::new(map));
    }

    pub fn lookup(&self, group: &GroupName, hour: u8) -> Option<u8> {
        self.current.load().get(group, hour)
    }
}

/// Per-bucket percentile over the dimmer values of `records`.
pub fn compute_baselines(records: &[HistoricalRecord], p: f64) -> Result<BaselineMap, CoreError> {
    let mut buckets: BTreeMap<(GroupName, u8), Vec<i64>> = BTreeMap::new();
    for r in records {
        buckets
            .entry((r.group_name.clone(), hour_bucket(r.observed_at)))
            .or_default()
            .push(i64::from(r.dimmer));
    }
    let mut map = BaselineMap::new();
    for ((group, hour), samples) in buckets {
        let value = percentile(&samples, p)?;
        map.insert(group, hour, value.clamp(0, 255) as u8);
    }
    Ok(map)
}

/// What one rebuild did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub samples: usize,
    pub buckets: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl RebuildReport {
    pub fn writes(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Recompute baselines from records observed after `since` and publish them.
///
/// The published map is the durable table as loaded before the rebuild,
/// overlaid with every bucket that was written successfully (or was already
/// identical). Buckets whose write failed keep their previous value.
pub fn rebuild(
    store: &dyn HistoryStore,
    since: DateTime<Utc>,
    p: f64,
    cache: &BaselineCache,
) -> Result<RebuildReport, CoreError> {
    let records = store
        .select_historical(since)
        .map_err(|e| CoreError::Store(e.to_string()))?;
    let existing = BaselineMap::from_entries(
        store
            .load_baselines()
            .map_err(|e| CoreError::Store(e.to_string()))?,
    );
    let fresh = compute_baselines(&records, p)?;

    let mut report = RebuildReport {
        samples: records.len(),
        buckets: fresh.len(),
        ..RebuildReport::default()
    };
    let mut published = existing.clone();

    for entry in fresh.entries() {
        let old = existing.get(&entry.group, entry.hour);
        if old == Some(entry.value) {
            report.unchanged += 1;
            continue;
        }
        match store.upsert_baseline(&entry) {
            Ok(()) => {
                match old {
                    Some(prev) => {
                        report.updated += 1;
                        tracing::info!(
                            group = %entry.group,
                            hour = entry.hour,
                            old = prev,
                            new = entry.value,
                            "baseline updated"
                        );
                    }
                    None => {
                        report.inserted += 1;
                        tracing::info!(
                            group = %entry.group,
                            hour = entry.hour,
                            value = entry.value,
                            "baseline inserted"
                        );
                    }
                }
                published.insert(entry.group, entry.hour, entry.value);
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(
                    group = %entry.group,
                    hour = entry.hour,
                    error = %e,
                    "failed to store baseline"
                );
            }
        }
    }

    cache.publish(published);
    tracing::info!(
        samples = report.samples,
        buckets = report.buckets,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        failed = report.failed,
        "baseline rebuild finished"
    );
    Ok(report)
}
