//! Counters and the status board they are reported from.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::status::{CounterDelta, ProgressSource, StatusUpdate};

/// Named, monotonically increasing task metric.
#[derive(Debug)]
pub struct Counter {
    group: String,
    name: String,
    value: AtomicU64,
}

impl Counter {
    fn new(group: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            value: AtomicU64::new(0),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn increase(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment(&self) {
        self.increase(1);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.group, self.name, self.get())
    }
}

/// Counter table plus the progress/status fields, all behind one lock.
///
/// `counters` keeps insertion order; `last_reported[i]` is the value of
/// `counters[i]` at the previous snapshot.
#[derive(Default)]
pub(crate) struct StatusBoard {
    index: HashMap<String, HashMap<String, usize>>,
    counters: Vec<Arc<Counter>>,
    last_reported: Vec<u64>,
    progress_source: Option<Arc<dyn ProgressSource>>,
    last_progress: f32,
    pending_status: String,
}

impl StatusBoard {
    pub(crate) fn counter(&mut self, group: &str, name: &str) -> Arc<Counter> {
        if let Some(&slot) = self.index.get(group).and_then(|names| names.get(name)) {
            return Arc::clone(&self.counters[slot]);
        }
        let counter = Arc::new(Counter::new(group, name));
        self.index
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), self.counters.len());
        self.counters.push(Arc::clone(&counter));
        self.last_reported.push(0);
        counter
    }

    pub(crate) fn counter_count(&self) -> usize {
        self.counters.len()
    }

    pub(crate) fn set_progress(&mut self, progress: f32) {
        self.last_progress = progress;
    }

    pub(crate) fn set_progress_source(&mut self, source: Option<Arc<dyn ProgressSource>>) {
        self.progress_source = source;
    }

    /// Polls the progress source, if any, and remembers the answer.
    pub(crate) fn progress(&mut self) -> f32 {
        if let Some(source) = &self.progress_source {
            self.last_progress = source.progress();
        }
        self.last_progress
    }

    pub(crate) fn set_status(&mut self, status: String) {
        self.pending_status = status;
    }

    /// Builds the next snapshot: clears the pending status and advances every
    /// counter's last reported value.
    pub(crate) fn take_update(&mut self) -> StatusUpdate {
        let progress = self.progress();
        let status = std::mem::take(&mut self.pending_status);
        let counters = self
            .counters
            .iter()
            .zip(self.last_reported.iter_mut())
            .map(|(counter, last)| {
                let current = counter.get();
                let delta = current.wrapping_sub(*last) as i64;
                *last = current;
                CounterDelta {
                    group: counter.group().to_string(),
                    name: counter.name().to_string(),
                    delta,
                }
            })
            .collect();
        StatusUpdate {
            progress,
            status,
            counters,
        }
    }

    /// Forgets every counter. Handles already given out keep working but are
    /// no longer reported.
    pub(crate) fn clear_counters(&mut self) {
        self.index.clear();
        self.counters.clear();
        self.last_reported.clear();
    }
}
