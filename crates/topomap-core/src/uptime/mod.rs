//! Per-node liveness tracking
//!
//! Each node id gets an entry on first observation. The entry's `since`
//! timestamp moves only when the observed status flips, so the elapsed time
//! since `since` is how long the node has been up (or down).

use crate::types::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Liveness as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkState {
    Up,
    Down,
    /// No snapshot has mentioned the node yet
    #[default]
    Unknown,
}

impl From<Option<bool>> for LinkState {
    fn from(status: Option<bool>) -> Self {
        match status {
            Some(true) => LinkState::Up,
            Some(false) => LinkState::Down,
            None => LinkState::Unknown,
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkState::Up => "UP",
            LinkState::Down => "DOWN",
            LinkState::Unknown => "UNKNOWN",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeEntry {
    pub status: bool,
    pub since: DateTime<Utc>,
}

/// What an observation did to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First time the node was seen
    Started,
    /// Status flipped; carries the previous status
    Flipped { from: bool },
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct UptimeTracker {
    entries: HashMap<NodeId, UptimeEntry>,
}

impl UptimeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` for `id` as of `now`
    pub fn observe(&mut self, id: &NodeId, status: bool, now: DateTime<Utc>) -> Transition {
        match self.entries.get_mut(id) {
            None => {
                self.entries.insert(id.clone(), UptimeEntry { status, since: now });
                Transition::Started
            }
            Some(entry) if entry.status != status => {
                let from = entry.status;
                entry.status = status;
                entry.since = now;
                tracing::info!(node = %id, from, to = status, "link state changed");
                Transition::Flipped { from }
            }
            Some(_) => Transition::Unchanged,
        }
    }

    #[must_use]
    pub fn entry(&self, id: &NodeId) -> Option<&UptimeEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn state(&self, id: &NodeId) -> LinkState {
        LinkState::from(self.entries.get(id).map(|e| e.status))
    }

    /// Milliseconds since the last flip, `None` if never observed
    #[must_use]
    pub fn elapsed_ms(&self, id: &NodeId, now: DateTime<Utc>) -> Option<i64> {
        self.entries
            .get(id)
            .map(|e| (now - e.since).num_milliseconds())
    }

    /// Human readable time in the current state
    #[must_use]
    pub fn uptime(&self, id: &NodeId, now: DateTime<Utc>) -> Option<String> {
        self.elapsed_ms(id, now).map(format_duration)
    }

    /// Drop the entry of a deleted node
    pub fn forget(&mut self, id: &NodeId) -> Option<UptimeEntry> {
        self.entries.remove(id)
    }

    /// Keep only entries whose id passes `keep`; returns how many were dropped
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&NodeId) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|id, _| keep(id));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!(dropped, "swept uptime entries");
        }
        dropped
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Format elapsed milliseconds, truncating to whole units
///
/// `45s`, `2m 5s`, `2h 5m`, `3d 4h`. Negative input formats as `0s`.
#[must_use]
pub fn format_duration(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m {}s", seconds % 60);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h {}m", minutes % 60);
    }
    format!("{}d {}h", hours / 24, hours % 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn duration_thresholds() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(999), "0s");
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(59_999), "59s");
        assert_eq!(format_duration(60_000), "1m 0s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(7_500_000), "2h 5m");
        assert_eq!(format_duration(86_400_000), "1d 0h");
        assert_eq!(format_duration(100_800_000), "1d 4h");
        assert_eq!(format_duration(-5_000), "0s");
    }

    #[test]
    fn first_observation_starts_clock() {
        let mut tracker = UptimeTracker::new();
        let id = NodeId::from("a");
        assert_eq!(tracker.state(&id), LinkState::Unknown);
        assert_eq!(tracker.observe(&id, true, t0()), Transition::Started);
        assert_eq!(tracker.state(&id), LinkState::Up);
        assert_eq!(tracker.uptime(&id, t0() + Duration::seconds(45)).as_deref(), Some("45s"));
    }

    #[test]
    fn same_status_keeps_since() {
        let mut tracker = UptimeTracker::new();
        let id = NodeId::from("a");
        tracker.observe(&id, true, t0());
        let later = t0() + Duration::minutes(5);
        assert_eq!(tracker.observe(&id, true, later), Transition::Unchanged);
        assert_eq!(tracker.entry(&id).unwrap().since, t0());
    }

    #[test]
    fn flip_resets_since() {
        let mut tracker = UptimeTracker::new();
        let id = NodeId::from("a");
        tracker.observe(&id, true, t0());
        let later = t0() + Duration::minutes(5);
        assert_eq!(tracker.observe(&id, false, later), Transition::Flipped { from: true });
        assert_eq!(tracker.entry(&id).unwrap().since, later);
        assert_eq!(tracker.state(&id), LinkState::Down);
        assert_eq!(tracker.elapsed_ms(&id, later), Some(0));
    }

    #[test]
    fn forget_and_retain_evict_entries() {
        let mut tracker = UptimeTracker::new();
        for id in ["a", "b", "c"] {
            tracker.observe(&NodeId::from(id), true, t0());
        }
        assert!(tracker.forget(&NodeId::from("a")).is_some());
        assert_eq!(tracker.retain(|id| id.as_str() == "b"), 1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.state(&NodeId::from("c")), LinkState::Unknown);
    }

    #[test]
    fn link_state_display() {
        assert_eq!(LinkState::from(Some(true)).to_string(), "UP");
        assert_eq!(LinkState::from(Some(false)).to_string(), "DOWN");
        assert_eq!(LinkState::from(None).to_string(), "UNKNOWN");
    }
}
