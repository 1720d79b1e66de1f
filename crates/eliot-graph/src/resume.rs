//! `ResumeQueue` — timed hand-offs of control the driver polls each tick.
//!
//! Host code that wants "wait N seconds, then continue at node X" schedules
//! X here instead of suspending anything.  At the start of every
//! [`BehaviourCore::tick`][crate::BehaviourCore::tick] the driver drains the
//! entries whose time has come and makes each one the active component in
//! turn (so the last due entry wins).

use eliot_core::NodeId;

/// Time-ordered queue of pending control hand-offs.
///
/// Entries with equal times keep their insertion order.
#[derive(Default, Debug)]
pub struct ResumeQueue {
    entries: Vec<(f64, NodeId)>,
}

impl ResumeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `node` to take control once the clock reaches `at`.
    pub fn push(&mut self, at: f64, node: NodeId) {
        let pos = self.entries.partition_point(|(t, _)| *t <= at);
        self.entries.insert(pos, (at, node));
    }

    /// Remove and return every node due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<NodeId> {
        let due = self.entries.partition_point(|(t, _)| *t <= now);
        self.entries.drain(..due).map(|(_, node)| node).collect()
    }

    /// The earliest scheduled time, or `None` if empty.
    pub fn next_due(&self) -> Option<f64> {
        self.entries.first().map(|(t, _)| *t)
    }

    /// Drop every pending entry for `node`; returns how many were removed.
    pub fn cancel(&mut self, node: NodeId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, n)| *n != node);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
