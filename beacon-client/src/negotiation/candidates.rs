use serde_json::Value;
use std::collections::VecDeque;
use tracing::warn;

pub const DEFAULT_CANDIDATE_CAPACITY: usize = 64;

/// Remote ICE candidates that arrived before the remote description was
/// applied. Bounded; the oldest candidate goes first when full.
#[derive(Debug)]
pub struct CandidateBuffer {
    pending: VecDeque<Value>,
    capacity: usize,
    remote_applied: bool,
    dropped: u64,
}

impl Default for CandidateBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_CAPACITY)
    }
}

impl CandidateBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
            remote_applied: false,
            dropped: 0,
        }
    }

    /// Returns the candidate back when it can be applied right away.
    pub fn push(&mut self, candidate: Value) -> Option<Value> {
        if self.remote_applied {
            return Some(candidate);
        }

        if self.pending.len() >= self.capacity {
            self.pending.pop_front();
            self.dropped += 1;
            warn!(dropped = self.dropped, "Candidate buffer full, dropping oldest");
        }
        self.pending.push_back(candidate);
        None
    }

    /// Marks the remote description as applied and hands back everything held,
    /// in arrival order.
    pub fn mark_remote_applied(&mut self) -> Vec<Value> {
        self.remote_applied = true;
        self.pending.drain(..).collect()
    }

    /// A new remote description is coming; hold candidates again.
    pub fn expect_remote(&mut self) {
        self.remote_applied = false;
    }

    pub fn is_remote_applied(&self) -> bool {
        self.remote_applied
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
