use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Viewers waiting for an offer from a broadcaster that is not capturing yet.
///
/// FIFO, and an id that is already waiting is not queued twice. Draining swaps
/// the whole queue out, so anything enqueued afterwards lands in a fresh queue
/// for the next drain.
#[derive(Debug)]
pub struct PendingOfferQueue<T> {
    order: VecDeque<T>,
    queued: HashSet<T>,
}

impl<T> Default for PendingOfferQueue<T> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            queued: HashSet::new(),
        }
    }
}

impl<T> PendingOfferQueue<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the id was already waiting.
    pub fn enqueue(&mut self, id: T) -> bool {
        if !self.queued.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);
        true
    }

    pub fn drain_all(&mut self) -> Vec<T> {
        self.queued.clear();
        std::mem::take(&mut self.order).into()
    }

    pub fn remove(&mut self, id: &T) -> bool {
        if !self.queued.remove(id) {
            return false;
        }
        self.order.retain(|queued| queued != id);
        true
    }

    pub fn contains(&self, id: &T) -> bool {
        self.queued.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
