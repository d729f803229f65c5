//! Bounded recency sets for duplicate suppression.

use crate::AlertRecord;
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Number of hex characters kept from a content hash.
const CONTENT_HASH_LEN: usize = 16;

/// Identity of an alert for duplicate suppression.
///
/// Socket alerts key on `(alert_id, fire_time)`; everything else
/// keys on a truncated content hash of the message text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn socket(alert_id: i64, fire_time: i64) -> Self {
        Self(format!("{}:{}", alert_id, fire_time))
    }

    pub fn content(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(CONTENT_HASH_LEN);
        Self(hex)
    }

    pub fn for_alert(record: &AlertRecord) -> Self {
        match &record.socket {
            Some(meta) => Self::socket(meta.alert_id, meta.fire_time),
            None => Self::content(&record.message),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bounded insertion-ordered set.
///
/// `admit` returns true the first time a key is seen; false
/// thereafter. Once the set grows past its capacity, the
/// insertion-oldest entry is evicted, so an evicted key can later be
/// re-admitted. That reprocess is accepted imprecision, not a bug.
/// There is no TTL.
#[derive(Debug)]
pub struct SeenWindow<T: Eq + Hash + Clone> {
    entries: HashSet<T>,
    order: VecDeque<T>,
    capacity: usize,
}

impl<T: Eq + Hash + Clone> SeenWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashSet::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record a key. Returns true if the key was not already present
    /// (the caller should process the item), false if it is a repeat.
    pub fn admit(&mut self, key: T) -> bool {
        if self.entries.contains(&key) {
            return false;
        }
        self.entries.insert(key.clone());
        self.order.push_back(key);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
