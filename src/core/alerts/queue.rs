use super::model::{AlertRequest, Priority};

/// Pending alert requests, served last-in first-out.
///
/// Only the engine mutates it.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Vec<AlertRequest>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: AlertRequest) {
        self.entries.push(request);
    }

    /// Take the most recently pushed request.
    pub fn pop(&mut self) -> Option<AlertRequest> {
        self.entries.pop()
    }

    /// Drop every entry that is not `High`. Returns how many were dropped.
    pub fn retain_high(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|request| request.priority == Priority::High);
        before - self.entries.len()
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from the bottom of the stack to the next one to be served.
    pub fn iter(&self) -> impl Iterator<Item = &AlertRequest> {
        self.entries.iter()
    }
}
