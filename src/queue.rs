use std::collections::VecDeque;

use crate::reference::BindingId;

/// FIFO queue of pending bindings. A binding is queued at most once at a time.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    queue: VecDeque<BindingId>,
    queued: Vec<bool>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `b` unless it is already pending. Return whether it was added.
    pub fn push(&mut self, b: BindingId) -> bool {
        let i = b.index();
        if i >= self.queued.len() {
            self.queued.resize(i + 1, false);
        }
        if self.queued[i] {
            return false;
        }
        self.queued[i] = true;
        self.queue.push_back(b);
        true
    }

    pub fn pop(&mut self) -> Option<BindingId> {
        let b = self.queue.pop_front()?;
        self.queued[b.index()] = false;
        Some(b)
    }

    pub fn contains(&self, b: BindingId) -> bool {
        self.queued.get(b.index()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BindingId> + '_ {
        self.queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_with_dedup() {
        let mut q = WorkQueue::new();
        let (a, b, c) = (BindingId::new(0), BindingId::new(5), BindingId::new(2));
        assert!(q.push(a));
        assert!(q.push(b));
        assert!(!q.push(a));
        assert!(q.push(c));
        assert_eq!(q.len(), 3);
        assert!(q.contains(b));

        assert_eq!(q.pop(), Some(a));
        assert!(!q.contains(a));
        assert!(q.push(a));
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![b, c, a]);
    }
}
