//! Per-cursor FIFO of pending actions with block grouping.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::action::Action;
use crate::error::{MachinaError, Result};

/// Pending/released action queue owned by one cursor.
///
/// Actions are admitted with [`add`](Self::add) and consumed from the front.
/// Consumed actions are appended to an append-only released history.
/// [`set_block`](Self::set_block) groups every currently pending action that
/// is not yet part of a block into a new block, so that compilers and drivers
/// can consume one block at a time.
#[derive(Debug, Default)]
pub struct ActionBuffer {
    /// Actions waiting to be consumed, ids strictly ascending
    pending: VecDeque<Arc<Action>>,

    /// Every consumed action, in consumption order
    released: Vec<Arc<Action>>,

    /// Sizes of the defined blocks, oldest first
    block_counts: VecDeque<usize>,
}

impl ActionBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action to the back of the pending queue.
    pub fn add(&mut self, action: Arc<Action>) {
        self.pending.push_back(action);
    }

    /// Pop the oldest pending action and move it to the released history.
    pub fn get_next(&mut self) -> Option<Arc<Action>> {
        let action = self.pending.pop_front()?;
        self.consume_block(1);
        self.released.push(Arc::clone(&action));
        Some(action)
    }

    /// Group all pending actions that are not in a block yet into a new block.
    ///
    /// Returns the size of the new block; nothing is recorded for an empty one.
    pub fn set_block(&mut self) -> usize {
        let blocked: usize = self.block_counts.iter().sum();
        let count = self.pending.len().saturating_sub(blocked);
        if count > 0 {
            self.block_counts.push_back(count);
        }
        count
    }

    /// The next block's actions, or every pending action if no block is defined.
    ///
    /// With `flush` the returned actions move to the released history and the
    /// consumed block marker is removed; without it the buffer is untouched.
    pub fn get_block_pending(&mut self, flush: bool) -> Vec<Arc<Action>> {
        let count = match self.block_counts.front() {
            Some(&count) => count.min(self.pending.len()),
            None => self.pending.len(),
        };

        if !flush {
            return self.pending.iter().take(count).cloned().collect();
        }

        let actions: Vec<Arc<Action>> = self.pending.drain(..count).collect();
        if !self.block_counts.is_empty() {
            self.block_counts.pop_front();
        }
        self.released.extend(actions.iter().cloned());
        actions
    }

    /// Consume and return every pending action up to and including `id`.
    ///
    /// Pending ids are assumed ascending. If the scan passes `id` without an
    /// exact match (or runs out of actions) the id sequence is corrupt and
    /// [`MachinaError::ActionIdNotFound`] is returned with the buffer untouched.
    pub fn get_all_up_to_id(&mut self, id: i64) -> Result<Vec<Arc<Action>>> {
        let mut count = 0;
        let mut found = false;
        for action in &self.pending {
            if action.id() > id {
                break;
            }
            count += 1;
            if action.id() == id {
                found = true;
                break;
            }
        }

        if !found {
            return Err(MachinaError::ActionIdNotFound { id });
        }

        let actions: Vec<Arc<Action>> = self.pending.drain(..count).collect();
        self.consume_block(count);
        self.released.extend(actions.iter().cloned());
        Ok(actions)
    }

    /// Discard every pending action and block marker.
    ///
    /// Discarded actions do not enter the released history.
    pub fn flush(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.block_counts.clear();
        discarded
    }

    /// Number of pending actions.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of released actions.
    pub fn released_len(&self) -> usize {
        self.released.len()
    }

    /// Number of blocks not fully consumed yet.
    pub fn block_count(&self) -> usize {
        self.block_counts.len()
    }

    /// Snapshot of the pending queue.
    pub fn pending(&self) -> Vec<Arc<Action>> {
        self.pending.iter().cloned().collect()
    }

    /// Released history, oldest first.
    pub fn released(&self) -> &[Arc<Action>] {
        &self.released
    }

    /// Decrement the head block markers by `count` consumed actions.
    fn consume_block(&mut self, mut count: usize) {
        while count > 0 {
            let Some(head) = self.block_counts.front_mut() else {
                return;
            };
            let taken = count.min(*head);
            *head -= taken;
            count -= taken;
            if *head == 0 {
                self.block_counts.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn action(id: i64) -> Arc<Action> {
        Arc::new(Action::with_id(ActionKind::Wait { millis: id as u64 }, id))
    }

    fn filled(count: i64) -> ActionBuffer {
        let mut buffer = ActionBuffer::new();
        for id in 1..=count {
            buffer.add(action(id));
        }
        buffer
    }

    fn ids(actions: &[Arc<Action>]) -> Vec<i64> {
        actions.iter().map(|a| a.id()).collect()
    }

    #[test]
    fn test_get_next_is_fifo() {
        let mut buffer = filled(3);
        assert_eq!(buffer.get_next().unwrap().id(), 1);
        assert_eq!(buffer.get_next().unwrap().id(), 2);
        assert_eq!(buffer.released_len(), 2);
        assert_eq!(buffer.pending_len(), 1);
    }

    #[test]
    fn test_get_all_up_to_id_ends_with_target() {
        for target in 1..=6 {
            let mut buffer = filled(6);
            let actions = buffer.get_all_up_to_id(target).unwrap();
            assert_eq!(ids(&actions), (1..=target).collect::<Vec<_>>());
            assert_eq!(actions.last().unwrap().id(), target);
            assert_eq!(buffer.pending_len() as i64, 6 - target);
        }
    }

    #[test]
    fn test_get_all_up_to_missing_id_is_an_error() {
        let mut buffer = filled(3);
        let result = buffer.get_all_up_to_id(7);
        assert!(matches!(result, Err(MachinaError::ActionIdNotFound { id: 7 })));
        assert_eq!(buffer.pending_len(), 3, "failed scan must not consume");

        let mut gapped = ActionBuffer::new();
        gapped.add(action(1));
        gapped.add(action(3));
        assert!(gapped.get_all_up_to_id(2).is_err());
    }

    #[test]
    fn test_blocks() {
        let mut buffer = filled(2);
        assert_eq!(buffer.set_block(), 2);
        buffer.add(action(3));
        buffer.add(action(4));
        buffer.add(action(5));
        assert_eq!(buffer.set_block(), 3);
        assert_eq!(buffer.set_block(), 0, "no unblocked actions left");
        assert_eq!(buffer.block_count(), 2);

        let preview = buffer.get_block_pending(false);
        assert_eq!(ids(&preview), vec![1, 2]);
        assert_eq!(buffer.pending_len(), 5);

        let first = buffer.get_block_pending(true);
        assert_eq!(ids(&first), vec![1, 2]);
        assert_eq!(buffer.block_count(), 1);

        // Consuming one by one shrinks the head block
        buffer.get_next();
        assert_eq!(ids(&buffer.get_block_pending(false)), vec![4, 5]);
        buffer.get_next();
        buffer.get_next();
        assert_eq!(buffer.block_count(), 0);
    }

    #[test]
    fn test_block_pending_without_blocks_returns_all() {
        let mut buffer = filled(4);
        assert_eq!(buffer.get_block_pending(true).len(), 4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.released_len(), 4);
    }

    #[test]
    fn test_flush_discards() {
        let mut buffer = filled(4);
        buffer.set_block();
        assert_eq!(buffer.flush(), 4);
        assert_eq!(buffer.block_count(), 0);
        assert_eq!(buffer.released_len(), 0);
    }
}
