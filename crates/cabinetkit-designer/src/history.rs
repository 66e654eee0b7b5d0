//! Linear undo/redo history over immutable snapshots.
//!
//! The stack always holds a `present` value. Callers read it and call
//! [`push`](HistoryStack::push), [`undo`](HistoryStack::undo) or
//! [`redo`](HistoryStack::redo); the past and future sequences are never
//! exposed mutably, and every value handed out is an owned copy.
//!
//! Plain `VecDeque`/`Vec` storage stands in for a structurally shared
//! sequence: editor snapshots are small `Copy` values, so cloning one costs
//! less than sharing it, and nothing outside the stack can reach the stored
//! entries.

use std::collections::VecDeque;

/// Undo/redo stack with an optional depth cap on the past.
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    past: VecDeque<T>,
    present: T,
    future: Vec<T>,
    max_depth: Option<usize>,
}

impl<T: Clone + PartialEq> HistoryStack<T> {
    /// Create an unbounded history starting at `initial`
    pub fn new(initial: T) -> Self {
        Self::with_max_depth(initial, None)
    }

    /// Create a history keeping at most `max_depth` past entries.
    ///
    /// `Some(0)` is treated as unbounded.
    pub fn with_max_depth(initial: T, max_depth: Option<usize>) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: Vec::new(),
            max_depth: max_depth.filter(|d| *d > 0),
        }
    }

    /// The currently displayed value
    pub fn present(&self) -> &T {
        &self.present
    }

    /// Make `value` the new present.
    ///
    /// Returns `false` without touching anything when `value` equals the
    /// current present. Otherwise the redo tail is discarded.
    pub fn push(&mut self, value: T) -> bool {
        if value == self.present {
            return false;
        }

        self.future.clear();
        let previous = std::mem::replace(&mut self.present, value);
        self.past.push_back(previous);

        if let Some(max) = self.max_depth {
            while self.past.len() > max {
                self.past.pop_front();
            }
        }
        true
    }

    /// Step back one entry, returning the restored present
    pub fn undo(&mut self) -> Option<T> {
        let restored = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, restored);
        self.future.push(current);
        Some(self.present.clone())
    }

    /// Step forward one entry, returning the restored present
    pub fn redo(&mut self) -> Option<T> {
        let restored = self.future.pop()?;
        let current = std::mem::replace(&mut self.present, restored);
        self.past.push_back(current);
        Some(self.present.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}
