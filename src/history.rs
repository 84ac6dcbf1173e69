//! Undo/redo over whole-state snapshots.
//!
//! Every edit records the state as it was *before* the edit, so undo always
//! restores the immediately prior snapshot rather than replaying a diff.

/// Past and future snapshot stacks.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    future: Vec<T>,
    /// Maximum length of `past`; 0 means unbounded.
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Push the pre-edit state and drop the redo stack.
    pub fn record(&mut self, before: T) {
        self.past.push(before);
        self.future.clear();
        if self.limit > 0 && self.past.len() > self.limit {
            let excess = self.past.len() - self.limit;
            self.past.drain(..excess);
        }
    }

    /// Step back. `current` goes onto the redo stack and the previous state
    /// is returned; `None` (and `current` is dropped) when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
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

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Drop entries on both stacks that `keep` rejects, e.g. snapshots of
    /// something that no longer exists.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.past.retain(&mut keep);
        self.future.retain(&mut keep);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_empty_is_noop() {
        let mut history: History<u32> = History::new();
        assert_eq!(history.undo(1), None);
        assert_eq!(history.redo(1), None);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new();
        let mut state = 0;

        history.record(state);
        state = 1;
        history.record(state);
        state = 2;

        state = history.undo(state).unwrap();
        assert_eq!(state, 1);
        state = history.undo(state).unwrap();
        assert_eq!(state, 0);
        state = history.redo(state).unwrap();
        assert_eq!(state, 1);
        state = history.redo(state).unwrap();
        assert_eq!(state, 2);
        assert!(history.redo(state).is_none());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new();
        history.record("a");
        let state = history.undo("b").unwrap();
        assert!(history.can_redo());

        history.record(state);
        assert!(!history.can_redo());
        assert_eq!(history.redo("c"), None);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(2);
        history.record(1);
        history.record(2);
        history.record(3);
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.undo(4), Some(3));
        assert_eq!(history.undo(3), Some(2));
        assert_eq!(history.undo(2), None);
    }

    #[test]
    fn test_retain_filters_both_stacks() {
        let mut history = History::new();
        history.record(("a", 1));
        history.record(("b", 2));
        history.record(("a", 3));
        let current = history.undo(("b", 4)).unwrap();
        assert_eq!(current, ("a", 3));

        history.retain(|(page, _)| *page == "a");
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
        assert_eq!(history.undo(current), Some(("a", 1)));
    }

    proptest! {
        #[test]
        fn prop_undo_then_redo_is_identity(edits in proptest::collection::vec(any::<i32>(), 1..20)) {
            let mut history = History::new();
            let mut state = 0i32;
            for edit in &edits {
                history.record(state);
                state = *edit;
            }
            let after_last = state;

            let undone = history.undo(state).unwrap();
            prop_assert_eq!(undone, if edits.len() > 1 { edits[edits.len() - 2] } else { 0 });
            let redone = history.redo(undone).unwrap();
            prop_assert_eq!(redone, after_last);
        }
    }
}
