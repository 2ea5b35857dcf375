//! Per-line exit states for line-state scanners.

use crate::state::ContinuationState;

/// One cached exit state per physical line; `None` means "never computed".
///
/// `states[i]` is the state line `i` exits in, given the exit state of line `i - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStateCache {
    states: Vec<Option<ContinuationState>>,
}

impl LineStateCache {
    /// A cache of `line_count` unknown lines.
    pub fn new(line_count: usize) -> Self {
        Self {
            states: vec![None; line_count],
        }
    }

    /// Number of tracked lines.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no line is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Cached exit state of `line`.
    pub fn get(&self, line: usize) -> Option<&ContinuationState> {
        self.states.get(line).and_then(Option::as_ref)
    }

    /// State a scan of `line` starts in.
    pub fn entry_state(&self, line: usize) -> ContinuationState {
        match line.checked_sub(1) {
            Some(prev) => self.get(prev).cloned().unwrap_or_default(),
            None => ContinuationState::Neutral,
        }
    }

    /// Store the exit state of `line`, returning the previous entry.
    pub fn replace(
        &mut self,
        line: usize,
        state: ContinuationState,
    ) -> Option<ContinuationState> {
        let slot = self.states.get_mut(line)?;
        slot.replace(state)
    }

    /// First line that has never been computed.
    pub fn first_unknown(&self) -> Option<usize> {
        self.states.iter().position(Option::is_none)
    }

    /// Forget everything and track `line_count` lines.
    pub fn reset(&mut self, line_count: usize) {
        self.states.clear();
        self.states.resize(line_count, None);
    }

    /// Follow an edit that turned old lines `first..=old_last` into new lines `first..=new_last`.
    ///
    /// The new lines become unknown, except the last one, which keeps the old exit state of
    /// `old_last` (the same physical line tail). Comparing against it lets a rescan of the
    /// edited line converge immediately when its exit state did not change.
    ///
    /// Returns `false`, leaving the cache untouched, if the line numbers do not fit the cache.
    pub fn splice(&mut self, first: usize, old_last: usize, new_last: usize) -> bool {
        if first > old_last || first > new_last || old_last >= self.states.len() {
            return false;
        }

        let tail = self.states[old_last].take();
        let fresh = std::iter::repeat_n(None, new_last - first).chain(std::iter::once(tail));
        self.states.splice(first..=old_last, fresh);
        true
    }

    /// Iterate over cached states.
    pub fn iter(&self) -> impl Iterator<Item = Option<&ContinuationState>> {
        self.states.iter().map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> ContinuationState {
        ContinuationState::BlockComment
    }

    #[test]
    fn test_replace_reports_prior() {
        let mut cache = LineStateCache::new(3);
        assert_eq!(cache.first_unknown(), Some(0));
        assert_eq!(cache.replace(0, block()), None);
        assert_eq!(cache.replace(0, ContinuationState::Neutral), Some(block()));
        assert_eq!(cache.first_unknown(), Some(1));
        assert_eq!(cache.entry_state(1), ContinuationState::Neutral);
        assert_eq!(cache.replace(7, block()), None);
    }

    #[test]
    fn test_splice_insert_lines() {
        let mut cache = LineStateCache::new(4);
        for line in 0..4 {
            cache.replace(line, ContinuationState::QuotedString { quote: Some(b'0' + line as u8) });
        }
        // Line 1 split into three lines.
        assert!(cache.splice(1, 1, 3));
        assert_eq!(cache.len(), 6);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_none());
        assert_eq!(
            cache.get(3),
            Some(&ContinuationState::QuotedString { quote: Some(b'1') })
        );
        assert_eq!(
            cache.get(4),
            Some(&ContinuationState::QuotedString { quote: Some(b'2') })
        );
    }

    #[test]
    fn test_splice_remove_lines() {
        let mut cache = LineStateCache::new(5);
        for line in 0..5 {
            cache.replace(line, ContinuationState::QuotedString { quote: Some(b'0' + line as u8) });
        }
        // Lines 1..=3 joined into one.
        assert!(cache.splice(1, 3, 1));
        assert!(!cache.splice(2, 5, 2));
        assert_eq!(cache.len(), 3);
        assert_eq!(
            cache.get(1),
            Some(&ContinuationState::QuotedString { quote: Some(b'3') })
        );
        assert_eq!(
            cache.get(2),
            Some(&ContinuationState::QuotedString { quote: Some(b'4') })
        );
    }
}
