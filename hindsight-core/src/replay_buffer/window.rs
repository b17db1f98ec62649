//! Index validity and history-window reconstruction.
//!
//! These are pure functions over the buffer geometry and the `done` flags,
//! kept apart from insertion so the episode-boundary rules can be tested
//! on their own.

/// Geometry of a circular store: capacity, number of stored entries and
/// the slot written next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Capacity `C`.
    pub capacity: usize,

    /// Number of stored entries, `min(num_inserts, C)`.
    pub size: usize,

    /// Slot written by the next insertion.
    pub next_idx: usize,
}

impl Cursor {
    /// The most recently written slot.
    pub fn newest(&self) -> Option<usize> {
        match self.size {
            0 => None,
            _ => Some((self.next_idx + self.capacity - 1) % self.capacity),
        }
    }

    /// The oldest stored slot.
    pub fn oldest(&self) -> Option<usize> {
        if self.size == 0 {
            None
        } else if self.size < self.capacity {
            Some(0)
        } else {
            Some(self.next_idx)
        }
    }

    /// Previous slot in insertion order, `None` at the oldest entry.
    pub fn prev(&self, ix: usize) -> Option<usize> {
        match self.oldest() {
            Some(oldest) if oldest != ix => Some((ix + self.capacity - 1) % self.capacity),
            _ => None,
        }
    }

    /// Next slot in insertion order, `None` at the newest entry.
    pub fn next(&self, ix: usize) -> Option<usize> {
        match self.newest() {
            Some(newest) if newest != ix => Some((ix + 1) % self.capacity),
            _ => None,
        }
    }
}

/// Whether `ix` can be drawn as a state: it is stored and its successor
/// has already been written.
pub fn is_valid_sample(cursor: &Cursor, ix: usize) -> bool {
    ix < cursor.size && cursor.next(ix).is_some()
}

/// Number of indices satisfying [`is_valid_sample`].
pub fn num_valid_samples(cursor: &Cursor) -> usize {
    cursor.size.saturating_sub(1)
}

/// Maps `n` in `0..num_valid_samples(cursor)` onto the `n`-th valid index.
pub fn nth_valid_sample(cursor: &Cursor, n: usize) -> usize {
    debug_assert!(n < num_valid_samples(cursor));
    match cursor.newest() {
        Some(newest) if n >= newest => n + 1,
        _ => n,
    }
}

/// History window of length `k` ending at the stored slot `end`, oldest first.
///
/// Walking backward from `end`, a slot is kept until either the previous slot
/// is marked done (it closes a prior episode) or the walk reaches the oldest
/// stored entry. Positions beyond that point are `None`, i.e. zero padding.
pub fn history_window(cursor: &Cursor, done: &[bool], end: usize, k: usize) -> Vec<Option<usize>> {
    debug_assert!(end < cursor.size);
    let mut window = vec![None; k];
    window[k - 1] = Some(end);
    let mut ix = end;
    for h in (0..k - 1).rev() {
        match cursor.prev(ix) {
            Some(prev) if !done[prev] => {
                window[h] = Some(prev);
                ix = prev;
            }
            _ => break,
        }
    }
    window
}

/// State and next-state windows of a valid sample index `ix`.
///
/// The next-state window is the state window shifted by one slot.
pub fn transition_windows(
    cursor: &Cursor,
    done: &[bool],
    ix: usize,
    k: usize,
) -> Option<(Vec<Option<usize>>, Vec<Option<usize>>)> {
    let next = cursor.next(ix)?;
    Some((
        history_window(cursor, done, ix, k),
        history_window(cursor, done, next, k),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(capacity: usize, size: usize, next_idx: usize) -> Cursor {
        Cursor {
            capacity,
            size,
            next_idx,
        }
    }

    #[test]
    fn test_newest_is_excluded() {
        let c = cursor(5, 3, 3);
        assert!(is_valid_sample(&c, 0));
        assert!(is_valid_sample(&c, 1));
        assert!(!is_valid_sample(&c, 2));
        assert!(!is_valid_sample(&c, 3));
        assert_eq!(num_valid_samples(&c), 2);

        // Full buffer: the slot before the write cursor is the newest one.
        let c = cursor(5, 5, 2);
        let valid: Vec<usize> = (0..5).filter(|&i| is_valid_sample(&c, i)).collect();
        assert_eq!(valid, vec![0, 2, 3, 4]);
        let mapped: Vec<usize> = (0..4).map(|n| nth_valid_sample(&c, n)).collect();
        assert_eq!(mapped, valid);
    }

    #[test]
    fn test_empty_cursor_has_no_samples() {
        let c = cursor(4, 0, 0);
        assert_eq!(num_valid_samples(&c), 0);
        assert!(!is_valid_sample(&c, 0));
        assert_eq!(c.newest(), None);
    }

    #[test]
    fn test_window_pads_before_first_entry() {
        let c = cursor(10, 3, 3);
        let done = vec![false; 10];
        assert_eq!(
            history_window(&c, &done, 1, 4),
            vec![None, None, Some(0), Some(1)]
        );
    }

    #[test]
    fn test_window_stops_at_done() {
        let c = cursor(10, 8, 8);
        let mut done = vec![false; 10];
        done[3] = true;
        assert_eq!(
            history_window(&c, &done, 5, 4),
            vec![None, None, Some(4), Some(5)]
        );
        // The terminal slot itself belongs to the episode it closes.
        assert_eq!(
            history_window(&c, &done, 3, 4),
            vec![Some(0), Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn test_window_does_not_cross_write_cursor() {
        // Full buffer, next write at slot 2: slot 2 is the oldest entry and
        // slot 1 the newest, which must never precede slot 2.
        let c = cursor(6, 6, 2);
        let done = vec![false; 6];
        assert_eq!(
            history_window(&c, &done, 3, 4),
            vec![None, None, Some(2), Some(3)]
        );
        assert_eq!(
            history_window(&c, &done, 0, 4),
            vec![Some(3), Some(4), Some(5), Some(0)]
        );
    }

    #[test]
    fn test_next_window_after_terminal_is_padded() {
        let c = cursor(10, 6, 6);
        let mut done = vec![false; 10];
        done[2] = true;
        let (s, ns) = transition_windows(&c, &done, 2, 3).unwrap();
        assert_eq!(s, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(ns, vec![None, None, Some(3)]);
        assert!(transition_windows(&c, &done, 5, 3).is_none());
    }
}
