/// Bounded position over a non-empty sequence of `len` items.
///
/// Navigation is clamped to `[0, len - 1]`; there is no wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

/// Result of a cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(usize),
    AtBoundary,
}

impl Cursor {
    /// Cursor at index 0, or `None` for an empty sequence.
    #[must_use]
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 0, len })
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.len - 1
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index == self.last_index()
    }

    pub fn next(&mut self) -> Step {
        if self.is_last() {
            return Step::AtBoundary;
        }
        self.index += 1;
        Step::Moved(self.index)
    }

    pub fn previous(&mut self) -> Step {
        if self.is_first() {
            return Step::AtBoundary;
        }
        self.index -= 1;
        Step::Moved(self.index)
    }

    /// Jump directly to `index`. Returns `false` (and stays put) when out of range.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.index = index;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_has_no_cursor() {
        assert!(Cursor::new(0).is_none());
    }

    #[test]
    fn navigation_never_leaves_bounds() {
        let mut cursor = Cursor::new(3).unwrap();
        assert_eq!(cursor.previous(), Step::AtBoundary);
        assert_eq!(cursor.index(), 0);

        for _ in 0..10 {
            cursor.next();
            assert!(cursor.index() <= cursor.last_index());
        }
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.next(), Step::AtBoundary);

        for _ in 0..10 {
            cursor.previous();
        }
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn jump_rejects_out_of_range() {
        let mut cursor = Cursor::new(2).unwrap();
        assert!(cursor.jump_to(1));
        assert!(!cursor.jump_to(2));
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn single_item_is_first_and_last() {
        let cursor = Cursor::new(1).unwrap();
        assert!(cursor.is_first());
        assert!(cursor.is_last());
    }
}
