use std::collections::BTreeSet;

/// Which rows of the on-screen (filtered) question list are expanded.
///
/// Keys are positions in the filtered list, not question identities, so the same index can
/// point at a different question after the search term or topic changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accordion {
    open: BTreeSet<usize>,
}

impl Accordion {
    pub fn toggle(&mut self, index: usize) {
        if !self.open.remove(&index) {
            self.open.insert(index);
        }
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open.contains(&index)
    }

    pub fn any_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// Close every open row that exists in a filtered list of `filtered_len` rows.
    pub fn collapse_all(&mut self, filtered_len: usize) {
        self.open.retain(|index| *index >= filtered_len);
    }

    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn open_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.open.iter().copied()
    }
}
