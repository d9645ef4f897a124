/// Row-selection bitmap over a dataset.
///
/// Bits are packed little-endian into `u64` words: row `i` lives in word `i / 64`, bit `i % 64`.
/// Bits past `len` in the last word are always zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowMask {
    words: Vec<u64>,
    len: usize,
}

impl RowMask {
    /// Select every row for which `select` returns `true`.
    pub fn from_fn(len: usize, mut select: impl FnMut(usize) -> bool) -> Self {
        let mut words = vec![0u64; len.div_ceil(64)];
        for row in 0..len {
            if select(row) {
                words[row / 64] |= 1u64 << (row % 64);
            }
        }
        Self { words, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Keep only rows selected by both masks.
    pub fn intersect(&mut self, other: &RowMask) {
        debug_assert_eq!(self.len, other.len, "RowMask length mismatch");
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word &= *other;
        }
    }

    /// Selected row indices in ascending order.
    pub fn iter_selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| SetBits { word }.map(move |bit| word_idx * 64 + bit))
    }
}

struct SetBits {
    word: u64,
}

impl Iterator for SetBits {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_selects_matching_rows_across_word_boundaries() {
        let mask = RowMask::from_fn(130, |i| i % 63 == 0);
        let rows: Vec<usize> = mask.iter_selected().collect();
        assert_eq!(rows, vec![0, 63, 126]);
        assert_eq!(mask.len(), 130);
    }

    #[test]
    fn intersect_keeps_common_rows() {
        let mut evens = RowMask::from_fn(10, |i| i % 2 == 0);
        let low = RowMask::from_fn(10, |i| i < 5);
        evens.intersect(&low);
        assert_eq!(evens.iter_selected().collect::<Vec<_>>(), vec![0, 2, 4]);
    }

    #[test]
    fn empty_mask_has_no_rows() {
        let mask = RowMask::from_fn(0, |_| true);
        assert!(mask.is_empty());
        assert_eq!(mask.iter_selected().count(), 0);
        assert_eq!(RowMask::from_fn(65, |_| true).iter_selected().count(), 65);
    }
}
