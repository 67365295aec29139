use super::iter::Window;
use crate::signal::BeatAnnotation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Beat annotations attributed to one window.
///
/// Selection is inclusive at both ends, so a beat sitting exactly on `right`
/// belongs to this window and, with overlapping steps, to the next one too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatTally {
    /// Symbols in annotation order.
    pub symbols: Vec<char>,
    /// Sample offsets relative to the window's left edge, in annotation order.
    pub offsets: Vec<usize>,
    pub counts: BTreeMap<char, usize>,
}

impl BeatTally {
    pub fn collect(window: &Window, beats: &[BeatAnnotation]) -> Self {
        let mut tally = BeatTally::default();
        for beat in beats
            .iter()
            .filter(|beat| window.left <= beat.sample && beat.sample <= window.right)
        {
            tally.symbols.push(beat.symbol);
            tally.offsets.push(beat.sample - window.left);
            *tally.counts.entry(beat.symbol).or_insert(0) += 1;
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.symbols.len()
    }

    pub fn count(&self, symbol: char) -> usize {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Share of beats carrying any of `symbols`, in percent; 0 for a beat-free window.
    pub fn percentage_of(&self, symbols: &[char]) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let hits: usize = self
            .counts
            .iter()
            .filter(|(symbol, _)| symbols.contains(*symbol))
            .map(|(_, count)| count)
            .sum();
        100.0 * hits as f64 / total as f64
    }

    pub fn percentage(&self, symbol: char) -> f64 {
        self.percentage_of(&[symbol])
    }

    /// Symbols as a string, e.g. `"NNAV"`.
    pub fn symbol_string(&self) -> String {
        self.symbols.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn beats(pairs: &[(usize, char)]) -> Vec<BeatAnnotation> {
        pairs
            .iter()
            .map(|&(sample, symbol)| BeatAnnotation::new(sample, symbol))
            .collect()
    }

    #[test]
    fn collects_symbols_offsets_and_counts() {
        let anns = beats(&[(5, 'N'), (20, 'N'), (35, 'A'), (60, 'A'), (150, 'V')]);
        let tally = BeatTally::collect(&Window { left: 10, right: 110 }, &anns);
        assert_eq!(tally.symbols, vec!['N', 'A', 'A']);
        assert_eq!(tally.offsets, vec![10, 25, 50]);
        assert_eq!(tally.count('A'), 2);
        assert_eq!(tally.count('V'), 0);
        assert_eq!(tally.symbol_string(), "NAA");
    }

    #[test]
    fn boundary_beats_count_in_both_overlapping_windows() {
        let anns = beats(&[(0, 'N'), (100, 'V'), (150, 'N')]);
        let first = BeatTally::collect(&Window { left: 0, right: 100 }, &anns);
        let second = BeatTally::collect(&Window { left: 100, right: 200 }, &anns);
        assert_eq!(first.symbols, vec!['N', 'V']);
        assert_eq!(first.offsets, vec![0, 100]);
        assert_eq!(second.symbols, vec!['V', 'N']);
        assert_eq!(second.offsets, vec![0, 50]);
    }

    #[test]
    fn keeps_annotation_order_when_unsorted() {
        let anns = beats(&[(40, 'V'), (10, 'N')]);
        let tally = BeatTally::collect(&Window { left: 0, right: 50 }, &anns);
        assert_eq!(tally.symbols, vec!['V', 'N']);
        assert_eq!(tally.offsets, vec![40, 10]);
    }

    #[test]
    fn percentages_of_two_pacs_in_four_beats() {
        let anns = beats(&[(1, 'N'), (2, 'N'), (3, 'A'), (4, 'A')]);
        let tally = BeatTally::collect(&Window { left: 0, right: 10 }, &anns);
        assert_eq!(tally.percentage('A'), 50.0);
        assert_eq!(tally.percentage('V'), 0.0);
        assert_eq!(tally.percentage_of(&['A', 'N']), 100.0);
    }

    #[test]
    fn empty_window_percentages_are_zero() {
        let tally = BeatTally::collect(&Window { left: 0, right: 10 }, &[]);
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.percentage('A'), 0.0);
        assert_eq!(tally.percentage('V'), 0.0);
    }

    #[test]
    fn pac_pvc_and_rest_sum_to_hundred() {
        let mut rng = StdRng::seed_from_u64(11);
        let alphabet = ['N', 'A', 'V', 'L', 'R'];
        for _ in 0..100 {
            let n = rng.gen_range(1..60);
            let anns: Vec<BeatAnnotation> = (0..n)
                .map(|i| BeatAnnotation::new(i, alphabet[rng.gen_range(0..alphabet.len())]))
                .collect();
            let tally = BeatTally::collect(&Window { left: 0, right: 100 }, &anns);
            let pac = tally.percentage('A');
            let pvc = tally.percentage('V');
            let rest = tally.percentage_of(&['N', 'L', 'R']);
            assert!((pac + pvc + rest - 100.0).abs() < 1e-9);
        }
    }
}
