//! Character-interval theory.
//!
//! A [`CharPred`] is a finite union of inclusive `char` ranges. Ranges are kept sorted,
//! disjoint and non-adjacent, so two predicates denote the same set exactly when they
//! are structurally equal. Adjacency skips the surrogate gap: `'\u{D7FF}'` and
//! `'\u{E000}'` are neighbours.
//!
//! # Examples
//!
//! ```
//! use sfa_rs::algebra::PredicateAlgebra;
//! use sfa_rs::intervals::{CharAlgebra, CharPred};
//!
//! let alg = CharAlgebra;
//! let p = alg.mk_or(&CharPred::range('a', 'f'), &CharPred::range('d', 'k')).unwrap();
//! assert_eq!(p, CharPred::range('a', 'k'));
//! assert_eq!(p.to_string(), "[a-k]");
//! assert_eq!(alg.generate_witness(&p).unwrap(), Some('a'));
//! ```

use std::fmt::{Display, Formatter};

use crate::algebra::PredicateAlgebra;
use crate::error::Result;

/// The character following `c`, if any.
fn next_char(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        char::MAX => None,
        _ => char::from_u32(c as u32 + 1),
    }
}

/// The character preceding `c`, if any.
fn prev_char(c: char) -> Option<char> {
    match c {
        '\u{E000}' => Some('\u{D7FF}'),
        '\0' => None,
        _ => char::from_u32(c as u32 - 1),
    }
}

/// A set of characters, as a normalized list of inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CharPred {
    ranges: Vec<(char, char)>,
}

impl CharPred {
    /// The empty set.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Every character.
    pub fn any() -> Self {
        Self {
            ranges: vec![('\0', char::MAX)],
        }
    }

    /// A single character.
    pub fn of(c: char) -> Self {
        Self::range(c, c)
    }

    /// The inclusive range `lo..=hi`; empty when `lo > hi`.
    pub fn range(lo: char, hi: char) -> Self {
        Self::from_ranges([(lo, hi)])
    }

    /// Builds a predicate from arbitrary, possibly overlapping, ranges.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (char, char)>,
    {
        let mut input: Vec<(char, char)> = ranges.into_iter().filter(|(lo, hi)| lo <= hi).collect();
        input.sort_unstable();

        let mut ranges: Vec<(char, char)> = Vec::with_capacity(input.len());
        for (lo, hi) in input {
            if let Some(last) = ranges.last_mut() {
                let touches = lo <= last.1 || next_char(last.1) == Some(lo);
                if touches {
                    last.1 = last.1.max(hi);
                    continue;
                }
            }
            ranges.push((lo, hi));
        }
        Self { ranges }
    }

    pub fn lower_alpha() -> Self {
        Self::range('a', 'z')
    }

    pub fn upper_alpha() -> Self {
        Self::range('A', 'Z')
    }

    pub fn alpha() -> Self {
        Self::from_ranges([('a', 'z'), ('A', 'Z')])
    }

    pub fn num() -> Self {
        Self::range('0', '9')
    }

    pub fn alpha_num() -> Self {
        Self::from_ranges([('a', 'z'), ('A', 'Z'), ('0', '9')])
    }

    /// Whitespace: space, tab, line feed, vertical tab, form feed, carriage return.
    pub fn spaces() -> Self {
        Self::from_ranges([(' ', ' '), ('\t', '\r')])
    }

    /// The normalized ranges.
    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_any(&self) -> bool {
        self.ranges == [('\0', char::MAX)]
    }

    pub fn contains(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The smallest character in the set.
    pub fn min_char(&self) -> Option<char> {
        self.ranges.first().map(|&(lo, _)| lo)
    }

    pub fn complement(&self) -> Self {
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = Some('\0');
        for &(lo, hi) in &self.ranges {
            if let Some(start) = next {
                if start < lo {
                    if let Some(end) = prev_char(lo) {
                        ranges.push((start, end));
                    }
                }
            }
            next = next_char(hi);
        }
        if let Some(start) = next {
            ranges.push((start, char::MAX));
        }
        Self { ranges }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut ranges = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                ranges.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        // Pieces of normalized inputs are already disjoint and non-adjacent.
        Self { ranges }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_ranges(self.ranges.iter().chain(&other.ranges).copied())
    }
}

fn write_class_char(f: &mut Formatter<'_>, c: char) -> std::fmt::Result {
    match c {
        '\\' | ']' | '[' | '-' | '^' => write!(f, "\\{}", c),
        c if c.is_ascii_graphic() || c == ' ' => write!(f, "{}", c),
        c => write!(f, "\\u{{{:x}}}", c as u32),
    }
}

impl Display for CharPred {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_any() {
            return write!(f, ".");
        }
        write!(f, "[")?;
        for &(lo, hi) in &self.ranges {
            write_class_char(f, lo)?;
            if lo != hi {
                write!(f, "-")?;
                write_class_char(f, hi)?;
            }
        }
        write!(f, "]")
    }
}

/// Boolean algebra of [`CharPred`]s over `char`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharAlgebra;

impl PredicateAlgebra for CharAlgebra {
    type Pred = CharPred;
    type Symbol = char;

    fn mk_true(&self) -> CharPred {
        CharPred::any()
    }

    fn mk_false(&self) -> CharPred {
        CharPred::empty()
    }

    fn mk_atom(&self, symbol: &char) -> CharPred {
        CharPred::of(*symbol)
    }

    fn mk_not(&self, p: &CharPred) -> Result<CharPred> {
        Ok(p.complement())
    }

    fn mk_and(&self, p: &CharPred, q: &CharPred) -> Result<CharPred> {
        Ok(p.intersection(q))
    }

    fn mk_or(&self, p: &CharPred, q: &CharPred) -> Result<CharPred> {
        Ok(p.union(q))
    }

    fn is_satisfiable(&self, p: &CharPred) -> Result<bool> {
        Ok(!p.is_empty())
    }

    fn are_equivalent(&self, p: &CharPred, q: &CharPred) -> Result<bool> {
        Ok(p == q)
    }

    fn has_model(&self, p: &CharPred, symbol: &char) -> bool {
        p.contains(*symbol)
    }

    fn generate_witness(&self, p: &CharPred) -> Result<Option<char>> {
        Ok(p.min_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_merges_adjacent() {
        let p = CharPred::from_ranges([('d', 'f'), ('a', 'c'), ('x', 'z'), ('y', 'y')]);
        assert_eq!(p.ranges(), &[('a', 'f'), ('x', 'z')]);
        assert!(CharPred::range('z', 'a').is_empty());
    }

    #[test]
    fn test_surrogate_gap_is_adjacent() {
        let p = CharPred::from_ranges([('\u{D000}', '\u{D7FF}'), ('\u{E000}', '\u{E0FF}')]);
        assert_eq!(p.ranges(), &[('\u{D000}', '\u{E0FF}')]);
    }

    #[test]
    fn test_complement() {
        let p = CharPred::alpha();
        let not_p = p.complement();
        assert!(!not_p.contains('a'));
        assert!(not_p.contains('0'));
        assert!(not_p.contains('\0'));
        assert!(not_p.contains(char::MAX));
        assert_eq!(not_p.complement(), p);
        assert!(CharPred::empty().complement().is_any());
        assert!(CharPred::any().complement().is_empty());
    }

    #[test]
    fn test_intersection_and_union() {
        let p = CharPred::from_ranges([('a', 'e'), ('k', 'p')]);
        let q = CharPred::range('c', 'm');
        assert_eq!(
            p.intersection(&q),
            CharPred::from_ranges([('c', 'e'), ('k', 'm')])
        );
        assert_eq!(p.union(&q), CharPred::range('a', 'p'));
        assert!(p.intersection(&CharPred::num()).is_empty());
    }

    #[test]
    fn test_contains() {
        let p = CharPred::alpha_num();
        assert!(p.contains('Q'));
        assert!(p.contains('7'));
        assert!(!p.contains('_'));
        assert!(CharPred::spaces().contains('\n'));
    }

    #[test]
    fn test_display() {
        assert_eq!(CharPred::alpha_num().to_string(), "[0-9A-Za-z]");
        assert_eq!(CharPred::of('-').to_string(), "[\\-]");
        assert_eq!(CharPred::empty().to_string(), "[]");
        assert_eq!(CharPred::any().to_string(), ".");
        assert_eq!(CharPred::of('\n').to_string(), "[\\u{a}]");
    }

    #[test]
    fn test_algebra_witness() {
        let alg = CharAlgebra;
        assert_eq!(alg.generate_witness(&CharPred::num()).unwrap(), Some('0'));
        assert_eq!(alg.generate_witness(&CharPred::empty()).unwrap(), None);
    }

    #[test]
    fn test_algebra_atom() {
        let alg = CharAlgebra;
        let x = alg.mk_atom(&'x');
        assert!(alg.has_model(&x, &'x'));
        assert!(!alg.has_model(&x, &'y'));
        assert_eq!(alg.generate_witness(&x).unwrap(), Some('x'));
    }
}
