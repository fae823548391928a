use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// A reference to a BDD node, possibly complemented.
///
/// The sign carries the complement bit: `-r` denotes the negation of `r`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Ref(i32);

impl Ref {
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Return the internal representation of the reference.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Return the index of the referenced node.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Encode the reference as an unsigned literal, `2 * index + negated`.
    pub(crate) fn as_lit(self) -> u32 {
        (self.0.unsigned_abs() << 1) + self.is_negated() as u32
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let r = Ref::new(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
        assert_eq!(r.to_string(), "@5");
        assert_eq!((-r).to_string(), "~@5");
    }

    #[test]
    fn test_lit_encoding() {
        assert_eq!(Ref::new(3).as_lit(), 6);
        assert_eq!(Ref::new(-3).as_lit(), 7);
    }
}
