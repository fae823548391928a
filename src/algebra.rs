//! The predicate algebra boundary.
//!
//! Symbolic automata label their transitions with *predicates* rather than symbols. The
//! engine never looks inside a predicate: everything it needs is asked from a
//! [`PredicateAlgebra`], which supplies the Boolean connectives, satisfiability,
//! minterm generation and witness extraction for one concrete theory.
//!
//! Two theories ship with the crate: character intervals ([`CharAlgebra`]) and
//! bit-vector BDDs ([`Bdd`]).
//!
//! [`CharAlgebra`]: crate::intervals::CharAlgebra
//! [`Bdd`]: crate::bdd::Bdd

use std::fmt::Debug;

use log::trace;

use crate::bitset::BitSet;
use crate::budget::Deadline;
use crate::error::Result;

/// An atomic region of the alphabet produced by minterm generation.
///
/// `selector` holds the indices of the input predicates that are implied by
/// `predicate`. Every other input predicate is disjoint from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minterm<P> {
    pub predicate: P,
    pub selector: BitSet,
}

/// Effective Boolean algebra over a domain of symbols.
///
/// All operations take `&self`: an algebra may keep internal caches behind interior
/// mutability, but it must behave as a pure function of its arguments.
///
/// Operations that may run for a long time return [`Result`], so that a theory backed
/// by an external solver can report a timeout.
pub trait PredicateAlgebra {
    /// Predicates (transition guards).
    type Pred: Clone + Debug;
    /// Alphabet elements.
    type Symbol: Clone + Debug;

    /// The predicate satisfied by every symbol.
    fn mk_true(&self) -> Self::Pred;

    /// The predicate satisfied by no symbol.
    fn mk_false(&self) -> Self::Pred;

    /// The predicate satisfied by exactly `symbol`.
    fn mk_atom(&self, symbol: &Self::Symbol) -> Self::Pred;

    fn mk_not(&self, p: &Self::Pred) -> Result<Self::Pred>;

    fn mk_and(&self, p: &Self::Pred, q: &Self::Pred) -> Result<Self::Pred>;

    fn mk_or(&self, p: &Self::Pred, q: &Self::Pred) -> Result<Self::Pred>;

    /// Conjunction of all `preds`. Empty input yields `True`.
    fn mk_and_all<'a, I>(&self, preds: I) -> Result<Self::Pred>
    where
        I: IntoIterator<Item = &'a Self::Pred>,
        Self::Pred: 'a,
    {
        let mut acc = self.mk_true();
        for p in preds {
            acc = self.mk_and(&acc, p)?;
        }
        Ok(acc)
    }

    /// Disjunction of all `preds`. Empty input yields `False`.
    fn mk_or_all<'a, I>(&self, preds: I) -> Result<Self::Pred>
    where
        I: IntoIterator<Item = &'a Self::Pred>,
        Self::Pred: 'a,
    {
        let mut acc = self.mk_false();
        for p in preds {
            acc = self.mk_or(&acc, p)?;
        }
        Ok(acc)
    }

    fn is_satisfiable(&self, p: &Self::Pred) -> Result<bool>;

    /// Returns `true` if `p` and `q` denote the same set of symbols.
    fn are_equivalent(&self, p: &Self::Pred, q: &Self::Pred) -> Result<bool> {
        let p_not_q = self.mk_and(p, &self.mk_not(q)?)?;
        if self.is_satisfiable(&p_not_q)? {
            return Ok(false);
        }
        let q_not_p = self.mk_and(q, &self.mk_not(p)?)?;
        Ok(!self.is_satisfiable(&q_not_p)?)
    }

    /// Returns `true` if `symbol` satisfies `p`.
    fn has_model(&self, p: &Self::Pred, symbol: &Self::Symbol) -> bool;

    /// Some symbol satisfying `p`, or `None` if `p` is unsatisfiable.
    fn generate_witness(&self, p: &Self::Pred) -> Result<Option<Self::Symbol>>;

    /// Minterms of `preds` without a time limit.
    fn get_minterms(&self, preds: &[Self::Pred]) -> Result<Vec<Minterm<Self::Pred>>> {
        self.get_minterms_within(preds, &Deadline::unbounded())
    }

    /// Partitions the alphabet into the satisfiable atomic regions of `preds`.
    ///
    /// The returned predicates are pairwise disjoint and their disjunction is `True`.
    /// The default implementation splits depth-first on each predicate and its negation,
    /// positive branch first, and drops unsatisfiable branches as soon as they appear.
    fn get_minterms_within(
        &self,
        preds: &[Self::Pred],
        deadline: &Deadline,
    ) -> Result<Vec<Minterm<Self::Pred>>> {
        let mut minterms = Vec::new();
        let mut stack = vec![(0usize, self.mk_true(), BitSet::empty())];

        while let Some((depth, current, selector)) = stack.pop() {
            deadline.check("minterms")?;

            if depth == preds.len() {
                minterms.push(Minterm {
                    predicate: current,
                    selector,
                });
                continue;
            }

            // Negative branch is pushed first, so the positive one is explored first.
            let negative = self.mk_and(&current, &self.mk_not(&preds[depth])?)?;
            if self.is_satisfiable(&negative)? {
                stack.push((depth + 1, negative, selector.clone()));
            }

            let positive = self.mk_and(&current, &preds[depth])?;
            if self.is_satisfiable(&positive)? {
                let mut selector = selector;
                selector.insert(depth);
                stack.push((depth + 1, positive, selector));
            }
        }

        trace!("{} minterms for {} predicates", minterms.len(), preds.len());
        Ok(minterms)
    }
}
