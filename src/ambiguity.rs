//! Ambiguity: inputs with more than one accepting run.
//!
//! A run is identified by the input moves it takes and by the final state it stops in.
//! Runs that differ only in the epsilon moves taken between two symbols count once.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::algebra::PredicateAlgebra;
use crate::automaton::Sfa;
use crate::bitset::BitSet;
use crate::budget::{Budget, Deadline};
use crate::error::Result;

/// Two runs over the same input, as arena indices, and whether they have taken
/// different input moves so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RunPair {
    left: usize,
    right: usize,
    diverged: bool,
}

/// Product states, each with the state it was first reached from and the guard read
/// on the way.
type Parents<P> = HashMap<RunPair, Option<(RunPair, P)>>;

impl<P: Clone> Sfa<P> {
    /// A shortest input with two distinct accepting runs, or `None` if the automaton is
    /// unambiguous.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfa_rs::automaton::{Sfa, Transition};
    /// use sfa_rs::intervals::{CharAlgebra, CharPred};
    ///
    /// let alg = CharAlgebra;
    /// // [a-z]+ where the switch to state 1 may happen on any letter
    /// let sfa = Sfa::new(
    ///     [
    ///         Transition::input(0, 0, CharPred::lower_alpha()),
    ///         Transition::input(0, 1, CharPred::lower_alpha()),
    ///         Transition::input(1, 1, CharPred::lower_alpha()),
    ///     ],
    ///     0,
    ///     [1],
    ///     &alg,
    /// )
    /// .unwrap();
    /// assert_eq!(sfa.ambiguous_input(&alg).unwrap(), Some(vec!['a', 'a']));
    /// ```
    pub fn ambiguous_input<A>(&self, alg: &A) -> Result<Option<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.ambiguous_input_within(alg, &Budget::unlimited())
    }

    /// Like [`ambiguous_input`](Self::ambiguous_input); the state ceiling applies to the
    /// number of explored pairs of runs.
    pub fn ambiguous_input_within<A>(&self, alg: &A, budget: &Budget) -> Result<Option<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.ambiguous_input_until(alg, &budget.start())
    }

    /// Breadth-first search of the self-product, so the first pair of accepting runs
    /// found reads a shortest ambiguous input.
    pub(crate) fn ambiguous_input_until<A>(&self, alg: &A, deadline: &Deadline) -> Result<Option<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() {
            return Ok(None);
        }

        let finals = self.final_indices();
        let init = self.idx(self.initial);
        let start = RunPair {
            left: init,
            right: init,
            diverged: false,
        };

        let mut parents: Parents<P> = HashMap::new();
        parents.insert(start, None);
        let mut queue = VecDeque::from([start]);

        while let Some(pair) = queue.pop_front() {
            deadline.check_states("ambiguity", parents.len())?;

            let closure1 = self.closure_of(&BitSet::singleton(pair.left));
            let closure2 = self.closure_of(&BitSet::singleton(pair.right));

            if accepts_twice(pair, &closure1, &closure2, &finals) {
                let word = read_back(pair, &parents, alg)?;
                debug!(
                    "ambiguous_input: found a word of length {} after {} pairs of runs",
                    word.len(),
                    parents.len()
                );
                return Ok(Some(word));
            }

            for i in closure1.iter() {
                for &k1 in &self.moves_from[i] {
                    for j in closure2.iter() {
                        for &k2 in &self.moves_from[j] {
                            deadline.check("ambiguity")?;

                            let m1 = &self.moves[k1];
                            let m2 = &self.moves[k2];
                            let guard = if k1 == k2 {
                                m1.guard.clone()
                            } else {
                                let guard = alg.mk_and(&m1.guard, &m2.guard)?;
                                if !alg.is_satisfiable(&guard)? {
                                    continue;
                                }
                                guard
                            };

                            let next = RunPair {
                                left: self.idx(m1.to),
                                right: self.idx(m2.to),
                                diverged: pair.diverged || k1 != k2,
                            };
                            if !parents.contains_key(&next) {
                                parents.insert(next, Some((pair, guard)));
                                queue.push_back(next);
                            }
                        }
                    }
                }
            }
        }

        debug!("ambiguous_input: unambiguous after {} pairs of runs", parents.len());
        Ok(None)
    }
}

/// Whether both runs can stop in final states that make them distinct.
fn accepts_twice(pair: RunPair, closure1: &BitSet, closure2: &BitSet, finals: &BitSet) -> bool {
    if pair.diverged {
        closure1.intersects(finals) && closure2.intersects(finals)
    } else {
        // Same input moves so far: only two different final states tell the runs apart.
        closure1.iter().filter(|&i| finals.contains(i)).nth(1).is_some()
    }
}

fn read_back<A>(mut pair: RunPair, parents: &Parents<A::Pred>, alg: &A) -> Result<Vec<A::Symbol>>
where
    A: PredicateAlgebra,
{
    let mut word = Vec::new();
    while let Some(Some((prev, guard))) = parents.get(&pair) {
        match alg.generate_witness(guard)? {
            Some(symbol) => word.push(symbol),
            None => panic!("No witness for a satisfiable product guard"),
        }
        pair = *prev;
    }
    word.reverse();
    Ok(word)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::automaton::Transition;
    use crate::intervals::{CharAlgebra, CharPred};

    #[test]
    fn test_ambiguous_plus() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 0, CharPred::lower_alpha()),
                Transition::input(0, 1, CharPred::lower_alpha()),
                Transition::input(1, 1, CharPred::lower_alpha()),
            ],
            0,
            [1],
            &alg,
        )
        .unwrap();
        let w = sfa.ambiguous_input(&alg).unwrap().unwrap();
        assert_eq!(w.len(), 2);
        assert!(sfa.accepts(&w, &alg));
    }

    #[test]
    fn test_unambiguous_plus() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 0, CharPred::lower_alpha()),
                Transition::input(0, 1, CharPred::lower_alpha()),
            ],
            0,
            [1],
            &alg,
        )
        .unwrap();
        assert_eq!(sfa.ambiguous_input(&alg).unwrap(), None);
    }

    #[test]
    fn test_epsilon_runs_to_distinct_finals() {
        let alg = CharAlgebra;
        let sfa = Sfa::<CharPred>::new(
            [Transition::epsilon(0, 1), Transition::epsilon(0, 2)],
            0,
            [1, 2],
            &alg,
        )
        .unwrap();
        assert_eq!(sfa.ambiguous_input(&alg).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_single_epsilon_run() {
        let alg = CharAlgebra;
        let sfa = Sfa::<CharPred>::new([Transition::epsilon(0, 1)], 0, [1], &alg).unwrap();
        assert_eq!(sfa.ambiguous_input(&alg).unwrap(), None);
    }

    #[test]
    fn test_epsilon_detours_count_once() {
        let alg = CharAlgebra;
        // Two epsilon paths into the same state before the only symbol.
        let sfa = Sfa::new(
            [
                Transition::epsilon(0, 1),
                Transition::epsilon(0, 2),
                Transition::epsilon(1, 3),
                Transition::epsilon(2, 3),
                Transition::input(3, 4, CharPred::of('x')),
            ],
            0,
            [4],
            &alg,
        )
        .unwrap();
        assert_eq!(sfa.ambiguous_input(&alg).unwrap(), None);
    }

    #[test]
    fn test_overlapping_guards_to_distinct_states() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 1, CharPred::range('a', 'm')),
                Transition::input(0, 2, CharPred::range('k', 'z')),
                Transition::input(1, 3, CharPred::of('!')),
                Transition::input(2, 3, CharPred::of('!')),
            ],
            0,
            [3],
            &alg,
        )
        .unwrap();
        let w = sfa.ambiguous_input(&alg).unwrap().unwrap();
        assert_eq!(w.len(), 2);
        assert!(('k'..='m').contains(&w[0]));
        assert_eq!(w[1], '!');
    }

    #[test]
    fn test_union_with_itself_is_ambiguous() {
        let alg = CharAlgebra;
        let ab = Sfa::from_word(&['a', 'b'], &alg).unwrap();
        assert_eq!(ab.ambiguous_input(&alg).unwrap(), None);
        let twice = ab.union(&ab, &alg).unwrap();
        assert_eq!(twice.ambiguous_input(&alg).unwrap(), Some(vec!['a', 'b']));
    }

    #[test]
    fn test_deterministic_is_unambiguous() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 0, CharPred::lower_alpha()),
                Transition::input(0, 1, CharPred::alpha()),
                Transition::input(1, 1, CharPred::alpha()),
            ],
            0,
            [1],
            &alg,
        )
        .unwrap();
        assert!(sfa.ambiguous_input(&alg).unwrap().is_some());
        let det = sfa.determinize(&alg).unwrap();
        assert_eq!(det.ambiguous_input(&alg).unwrap(), None);
        assert_eq!(Sfa::empty(&alg).ambiguous_input(&alg).unwrap(), None);
    }

    #[test]
    fn test_ambiguity_respects_budget() {
        let alg = CharAlgebra;
        let sfa = Sfa::new([Transition::input(0, 0, CharPred::any())], 0, [0], &alg).unwrap();
        let budget = Budget::with_timeout(std::time::Duration::ZERO);
        let err = sfa.ambiguous_input_within(&alg, &budget).unwrap_err();
        assert_eq!(err.operation(), "ambiguity");
    }
}
