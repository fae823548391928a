//! Building automata: guard filtering, normalization and pruning.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use crate::algebra::PredicateAlgebra;
use crate::automaton::{EpsilonMove, InputMove, Known, Sfa, StateId, Transition};
use crate::bitset::BitSet;
use crate::error::Result;

/// Options of [`Sfa::with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeOptions {
    /// Keep only states that are reachable from the initial state and can reach a final state.
    pub prune_unreachable: bool,
    /// Merge parallel input moves between the same ordered pair of states.
    pub normalize: bool,
}

impl Default for MakeOptions {
    fn default() -> Self {
        Self {
            prune_unreachable: true,
            normalize: true,
        }
    }
}

impl MakeOptions {
    /// Normalize, but keep every state.
    pub fn keep_states() -> Self {
        Self {
            prune_unreachable: false,
            normalize: true,
        }
    }
}

impl<P: Clone> Sfa<P> {
    /// Builds an automaton, dropping unsatisfiable moves and pruning useless states.
    ///
    /// An automaton without final states (after pruning) is the canonical
    /// [`empty`](Self::empty) automaton.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfa_rs::automaton::{Sfa, Transition};
    /// use sfa_rs::intervals::{CharAlgebra, CharPred};
    ///
    /// let alg = CharAlgebra;
    /// let sfa = Sfa::new(
    ///     [
    ///         Transition::input(0, 1, CharPred::lower_alpha()),
    ///         Transition::input(1, 1, CharPred::num()),
    ///         Transition::input(0, 2, CharPred::upper_alpha()), // dead end
    ///     ],
    ///     0,
    ///     [1],
    ///     &alg,
    /// )
    /// .unwrap();
    /// assert_eq!(sfa.state_count(), 2);
    /// assert!(sfa.accepts(&['x', '4', '2'], &alg));
    /// ```
    pub fn new<A, T, F>(transitions: T, initial: StateId, finals: F, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
        T: IntoIterator<Item = Transition<P>>,
        F: IntoIterator<Item = StateId>,
    {
        Self::with_options(transitions, initial, finals, alg, MakeOptions::default())
    }

    /// Like [`new`](Self::new), with explicit normalization and pruning options.
    pub fn with_options<A, T, F>(
        transitions: T,
        initial: StateId,
        finals: F,
        alg: &A,
        options: MakeOptions,
    ) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
        T: IntoIterator<Item = Transition<P>>,
        F: IntoIterator<Item = StateId>,
    {
        let finals: BTreeSet<StateId> = finals.into_iter().collect();
        if finals.is_empty() {
            return Ok(Self::empty(alg));
        }

        let mut moves = Vec::new();
        let mut epsilons = Vec::new();
        for t in transitions {
            match t {
                Transition::Input(m) => {
                    if alg.is_satisfiable(&m.guard)? {
                        moves.push(m);
                    }
                }
                Transition::Epsilon(e) => epsilons.push(e),
            }
        }

        Self::make(initial, finals, moves, epsilons, alg, options)
    }

    /// Builds an automaton from moves whose guards are already known to be satisfiable.
    pub(crate) fn make<A>(
        initial: StateId,
        finals: BTreeSet<StateId>,
        moves: Vec<InputMove<P>>,
        epsilons: Vec<EpsilonMove>,
        alg: &A,
        options: MakeOptions,
    ) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if finals.is_empty() {
            return Ok(Self::empty(alg));
        }

        let epsilons: Vec<EpsilonMove> = epsilons.into_iter().filter(|e| e.from != e.to).collect();

        let (moves, epsilons) = if options.normalize {
            (merge_parallel(moves, alg)?, dedup_epsilons(epsilons))
        } else {
            (moves, epsilons)
        };

        let sfa = Self::assemble(initial, finals, moves, epsilons);

        let sfa = if options.prune_unreachable {
            sfa.remove_dead_or_unreachable()
        } else if sfa.has_reachable_final() {
            Some(sfa)
        } else {
            None
        };

        match sfa {
            Some(sfa) => Ok(sfa),
            None => {
                debug!("make: no reachable final state, returning the empty automaton");
                Ok(Self::empty(alg))
            }
        }
    }

    /// The automaton accepting exactly `word`, as a chain of [`mk_atom`] guards.
    ///
    /// [`mk_atom`]: PredicateAlgebra::mk_atom
    pub fn from_word<A>(word: &[A::Symbol], alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let moves: Vec<InputMove<P>> = word
            .iter()
            .enumerate()
            .map(|(i, symbol)| InputMove {
                from: i as StateId,
                to: i as StateId + 1,
                guard: alg.mk_atom(symbol),
            })
            .collect();
        let last = word.len() as StateId;

        let mut sfa = Self::make(0, BTreeSet::from([last]), moves, Vec::new(), alg, MakeOptions::default())?;
        sfa.deterministic = Known::True;
        Ok(sfa)
    }

    /// The canonical automaton accepting nothing: one non-final state with a `True` loop.
    pub fn empty<A>(alg: &A) -> Self
    where
        A: PredicateAlgebra<Pred = P>,
    {
        Self::single_state(alg, false)
    }

    /// The automaton accepting every word: one final state with a `True` loop.
    pub fn full<A>(alg: &A) -> Self
    where
        A: PredicateAlgebra<Pred = P>,
    {
        Self::single_state(alg, true)
    }

    fn single_state<A>(alg: &A, accepting: bool) -> Self
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let finals = if accepting {
            BTreeSet::from([0])
        } else {
            BTreeSet::new()
        };
        let moves = vec![InputMove {
            from: 0,
            to: 0,
            guard: alg.mk_true(),
        }];
        let mut sfa = Self::assemble(0, finals, moves, Vec::new());
        sfa.deterministic = Known::True;
        sfa.total = Known::True;
        sfa
    }

    /// Merges parallel input moves and duplicate epsilon moves.
    pub fn normalize<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let mut sfa = Self::make(
            self.initial,
            self.finals.clone(),
            self.moves.clone(),
            self.epsilons.clone(),
            alg,
            MakeOptions::keep_states(),
        )?;
        sfa.deterministic = sfa.deterministic.or(self.deterministic);
        sfa.total = sfa.total.or(self.total);
        Ok(sfa)
    }

    /// Arena indices reachable from `seeds`, along moves when `forward` and against them otherwise.
    fn reach(&self, seeds: impl IntoIterator<Item = usize>, forward: bool) -> BitSet {
        let mut visited = BitSet::empty();
        let mut stack = Vec::new();
        for s in seeds {
            if visited.insert(s) {
                stack.push(s);
            }
        }
        while let Some(i) = stack.pop() {
            let neighbours: Vec<StateId> = if forward {
                let inputs = self.moves_from[i].iter().map(|&k| self.moves[k].to);
                let eps = self.eps_from[i].iter().map(|&k| self.epsilons[k].to);
                inputs.chain(eps).collect()
            } else {
                let inputs = self.moves_to[i].iter().map(|&k| self.moves[k].from);
                let eps = self.eps_to[i].iter().map(|&k| self.epsilons[k].from);
                inputs.chain(eps).collect()
            };
            for s in neighbours {
                let j = self.idx(s);
                if visited.insert(j) {
                    stack.push(j);
                }
            }
        }
        visited
    }

    fn has_reachable_final(&self) -> bool {
        let reachable = self.reach([self.idx(self.initial)], true);
        reachable.intersects(&self.final_indices())
    }

    /// Keeps only the states that are reachable from the initial state and from which a
    /// final state is reachable. Returns `None` when the initial state is not among them.
    pub(crate) fn remove_dead_or_unreachable(&self) -> Option<Self> {
        let reachable = self.reach([self.idx(self.initial)], true);
        let coreachable = self.reach(self.final_indices().iter(), false);

        let alive = |s: StateId| {
            let i = self.idx(s);
            reachable.contains(i) && coreachable.contains(i)
        };

        if !alive(self.initial) {
            return None;
        }

        let moves: Vec<InputMove<P>> = self
            .moves
            .iter()
            .filter(|m| alive(m.from) && alive(m.to))
            .cloned()
            .collect();
        let epsilons: Vec<EpsilonMove> = self
            .epsilons
            .iter()
            .filter(|e| alive(e.from) && alive(e.to))
            .copied()
            .collect();
        let finals: BTreeSet<StateId> = self.finals.iter().copied().filter(|&s| alive(s)).collect();

        let removed = self.states.iter().filter(|&&s| !alive(s)).count();
        if removed > 0 {
            debug!("pruned {} of {} states", removed, self.states.len());
        }

        let mut sfa = Self::assemble(self.initial, finals, moves, epsilons);
        // Deleting states and moves keeps guards disjoint.
        sfa.deterministic = self.deterministic;
        Some(sfa)
    }
}

/// One input move per ordered pair of states, guarded by the disjunction of the originals.
fn merge_parallel<A>(moves: Vec<InputMove<A::Pred>>, alg: &A) -> Result<Vec<InputMove<A::Pred>>>
where
    A: PredicateAlgebra,
{
    let mut position: HashMap<(StateId, StateId), usize> = HashMap::new();
    let mut merged: Vec<InputMove<A::Pred>> = Vec::with_capacity(moves.len());
    for m in moves {
        match position.get(&(m.from, m.to)) {
            Some(&k) => {
                merged[k].guard = alg.mk_or(&merged[k].guard, &m.guard)?;
            }
            None => {
                position.insert((m.from, m.to), merged.len());
                merged.push(m);
            }
        }
    }
    Ok(merged)
}

fn dedup_epsilons(epsilons: Vec<EpsilonMove>) -> Vec<EpsilonMove> {
    let mut seen = HashSet::new();
    epsilons.into_iter().filter(|e| seen.insert(*e)).collect()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::intervals::{CharAlgebra, CharPred};

    #[test]
    fn test_unsatisfiable_moves_are_dropped() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 1, CharPred::of('a')),
                Transition::input(0, 1, CharPred::empty()),
                Transition::input(1, 2, CharPred::empty()),
            ],
            0,
            [1, 2],
            &alg,
        )
        .unwrap();
        assert_eq!(sfa.state_count(), 2);
        assert_eq!(sfa.transition_count(), 1);
    }

    #[test]
    fn test_no_finals_gives_canonical_empty() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [Transition::input(0, 1, CharPred::of('a'))],
            0,
            std::iter::empty(),
            &alg,
        )
        .unwrap();
        assert!(sfa.is_empty());
        assert_eq!(sfa.state_count(), 1);
        assert_eq!(sfa.transition_count(), 1);
        assert!(sfa.is_known_deterministic());
        assert!(sfa.is_total());

        // Final state not reachable from the initial one.
        let sfa = Sfa::new([Transition::input(1, 2, CharPred::of('a'))], 0, [2], &alg).unwrap();
        assert!(sfa.is_empty());
        assert_eq!(sfa.state_count(), 1);
    }

    #[test]
    fn test_unreachable_final_without_pruning() {
        let alg = CharAlgebra;
        let sfa = Sfa::with_options(
            [Transition::input(1, 2, CharPred::of('a'))],
            0,
            [2],
            &alg,
            MakeOptions::keep_states(),
        )
        .unwrap();
        assert!(sfa.is_empty());
    }

    #[test]
    fn test_normalize_merges_parallel_moves() {
        let alg = CharAlgebra;
        let transitions = [
            Transition::input(0, 1, CharPred::range('a', 'c')),
            Transition::input(0, 1, CharPred::range('x', 'z')),
            Transition::epsilon(1, 1),
            Transition::epsilon(0, 1),
            Transition::epsilon(0, 1),
        ];

        let raw = Sfa::with_options(
            transitions.clone(),
            0,
            [1],
            &alg,
            MakeOptions {
                prune_unreachable: true,
                normalize: false,
            },
        )
        .unwrap();
        // The epsilon self-loop is dropped regardless.
        assert_eq!(raw.input_moves().len(), 2);
        assert_eq!(raw.epsilon_moves().len(), 2);

        let sfa = raw.normalize(&alg).unwrap();
        assert_eq!(sfa.input_moves().len(), 1);
        assert_eq!(sfa.epsilon_moves().len(), 1);
        assert_eq!(
            sfa.input_moves()[0].guard,
            CharPred::from_ranges([('a', 'c'), ('x', 'z')])
        );
    }

    #[test]
    fn test_dead_states_are_pruned() {
        let alg = CharAlgebra;
        let transitions = vec![
            Transition::input(0, 1, CharPred::of('a')),
            Transition::input(0, 2, CharPred::of('b')),
            Transition::input(2, 2, CharPred::of('b')),
            Transition::input(3, 1, CharPred::of('c')),
        ];
        let sfa = Sfa::new(transitions.clone(), 0, [1], &alg).unwrap();
        assert_eq!(sfa.states(), &[0, 1]);

        let kept = Sfa::with_options(transitions, 0, [1], &alg, MakeOptions::keep_states()).unwrap();
        assert_eq!(kept.states(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_full_accepts_everything() {
        let alg = CharAlgebra;
        let full = Sfa::full(&alg);
        assert!(full.accepts(&[], &alg));
        assert!(full.accepts(&['q', '\u{1F600}'], &alg));
        let empty = Sfa::empty(&alg);
        assert!(!empty.accepts(&[], &alg));
    }

    #[test]
    fn test_from_word() {
        let alg = CharAlgebra;
        let word: Vec<char> = "if".chars().collect();
        let sfa = Sfa::from_word(&word, &alg).unwrap();
        assert_eq!(sfa.state_count(), 3);
        assert!(sfa.is_known_deterministic());
        assert!(sfa.accepts(&word, &alg));
        assert!(!sfa.accepts(&['i'], &alg));
        assert!(!sfa.accepts(&['i', 'g'], &alg));

        let epsilon = Sfa::from_word(&[], &alg).unwrap();
        assert!(epsilon.accepts(&[], &alg));
        assert!(!epsilon.accepts(&['a'], &alg));
    }

    #[test]
    fn test_from_word_over_bdds() {
        let bdd = crate::bdd::Bdd::new(4);
        let sfa = Sfa::from_word(&[3u64, 12], &bdd).unwrap();
        assert!(sfa.accepts(&[3, 12], &bdd));
        assert!(!sfa.accepts(&[3, 13], &bdd));
        assert!(!sfa.accepts(&[12, 3], &bdd));
    }
}
