//! Extraction of accepted words.

use std::collections::VecDeque;

use log::debug;

use crate::algebra::PredicateAlgebra;
use crate::automaton::Sfa;
use crate::budget::{Budget, Deadline};
use crate::error::Result;

/// First step of a shortest path towards a final state.
#[derive(Debug, Clone, Copy)]
enum Step {
    Input(usize),
    Epsilon(usize),
}

impl<P: Clone> Sfa<P> {
    /// A shortest word accepted by the automaton, or `None` if the language is empty.
    ///
    /// Distances to the final states are computed by a backward breadth-first search
    /// where epsilon moves cost nothing; the word is then read off the shortest path from
    /// the initial state, taking one witness symbol per guard.
    ///
    /// Ties between equally short paths are broken deterministically, by the order of the
    /// moves in the automaton, so the same automaton always yields the same word.
    ///
    /// # Panics
    ///
    /// Panics if the algebra returns no witness for a guard, which construction
    /// guarantees to be satisfiable.
    pub fn get_witness<A>(&self, alg: &A) -> Result<Option<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() {
            return Ok(None);
        }

        let n = self.states.len();
        let mut dist = vec![usize::MAX; n];
        let mut step: Vec<Option<Step>> = vec![None; n];
        let mut queue = VecDeque::new();

        for i in self.final_indices().iter() {
            dist[i] = 0;
            queue.push_back(i);
        }

        while let Some(i) = queue.pop_front() {
            let d = dist[i];
            for &k in &self.eps_to[i] {
                let j = self.idx(self.epsilons[k].from);
                if d < dist[j] {
                    dist[j] = d;
                    step[j] = Some(Step::Epsilon(k));
                    queue.push_front(j);
                }
            }
            for &k in &self.moves_to[i] {
                let j = self.idx(self.moves[k].from);
                if d + 1 < dist[j] {
                    dist[j] = d + 1;
                    step[j] = Some(Step::Input(k));
                    queue.push_back(j);
                }
            }
        }

        let mut current = self.idx(self.initial);
        if dist[current] == usize::MAX {
            return Ok(None);
        }

        let mut word = Vec::with_capacity(dist[current]);
        while let Some(s) = step[current] {
            current = match s {
                Step::Epsilon(k) => self.idx(self.epsilons[k].to),
                Step::Input(k) => {
                    let m = &self.moves[k];
                    match alg.generate_witness(&m.guard)? {
                        Some(symbol) => word.push(symbol),
                        None => panic!("No witness for the guard of move {} -> {}", m.from, m.to),
                    }
                    self.idx(m.to)
                }
            };
        }
        Ok(Some(word))
    }
    /// Up to `n` distinct accepted words, shortest first.
    ///
    /// Each word is the [`get_witness`](Self::get_witness) of the language left once the
    /// previous words are removed from it. Fewer than `n` words come back only when the
    /// language has fewer than `n` words.
    pub fn get_witnesses<A>(&self, alg: &A, n: usize) -> Result<Vec<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.get_witnesses_within(alg, n, &Budget::unlimited())
    }

    pub fn get_witnesses_within<A>(&self, alg: &A, n: usize, budget: &Budget) -> Result<Vec<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.get_witnesses_until(alg, n, &budget.start())
    }

    pub(crate) fn get_witnesses_until<A>(&self, alg: &A, n: usize, deadline: &Deadline) -> Result<Vec<Vec<A::Symbol>>>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let mut words = Vec::with_capacity(n);
        let mut rest = self.clone();
        while words.len() < n {
            let word = match rest.get_witness(alg)? {
                Some(word) => word,
                None => break,
            };
            if words.len() + 1 < n {
                let seen = Self::from_word(&word, alg)?;
                rest = rest.difference_until(&seen, alg, deadline)?;
            }
            words.push(word);
        }
        debug!("get_witnesses: {} of {} requested words", words.len(), n);
        Ok(words)
    }
}


#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::automaton::Transition;
    use crate::intervals::{CharAlgebra, CharPred};

    #[test]
    fn test_shortest_witness() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 1, CharPred::of('a')),
                Transition::input(1, 2, CharPred::of('b')),
                Transition::input(2, 3, CharPred::of('c')),
                Transition::input(0, 4, CharPred::range('x', 'z')),
                Transition::epsilon(4, 3),
            ],
            0,
            [3],
            &alg,
        )
        .unwrap();
        let w = sfa.get_witness(&alg).unwrap().unwrap();
        assert_eq!(w, vec!['x']);
        assert!(sfa.accepts(&w, &alg));
    }

    #[test]
    fn test_empty_word_and_empty_language() {
        let alg = CharAlgebra;
        assert_eq!(Sfa::full(&alg).get_witness(&alg).unwrap(), Some(vec![]));
        assert_eq!(Sfa::empty(&alg).get_witness(&alg).unwrap(), None);
    }

    #[test]
    fn test_witness_of_complement() {
        let alg = CharAlgebra;
        let lower_star = Sfa::new(
            [
                Transition::epsilon(0, 1),
                Transition::input(0, 0, CharPred::lower_alpha()),
            ],
            0,
            [0, 1],
            &alg,
        )
        .unwrap();
        let w = lower_star.complement(&alg).unwrap().get_witness(&alg).unwrap().unwrap();
        assert!(w.iter().any(|c| !CharPred::lower_alpha().contains(*c)));
        assert!(!lower_star.accepts(&w, &alg));
    }

    #[test]
    fn test_witnesses_are_distinct_and_shortest_first() {
        let alg = CharAlgebra;
        // [ab]*
        let sfa = Sfa::new([Transition::input(0, 0, CharPred::range('a', 'b'))], 0, [0], &alg).unwrap();
        let words = sfa.get_witnesses(&alg, 5).unwrap();
        assert_eq!(words.len(), 5);
        assert_eq!(words[0], Vec::<char>::new());
        for w in &words {
            assert!(sfa.accepts(w, &alg));
        }
        for pair in words.windows(2) {
            assert!(pair[0].len() <= pair[1].len());
        }
        for (i, w) in words.iter().enumerate() {
            assert!(!words[i + 1..].contains(w), "{:?} repeated", w);
        }
    }

    #[test]
    fn test_witnesses_of_finite_language() {
        let alg = CharAlgebra;
        // "a" or "bc"
        let sfa = Sfa::new(
            [
                Transition::input(0, 1, CharPred::of('a')),
                Transition::input(0, 2, CharPred::of('b')),
                Transition::input(2, 1, CharPred::of('c')),
            ],
            0,
            [1],
            &alg,
        )
        .unwrap();
        let words = sfa.get_witnesses(&alg, 10).unwrap();
        assert_eq!(words, vec![vec!['a'], vec!['b', 'c']]);

        assert!(sfa.get_witnesses(&alg, 0).unwrap().is_empty());
        assert!(Sfa::empty(&alg).get_witnesses(&alg, 3).unwrap().is_empty());
    }

    #[test]
    fn test_witnesses_timeout() {
        let alg = CharAlgebra;
        let sfa = Sfa::new([Transition::input(0, 0, CharPred::any())], 0, [0], &alg).unwrap();
        let budget = Budget::with_timeout(std::time::Duration::ZERO);
        let err = sfa.get_witnesses_within(&alg, 3, &budget).unwrap_err();
        assert_eq!(err.operation(), "mk_total");
    }
}
