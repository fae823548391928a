//! Epsilon removal and minterm-based subset construction.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::debug;

use crate::algebra::PredicateAlgebra;
use crate::automaton::{InputMove, Known, Sfa, StateId};
use crate::bitset::BitSet;
use crate::budget::{Budget, Deadline};
use crate::construction::MakeOptions;
use crate::error::Result;

/// Numbering of the subsets discovered by a subset construction.
///
/// Ids are handed out densely from 0 in discovery order.
pub(crate) struct SubsetIds {
    ids: HashMap<BitSet, StateId>,
    pending: VecDeque<(BitSet, StateId)>,
}

impl SubsetIds {
    pub(crate) fn new() -> Self {
        Self {
            ids: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Id of `subset`, registering and queueing it if it is new.
    pub(crate) fn get_or_insert(&mut self, subset: BitSet) -> StateId {
        if let Some(&id) = self.ids.get(&subset) {
            return id;
        }
        let id = self.ids.len() as StateId;
        self.ids.insert(subset.clone(), id);
        self.pending.push_back((subset, id));
        id
    }

    pub(crate) fn pop(&mut self) -> Option<(BitSet, StateId)> {
        self.pending.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

impl<P: Clone> Sfa<P> {
    /// Checks that there are no epsilon moves and that the guards leaving each state are
    /// pairwise disjoint.
    pub fn is_deterministic<A>(&self, alg: &A) -> Result<bool>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.deterministic.is_true() {
            return Ok(true);
        }
        if !self.is_epsilon_free() {
            return Ok(false);
        }
        for i in 0..self.states.len() {
            let guards: Vec<&P> = self.moves_from_idx(i).map(|m| &m.guard).collect();
            for (k, g1) in guards.iter().enumerate() {
                for g2 in &guards[k + 1..] {
                    if alg.is_satisfiable(&alg.mk_and(g1, g2)?)? {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    /// Equivalent automaton without epsilon moves.
    pub fn remove_epsilon_moves<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.remove_epsilon_moves_within(alg, &Budget::unlimited())
    }

    pub fn remove_epsilon_moves_within<A>(&self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.remove_epsilon_moves_until(alg, &budget.start())
    }

    pub(crate) fn remove_epsilon_moves_until<A>(&self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_epsilon_free() {
            return Ok(self.clone());
        }

        let final_indices = self.final_indices();
        let mut subsets = SubsetIds::new();
        let initial = subsets.get_or_insert(self.closure_of(&BitSet::singleton(self.idx(self.initial))));

        let mut finals = BTreeSet::new();
        let mut moves = Vec::new();

        while let Some((subset, id)) = subsets.pop() {
            deadline.check_states("remove_epsilon_moves", subsets.len())?;

            if subset.intersects(&final_indices) {
                finals.insert(id);
            }
            for i in subset.iter() {
                for m in self.moves_from_idx(i) {
                    let target = self.closure_of(&BitSet::singleton(self.idx(m.to)));
                    let to = subsets.get_or_insert(target);
                    moves.push(InputMove {
                        from: id,
                        to,
                        guard: m.guard.clone(),
                    });
                }
            }
        }

        debug!(
            "remove_epsilon_moves: {} states -> {} states",
            self.state_count(),
            subsets.len()
        );
        Self::make(initial, finals, moves, Vec::new(), alg, MakeOptions::default())
    }

    /// Equivalent deterministic automaton.
    ///
    /// Returns a copy of `self` when it is already flagged deterministic.
    pub fn determinize<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.determinize_within(alg, &Budget::unlimited())
    }

    /// Like [`determinize`](Self::determinize), aborting when the budget runs out.
    ///
    /// The budget's state ceiling bounds the number of subsets the construction may
    /// discover.
    pub fn determinize_within<A>(&self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.determinize_until(alg, &budget.start())
    }

    pub(crate) fn determinize_until<A>(&self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.deterministic.is_true() {
            return Ok(self.clone());
        }

        let sfa = self.remove_epsilon_moves_until(alg, deadline)?;
        debug!("determinize: {} states", sfa.state_count());

        let final_indices = sfa.final_indices();
        let mut subsets = SubsetIds::new();
        let initial = subsets.get_or_insert(BitSet::singleton(sfa.idx(sfa.initial)));

        let mut finals = BTreeSet::new();
        let mut moves = Vec::new();

        while let Some((subset, id)) = subsets.pop() {
            deadline.check_states("determinize", subsets.len())?;

            if subset.intersects(&final_indices) {
                finals.insert(id);
            }

            let outgoing: Vec<&InputMove<P>> =
                subset.iter().flat_map(|i| sfa.moves_from_idx(i)).collect();
            let guards: Vec<P> = outgoing.iter().map(|m| m.guard.clone()).collect();

            for minterm in alg.get_minterms_within(&guards, deadline)? {
                let target: BitSet = minterm
                    .selector
                    .iter()
                    .map(|k| sfa.idx(outgoing[k].to))
                    .collect();
                if target.is_empty() {
                    continue;
                }
                let to = subsets.get_or_insert(target);
                moves.push(InputMove {
                    from: id,
                    to,
                    guard: minterm.predicate,
                });
            }
        }

        debug!("determinize: {} subsets", subsets.len());
        let mut det = Self::make(initial, finals, moves, Vec::new(), alg, MakeOptions::keep_states())?;
        det.deterministic = Known::True;
        Ok(det)
    }
}
