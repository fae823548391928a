//! Symbolic finite automata.
//!
//! An [`Sfa`] is an immutable value: every operation (union, determinization,
//! minimization, ...) returns a fresh automaton. States are opaque [`StateId`]s. Internally
//! they are numbered densely (their *arena index*, following the sorted order of ids) so
//! that the adjacency lists and the subset constructions can work with plain vectors and
//! [`BitSet`]s.

use std::collections::{BTreeSet, HashMap};

use crate::algebra::PredicateAlgebra;
use crate::bitset::BitSet;

/// State identifier.
pub type StateId = u32;

/// A transition consuming one symbol satisfying `guard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMove<P> {
    pub from: StateId,
    pub to: StateId,
    pub guard: P,
}

/// A transition consuming no input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpsilonMove {
    pub from: StateId,
    pub to: StateId,
}

/// Either kind of transition, as accepted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<P> {
    Input(InputMove<P>),
    Epsilon(EpsilonMove),
}

impl<P> Transition<P> {
    pub fn input(from: StateId, to: StateId, guard: P) -> Self {
        Transition::Input(InputMove { from, to, guard })
    }

    pub fn epsilon(from: StateId, to: StateId) -> Self {
        Transition::Epsilon(EpsilonMove { from, to })
    }

    pub fn from(&self) -> StateId {
        match self {
            Transition::Input(m) => m.from,
            Transition::Epsilon(e) => e.from,
        }
    }

    pub fn to(&self) -> StateId {
        match self {
            Transition::Input(m) => m.to,
            Transition::Epsilon(e) => e.to,
        }
    }
}

/// A structural fact that is either established or not known.
///
/// Flags never move back from `True` to `Unknown`: operations that preserve a property
/// carry it over, all others start from `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Known {
    #[default]
    Unknown,
    True,
}

impl Known {
    pub fn is_true(self) -> bool {
        self == Known::True
    }

    /// `True` iff both facts are `True`.
    pub fn and(self, other: Known) -> Known {
        if self.is_true() && other.is_true() {
            Known::True
        } else {
            Known::Unknown
        }
    }

    /// `True` iff either fact is `True`.
    pub fn or(self, other: Known) -> Known {
        if self.is_true() || other.is_true() {
            Known::True
        } else {
            Known::Unknown
        }
    }
}

/// A symbolic finite automaton with guards of type `P`.
#[derive(Debug, Clone)]
pub struct Sfa<P> {
    /// Sorted state ids. Position in this vector is the arena index.
    pub(crate) states: Vec<StateId>,
    pub(crate) index: HashMap<StateId, usize>,
    pub(crate) initial: StateId,
    pub(crate) finals: BTreeSet<StateId>,
    pub(crate) moves: Vec<InputMove<P>>,
    pub(crate) epsilons: Vec<EpsilonMove>,
    /// Per arena index: positions in `moves` leaving the state.
    pub(crate) moves_from: Vec<Vec<usize>>,
    /// Per arena index: positions in `moves` entering the state.
    pub(crate) moves_to: Vec<Vec<usize>>,
    pub(crate) eps_from: Vec<Vec<usize>>,
    pub(crate) eps_to: Vec<Vec<usize>>,
    pub(crate) max_state_id: StateId,
    pub(crate) deterministic: Known,
    pub(crate) total: Known,
}

impl<P> Sfa<P> {
    /// Builds the indices of an automaton from its components.
    ///
    /// The state set is the initial state, the final states and every endpoint of a move.
    /// No validation happens here.
    pub(crate) fn assemble(
        initial: StateId,
        finals: BTreeSet<StateId>,
        moves: Vec<InputMove<P>>,
        epsilons: Vec<EpsilonMove>,
    ) -> Self {
        let mut ids: BTreeSet<StateId> = finals.clone();
        ids.insert(initial);
        for m in &moves {
            ids.insert(m.from);
            ids.insert(m.to);
        }
        for e in &epsilons {
            ids.insert(e.from);
            ids.insert(e.to);
        }

        let states: Vec<StateId> = ids.into_iter().collect();
        let index: HashMap<StateId, usize> =
            states.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        let n = states.len();
        let mut moves_from = vec![Vec::new(); n];
        let mut moves_to = vec![Vec::new(); n];
        for (k, m) in moves.iter().enumerate() {
            moves_from[index[&m.from]].push(k);
            moves_to[index[&m.to]].push(k);
        }
        let mut eps_from = vec![Vec::new(); n];
        let mut eps_to = vec![Vec::new(); n];
        for (k, e) in epsilons.iter().enumerate() {
            eps_from[index[&e.from]].push(k);
            eps_to[index[&e.to]].push(k);
        }

        let max_state_id = states.last().copied().unwrap_or(initial);

        Self {
            states,
            index,
            initial,
            finals,
            moves,
            epsilons,
            moves_from,
            moves_to,
            eps_from,
            eps_to,
            max_state_id,
            deterministic: Known::Unknown,
            total: Known::Unknown,
        }
    }

    /// Arena index of a state known to belong to the automaton.
    pub(crate) fn idx(&self, state: StateId) -> usize {
        match self.index.get(&state) {
            Some(&i) => i,
            None => panic!("State {} does not belong to the automaton", state),
        }
    }

    /// Arena indices of the final states.
    pub(crate) fn final_indices(&self) -> BitSet {
        self.finals.iter().map(|&s| self.idx(s)).collect()
    }

    /// Input moves leaving the state with the given arena index.
    pub(crate) fn moves_from_idx(&self, i: usize) -> impl Iterator<Item = &InputMove<P>> + '_ {
        self.moves_from[i].iter().map(move |&k| &self.moves[k])
    }

    /// Input moves entering the state with the given arena index.
    pub(crate) fn moves_to_idx(&self, i: usize) -> impl Iterator<Item = &InputMove<P>> + '_ {
        self.moves_to[i].iter().map(move |&k| &self.moves[k])
    }

    /// Epsilon closure of a set of arena indices.
    pub(crate) fn closure_of(&self, seeds: &BitSet) -> BitSet {
        let mut closure = seeds.clone();
        let mut stack: Vec<usize> = seeds.iter().collect();
        while let Some(i) = stack.pop() {
            for &k in &self.eps_from[i] {
                let j = self.idx(self.epsilons[k].to);
                if closure.insert(j) {
                    stack.push(j);
                }
            }
        }
        closure
    }

    /// Returns the states reachable from `state` through epsilon moves only, `state` included.
    pub fn epsilon_closure(&self, state: StateId) -> BTreeSet<StateId> {
        match self.index.get(&state) {
            Some(&i) => self
                .closure_of(&BitSet::singleton(i))
                .iter()
                .map(|j| self.states[j])
                .collect(),
            None => BTreeSet::new(),
        }
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    /// All states, in increasing order.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn final_states(&self) -> &BTreeSet<StateId> {
        &self.finals
    }

    pub fn non_final_states(&self) -> BTreeSet<StateId> {
        self.states
            .iter()
            .copied()
            .filter(|s| !self.finals.contains(s))
            .collect()
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.finals.contains(&state)
    }

    pub fn contains_state(&self, state: StateId) -> bool {
        self.index.contains_key(&state)
    }

    pub fn input_moves(&self) -> &[InputMove<P>] {
        &self.moves
    }

    pub fn epsilon_moves(&self) -> &[EpsilonMove] {
        &self.epsilons
    }

    /// All transitions, input moves first.
    pub fn transitions(&self) -> impl Iterator<Item = Transition<P>> + '_
    where
        P: Clone,
    {
        self.moves
            .iter()
            .cloned()
            .map(Transition::Input)
            .chain(self.epsilons.iter().copied().map(Transition::Epsilon))
    }

    pub fn moves_from(&self, state: StateId) -> impl Iterator<Item = &InputMove<P>> + '_ {
        let list: &[usize] = match self.index.get(&state) {
            Some(&i) => &self.moves_from[i],
            None => &[],
        };
        list.iter().map(move |&k| &self.moves[k])
    }

    pub fn moves_to(&self, state: StateId) -> impl Iterator<Item = &InputMove<P>> + '_ {
        let list: &[usize] = match self.index.get(&state) {
            Some(&i) => &self.moves_to[i],
            None => &[],
        };
        list.iter().map(move |&k| &self.moves[k])
    }

    pub fn epsilons_from(&self, state: StateId) -> impl Iterator<Item = &EpsilonMove> + '_ {
        let list: &[usize] = match self.index.get(&state) {
            Some(&i) => &self.eps_from[i],
            None => &[],
        };
        list.iter().map(move |&k| &self.epsilons[k])
    }

    pub fn epsilons_to(&self, state: StateId) -> impl Iterator<Item = &EpsilonMove> + '_ {
        let list: &[usize] = match self.index.get(&state) {
            Some(&i) => &self.eps_to[i],
            None => &[],
        };
        list.iter().map(move |&k| &self.epsilons[k])
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions, epsilon moves included.
    pub fn transition_count(&self) -> usize {
        self.moves.len() + self.epsilons.len()
    }

    /// Largest state id in use; fresh states are numbered above it.
    pub fn max_state_id(&self) -> StateId {
        self.max_state_id
    }

    /// Returns `true` if the automaton accepts no word.
    ///
    /// Construction collapses every automaton without a reachable final state into the
    /// canonical empty automaton, so this is a plain check of the final states.
    pub fn is_empty(&self) -> bool {
        self.finals.is_empty()
    }

    pub fn is_epsilon_free(&self) -> bool {
        self.epsilons.is_empty()
    }

    /// Returns `true` if the automaton is known to be total.
    ///
    /// This only reports the structural flag set by totalization; it does not inspect
    /// the guards.
    pub fn is_total(&self) -> bool {
        self.total.is_true()
    }

    /// Returns `true` if the automaton is known to be deterministic without asking the algebra.
    pub fn is_known_deterministic(&self) -> bool {
        self.deterministic.is_true()
    }

    /// Runs the automaton on `input`.
    pub fn accepts<A>(&self, input: &[A::Symbol], alg: &A) -> bool
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let mut current = self.closure_of(&BitSet::singleton(self.idx(self.initial)));
        for symbol in input {
            let mut next = BitSet::empty();
            for i in current.iter() {
                for m in self.moves_from_idx(i) {
                    if alg.has_model(&m.guard, symbol) {
                        next.insert(self.idx(m.to));
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            current = self.closure_of(&next);
        }
        current.intersects(&self.final_indices())
    }
}
