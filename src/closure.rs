//! Boolean and regular closure operations.
//!
//! Constructions that combine automata or add fresh states renumber their operands
//! densely by arena index: the state at index `i` becomes `offset + i`. The state sets
//! stay disjoint, and the new ids stay small however large the original ids are.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::debug;

use crate::algebra::PredicateAlgebra;
use crate::automaton::{EpsilonMove, InputMove, Known, Sfa, StateId};
use crate::bitset::BitSet;
use crate::budget::{Budget, Deadline};
use crate::construction::MakeOptions;
use crate::error::Result;

impl<P: Clone> Sfa<P> {
    /// Dense id of `state` in a copy numbered from `offset`.
    fn dense_id(&self, state: StateId, offset: StateId) -> StateId {
        offset + self.idx(state) as StateId
    }

    /// Number of dense ids taken by a copy of `self`.
    fn dense_width(&self) -> StateId {
        self.states.len() as StateId
    }

    fn dense_moves(&self, offset: StateId) -> impl Iterator<Item = InputMove<P>> + '_ {
        self.moves.iter().map(move |m| InputMove {
            from: self.dense_id(m.from, offset),
            to: self.dense_id(m.to, offset),
            guard: m.guard.clone(),
        })
    }

    fn dense_epsilons(&self, offset: StateId) -> impl Iterator<Item = EpsilonMove> + '_ {
        self.epsilons.iter().map(move |e| EpsilonMove {
            from: self.dense_id(e.from, offset),
            to: self.dense_id(e.to, offset),
        })
    }

    fn dense_finals(&self, offset: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.finals.iter().map(move |&s| self.dense_id(s, offset))
    }

    /// Automaton accepting `L(self) ∪ L(other)`.
    ///
    /// A fresh initial state has epsilon moves to both original initial states.
    pub fn union<A>(&self, other: &Self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }

        let offset = self.dense_width();
        let initial = offset + other.dense_width();

        let moves: Vec<InputMove<P>> = self.dense_moves(0).chain(other.dense_moves(offset)).collect();
        let mut epsilons: Vec<EpsilonMove> = self
            .dense_epsilons(0)
            .chain(other.dense_epsilons(offset))
            .collect();
        epsilons.push(EpsilonMove {
            from: initial,
            to: self.dense_id(self.initial, 0),
        });
        epsilons.push(EpsilonMove {
            from: initial,
            to: other.dense_id(other.initial, offset),
        });

        let finals: BTreeSet<StateId> = self.dense_finals(0).chain(other.dense_finals(offset)).collect();

        Self::make(initial, finals, moves, epsilons, alg, MakeOptions::keep_states())
    }

    /// Automaton accepting `L(self) ∩ L(other)`, by synchronized product.
    pub fn intersection<A>(&self, other: &Self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.intersection_within(other, alg, &Budget::unlimited())
    }

    /// Like [`intersection`](Self::intersection); the budget is checked for every pair of
    /// moves considered.
    pub fn intersection_within<A>(&self, other: &Self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.intersection_until(other, alg, &budget.start())
    }

    pub(crate) fn intersection_until<A>(&self, other: &Self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() || other.is_empty() {
            return Ok(Self::empty(alg));
        }

        let finals1 = self.final_indices();
        let finals2 = other.final_indices();

        // Product states are pairs of arena indices.
        let mut ids: HashMap<(usize, usize), StateId> = HashMap::new();
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        let start = (self.idx(self.initial), other.idx(other.initial));
        ids.insert(start, 0);
        queue.push_back(start);

        let mut finals = BTreeSet::new();
        let mut moves = Vec::new();

        while let Some((p, q)) = queue.pop_front() {
            let id = ids[&(p, q)];
            let closure1 = self.closure_of(&BitSet::singleton(p));
            let closure2 = other.closure_of(&BitSet::singleton(q));

            if closure1.intersects(&finals1) && closure2.intersects(&finals2) {
                finals.insert(id);
            }

            for i in closure1.iter() {
                for m1 in self.moves_from_idx(i) {
                    for j in closure2.iter() {
                        for m2 in other.moves_from_idx(j) {
                            deadline.check("intersection")?;

                            let guard = alg.mk_and(&m1.guard, &m2.guard)?;
                            if !alg.is_satisfiable(&guard)? {
                                continue;
                            }
                            let target = (self.idx(m1.to), other.idx(m2.to));
                            let to = match ids.get(&target) {
                                Some(&to) => to,
                                None => {
                                    let to = ids.len() as StateId;
                                    ids.insert(target, to);
                                    queue.push_back(target);
                                    to
                                }
                            };
                            moves.push(InputMove { from: id, to, guard });
                        }
                    }
                }
            }
        }

        debug!(
            "intersection: {} x {} states -> {} product states",
            self.state_count(),
            other.state_count(),
            ids.len()
        );

        let mut product = Self::make(0, finals, moves, Vec::new(), alg, MakeOptions::default())?;
        product.deterministic = product
            .deterministic
            .or(self.deterministic.and(other.deterministic));
        Ok(product)
    }

    /// Totalized copy: deterministic, and every state has a move for every symbol.
    ///
    /// Missing symbols lead to a fresh non-final sink state with a `True` loop. No state
    /// is pruned, so the sink survives.
    pub fn mk_total<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.mk_total_within(alg, &Budget::unlimited())
    }

    pub fn mk_total_within<A>(&self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.mk_total_until(alg, &budget.start())
    }

    pub(crate) fn mk_total_until<A>(&self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.total.is_true() {
            return Ok(self.clone());
        }

        let det = self.determinize_until(alg, deadline)?;
        let sink = det.dense_width();

        let mut moves: Vec<InputMove<P>> = det.dense_moves(0).collect();
        let mut needs_sink = false;
        for i in 0..det.states.len() {
            deadline.check("mk_total")?;

            let covered = alg.mk_or_all(det.moves_from_idx(i).map(|m| &m.guard))?;
            let missing = alg.mk_not(&covered)?;
            if alg.is_satisfiable(&missing)? {
                moves.push(InputMove {
                    from: i as StateId,
                    to: sink,
                    guard: missing,
                });
                needs_sink = true;
            }
        }
        if needs_sink {
            moves.push(InputMove {
                from: sink,
                to: sink,
                guard: alg.mk_true(),
            });
        }

        let mut total = Self::make(
            det.dense_id(det.initial, 0),
            det.dense_finals(0).collect(),
            moves,
            Vec::new(),
            alg,
            MakeOptions {
                prune_unreachable: false,
                normalize: false,
            },
        )?;
        total.deterministic = Known::True;
        total.total = Known::True;
        Ok(total)
    }

    /// Automaton accepting the complement of `L(self)`.
    pub fn complement<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.complement_within(alg, &Budget::unlimited())
    }

    pub fn complement_within<A>(&self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.complement_until(alg, &budget.start())
    }

    pub(crate) fn complement_until<A>(&self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let total = self.mk_total_until(alg, deadline)?;
        let finals = total.non_final_states();

        let mut complement = Self::make(
            total.initial,
            finals,
            total.moves,
            Vec::new(),
            alg,
            MakeOptions {
                prune_unreachable: false,
                normalize: false,
            },
        )?;
        complement.deterministic = Known::True;
        complement.total = Known::True;
        Ok(complement)
    }

    /// Automaton accepting `L(self) \ L(other)`.
    pub fn difference<A>(&self, other: &Self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.difference_within(other, alg, &Budget::unlimited())
    }

    pub fn difference_within<A>(&self, other: &Self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.difference_until(other, alg, &budget.start())
    }

    pub(crate) fn difference_until<A>(&self, other: &Self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() {
            return Ok(Self::empty(alg));
        }
        let complement = other.complement_until(alg, deadline)?;
        self.intersection_until(&complement, alg, deadline)
    }

    /// Automaton accepting `L(self) · L(other)`.
    pub fn concatenate<A>(&self, other: &Self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() || other.is_empty() {
            return Ok(Self::empty(alg));
        }

        let offset = self.dense_width();
        let moves: Vec<InputMove<P>> = self.dense_moves(0).chain(other.dense_moves(offset)).collect();
        let mut epsilons: Vec<EpsilonMove> = self
            .dense_epsilons(0)
            .chain(other.dense_epsilons(offset))
            .collect();
        let joint = other.dense_id(other.initial, offset);
        epsilons.extend(self.dense_finals(0).map(|from| EpsilonMove { from, to: joint }));
        let finals: BTreeSet<StateId> = other.dense_finals(offset).collect();

        Self::make(
            self.dense_id(self.initial, 0),
            finals,
            moves,
            epsilons,
            alg,
            MakeOptions::default(),
        )
    }

    /// Automaton accepting `L(self)*`.
    ///
    /// A fresh initial state, which is the only final state, is linked by epsilon moves to
    /// the old initial state and back from every old final state.
    pub fn star<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        let initial = self.dense_width();
        let mut epsilons: Vec<EpsilonMove> = self.dense_epsilons(0).collect();
        epsilons.push(EpsilonMove {
            from: initial,
            to: self.dense_id(self.initial, 0),
        });
        epsilons.extend(self.dense_finals(0).map(|from| EpsilonMove { from, to: initial }));

        Self::make(
            initial,
            BTreeSet::from([initial]),
            self.dense_moves(0).collect(),
            epsilons,
            alg,
            MakeOptions::default(),
        )
    }
}
