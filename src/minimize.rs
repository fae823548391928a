//! Minimization by symbolic partition refinement.
//!
//! The refinement starts from the final/non-final partition of the totalized automaton
//! and repeatedly picks a splitter block `C` from a stack. For each state `s` with a move
//! into `C`, `pred(s)` is the disjunction of the guards of those moves. Blocks are first
//! split by membership in `pre(C)`, then, inside `pre(C)`, by a local minterm `psi`: a
//! region of the alphabet on which some states of a block enter `C` and others do not.
//!
//! After a split, if the old block is still waiting on the stack the new piece is pushed
//! too; otherwise only the smaller of the two pieces is pushed.

use std::collections::{BTreeSet, HashMap};

use log::{debug, trace};

use crate::algebra::PredicateAlgebra;
use crate::automaton::{InputMove, Known, Sfa, StateId};
use crate::budget::{Budget, Deadline};
use crate::construction::MakeOptions;
use crate::error::Result;

/// The current partition of the arena indices of an automaton.
struct Partition {
    blocks: Vec<BTreeSet<usize>>,
    block_of: Vec<usize>,
    stack: Vec<usize>,
}

impl Partition {
    fn new(num_states: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_of: vec![0; num_states],
            stack: Vec::new(),
        }
    }

    fn add_block(&mut self, members: BTreeSet<usize>) -> usize {
        let id = self.blocks.len();
        for &s in &members {
            self.block_of[s] = id;
        }
        self.blocks.push(members);
        id
    }

    /// Blocks containing at least one of `states`, in increasing order.
    fn blocks_touching(&self, states: &BTreeSet<usize>) -> BTreeSet<usize> {
        states.iter().map(|&s| self.block_of[s]).collect()
    }

    /// Moves `piece` out of `block` into a new block, then schedules the pieces.
    fn split(&mut self, block: usize, piece: BTreeSet<usize>) {
        for s in &piece {
            self.blocks[block].remove(s);
        }
        let new = self.add_block(piece);
        trace!(
            "split block {} into {} + {} states",
            block,
            self.blocks[block].len(),
            self.blocks[new].len()
        );

        if self.stack.contains(&block) {
            self.stack.push(new);
        } else if self.blocks[block].len() <= self.blocks[new].len() {
            self.stack.push(block);
        } else {
            self.stack.push(new);
        }
    }
}

impl<P: Clone> Sfa<P> {
    /// The minimal total deterministic automaton accepting `L(self)`.
    ///
    /// Two automata with the same language minimize to automata with the same number of
    /// states (the sink state included, when there is one).
    pub fn minimize<A>(&self, alg: &A) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.minimize_within(alg, &Budget::unlimited())
    }

    pub fn minimize_within<A>(&self, alg: &A, budget: &Budget) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        self.minimize_until(alg, &budget.start())
    }

    pub(crate) fn minimize_until<A>(&self, alg: &A, deadline: &Deadline) -> Result<Self>
    where
        A: PredicateAlgebra<Pred = P>,
    {
        if self.is_empty() {
            return Ok(Self::empty(alg));
        }

        let total = self.mk_total_until(alg, deadline)?;
        let n = total.states.len();
        debug!("minimize: {} states after totalization", n);

        let final_indices = total.final_indices();
        let (finals, non_finals): (BTreeSet<usize>, BTreeSet<usize>) =
            (0..n).partition(|&i| final_indices.contains(i));

        let mut partition = Partition::new(n);
        let final_block = partition.add_block(finals);
        if non_finals.is_empty() {
            partition.stack.push(final_block);
        } else {
            let non_final_size = non_finals.len();
            let non_final_block = partition.add_block(non_finals);
            if non_final_size < partition.blocks[final_block].len() {
                partition.stack.push(non_final_block);
            } else {
                partition.stack.push(final_block);
            }
        }

        let mut rounds = 0usize;
        while let Some(current) = partition.stack.pop() {
            deadline.check("minimize")?;
            rounds += 1;

            // pred(s): the symbols on which s moves into the current block.
            let mut pred: HashMap<usize, P> = HashMap::new();
            for &t in &partition.blocks[current] {
                for m in total.moves_to_idx(t) {
                    let s = total.idx(m.from);
                    let guard = match pred.remove(&s) {
                        Some(g) => alg.mk_or(&g, &m.guard)?,
                        None => m.guard.clone(),
                    };
                    pred.insert(s, guard);
                }
            }
            let pre: BTreeSet<usize> = pred.keys().copied().collect();

            // Split every block by membership in pre(C).
            for block in partition.blocks_touching(&pre) {
                let inside: BTreeSet<usize> = partition.blocks[block].intersection(&pre).copied().collect();
                if inside.len() < partition.blocks[block].len() {
                    partition.split(block, inside);
                }
            }

            // Now every block touching pre(C) lies inside it. Split them by local minterms
            // until nothing changes.
            let mut iterate = true;
            while iterate {
                iterate = false;
                deadline.check("minimize")?;

                for block in partition.blocks_touching(&pre) {
                    let members: Vec<usize> = partition.blocks[block].iter().copied().collect();
                    let first = members[0];
                    let mut psi = pred[&first].clone();
                    let mut piece = BTreeSet::from([first]);
                    let mut splitter_found = false;

                    for &q in &members[1..] {
                        let phi = &pred[&q];
                        if splitter_found {
                            let conj = alg.mk_and(&psi, phi)?;
                            if alg.is_satisfiable(&conj)? {
                                piece.insert(q);
                                psi = conj;
                            }
                        } else {
                            let conj = alg.mk_and(&psi, &alg.mk_not(phi)?)?;
                            if alg.is_satisfiable(&conj)? {
                                // q does not enter C on psi.
                                psi = conj;
                                splitter_found = true;
                            } else {
                                // psi implies phi.
                                let conj = alg.mk_and(phi, &alg.mk_not(&psi)?)?;
                                if alg.is_satisfiable(&conj)? {
                                    piece.clear();
                                    piece.insert(q);
                                    psi = conj;
                                    splitter_found = true;
                                } else {
                                    piece.insert(q);
                                }
                            }
                        }
                    }

                    if piece.len() < members.len() {
                        iterate = iterate || members.len() > 2;
                        partition.split(block, piece);
                    }
                }
            }
        }

        // One state per block, numbered in the order of the states.
        let mut class_of_block: HashMap<usize, StateId> = HashMap::new();
        let mut class = vec![0 as StateId; n];
        for (i, c) in class.iter_mut().enumerate() {
            let next = class_of_block.len() as StateId;
            *c = *class_of_block.entry(partition.block_of[i]).or_insert(next);
        }

        debug!(
            "minimize: {} states -> {} blocks in {} rounds",
            n,
            class_of_block.len(),
            rounds
        );

        let finals: BTreeSet<StateId> = final_indices.iter().map(|i| class[i]).collect();
        let moves: Vec<InputMove<P>> = total
            .moves
            .iter()
            .map(|m| InputMove {
                from: class[total.idx(m.from)],
                to: class[total.idx(m.to)],
                guard: m.guard.clone(),
            })
            .collect();
        let initial = class[total.idx(total.initial)];

        let mut min = Self::make(initial, finals, moves, Vec::new(), alg, MakeOptions::keep_states())?;
        min.deterministic = Known::True;
        min.total = Known::True;
        Ok(min)
    }
}
