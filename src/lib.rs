//! # sfa-rs: Symbolic Finite Automata in Rust
//!
//! **`sfa-rs`** is a library of algorithms over **symbolic finite automata (SFAs)**:
//! finite-state machines whose transitions are labeled by predicates instead of single
//! symbols. The predicates come from a pluggable Boolean algebra, so the same engine
//! works for character classes, bit-vectors, or any theory you can decide.
//!
//! ## What is a symbolic automaton?
//!
//! A classic automaton over Unicode would need one edge per character. An SFA labels a
//! single edge with `[a-z]` instead, and asks the algebra whenever it needs to know
//! whether a guard is satisfiable, how two guards overlap, or which concrete symbol a
//! guard admits. The engine never looks inside a predicate.
//!
//! ## Key Features
//!
//! - **Pluggable theories**: all algorithms are generic over [`PredicateAlgebra`][crate::algebra::PredicateAlgebra].
//!   Two theories are bundled: character intervals ([`intervals`]) and bit-vector BDDs ([`bdd`]).
//! - **Canonical construction**: unsatisfiable guards are dropped, dead and unreachable states
//!   pruned, and every automaton without an accepted word collapses to one empty representative.
//! - **Boolean closure**: union, intersection, complement, difference, plus concatenation and star.
//! - **Minterm determinization** and **symbolic minimization** (D'Antoni–Veanes partition refinement).
//! - **Equivalence** either eagerly through differences, or lazily with Hopcroft–Karp over
//!   on-the-fly subset constructions, reporting a counterexample word.
//! - **Ambiguity** detection, returning an input with two accepting runs.
//! - **Budgets**: long-running operations poll a [`Budget`][crate::budget::Budget] (timeout,
//!   state ceiling, cancellation token) and fail with [`Error::Timeout`][crate::error::Error::Timeout].
//!
//! ## Basic Usage
//!
//! ```rust
//! use sfa_rs::automaton::{Sfa, Transition};
//! use sfa_rs::intervals::{CharAlgebra, CharPred};
//!
//! let alg = CharAlgebra;
//!
//! // 1. Identifiers: a letter followed by letters or digits
//! let ident = Sfa::new(
//!     [
//!         Transition::input(0, 1, CharPred::alpha()),
//!         Transition::input(1, 1, CharPred::alpha_num()),
//!     ],
//!     0,
//!     [1],
//!     &alg,
//! )?;
//!
//! // 2. Keywords: exactly "if"
//! let keyword = Sfa::new(
//!     [
//!         Transition::input(0, 1, CharPred::of('i')),
//!         Transition::input(1, 2, CharPred::of('f')),
//!     ],
//!     0,
//!     [2],
//!     &alg,
//! )?;
//!
//! // 3. Identifiers that are not keywords
//! let names = ident.difference(&keyword, &alg)?;
//! assert!(names.accepts(&['x', '1'], &alg));
//! assert!(!names.accepts(&['i', 'f'], &alg));
//!
//! // 4. Every keyword is an identifier, so adding them back changes nothing
//! let back = names.union(&keyword, &alg)?;
//! assert!(back.equivalent_lazy(&ident, &alg)?.is_equivalent());
//! # Ok::<(), sfa_rs::error::Error>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`automaton`]**: the [`Sfa`][crate::automaton::Sfa] type and its read-only accessors.
//! - **[`construction`]**: building, pruning and normalizing automata.
//! - **[`closure`]**, **[`determinize`]**, **[`minimize`]**, **[`equivalence`]**, **[`ambiguity`]**: the algorithms.
//! - **[`algebra`]**: the theory boundary, including minterm generation.
//! - **[`dot`]**: Graphviz export.

pub mod algebra;
pub mod ambiguity;
pub mod automaton;
pub mod bdd;
pub mod bitset;
pub mod budget;
pub mod cache;
pub mod closure;
pub mod construction;
pub mod determinize;
pub mod dot;
pub mod equivalence;
pub mod error;
pub mod intervals;
pub mod minimize;
pub mod reference;
pub mod sat;
pub mod union_find;
pub mod witness;
