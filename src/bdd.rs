//! Bit-vector theory backed by reduced ordered BDDs.
//!
//! A [`Bdd`] manager describes sets of `bits`-wide unsigned integers. Variable `1` is the
//! most significant bit and variable `bits` the least significant one, so the variable
//! order follows the numeric order of values. Nodes are hash-consed and use complement
//! edges, so two references denote the same set iff they are equal.
//!
//! # Examples
//!
//! ```
//! use sfa_rs::algebra::PredicateAlgebra;
//! use sfa_rs::bdd::Bdd;
//!
//! let bdd = Bdd::new(8);
//! let digits = bdd.mk_range(b'0' as u64, b'9' as u64);
//! let small = bdd.mk_le(b'4' as u64);
//! let low_digits = bdd.apply_and(digits, small);
//!
//! assert!(bdd.eval(low_digits, b'3' as u64));
//! assert!(!bdd.eval(low_digits, b'7' as u64));
//! assert_eq!(bdd.generate_witness(&low_digits).unwrap(), Some(b'0' as u64));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use log::{debug, trace};

use crate::algebra::PredicateAlgebra;
use crate::cache::Cache;
use crate::error::Result;
use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

/// Key of the ITE cache: a normalized `(f, g, h)` triple.
type OpKey = (Ref, Ref, Ref);

pub struct Bdd {
    bits: u32,
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<Cache<OpKey, Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    /// Create a manager for `bits`-wide values, `1 <= bits <= 64`.
    pub fn new(bits: u32) -> Self {
        Self::with_cache_bits(bits, 16)
    }

    /// Like [`new`](Self::new), with an ITE cache of `2^cache_bits` slots.
    pub fn with_cache_bits(bits: u32, cache_bits: usize) -> Self {
        assert!(
            (1..=64).contains(&bits),
            "Bit width should be in the range 1..=64"
        );

        // Node 0 is unused so that every real node has a signable index.
        // Node 1 is the terminal.
        let dummy = Node {
            variable: 0,
            low: Ref::new(0),
            high: Ref::new(0),
        };
        let nodes = vec![dummy, dummy];
        let one = Ref::new(1);
        let zero = -one;

        Self {
            bits,
            nodes: RefCell::new(nodes),
            unique: RefCell::new(HashMap::new()),
            cache: RefCell::new(Cache::new(cache_bits)),
            zero,
            one,
        }
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("bits", &self.bits)
            .field("nodes", &self.num_nodes())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    /// Width of the encoded values.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Largest encodable value.
    pub fn max_value(&self) -> u64 {
        if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Number of allocated nodes, including the terminal.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 1
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.nodes.borrow()[index].variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        trace!("mk(v = {}, low = {}, high = {})", v, low, high);

        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            return low;
        }

        let node = Node {
            variable: v,
            low,
            high,
        };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::new(i as i32);
        }

        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        assert!(i < i32::MAX as u32, "BDD node table is full");
        nodes.push(node);
        self.unique.borrow_mut().insert(node, i);
        Ref::new(i as i32)
    }

    /// The BDD of a single variable.
    pub fn mk_var(&self, v: u32) -> Ref {
        assert!(
            (1..=self.bits).contains(&v),
            "Variable index should be in the range 1..={}",
            self.bits
        );
        self.mk_node(v, self.zero, self.one)
    }

    /// The set of values whose bit at `position` (0 being the least significant) is set.
    pub fn mk_bit(&self, position: u32) -> Ref {
        assert!(position < self.bits, "Bit position out of range");
        self.mk_var(self.bits - position)
    }

    fn check_value(&self, value: u64) {
        assert!(
            value <= self.max_value(),
            "Value {} does not fit in {} bits",
            value,
            self.bits
        );
    }

    /// Bit of `value` tested by variable `v`.
    fn bit_of(&self, value: u64, v: u32) -> bool {
        (value >> (self.bits - v)) & 1 == 1
    }

    /// The singleton set `{value}`.
    pub fn mk_value(&self, value: u64) -> Ref {
        self.check_value(value);
        let mut current = self.one;
        for v in (1..=self.bits).rev() {
            current = if self.bit_of(value, v) {
                self.mk_node(v, self.zero, current)
            } else {
                self.mk_node(v, current, self.zero)
            };
        }
        current
    }

    /// The set of values `<= bound`.
    pub fn mk_le(&self, bound: u64) -> Ref {
        self.check_value(bound);
        // Built from the least significant bit up: `current` describes the suffix.
        let mut current = self.one;
        for v in (1..=self.bits).rev() {
            current = if self.bit_of(bound, v) {
                self.mk_node(v, self.one, current)
            } else {
                self.mk_node(v, current, self.zero)
            };
        }
        current
    }

    /// The set of values `>= bound`.
    pub fn mk_ge(&self, bound: u64) -> Ref {
        self.check_value(bound);
        let mut current = self.one;
        for v in (1..=self.bits).rev() {
            current = if self.bit_of(bound, v) {
                self.mk_node(v, self.zero, current)
            } else {
                self.mk_node(v, current, self.one)
            };
        }
        current
    }

    /// The set of values in `lo..=hi`; empty when `lo > hi`.
    pub fn mk_range(&self, lo: u64, hi: u64) -> Ref {
        if lo > hi {
            return self.zero;
        }
        self.apply_and(self.mk_ge(lo), self.mk_le(hi))
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        if node.is_negated() {
            (-self.low(i), -self.high(i))
        } else {
            (self.low(i), self.high(i))
        }
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        trace!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero
        } else {
            g
        };
        let h = if h == f {
            self.zero
        } else if h == -f {
            self.one
        } else {
            h
        };

        // Terminal cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if n { -res } else { res };
        }

        // Determine the top variable:
        let mut m = self.variable(f.index());
        for x in [g, h] {
            if !self.is_terminal(x) {
                m = m.min(self.variable(x.index()));
            }
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);

        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if n {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    /// Evaluate `f` on `value`.
    pub fn eval(&self, f: Ref, value: u64) -> bool {
        let mut current = f;
        while !self.is_terminal(current) {
            let v = self.variable(current.index());
            current = if self.bit_of(value, v) {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        self.is_one(current)
    }

    /// Indices of all nodes reachable from `nodes`, terminals excluded.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        let mut stack: Vec<Ref> = nodes.into_iter().collect();
        while let Some(node) = stack.pop() {
            if self.is_terminal(node) || !visited.insert(node.index()) {
                continue;
            }
            stack.push(self.low(node.index()));
            stack.push(self.high(node.index()));
        }
        visited
    }

    /// Number of internal nodes of `f`.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }
}

impl PredicateAlgebra for Bdd {
    type Pred = Ref;
    type Symbol = u64;

    fn mk_true(&self) -> Ref {
        self.one
    }

    fn mk_false(&self) -> Ref {
        self.zero
    }

    fn mk_atom(&self, symbol: &u64) -> Ref {
        self.mk_value(*symbol)
    }

    fn mk_not(&self, p: &Ref) -> Result<Ref> {
        Ok(self.apply_not(*p))
    }

    fn mk_and(&self, p: &Ref, q: &Ref) -> Result<Ref> {
        Ok(self.apply_and(*p, *q))
    }

    fn mk_or(&self, p: &Ref, q: &Ref) -> Result<Ref> {
        Ok(self.apply_or(*p, *q))
    }

    fn is_satisfiable(&self, p: &Ref) -> Result<bool> {
        Ok(!self.is_zero(*p))
    }

    fn are_equivalent(&self, p: &Ref, q: &Ref) -> Result<bool> {
        Ok(p == q)
    }

    fn has_model(&self, p: &Ref, symbol: &u64) -> bool {
        *symbol <= self.max_value() && self.eval(*p, *symbol)
    }

    fn generate_witness(&self, p: &Ref) -> Result<Option<u64>> {
        let witness = self.one_sat(*p);
        debug!("witness of {} is {:?}", p, witness);
        Ok(witness)
    }
}
