use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Returns the smallest value satisfying the BDD, if any exists.
    ///
    /// Walks down the BDD preferring the low (0) branch. Variables skipped along the path
    /// are don't-cares and are set to 0.
    ///
    /// Returns `None` if the BDD represents the constant false function.
    pub fn one_sat(&self, node: Ref) -> Option<u64> {
        if self.is_zero(node) {
            return None;
        }

        let mut value = 0u64;
        let mut current = node;

        while !self.is_one(current) {
            let var = self.variable(current.index());
            let low = self.low_node(current);

            // Every non-zero node is satisfiable, so a non-zero branch always leads to one.
            if !self.is_zero(low) {
                current = low;
            } else {
                value |= 1 << (self.bits() - var);
                current = self.high_node(current);
            }
        }

        Some(value)
    }

    /// Number of values satisfying the BDD.
    pub fn sat_count(&self, node: Ref) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(2u32).pow(self.bits());
        self.sat_count_rec(node, &max, &mut cache)
    }

    fn sat_count_rec(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let low = self.low(node.index());
        let high = self.high(node.index());

        let count_low = self.sat_count_rec(low, max, cache);
        let count_high = self.sat_count_rec(high, max, cache);

        // Each child counts solutions over all variables; a node halves their sum.
        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}
