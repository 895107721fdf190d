//! Per-degree bookkeeping of the network under construction.

use std::collections::BTreeMap;

use range_core::NodeId;

use crate::distribution::PowerLaw;

/// Degree whose bin holds the parity slot during the greedy phases.
pub const PARITY_SLOT_DEGREE: usize = 2;

/// Per-node degrees plus a table of how many nodes sit at each degree.
///
/// Every node is accounted for in exactly one bin at all times, so the bins
/// always sum to the node count. Moves go directly from the old bin to the new
/// one.
#[derive(Debug, Clone)]
pub struct BinTracker {
    law: PowerLaw,
    degrees: Vec<usize>,
    bins: Vec<usize>,
    parity_slot_held: bool,
}

impl BinTracker {
    /// Creates a tracker with every node at degree zero.
    pub fn new(law: PowerLaw) -> Self {
        let mut bins = vec![0; law.max_degree() + 1];
        bins[0] = law.node_count();
        Self {
            law,
            degrees: vec![0; law.node_count()],
            bins,
            parity_slot_held: false,
        }
    }

    /// Distribution the capacities are derived from.
    pub fn law(&self) -> &PowerLaw {
        &self.law
    }

    /// Current degree of `node`.
    pub fn degree(&self, node: NodeId) -> usize {
        self.degrees[node.index()]
    }

    /// Number of nodes currently at `degree`.
    pub fn count(&self, degree: usize) -> usize {
        self.bins.get(degree).copied().unwrap_or(0)
    }

    /// Sum over all bins. Equals the node count.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Raises `node` by one.
    pub fn increment(&mut self, node: NodeId) {
        self.bump(node, 1);
    }

    /// Lowers `node` by one. A node already at degree zero is left alone and
    /// `false` is returned.
    pub fn decrement(&mut self, node: NodeId) -> bool {
        let old = self.degrees[node.index()];
        if old == 0 {
            return false;
        }
        self.move_unit(node, old, old - 1);
        true
    }

    /// Raises `node` by `by` in one step.
    pub fn bump(&mut self, node: NodeId, by: usize) {
        let old = self.degrees[node.index()];
        self.move_unit(node, old, old + by);
    }

    fn move_unit(&mut self, node: NodeId, from: usize, to: usize) {
        if self.bins[from] > 0 {
            self.bins[from] -= 1;
        }
        if to >= self.bins.len() {
            self.bins.resize(to + 1, 0);
        }
        self.bins[to] += 1;
        self.degrees[node.index()] = to;
    }

    /// `capacity_ceil(degree) - count(degree)`; negative once a bin overshoots.
    pub fn capacity_remaining(&self, degree: usize) -> i64 {
        self.law.capacity_ceil(degree) as i64 - self.count(degree) as i64
    }

    /// Whether every move of an atomic structure can be admitted.
    ///
    /// Units arriving in the same bin are counted together. The parity slot,
    /// while held, is not available to the greedy phases.
    pub fn fits(&self, moves: &[(NodeId, usize)]) -> bool {
        let mut arrivals: BTreeMap<usize, i64> = BTreeMap::new();
        for (node, by) in moves {
            *arrivals.entry(self.degree(*node) + by).or_default() += 1;
        }
        arrivals.into_iter().all(|(degree, units)| {
            let mut remaining = self.capacity_remaining(degree);
            if self.parity_slot_held && degree == PARITY_SLOT_DEGREE {
                remaining -= 1;
            }
            units <= remaining
        })
    }

    /// Whether `node` alone can be raised by `by`.
    pub fn can_raise(&self, node: NodeId, by: usize) -> bool {
        self.fits(&[(node, by)])
    }

    /// Keeps one degree-two slot back so an odd leftover node can always be
    /// self-regulated at the end of the run.
    pub fn hold_parity_slot(&mut self) {
        self.parity_slot_held = true;
    }

    /// Makes the parity slot available again.
    pub fn release_parity_slot(&mut self) {
        self.parity_slot_held = false;
    }

    /// Node counts indexed by degree.
    pub fn histogram(&self) -> &[usize] {
        &self.bins
    }

    /// Degrees indexed by node id.
    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    /// Largest `count(d) - capacity_ceil(d)` over `d >= 1`.
    pub fn max_overshoot(&self) -> i64 {
        (1..self.bins.len())
            .map(|degree| -self.capacity_remaining(degree))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::BACKBONE_CONSTANT;

    fn tracker(n: usize) -> BinTracker {
        BinTracker::new(PowerLaw::new(n, BACKBONE_CONSTANT))
    }

    #[test]
    fn bump_moves_directly_between_bins() {
        let mut bins = tracker(100);
        let node = NodeId::from_raw(3);
        bins.bump(node, 4);
        assert_eq!(bins.degree(node), 4);
        assert_eq!(bins.count(0), 99);
        assert_eq!(bins.count(4), 1);
        assert_eq!(bins.count(1) + bins.count(2) + bins.count(3), 0);
        assert_eq!(bins.total(), 100);
    }

    #[test]
    fn decrement_at_zero_is_a_no_op() {
        let mut bins = tracker(40);
        let node = NodeId::from_raw(0);
        assert!(!bins.decrement(node));
        assert_eq!(bins.count(0), 40);
        bins.increment(node);
        assert!(bins.decrement(node));
        assert_eq!(bins.degree(node), 0);
        assert_eq!(bins.total(), 40);
    }

    #[test]
    fn fits_counts_units_landing_in_the_same_bin() {
        let mut bins = tracker(100);
        // capacity_ceil(9) == 1 for N = 100
        let a = NodeId::from_raw(0);
        let b = NodeId::from_raw(1);
        bins.bump(a, 8);
        bins.bump(b, 8);
        assert!(bins.can_raise(a, 1));
        assert!(!bins.fits(&[(a, 1), (b, 1)]));
        bins.increment(a);
        assert!(!bins.can_raise(b, 1));
        assert_eq!(bins.capacity_remaining(9), 0);
    }

    #[test]
    fn degrees_past_the_maximum_are_refused() {
        let bins = tracker(100);
        let node = NodeId::from_raw(5);
        assert!(!bins.can_raise(node, bins.law().max_degree() + 1));
    }

    #[test]
    fn parity_slot_hides_one_degree_two_unit() {
        let mut bins = tracker(32);
        // capacity_ceil(2) == 6 for N = 32
        for raw in 0..5 {
            bins.bump(NodeId::from_raw(raw), 2);
        }
        let next = NodeId::from_raw(10);
        bins.hold_parity_slot();
        assert!(!bins.can_raise(next, 2));
        bins.release_parity_slot();
        assert!(bins.can_raise(next, 2));
    }

    #[test]
    fn unchecked_bumps_grow_the_table() {
        let mut bins = tracker(32);
        let node = NodeId::from_raw(0);
        bins.bump(node, 12);
        assert_eq!(bins.count(12), 1);
        assert_eq!(bins.histogram().len(), 13);
        assert_eq!(bins.total(), 32);
        assert_eq!(bins.max_overshoot(), 1);
    }
}
