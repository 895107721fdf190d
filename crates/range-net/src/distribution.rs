//! Target degree distribution and the bin capacities derived from it.

use serde::{Deserialize, Serialize};

/// Normalisation constant for the pool-driven backbone mode.
pub const BACKBONE_CONSTANT: f64 = 0.7;

/// Inverse-square degree distribution `P(d) = c / d²` for a network of `N` nodes.
///
/// Two capacity conventions coexist and are kept distinct:
/// [`PowerLaw::capacity_ceil`] is the strict upper bound checked before every
/// insertion, [`PowerLaw::capacity_floor`] is the softer target used when quotas
/// are re-estimated after the structure has changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    node_count: usize,
    constant: f64,
    max_degree: usize,
}

impl PowerLaw {
    /// Creates the distribution and derives its maximum degree.
    pub fn new(node_count: usize, constant: f64) -> Self {
        Self {
            node_count,
            constant,
            max_degree: max_degree(node_count, constant),
        }
    }

    /// Number of nodes the capacities are computed for.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Normalisation constant `c`.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Largest degree the distribution expects at least one node to hold.
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Expected fraction of nodes with exactly `degree` edges.
    pub fn probability(&self, degree: usize) -> f64 {
        if degree == 0 {
            return 0.0;
        }
        let d = degree as f64;
        self.constant / (d * d)
    }

    /// Upper bound on the number of nodes allowed at `degree`.
    pub fn capacity_ceil(&self, degree: usize) -> usize {
        match degree {
            0 => self.node_count,
            d if d > self.max_degree => 0,
            d => self.quota_ceil(self.node_count, d),
        }
    }

    /// Target number of nodes at `degree` used for re-estimation.
    pub fn capacity_floor(&self, degree: usize) -> usize {
        match degree {
            0 => self.node_count,
            d if d > self.max_degree => 0,
            d => self.quota_floor(self.node_count, d),
        }
    }

    /// Sum of `capacity_ceil(d)` over `1..=max_degree`.
    pub fn total_capacity(&self) -> usize {
        (1..=self.max_degree).map(|d| self.capacity_ceil(d)).sum()
    }

    /// Whether every node can be given a degree without overfilling a bin.
    pub fn covers_node_count(&self) -> bool {
        self.total_capacity() >= self.node_count
    }

    /// `ceil(scale · P(degree))`.
    pub fn quota_ceil(&self, scale: usize, degree: usize) -> usize {
        (scale as f64 * self.probability(degree)).ceil() as usize
    }

    /// `floor(scale · P(degree))`.
    pub fn quota_floor(&self, scale: usize, degree: usize) -> usize {
        (scale as f64 * self.probability(degree)).floor() as usize
    }
}

/// Smallest degree `d` with `N · c / d² <= 1`.
fn max_degree(node_count: usize, constant: f64) -> usize {
    ((constant * node_count as f64).sqrt().ceil() as usize).max(1)
}
