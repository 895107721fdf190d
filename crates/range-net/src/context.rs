//! State shared by every phase of a run.

use range_core::errors::RangeError;
use range_core::{NodeId, RngHandle};
use serde::{Deserialize, Serialize};

use crate::bins::BinTracker;
use crate::config::GeneratorConfig;
use crate::distribution::PowerLaw;
use crate::grammar::{GeneEntry, GrammarWriter};
use crate::pool::NodePool;

/// Counters describing what a run built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// `DOR` blocks emitted.
    pub clusters: usize,
    /// Clusters rolled back because fewer than two genes were admitted.
    pub empty_clusters: usize,
    /// Nodes left in the regulator set.
    pub regulators: usize,
    /// Feed-forward loops attached.
    pub feed_forward_loops: usize,
    /// Multi-output feed-forward loops attached.
    pub multi_feed_forward_loops: usize,
    /// Single-input modules attached to cluster genes.
    pub co_regulations: usize,
    /// Motif sites where nothing fit.
    pub skipped_motifs: usize,
    /// Regulator backbone entries emitted.
    pub backbone_entries: usize,
    /// Hubs created to fill the upper degree bins.
    pub hubs: usize,
    /// Leftover nodes placed as regulator/target pairs.
    pub pairs: usize,
    /// Leftover nodes placed as self-regulated singles.
    pub self_regulated: usize,
    /// Leftover nodes attached to an already placed regulator.
    pub partnered: usize,
    /// Self-regulations placed without capacity.
    pub forced: usize,
    /// Uniform draws taken from the run's RNG stream.
    #[serde(default)]
    pub rng_draws: u64,
}

/// State owned by one generation run.
///
/// Every phase borrows the context mutably; nothing outlives the run except the
/// finished document, the tracker and the statistics.
#[derive(Debug)]
pub struct GenerationContext {
    pub(crate) law: PowerLaw,
    pub(crate) tracker: BinTracker,
    pub(crate) pool: NodePool,
    pub(crate) rng: RngHandle,
    pub(crate) writer: GrammarWriter,
    pub(crate) stats: RunStats,
    pub(crate) master: Option<NodeId>,
}

impl GenerationContext {
    /// Validates `config` and sets up empty bookkeeping for it.
    pub fn new(config: &GeneratorConfig) -> Result<Self, RangeError> {
        config.validate()?;
        let law = PowerLaw::new(config.node_count, config.constant);
        Ok(Self {
            law,
            tracker: BinTracker::new(law),
            pool: NodePool::new(config.node_count),
            rng: RngHandle::from_seed(config.seed),
            writer: GrammarWriter::new()?,
            stats: RunStats::default(),
            master: None,
        })
    }

    /// Target distribution.
    pub fn law(&self) -> &PowerLaw {
        &self.law
    }

    /// Degree bookkeeping.
    pub fn tracker(&self) -> &BinTracker {
        &self.tracker
    }

    /// Node pool and regulator set.
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Counters so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Gene feeding the regulator backbone, once the first cluster is built.
    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    /// Adds the edge `regulator -> entry.gene` and draws its sign. A node
    /// regulating itself gains two units.
    pub(crate) fn regulate(&mut self, entry: &mut GeneEntry, regulator: NodeId) {
        if regulator == entry.gene {
            self.tracker.bump(regulator, 2);
        } else {
            self.tracker.increment(regulator);
            self.tracker.increment(entry.gene);
        }
        let sign = self.rng.sign();
        entry.push(regulator, sign);
    }

    /// Takes `count` consecutive nodes from the pool.
    pub(crate) fn take_nodes(&mut self, count: usize) -> Vec<NodeId> {
        (0..count).map_while(|_| self.pool.take()).collect()
    }

    pub(crate) fn into_parts(mut self) -> (GrammarWriter, BinTracker, RunStats) {
        self.stats.rng_draws = self.rng.draws();
        (self.writer, self.tracker, self.stats)
    }
}
