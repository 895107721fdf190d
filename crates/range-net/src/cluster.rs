//! Dense overlapping regulons.
//!
//! A cluster starts with one fresh regulator and a quota of regulated genes.
//! Each gene is wired to the last `tier` regulators; once the quota is met the
//! tier is raised, a new regulator joins and a smaller quota is requested, so
//! later genes see more overlapping inputs. Every edge is checked against the
//! bin capacities before it is added.

use range_core::errors::RangeError;
use range_core::NodeId;
use tracing::debug;

use crate::context::GenerationContext;
use crate::distribution::PowerLaw;
use crate::grammar::{BlockKind, Entry, GeneEntry};

/// Result of one cluster attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterOutcome {
    /// A `DOR` block was emitted for these genes.
    Built {
        /// Regulated genes in emission order.
        genes: Vec<NodeId>,
    },
    /// Fewer than two genes were admitted and everything was rolled back.
    Empty {
        /// The primary edge of the next gene did not fit or the pool ran dry.
        dead_end: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    GrowRegulatedSet,
    EscalateRegulatorInput,
    Finalize { dead_end: bool },
}

/// Quota bookkeeping carried from one cluster to the next.
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    law: PowerLaw,
    clusters_remaining: usize,
    pool_scale: usize,
    quota: usize,
}

impl ClusterBuilder {
    /// Starts with `max_degree` clusters to build and a first quota of
    /// `ceil(max_degree · P(1))` genes.
    pub fn new(law: PowerLaw) -> Self {
        let max_degree = law.max_degree();
        Self {
            law,
            clusters_remaining: max_degree,
            pool_scale: max_degree,
            quota: law.quota_ceil(max_degree, 1),
        }
    }

    /// Clusters still to be attempted.
    pub fn clusters_remaining(&self) -> usize {
        self.clusters_remaining
    }

    /// Scale the tier quotas are computed from.
    pub fn pool_scale(&self) -> usize {
        self.pool_scale
    }

    /// Tier-one quota of the next cluster.
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Widens later tier quotas by the nodes a motif consumed.
    pub fn grow_pool_scale(&mut self, by: usize) {
        self.pool_scale += by;
    }

    /// Whether another cluster should be attempted.
    pub fn has_work(&self, ctx: &GenerationContext) -> bool {
        !ctx.pool.is_exhausted() && self.clusters_remaining > 0 && self.quota > 0
    }

    /// Counts a finished attempt and re-estimates the next tier-one quota.
    pub fn advance(&mut self) {
        self.clusters_remaining = self.clusters_remaining.saturating_sub(1);
        self.quota = self.law.quota_floor(self.clusters_remaining, 1);
    }

    /// Builds one cluster. Returns `None` when no regulator can be reserved.
    pub fn build(
        &mut self,
        ctx: &mut GenerationContext,
    ) -> Result<Option<ClusterOutcome>, RangeError> {
        let first_regulator = ctx.pool.regulators().len();
        if ctx.pool.reserve_regulator().is_none() {
            return Ok(None);
        }

        let mut tier = 1usize;
        let mut quota = self.quota;
        let mut genes = Vec::new();
        let mut entries = Vec::new();
        let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
        let mut phase = Phase::GrowRegulatedSet;

        let dead_end = loop {
            match phase {
                Phase::GrowRegulatedSet => {
                    phase = Phase::EscalateRegulatorInput;
                    for _ in 0..quota {
                        let regulators = ctx.pool.regulators();
                        let window = regulators[regulators.len().saturating_sub(tier)..].to_vec();
                        let primary = window[0];
                        let Some(next) = ctx.pool.peek(0) else {
                            phase = Phase::Finalize { dead_end: true };
                            break;
                        };
                        if !ctx.tracker.fits(&[(primary, 1), (next, 1)]) {
                            phase = Phase::Finalize { dead_end: true };
                            break;
                        }
                        let Some(gene) = ctx.pool.take() else {
                            phase = Phase::Finalize { dead_end: true };
                            break;
                        };
                        let mut entry = GeneEntry::new(gene);
                        ctx.regulate(&mut entry, primary);
                        edges.push((primary, gene));
                        for &regulator in &window[1..] {
                            if ctx.tracker.fits(&[(regulator, 1), (gene, 1)]) {
                                ctx.regulate(&mut entry, regulator);
                                edges.push((regulator, gene));
                            }
                        }
                        genes.push(gene);
                        entries.push(Entry::Gene(entry));
                    }
                }
                Phase::EscalateRegulatorInput => {
                    tier += 1;
                    quota = self.law.quota_floor(self.pool_scale, tier);
                    if tier == 2 {
                        quota /= 2;
                    }
                    phase = Phase::GrowRegulatedSet;
                    if quota == 0 {
                        phase = Phase::Finalize { dead_end: false };
                        continue;
                    }
                    let newest_used = ctx
                        .pool
                        .regulators()
                        .last()
                        .map_or(false, |&regulator| ctx.tracker.degree(regulator) != 0);
                    if newest_used && ctx.pool.reserve_regulator().is_none() {
                        phase = Phase::Finalize { dead_end: false };
                    }
                }
                Phase::Finalize { dead_end } => break dead_end,
            }
        };

        if genes.len() < 2 {
            for (regulator, gene) in edges {
                ctx.tracker.decrement(regulator);
                ctx.tracker.decrement(gene);
            }
            for gene in genes.into_iter().rev() {
                ctx.pool.give_back(gene);
            }
            release_unused_regulators(ctx, first_regulator);
            ctx.stats.empty_clusters += 1;
            debug!(dead_end, "cluster rolled back");
            return Ok(Some(ClusterOutcome::Empty { dead_end }));
        }

        release_unused_regulators(ctx, first_regulator);
        ctx.writer.emit_block(BlockKind::Cluster, &entries)?;
        ctx.stats.clusters += 1;
        if ctx.master.is_none() {
            ctx.master = Some(genes[0]);
        }
        debug!(
            genes = genes.len(),
            tiers = tier,
            regulators = ctx.pool.regulators().len() - first_regulator,
            "cluster built"
        );
        Ok(Some(ClusterOutcome::Built { genes }))
    }
}

/// Pops regulators reserved since `first` that never received an edge.
fn release_unused_regulators(ctx: &mut GenerationContext, first: usize) {
    while ctx.pool.regulators().len() > first {
        match ctx.pool.regulators().last() {
            Some(&regulator) if ctx.tracker.degree(regulator) == 0 => {
                ctx.pool.release_regulator();
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    fn context(nodes: usize) -> GenerationContext {
        GenerationContext::new(&GeneratorConfig::with_nodes(nodes)).unwrap()
    }

    #[test]
    fn first_quota_uses_the_ceiling() {
        let ctx = context(100);
        let builder = ClusterBuilder::new(*ctx.law());
        assert_eq!(builder.clusters_remaining(), 9);
        // ceil(9 · 0.7)
        assert_eq!(builder.quota(), 7);
        assert!(builder.has_work(&ctx));
    }

    #[test]
    fn built_cluster_wires_every_gene_to_the_first_regulator() {
        let mut ctx = context(100);
        let mut builder = ClusterBuilder::new(*ctx.law());
        let Some(ClusterOutcome::Built { genes }) = builder.build(&mut ctx).unwrap() else {
            panic!("expected a built cluster");
        };
        assert!(genes.len() >= 2);
        assert_eq!(genes[0], NodeId::from_raw(0));
        assert_eq!(ctx.master(), Some(genes[0]));
        let first_regulator = ctx.pool().regulators()[0];
        assert_eq!(first_regulator, NodeId::from_raw(99));
        assert!(ctx.tracker().degree(first_regulator) >= genes.len().min(2));
        for gene in &genes {
            assert!(ctx.tracker().degree(*gene) >= 1);
        }
        assert_eq!(ctx.tracker().total(), 100);
        assert!(ctx.tracker().max_overshoot() <= 0);
    }

    #[test]
    fn every_kept_regulator_has_an_edge() {
        let mut ctx = context(400);
        let mut builder = ClusterBuilder::new(*ctx.law());
        while builder.has_work(&ctx) {
            match builder.build(&mut ctx).unwrap() {
                None => break,
                Some(ClusterOutcome::Empty { dead_end: true }) => break,
                Some(_) => builder.advance(),
            }
        }
        for regulator in ctx.pool().regulators() {
            assert!(ctx.tracker().degree(*regulator) > 0);
        }
    }

    #[test]
    fn single_gene_cluster_is_rolled_back() {
        let mut ctx = context(100);
        // capacity_ceil(1) == 70 for N = 100: leave room for one edge only
        for raw in 30..98 {
            ctx.tracker.increment(NodeId::from_raw(raw));
        }
        assert_eq!(ctx.tracker().capacity_remaining(1), 2);
        let histogram = ctx.tracker().histogram().to_vec();
        let degrees = ctx.tracker().degrees().to_vec();

        let mut builder = ClusterBuilder::new(*ctx.law());
        let outcome = builder.build(&mut ctx).unwrap();
        assert_eq!(outcome, Some(ClusterOutcome::Empty { dead_end: true }));

        assert_eq!(ctx.pool().genes_taken(), 0);
        assert!(ctx.pool().regulators().is_empty());
        assert_eq!(ctx.tracker().histogram(), histogram.as_slice());
        assert_eq!(ctx.tracker().degrees(), degrees.as_slice());
        assert_eq!(ctx.stats().empty_clusters, 1);
        assert_eq!(ctx.stats().clusters, 0);
        assert_eq!(ctx.master(), None);
        assert_eq!(ctx.writer.blocks(), 0);
    }

    #[test]
    fn advance_uses_the_floor() {
        let ctx = context(100);
        let mut builder = ClusterBuilder::new(*ctx.law());
        builder.advance();
        assert_eq!(builder.clusters_remaining(), 8);
        // floor(8 · 0.7)
        assert_eq!(builder.quota(), 5);
    }
}
