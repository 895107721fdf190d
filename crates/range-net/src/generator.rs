use range_core::errors::RangeError;
use tracing::{debug, info};

use crate::audit;
use crate::bins::BinTracker;
use crate::cluster::{ClusterBuilder, ClusterOutcome};
use crate::config::GeneratorConfig;
use crate::context::{GenerationContext, RunStats};
use crate::finalize::finalize;
use crate::hash::document_digest;
use crate::motifs::{attach_motifs, MotifOutcome};
use crate::report::{DegreeHistogram, NodeDegreeListing, RunSummary};

/// A finished run: the document and the bookkeeping that produced it.
#[derive(Debug, Clone)]
pub struct Network {
    config: GeneratorConfig,
    document: String,
    tracker: BinTracker,
    stats: RunStats,
}

impl Network {
    /// The grammar document.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Consumes the network and returns the document.
    pub fn into_document(self) -> String {
        self.document
    }

    /// Configuration the run used.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Final degree bookkeeping.
    pub fn tracker(&self) -> &BinTracker {
        &self.tracker
    }

    /// Counters of the run.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Degree of every node.
    pub fn degrees(&self) -> &[usize] {
        self.tracker.degrees()
    }

    /// Node counts per degree up to the maximum degree.
    pub fn histogram(&self) -> DegreeHistogram {
        DegreeHistogram::from_degrees(self.tracker.degrees(), self.tracker.law().max_degree())
    }

    /// Per-node degree listing.
    pub fn listing(&self) -> NodeDegreeListing<'_> {
        NodeDegreeListing::new(self.tracker.degrees())
    }

    /// Machine readable summary.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            node_count: self.config.node_count,
            seed: self.config.seed,
            constant: self.config.constant,
            max_degree: self.tracker.law().max_degree(),
            digest: document_digest(&self.document),
            max_overshoot: self.tracker.max_overshoot(),
            stats: self.stats.clone(),
            histogram: self.histogram(),
        }
    }
}

/// Generates one network.
///
/// Clusters are built until the pool runs dry, the cluster counter reaches
/// zero or the tier-one quota vanishes; each built cluster gets its motifs
/// before the next one starts. Finalization then links the regulators, fills
/// the high-degree bins and places every remaining node.
pub fn generate(config: &GeneratorConfig) -> Result<Network, RangeError> {
    let mut ctx = GenerationContext::new(config)?;
    ctx.tracker.hold_parity_slot();
    let mut builder = ClusterBuilder::new(ctx.law);

    while builder.has_work(&ctx) {
        let Some(outcome) = builder.build(&mut ctx)? else {
            break;
        };
        builder.advance();
        match outcome {
            ClusterOutcome::Empty { dead_end: true } => break,
            ClusterOutcome::Empty { dead_end: false } => {}
            ClusterOutcome::Built { genes } => {
                for outcome in attach_motifs(&mut ctx, &genes, config.motif_stride)? {
                    if let MotifOutcome::Attached(shape) = outcome {
                        builder.grow_pool_scale(shape.consumed());
                    }
                }
            }
        }
    }
    debug!(
        clusters = ctx.stats.clusters,
        empty = ctx.stats.empty_clusters,
        pool_left = ctx.pool.remaining(),
        pool_scale = builder.pool_scale(),
        "cluster loop finished"
    );

    finalize(&mut ctx)?;
    let (writer, tracker, stats) = ctx.into_parts();
    let document = writer.finish()?;

    if config.verify {
        audit::verify(&document, &tracker)?;
    }

    info!(
        nodes = config.node_count,
        seed = config.seed,
        bytes = document.len(),
        clusters = stats.clusters,
        hubs = stats.hubs,
        forced = stats.forced,
        rng_draws = stats.rng_draws,
        "network generated"
    );

    Ok(Network {
        config: config.clone(),
        document,
        tracker,
        stats,
    })
}
