//! Motifs hung off the regulated genes of a finished cluster.

use range_core::errors::RangeError;
use range_core::NodeId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::GenerationContext;
use crate::grammar::{BlockKind, Entry, MotifEntry};

const FEED_FORWARD_BAND: f64 = 0.4;
const MULTI_FEED_FORWARD_BAND: f64 = 0.8;
const MULTI_FEED_FORWARD_MIN: usize = 3;
const MULTI_FEED_FORWARD_MEAN: f64 = 1.0;
const CO_REGULATION_BASE: usize = 2;
const CO_REGULATION_MEAN: f64 = 10.0;

/// Structure attached at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotifShape {
    /// One regulator, two targets, three edges.
    FeedForwardLoop,
    /// One regulator, `size` targets, the first regulating the rest.
    MultiFeedForwardLoop {
        /// Number of targets.
        size: usize,
    },
    /// One regulator, `size` targets sharing one sign.
    SimpleCoRegulation {
        /// Number of targets.
        size: usize,
    },
}

impl MotifShape {
    /// Fresh pool nodes the motif consumed.
    pub fn consumed(&self) -> usize {
        match self {
            MotifShape::FeedForwardLoop => 2,
            MotifShape::MultiFeedForwardLoop { size } | MotifShape::SimpleCoRegulation { size } => {
                *size
            }
        }
    }
}

/// What happened at one motif site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotifOutcome {
    /// A motif was emitted.
    Attached(MotifShape),
    /// No shape fit the remaining capacity.
    Skipped,
}

/// Considers every `stride`-th gene of a cluster and emits the motifs that fit
/// as one `TMLIST` block. The master regulator and regulator-set members are
/// never motif sites.
pub fn attach_motifs(
    ctx: &mut GenerationContext,
    genes: &[NodeId],
    stride: usize,
) -> Result<Vec<MotifOutcome>, RangeError> {
    ctx.writer.open(BlockKind::MotifList)?;
    let mut outcomes = Vec::new();
    for gene in genes.iter().step_by(stride.max(1)) {
        if Some(*gene) == ctx.master || ctx.pool.is_regulator(*gene) {
            continue;
        }
        outcomes.push(attach_motif(ctx, *gene)?);
    }
    ctx.writer.close()?;
    Ok(outcomes)
}

/// Draws a shape for `gene` and attaches it if capacity allows. Feed-forward
/// shapes that do not fit fall back to co-regulation.
pub fn attach_motif(
    ctx: &mut GenerationContext,
    gene: NodeId,
) -> Result<MotifOutcome, RangeError> {
    let band = ctx.rng.unit();
    let headroom = ctx
        .law
        .max_degree()
        .saturating_sub(ctx.tracker.degree(gene));

    let mut shape = None;
    if band < FEED_FORWARD_BAND {
        shape = feed_forward(ctx, gene)?;
    } else if band < MULTI_FEED_FORWARD_BAND {
        shape = multi_feed_forward(ctx, gene, headroom)?;
    }
    if shape.is_none() {
        shape = co_regulation(ctx, gene, headroom)?;
    }

    let outcome = match shape {
        Some(shape) => {
            match shape {
                MotifShape::FeedForwardLoop => ctx.stats.feed_forward_loops += 1,
                MotifShape::MultiFeedForwardLoop { .. } => ctx.stats.multi_feed_forward_loops += 1,
                MotifShape::SimpleCoRegulation { .. } => ctx.stats.co_regulations += 1,
            }
            MotifOutcome::Attached(shape)
        }
        None => {
            ctx.stats.skipped_motifs += 1;
            MotifOutcome::Skipped
        }
    };
    debug!(gene = gene.as_raw(), band, ?outcome, "motif site");
    Ok(outcome)
}

fn feed_forward(
    ctx: &mut GenerationContext,
    regulator: NodeId,
) -> Result<Option<MotifShape>, RangeError> {
    let (Some(first), Some(second)) = (ctx.pool.peek(0), ctx.pool.peek(1)) else {
        return Ok(None);
    };
    if !ctx
        .tracker
        .fits(&[(regulator, 2), (first, 2), (second, 2)])
    {
        return Ok(None);
    }
    let signs = [ctx.rng.sign(), ctx.rng.sign(), ctx.rng.sign()];
    ctx.take_nodes(2);
    for node in [regulator, first, second] {
        ctx.tracker.bump(node, 2);
    }
    ctx.writer.entry(&Entry::Motif(MotifEntry::FeedForward {
        regulator,
        first,
        second,
        signs,
    }))?;
    Ok(Some(MotifShape::FeedForwardLoop))
}

fn multi_feed_forward(
    ctx: &mut GenerationContext,
    regulator: NodeId,
    headroom: usize,
) -> Result<Option<MotifShape>, RangeError> {
    let drawn = MULTI_FEED_FORWARD_MIN
        + ctx.rng.exponential(MULTI_FEED_FORWARD_MEAN).floor() as usize;
    let size = drawn.min(headroom);
    if size < MULTI_FEED_FORWARD_MIN || ctx.pool.remaining() < size {
        return Ok(None);
    }
    let mut moves = Vec::with_capacity(size + 1);
    moves.push((regulator, size));
    for offset in 0..size {
        let Some(node) = ctx.pool.peek(offset) else {
            return Ok(None);
        };
        moves.push((node, if offset == 0 { size } else { 2 }));
    }
    if !ctx.tracker.fits(&moves) {
        return Ok(None);
    }
    let signs = [ctx.rng.sign(), ctx.rng.sign(), ctx.rng.sign()];
    let targets = ctx.take_nodes(size);
    for (node, by) in moves {
        ctx.tracker.bump(node, by);
    }
    ctx.writer.entry(&Entry::Motif(MotifEntry::MultiFeedForward {
        regulator,
        first: targets[0],
        chained: targets[1..].to_vec(),
        signs,
    }))?;
    Ok(Some(MotifShape::MultiFeedForwardLoop { size }))
}

fn co_regulation(
    ctx: &mut GenerationContext,
    regulator: NodeId,
    headroom: usize,
) -> Result<Option<MotifShape>, RangeError> {
    let drawn = CO_REGULATION_BASE + ctx.rng.exponential(CO_REGULATION_MEAN).floor() as usize;
    let size = drawn.min(headroom).min(ctx.pool.remaining());
    if size == 0 {
        return Ok(None);
    }
    let mut moves = Vec::with_capacity(size + 1);
    moves.push((regulator, size));
    for offset in 0..size {
        let Some(node) = ctx.pool.peek(offset) else {
            return Ok(None);
        };
        moves.push((node, 1));
    }
    if !ctx.tracker.fits(&moves) {
        return Ok(None);
    }
    let sign = ctx.rng.sign();
    let targets = ctx.take_nodes(size);
    for (node, by) in moves {
        ctx.tracker.bump(node, by);
    }
    ctx.writer.entry(&Entry::Motif(MotifEntry::CoRegulation {
        regulator,
        targets,
        sign,
    }))?;
    Ok(Some(MotifShape::SimpleCoRegulation { size }))
}
