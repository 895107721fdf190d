//! Closing phases run once the cluster loop has stopped: the regulator
//! backbone, the fat-tail hubs and the placement of every node still unused.

use range_core::errors::RangeError;
use range_core::NodeId;
use tracing::{debug, warn};

use crate::context::GenerationContext;
use crate::grammar::{BlockKind, Entry, GeneEntry, MotifEntry};

const MIN_HUB_DEGREE: usize = 3;

/// Runs every closing phase in order.
pub fn finalize(ctx: &mut GenerationContext) -> Result<(), RangeError> {
    link_regulators(ctx)?;
    fill_fat_tail(ctx)?;
    ctx.tracker.release_parity_slot();
    place_leftovers(ctx)?;
    debug!(
        backbone = ctx.stats.backbone_entries,
        hubs = ctx.stats.hubs,
        pairs = ctx.stats.pairs,
        forced = ctx.stats.forced,
        "finalization done"
    );
    Ok(())
}

/// Chains each regulator to the one reserved after it and, on odd positions,
/// to the master regulator. Emitted as one `GLIST` block.
pub fn link_regulators(ctx: &mut GenerationContext) -> Result<(), RangeError> {
    let regulators = ctx.pool.regulators().to_vec();
    ctx.stats.regulators = regulators.len();
    ctx.writer.open(BlockKind::RegulatorList)?;
    for (position, pair) in regulators.windows(2).enumerate() {
        let (target, upstream) = (pair[0], pair[1]);
        let mut entry = GeneEntry::new(target);
        if ctx.tracker.fits(&[(target, 1), (upstream, 1)]) {
            ctx.regulate(&mut entry, upstream);
        }
        if let Some(master) = ctx.master {
            if position % 2 == 1 && ctx.tracker.fits(&[(target, 1), (master, 1)]) {
                ctx.regulate(&mut entry, master);
            }
        }
        if !entry.inputs.is_empty() {
            ctx.writer.entry(&Entry::Gene(entry))?;
            ctx.stats.backbone_entries += 1;
        }
    }
    ctx.writer.close()
}

/// Builds co-regulation hubs from fresh nodes, first up to the floor target of
/// the highest under-filled degree, then while the pool is larger than what
/// bins one and two can still absorb.
pub fn fill_fat_tail(ctx: &mut GenerationContext) -> Result<(), RangeError> {
    let max_degree = ctx.law.max_degree();
    ctx.writer.open(BlockKind::MotifList)?;

    while !ctx.pool.is_exhausted() {
        let Some(degree) = (MIN_HUB_DEGREE..=max_degree)
            .rev()
            .find(|&d| ctx.tracker.count(d) < ctx.law.capacity_floor(d))
        else {
            break;
        };
        if ctx.pool.remaining() < degree + 1 || ctx.tracker.capacity_remaining(1) < degree as i64
        {
            break;
        }
        hub(ctx, degree)?;
    }

    while !ctx.pool.is_exhausted() {
        let absorbable = ctx.tracker.capacity_remaining(1) + ctx.tracker.capacity_remaining(2);
        if absorbable >= ctx.pool.remaining() as i64 {
            break;
        }
        let Some(highest) = (MIN_HUB_DEGREE..=max_degree)
            .rev()
            .find(|&d| ctx.tracker.capacity_remaining(d) > 0)
        else {
            break;
        };
        let degree = (highest as i64)
            .min(ctx.pool.remaining() as i64 - 1)
            .min(ctx.tracker.capacity_remaining(1));
        if degree < MIN_HUB_DEGREE as i64 {
            break;
        }
        let degree = degree as usize;
        if ctx.tracker.capacity_remaining(degree) <= 0 {
            break;
        }
        hub(ctx, degree)?;
    }

    ctx.writer.close()
}

fn hub(ctx: &mut GenerationContext, degree: usize) -> Result<(), RangeError> {
    let Some(regulator) = ctx.pool.take() else {
        return Ok(());
    };
    let targets = ctx.take_nodes(degree);
    ctx.tracker.bump(regulator, targets.len());
    for target in &targets {
        ctx.tracker.increment(*target);
    }
    let sign = ctx.rng.sign();
    ctx.writer.entry(&Entry::Motif(MotifEntry::CoRegulation {
        regulator,
        targets,
        sign,
    }))?;
    ctx.stats.hubs += 1;
    Ok(())
}

/// Places every node still in the pool. An odd node goes first on its own,
/// the rest are paired as regulator and target while bin one has room.
pub fn place_leftovers(ctx: &mut GenerationContext) -> Result<(), RangeError> {
    ctx.writer.open(BlockKind::RegulatorList)?;
    if ctx.pool.remaining() % 2 == 1 {
        if let Some(node) = ctx.pool.take() {
            place_single(ctx, node)?;
        }
    }
    while let Some(regulator) = ctx.pool.take() {
        if !ctx.pool.is_exhausted() && ctx.tracker.capacity_remaining(1) > 0 {
            if let Some(target) = ctx.pool.take() {
                let mut entry = GeneEntry::new(target);
                ctx.regulate(&mut entry, regulator);
                ctx.writer.entry(&Entry::Gene(entry))?;
                ctx.stats.pairs += 1;
                continue;
            }
        }
        place_single(ctx, regulator)?;
    }
    ctx.writer.close()
}

/// Gives `node` its first edges: self-regulation into bin two, else one
/// existing regulator into bin one, else self-regulation plus enough existing
/// regulators to reach the lowest open degree from three up.
fn place_single(ctx: &mut GenerationContext, node: NodeId) -> Result<(), RangeError> {
    let mut entry = GeneEntry::new(node);

    if ctx.tracker.capacity_remaining(2) > 0 {
        ctx.regulate(&mut entry, node);
        ctx.stats.self_regulated += 1;
        return ctx.writer.entry(&Entry::Gene(entry));
    }

    if ctx.tracker.capacity_remaining(1) > 0 {
        if let Some(&partner) = admissible_partners(ctx, node, 1, 1).first() {
            ctx.regulate(&mut entry, partner);
            ctx.stats.partnered += 1;
            return ctx.writer.entry(&Entry::Gene(entry));
        }
    }

    for degree in MIN_HUB_DEGREE..=ctx.law.max_degree() {
        if ctx.tracker.capacity_remaining(degree) <= 0 {
            continue;
        }
        let partners = admissible_partners(ctx, node, degree, degree - 2);
        if partners.len() == degree - 2 {
            ctx.regulate(&mut entry, node);
            for partner in partners {
                ctx.regulate(&mut entry, partner);
            }
            ctx.stats.partnered += 1;
            return ctx.writer.entry(&Entry::Gene(entry));
        }
    }

    warn!(
        node = node.as_raw(),
        "no bin has room, self-regulating without capacity"
    );
    ctx.regulate(&mut entry, node);
    ctx.stats.forced += 1;
    ctx.writer.entry(&Entry::Gene(entry))
}

/// Up to `limit` placed nodes, highest id first, each raised by one while
/// `node` lands at `node_degree`. Candidates are admitted greedily against the
/// moves already accepted, so partners sharing a bin never overfill it.
fn admissible_partners(
    ctx: &GenerationContext,
    node: NodeId,
    node_degree: usize,
    limit: usize,
) -> Vec<NodeId> {
    let mut moves = vec![(node, node_degree.saturating_sub(ctx.tracker.degree(node)))];
    let mut partners = Vec::with_capacity(limit);
    for candidate in (0..ctx.law.node_count()).rev().map(NodeId::from) {
        if partners.len() == limit {
            break;
        }
        if candidate == node || ctx.tracker.degree(candidate) == 0 {
            continue;
        }
        moves.push((candidate, 1));
        if ctx.tracker.fits(&moves) {
            partners.push(candidate);
        } else {
            moves.pop();
        }
    }
    partners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    fn context(nodes: usize) -> GenerationContext {
        let mut ctx = GenerationContext::new(&GeneratorConfig::with_nodes(nodes)).unwrap();
        ctx.tracker.hold_parity_slot();
        ctx
    }

    #[test]
    fn fat_tail_hubs_stay_within_capacity() {
        let mut ctx = context(100);
        fill_fat_tail(&mut ctx).unwrap();
        assert!(ctx.stats().hubs > 0);
        assert_eq!(ctx.tracker().total(), 100);
        assert!(ctx.tracker().max_overshoot() <= 0);
        // floor target of degree 9 is zero for N = 100, so 8 is the first hub
        assert_eq!(ctx.tracker().count(9), 0);
        assert_eq!(ctx.tracker().count(8), 1);
        assert_eq!(ctx.stats().hubs, 16);
        assert_eq!(ctx.pool().remaining(), 16);
    }

    #[test]
    fn backbone_skips_regulators_without_room() {
        let mut ctx = context(100);
        let regulators: Vec<_> = (0..3).filter_map(|_| ctx.pool.reserve_regulator()).collect();
        let max = ctx.law.max_degree();
        ctx.tracker.bump(regulators[0], max);
        link_regulators(&mut ctx).unwrap();
        // only regulators[1] <- regulators[2] fits
        assert_eq!(ctx.stats().backbone_entries, 1);
        assert_eq!(ctx.tracker().degree(regulators[1]), 1);
        assert_eq!(ctx.tracker().degree(regulators[2]), 1);
        assert_eq!(ctx.stats().regulators, 3);
    }

    #[test]
    fn leftovers_are_paired_then_self_regulated() {
        let mut ctx = context(100);
        while ctx.pool.remaining() > 5 {
            let node = ctx.pool.take().unwrap();
            ctx.tracker.increment(node);
        }
        // bin one is saturated, so the odd node and the rest go to bin two
        assert!(ctx.tracker.capacity_remaining(1) <= 0);
        ctx.tracker.release_parity_slot();
        place_leftovers(&mut ctx).unwrap();
        assert!(ctx.pool().is_exhausted());
        assert_eq!(ctx.stats().self_regulated, 5);
        assert_eq!(ctx.stats().pairs, 0);
        assert_eq!(ctx.tracker().count(2), 5);
    }

    #[test]
    fn leftovers_pair_while_bin_one_has_room() {
        let mut ctx = context(100);
        ctx.tracker.release_parity_slot();
        for _ in 0..93 {
            let node = ctx.pool.take().unwrap();
            ctx.tracker.bump(node, 3);
        }
        place_leftovers(&mut ctx).unwrap();
        assert_eq!(ctx.stats().self_regulated, 1);
        assert_eq!(ctx.stats().pairs, 3);
        assert_eq!(ctx.tracker().count(1), 6);
        assert_eq!(ctx.stats().forced, 0);
    }

    /// N = 100: bins 1..=3 full, id 97 at degree six, ids 98 and 99 at five,
    /// so bin six has exactly one slot left.
    fn crowded_context() -> GenerationContext {
        let mut ctx = context(100);
        ctx.tracker.release_parity_slot();
        for raw in 1..=70 {
            ctx.tracker.increment(NodeId::from_raw(raw));
        }
        for raw in 71..=88 {
            ctx.tracker.bump(NodeId::from_raw(raw), 2);
        }
        for raw in 89..=96 {
            ctx.tracker.bump(NodeId::from_raw(raw), 3);
        }
        ctx.tracker.bump(NodeId::from_raw(97), 6);
        ctx.tracker.bump(NodeId::from_raw(98), 5);
        ctx.tracker.bump(NodeId::from_raw(99), 5);
        ctx
    }

    #[test]
    fn partners_sharing_a_bin_are_admitted_jointly() {
        let ctx = crowded_context();
        assert_eq!(ctx.tracker().capacity_remaining(6), 1);
        let node = NodeId::from_raw(0);
        let partners = admissible_partners(&ctx, node, 4, 2);
        assert_eq!(partners, vec![NodeId::from_raw(99), NodeId::from_raw(97)]);
    }

    #[test]
    fn single_with_partners_keeps_every_bin_within_capacity() {
        let mut ctx = crowded_context();
        let node = NodeId::from_raw(0);
        ctx.writer.open(BlockKind::RegulatorList).unwrap();
        place_single(&mut ctx, node).unwrap();
        ctx.writer.close().unwrap();

        assert_eq!(ctx.stats().partnered, 1);
        assert_eq!(ctx.stats().forced, 0);
        assert_eq!(ctx.tracker().degree(node), 4);
        assert_eq!(ctx.tracker().degree(NodeId::from_raw(98)), 5);
        assert_eq!(ctx.tracker().count(6), 1);
        assert_eq!(ctx.tracker().total(), 100);
        assert!(ctx.tracker().max_overshoot() <= 0);
    }
}
