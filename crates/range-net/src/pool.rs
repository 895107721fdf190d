//! Node identifier allocation.

use range_core::NodeId;

/// Bounded pool of node identifiers.
///
/// Regulated genes are handed out from the bottom of the id space through a
/// cursor; regulators are reserved from the top. The pool is exhausted when
/// the cursor meets the lowest reserved regulator.
#[derive(Debug, Clone)]
pub struct NodePool {
    node_count: usize,
    cursor: usize,
    regulators: Vec<NodeId>,
}

impl NodePool {
    /// Creates a pool covering `[0, node_count)`.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            cursor: 0,
            regulators: Vec::new(),
        }
    }

    /// First id that belongs to the regulator set.
    pub fn boundary(&self) -> usize {
        self.node_count - self.regulators.len()
    }

    /// Unassigned ids left between the cursor and the boundary.
    pub fn remaining(&self) -> usize {
        self.boundary().saturating_sub(self.cursor)
    }

    /// Whether no unassigned id is left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Unassigned id `offset` places past the cursor; `peek(0)` is what
    /// [`NodePool::take`] returns next.
    pub fn peek(&self, offset: usize) -> Option<NodeId> {
        let id = self.cursor + offset;
        (id < self.boundary()).then(|| NodeId::from(id))
    }

    /// Hands out the next unassigned id.
    pub fn take(&mut self) -> Option<NodeId> {
        let id = self.peek(0)?;
        self.cursor += 1;
        Some(id)
    }

    /// Returns the most recently taken id to the pool.
    pub fn give_back(&mut self, node: NodeId) -> bool {
        if self.cursor == 0 || node.index() != self.cursor - 1 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Reserves the highest unassigned id as a regulator.
    pub fn reserve_regulator(&mut self) -> Option<NodeId> {
        if self.is_exhausted() {
            return None;
        }
        let id = NodeId::from(self.boundary() - 1);
        self.regulators.push(id);
        Some(id)
    }

    /// Drops the most recently reserved regulator and returns its id to the pool.
    pub fn release_regulator(&mut self) -> Option<NodeId> {
        self.regulators.pop()
    }

    /// Regulators in reservation order.
    pub fn regulators(&self) -> &[NodeId] {
        &self.regulators
    }

    /// Whether `node` has been reserved as a regulator.
    pub fn is_regulator(&self, node: NodeId) -> bool {
        node.index() >= self.boundary() && node.index() < self.node_count
    }

    /// Ids handed out through the cursor so far.
    pub fn genes_taken(&self) -> usize {
        self.cursor
    }
}
