//! Basic blocks.

use std::fmt;

use bitflags::bitflags;

use crate::graph::{BlockId, Graph, InstId};

bitflags! {
    /// Role of a block in the graph and inside try/catch regions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockFlags: u8 {
        /// Start block, holds parameters and constants
        const START = 0x01;
        /// End block, never holds instructions
        const END = 0x02;
        /// Entry block of a try region, ends with a `Try` instruction
        const TRY_BEGIN = 0x04;
        /// Exit block of a try region
        const TRY_END = 0x08;
        /// Block inside a try region
        const TRY = 0x10;
        /// First block of an exception handler
        const CATCH_BEGIN = 0x20;
        /// Block of an exception handler
        const CATCH = 0x40;
    }
}

/// A basic block: an ordered, doubly linked run of instructions plus its control flow edges.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub(crate) id: BlockId,
    pub(crate) first: Option<InstId>,
    pub(crate) last: Option<InstId>,
    pub(crate) len: usize,
    pub(crate) preds: Vec<BlockId>,
    pub(crate) succs: Vec<BlockId>,
    pub(crate) flags: BlockFlags,
    pub(crate) try_id: Option<u32>,
}

impl BasicBlock {
    pub(crate) fn new(id: BlockId) -> BasicBlock {
        BasicBlock {
            id,
            first: None,
            last: None,
            len: 0,
            preds: Vec::new(),
            succs: Vec::new(),
            flags: BlockFlags::empty(),
            try_id: None,
        }
    }

    /// Handle of this block.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// First instruction, if any.
    #[must_use]
    pub fn first_inst(&self) -> Option<InstId> {
        self.first
    }

    /// Last instruction, if any.
    #[must_use]
    pub fn last_inst(&self) -> Option<InstId> {
        self.last
    }

    /// Number of instructions.
    #[must_use]
    pub fn inst_count(&self) -> usize {
        self.len
    }

    /// Returns `true` if the block holds no instruction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ordered predecessors, with one entry per incoming edge.
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.preds
    }

    /// Ordered successors, with one entry per outgoing edge.
    #[must_use]
    pub fn successors(&self) -> &[BlockId] {
        &self.succs
    }

    /// Role flags.
    #[must_use]
    pub fn flags(&self) -> BlockFlags {
        self.flags
    }

    /// Identity of the innermost try region this block belongs to.
    #[must_use]
    pub fn try_id(&self) -> Option<u32> {
        self.try_id
    }

    /// Returns `true` for the start block.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.flags.contains(BlockFlags::START)
    }

    /// Returns `true` for the end block.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.flags.contains(BlockFlags::END)
    }

    /// Returns `true` for the entry block of a try region.
    #[must_use]
    pub fn is_try_begin(&self) -> bool {
        self.flags.contains(BlockFlags::TRY_BEGIN)
    }

    /// Returns `true` for the exit block of a try region.
    #[must_use]
    pub fn is_try_end(&self) -> bool {
        self.flags.contains(BlockFlags::TRY_END)
    }

    /// Returns `true` for blocks inside a try region.
    #[must_use]
    pub fn is_try(&self) -> bool {
        self.flags.contains(BlockFlags::TRY)
    }

    /// Returns `true` for the first block of an exception handler.
    #[must_use]
    pub fn is_catch_begin(&self) -> bool {
        self.flags.contains(BlockFlags::CATCH_BEGIN)
    }

    /// Returns `true` for the blocks of an exception handler.
    #[must_use]
    pub fn is_catch(&self) -> bool {
        self.flags.contains(BlockFlags::CATCH)
    }
}

/// Iterator over the instructions of one block, following the `next` links.
pub struct InstIter<'g> {
    graph: &'g Graph,
    current: Option<InstId>,
}

impl<'g> InstIter<'g> {
    pub(crate) fn new(graph: &'g Graph, first: Option<InstId>) -> Self {
        InstIter {
            graph,
            current: first,
        }
    }
}

impl Iterator for InstIter<'_> {
    type Item = InstId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.graph.inst(current).ok().and_then(|inst| inst.next);
        Some(current)
    }
}

fn flag_names(flags: BlockFlags) -> Vec<&'static str> {
    let mut names = Vec::new();
    for (name, flag) in [
        ("start", BlockFlags::START),
        ("end", BlockFlags::END),
        ("try_begin", BlockFlags::TRY_BEGIN),
        ("try_end", BlockFlags::TRY_END),
        ("try", BlockFlags::TRY),
        ("catch_begin", BlockFlags::CATCH_BEGIN),
        ("catch", BlockFlags::CATCH),
    ] {
        if flags.contains(flag) {
            names.push(name);
        }
    }
    names
}

fn fmt_ids(ids: &[BlockId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn fmt_block(graph: &Graph, block: &BasicBlock, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", block.id)?;
    let names = flag_names(block.flags);
    if !names.is_empty() {
        write!(f, " [{}]", names.join(", "))?;
    }
    if let Some(try_id) = block.try_id {
        write!(f, " try#{try_id}")?;
    }
    writeln!(
        f,
        " preds: [{}] succs: [{}]",
        fmt_ids(&block.preds),
        fmt_ids(&block.succs)
    )?;

    for inst in InstIter::new(graph, block.first) {
        if let Ok(inst) = graph.inst(inst) {
            writeln!(f, "    {inst}")?;
        }
    }
    Ok(())
}

/// Textual dump of one block, as produced by `{}` on a [`Graph`].
pub struct BlockDump<'g> {
    graph: &'g Graph,
    block: &'g BasicBlock,
}

impl Graph {
    /// Returns a displayable dump of a single block.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block.
    pub fn dump_block(&self, block: BlockId) -> crate::Result<BlockDump<'_>> {
        Ok(BlockDump {
            graph: self,
            block: self.block(block)?,
        })
    }
}

impl fmt::Display for BlockDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_block(self.graph, self.block, f)
    }
}
