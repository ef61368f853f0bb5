//! Instruction graph engine.
//!
//! A [`Graph`] is the editable control-flow / data-flow form of one function body. It is an arena:
//! every [`BasicBlock`] and [`Inst`] lives in the graph and is addressed through a [`BlockId`] or
//! [`InstId`]. Handles carry the [`GraphId`] of the graph that created them, so handles of another
//! graph, and handles of erased blocks or removed instructions, are rejected with
//! [`crate::Error::BadArgument`] instead of touching unrelated data.
//!
//! # Structure
//!
//! - Every graph has a **start** block holding parameters and constants, and an **end** block
//!   without instructions that every returning or throwing block flows into.
//! - Blocks keep ordered predecessor and successor lists. Successor 0 is the true branch or
//!   fallthrough, successor 1 the false branch or the exceptional edge of a try boundary.
//! - Instructions keep ordered inputs and a user multiset mirroring them.
//! - Phi input `i` is the value flowing in from predecessor `i`.
//!
//! # Key Components
//!
//! - [`crate::graph::inst`] - Instructions and the data-flow editing operations
//! - [`crate::graph::block`] - Basic blocks and their try/catch flags
//! - [`crate::graph::cfg`] - Successor edge editing and block splitting
//! - [`crate::graph::traversal`] - Reverse postorder traversal
//! - [`crate::graph::dominators`] - Dominator tree
//! - [`crate::graph::passes`] - Unreachable block removal and try/catch insertion
//! - [`crate::graph::verify`] - Structural invariant checking
//!
//! # Lifetime
//!
//! A graph is created from a function with [`crate::AbcFile::create_graph_from_function`] and
//! written back with [`crate::AbcFile::function_set_graph`], which encodes a copy. Dropping the
//! graph releases all of its blocks and instructions.

pub mod block;
pub mod cfg;
pub mod dominators;
pub mod inst;
pub mod passes;
pub mod traversal;
pub mod verify;

pub use block::{BasicBlock, BlockFlags, InstIter};
pub use dominators::DominatorTree;
pub use inst::{ConstantValue, Inst, Reference};

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::{
    isa::{OpKind, Opcode, Target},
    metadata::{
        ids::{FileId, FunctionId},
        types::TypeId,
    },
    Result,
};
use inst::InstData;

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

/// Process-wide unique identity of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphId(u32);

impl GraphId {
    fn next() -> GraphId {
        GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Handle of an instruction inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstId {
    graph: GraphId,
    index: u32,
}

impl InstId {
    /// Position of the instruction in the arena of its graph.
    #[must_use]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Graph this handle belongs to.
    #[must_use]
    pub fn graph(self) -> GraphId {
        self.graph
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.index)
    }
}

/// Handle of a basic block inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId {
    graph: GraphId,
    index: u32,
}

impl BlockId {
    /// Position of the block in the arena of its graph.
    #[must_use]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Graph this handle belongs to.
    #[must_use]
    pub fn graph(self) -> GraphId {
        self.graph
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.index)
    }
}

/// Editable control-flow / data-flow graph of one function body.
pub struct Graph {
    id: GraphId,
    file: FileId,
    function: FunctionId,
    target: Target,
    params: Vec<TypeId>,
    pub(crate) blocks: Vec<Option<BasicBlock>>,
    pub(crate) insts: Vec<Option<Inst>>,
    start: BlockId,
    end: BlockId,
    next_try_id: u32,
}

impl Graph {
    /// Creates a graph with an empty start block (holding one parameter per entry of `params`)
    /// and an empty end block.
    ///
    /// # Errors
    /// Never fails in practice; arena exhaustion is reported as [`crate::Error::NotSupported`].
    pub(crate) fn new(
        file: FileId,
        function: FunctionId,
        target: Target,
        params: &[TypeId],
    ) -> Result<Graph> {
        let id = GraphId::next();
        let placeholder = BlockId { graph: id, index: 0 };
        let mut graph = Graph {
            id,
            file,
            function,
            target,
            params: params.to_vec(),
            blocks: Vec::new(),
            insts: Vec::new(),
            start: placeholder,
            end: placeholder,
            next_try_id: 0,
        };

        graph.start = graph.create_empty_block()?;
        graph.end = graph.create_empty_block()?;
        graph.block_mut(graph.start)?.flags.insert(BlockFlags::START);
        graph.block_mut(graph.end)?.flags.insert(BlockFlags::END);

        Ok(graph)
    }

    /// Creates the parameter instructions of the start block, in parameter order.
    pub(crate) fn create_parameters(&mut self) -> Result<()> {
        let Some(opcode) = Opcode::graph_op(self.target, OpKind::Parameter) else {
            return Err(crate::Error::NotSupported);
        };
        for (index, ty) in self.params.clone().into_iter().enumerate() {
            let parameter = self.create_inst(InstData::new(opcode, ty).imms(vec![index as u64]))?;
            self.add_inst_back(self.start, parameter)?;
        }
        Ok(())
    }

    /// Unique identity of this graph.
    #[must_use]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Identity of the file this graph was created from.
    #[must_use]
    pub fn file_id(&self) -> FileId {
        self.file
    }

    /// Function this graph was created from.
    #[must_use]
    pub fn function(&self) -> FunctionId {
        self.function
    }

    /// Instruction set of every instruction in this graph.
    #[must_use]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Number of parameters of the function.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Types of the parameters of the function.
    #[must_use]
    pub fn param_types(&self) -> &[TypeId] {
        &self.params
    }

    /// The start block.
    #[must_use]
    pub fn start(&self) -> BlockId {
        self.start
    }

    /// The end block.
    #[must_use]
    pub fn end(&self) -> BlockId {
        self.end
    }

    /// Returns the block behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `id` belongs to another graph or the block was erased.
    pub fn block(&self, id: BlockId) -> Result<&BasicBlock> {
        if id.graph != self.id {
            return Err(bad_argument!("block {} belongs to graph {}, not {}", id, id.graph, self.id));
        }
        match self.blocks.get(id.index()) {
            Some(Some(block)) => Ok(block),
            _ => Err(bad_argument!("block {} does not exist in graph {}", id, self.id)),
        }
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Result<&mut BasicBlock> {
        if id.graph != self.id {
            return Err(bad_argument!("block {} belongs to graph {}, not {}", id, id.graph, self.id));
        }
        let graph = self.id;
        match self.blocks.get_mut(id.index()) {
            Some(Some(block)) => Ok(block),
            _ => Err(bad_argument!("block {} does not exist in graph {}", id, graph)),
        }
    }

    /// Returns the instruction behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `id` belongs to another graph or the instruction was
    /// removed.
    pub fn inst(&self, id: InstId) -> Result<&Inst> {
        if id.graph != self.id {
            return Err(bad_argument!(
                "instruction {} belongs to graph {}, not {}",
                id,
                id.graph,
                self.id
            ));
        }
        match self.insts.get(id.index()) {
            Some(Some(inst)) => Ok(inst),
            _ => Err(bad_argument!("instruction {} does not exist in graph {}", id, self.id)),
        }
    }

    pub(crate) fn inst_mut(&mut self, id: InstId) -> Result<&mut Inst> {
        if id.graph != self.id {
            return Err(bad_argument!(
                "instruction {} belongs to graph {}, not {}",
                id,
                id.graph,
                self.id
            ));
        }
        let graph = self.id;
        match self.insts.get_mut(id.index()) {
            Some(Some(inst)) => Ok(inst),
            _ => Err(bad_argument!("instruction {} does not exist in graph {}", id, graph)),
        }
    }

    /// Iterates over the handles of all live blocks, in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .filter_map(|block| block.as_ref().map(BasicBlock::id))
    }

    /// Iterates over the handles of all live instructions, in creation order.
    ///
    /// Unlinked instructions are included.
    pub fn insts(&self) -> impl Iterator<Item = InstId> + '_ {
        self.insts
            .iter()
            .filter_map(|inst| inst.as_ref().map(Inst::id))
    }

    /// Number of live blocks, start and end included.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.iter().flatten().count()
    }

    /// Iterates over the instructions of `block` in order.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block.
    pub fn block_insts(&self, block: BlockId) -> Result<InstIter<'_>> {
        let first = self.block(block)?.first_inst();
        Ok(InstIter::new(self, first))
    }

    /// Returns the block handle for the arena slot `index`, if that block is live.
    pub(crate) fn block_at(&self, index: usize) -> Option<BlockId> {
        self.blocks.get(index)?.as_ref().map(BasicBlock::id)
    }

    fn make_block_id(&self) -> Result<BlockId> {
        let index = u32::try_from(self.blocks.len()).map_err(|_| crate::Error::NotSupported)?;
        Ok(BlockId {
            graph: self.id,
            index,
        })
    }

    fn make_inst_id(&self) -> Result<InstId> {
        let index = u32::try_from(self.insts.len()).map_err(|_| crate::Error::NotSupported)?;
        Ok(InstId {
            graph: self.id,
            index,
        })
    }

    pub(crate) fn allocate_try_id(&mut self) -> u32 {
        let id = self.next_try_id;
        self.next_try_id += 1;
        id
    }

    pub(crate) fn reserve_try_ids(&mut self, count: u32) {
        self.next_try_id = self.next_try_id.max(count);
    }

    /// Returns the leading phi of `block` whose kind is `kind`, in order.
    pub(crate) fn leading_phis(&self, block: BlockId, kind: OpKind) -> Result<Vec<InstId>> {
        let mut phis = Vec::new();
        for inst in self.block_insts(block)? {
            let opcode_kind = self.inst(inst)?.kind();
            if !opcode_kind.is_phi() {
                break;
            }
            if opcode_kind == kind {
                phis.push(inst);
            }
        }
        Ok(phis)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "graph {} of {} ({}, {} params)",
            self.id,
            self.function,
            self.target,
            self.params.len()
        )?;
        for block in self.blocks.iter().flatten() {
            block::fmt_block(self, block, f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("file", &self.file)
            .field("function", &self.function)
            .field("target", &self.target)
            .field("blocks", &self.block_count())
            .finish_non_exhaustive()
    }
}
