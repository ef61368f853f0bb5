//! Graph to body encoding.
//!
//! Blocks are laid out in reverse postorder starting with the start block; blocks that are not
//! reachable from start are dropped. Every laid out block contributes at least one instruction,
//! the first of which carries the leader flag. Phi moves are placed in front of the terminator
//! of each predecessor, and a jump closes every block whose normal successor is not the next
//! block of the layout.

use std::collections::HashMap;

use crate::{
    bytecode::{ic_slots, Body, RawInst, TryRange},
    graph::{BlockId, Graph, InstId},
    isa::OpKind,
    metadata::types::TypeId,
    Result,
};

/// Encodes `graph` into a complete body.
///
/// # Errors
/// [`crate::Error::BadArgument`] if the graph can not be laid out: a reachable block without a
/// successor, a branch without two successors, a value used outside of the reachable blocks or
/// a phi fed different values over two edges from the same predecessor.
pub(crate) fn encode(graph: &Graph) -> Result<Vec<u8>> {
    let body = Encoder::new(graph)?.run()?;
    log::debug!(
        "encoded {} into {} instructions, {} registers",
        graph.function(),
        body.insts.len(),
        body.register_count
    );
    body.write()
}

enum Item {
    Inst(InstId),
    Mov { dst: u32, src: u32 },
    Jump(BlockId),
}

struct Encoder<'g> {
    graph: &'g Graph,
    layout: Vec<BlockId>,
    registers: HashMap<InstId, u32>,
    incoming: HashMap<InstId, u32>,
    register_count: u32,
}

impl<'g> Encoder<'g> {
    fn new(graph: &'g Graph) -> Result<Self> {
        let end = graph.end();
        let layout = graph
            .blocks_rpo()
            .into_iter()
            .filter(|block| *block != end)
            .collect();
        let register_count = u32::try_from(graph.param_count())
            .map_err(|_| bad_argument!("too many parameters"))?;

        Ok(Encoder {
            graph,
            layout,
            registers: HashMap::new(),
            incoming: HashMap::new(),
            register_count,
        })
    }

    fn next_register(&mut self) -> u32 {
        let register = self.register_count;
        self.register_count += 1;
        register
    }

    /// Instructions of `block` that are encoded, parameters excluded.
    fn block_insts(&self, block: BlockId) -> Result<Vec<InstId>> {
        let mut insts = Vec::new();
        for inst in self.graph.block_insts(block)? {
            if self.graph.inst(inst)?.kind() != OpKind::Parameter {
                insts.push(inst);
            }
        }
        Ok(insts)
    }

    fn assign_registers(&mut self) -> Result<()> {
        let graph = self.graph;
        for inst in graph.block_insts(graph.start())? {
            let node = graph.inst(inst)?;
            if node.kind() == OpKind::Parameter {
                let index = node.imms().first().copied().unwrap_or_default();
                let register =
                    u32::try_from(index).map_err(|_| bad_argument!("bad parameter index"))?;
                self.registers.insert(inst, register);
            }
        }

        for block in self.layout.clone() {
            for inst in self.block_insts(block)? {
                let (kind, ty) = {
                    let node = graph.inst(inst)?;
                    (node.kind(), node.ty())
                };
                if ty == TypeId::Void && !kind.is_phi() && kind != OpKind::Constant {
                    continue;
                }
                let register = self.next_register();
                self.registers.insert(inst, register);
                if kind == OpKind::Phi {
                    let register = self.next_register();
                    self.incoming.insert(inst, register);
                }
            }
        }
        Ok(())
    }

    fn register_of(&self, inst: InstId, user: InstId) -> Result<u32> {
        self.registers.get(&inst).copied().ok_or_else(|| {
            bad_argument!(
                "{} uses {} which is not placed in a reachable block",
                user,
                inst
            )
        })
    }

    /// Moves filling the incoming registers of the phis of every successor of `block`.
    fn phi_moves(&self, block: BlockId) -> Result<Vec<Item>> {
        let mut moves = Vec::new();
        let mut seen: Vec<BlockId> = Vec::new();

        for succ in self.graph.block(block)?.successors() {
            if seen.contains(succ) {
                continue;
            }
            seen.push(*succ);

            let slots: Vec<usize> = self
                .graph
                .block(*succ)?
                .predecessors()
                .iter()
                .enumerate()
                .filter(|(_, pred)| **pred == block)
                .map(|(slot, _)| slot)
                .collect();

            for phi in self.graph.leading_phis(*succ, OpKind::Phi)? {
                let inputs = self.graph.inst(phi)?.inputs();
                let mut value = None;
                for slot in &slots {
                    let Some(input) = inputs.get(*slot) else {
                        return Err(bad_argument!("phi {} misses the input of {}", phi, block));
                    };
                    if value.is_some_and(|value| value != *input) {
                        return Err(bad_argument!(
                            "phi {} receives different values over the edges from {}",
                            phi,
                            block
                        ));
                    }
                    value = Some(*input);
                }
                if let Some(value) = value {
                    let dst = self.incoming[&phi];
                    moves.push(Item::Mov {
                        dst,
                        src: self.register_of(value, phi)?,
                    });
                }
            }
        }
        Ok(moves)
    }

    /// The successor `block` continues with when it does not branch away.
    fn normal_successor(&self, block: BlockId, terminator: Option<OpKind>) -> Result<Option<BlockId>> {
        let node = self.graph.block(block)?;
        let succs = node.successors();

        let (expected, normal) = match terminator {
            Some(OpKind::If) => (2, succs.get(1)),
            Some(OpKind::Try) => (2, succs.first()),
            Some(OpKind::Return | OpKind::Throw) => {
                self.exit_of(block)?;
                return Ok(None);
            }
            _ if node.is_try_end() => (2, succs.first()),
            _ => (1, succs.first()),
        };

        if succs.len() != expected {
            return Err(bad_argument!(
                "{} needs {} successor(s), has {}",
                block,
                expected,
                succs.len()
            ));
        }
        Ok(normal.copied())
    }

    /// Successor of a block that leaves the function: the end block, or the exit block of the try
    /// region it closes.
    fn exit_of(&self, block: BlockId) -> Result<BlockId> {
        match self.graph.block(block)?.successors() {
            [exit] if *exit == self.graph.end() || self.graph.block(*exit)?.is_try_end() => {
                Ok(*exit)
            }
            _ => Err(bad_argument!(
                "{} leaves the function but does not flow into the end block or a try exit",
                block
            )),
        }
    }

    fn block_items(&self, index: usize) -> Result<Vec<Item>> {
        let block = self.layout[index];
        let insts = self.block_insts(block)?;

        let terminator = match insts.last() {
            Some(last) if self.graph.inst(*last)?.kind().is_terminator() => Some(*last),
            _ => None,
        };
        let terminator_kind = match terminator {
            Some(inst) => Some(self.graph.inst(inst)?.kind()),
            None => None,
        };

        let mut items: Vec<Item> = insts
            .iter()
            .filter(|inst| Some(**inst) != terminator)
            .map(|inst| Item::Inst(*inst))
            .collect();
        items.extend(self.phi_moves(block)?);
        if let Some(terminator) = terminator {
            items.push(Item::Inst(terminator));
        }

        if let Some(normal) = self.normal_successor(block, terminator_kind)? {
            let fallthrough = self
                .layout
                .get(index + 1)
                .copied()
                .unwrap_or(self.graph.end());
            if normal != fallthrough || items.is_empty() {
                items.push(Item::Jump(normal));
            }
        }
        Ok(items)
    }

    fn run(mut self) -> Result<Body> {
        self.assign_registers()?;

        let mut blocks = Vec::with_capacity(self.layout.len());
        for index in 0..self.layout.len() {
            blocks.push(self.block_items(index)?);
        }

        let mut block_pc: HashMap<BlockId, u32> = HashMap::new();
        let mut item_pc: HashMap<InstId, u32> = HashMap::new();
        let mut order = Vec::new();
        let mut pc: u32 = 0;
        for (block, items) in self.layout.iter().zip(&blocks) {
            block_pc.insert(*block, pc);
            for item in items {
                if let Item::Inst(inst) = item {
                    item_pc.insert(*inst, pc);
                    order.push(*inst);
                }
                pc = pc
                    .checked_add(1)
                    .ok_or_else(|| bad_argument!("function body too large"))?;
            }
        }
        let inst_count = pc;
        let end = self.graph.end();
        let pc_of = |block: BlockId| -> Result<u32> {
            if block == end {
                return Ok(inst_count);
            }
            block_pc
                .get(&block)
                .copied()
                .ok_or_else(|| bad_argument!("{} is not reachable from start", block))
        };

        let slots = ic_slots::allocate(self.graph, &order)?;

        let mut insts = Vec::with_capacity(inst_count as usize);
        for (block, items) in self.layout.iter().zip(&blocks) {
            for (position, item) in items.iter().enumerate() {
                let mut raw = match item {
                    Item::Inst(inst) => self.raw_inst(*inst, *block, &slots, &pc_of)?,
                    Item::Mov { dst, src } => RawInst::mov(*dst, *src),
                    Item::Jump(target) => RawInst::jump(pc_of(*target)?),
                };
                raw.leader = position == 0;
                insts.push(raw);
            }
        }

        let tries = self.tries(&item_pc, &pc_of)?;

        Ok(Body {
            param_count: u32::try_from(self.graph.param_count())
                .map_err(|_| bad_argument!("too many parameters"))?,
            register_count: self.register_count,
            tries,
            insts,
        })
    }

    fn raw_inst(
        &self,
        id: InstId,
        block: BlockId,
        slots: &HashMap<InstId, u16>,
        pc_of: &impl Fn(BlockId) -> Result<u32>,
    ) -> Result<RawInst> {
        let inst = self.graph.inst(id)?;
        let mut raw = RawInst::new(inst.opcode().code(), inst.ty());
        raw.dst = self.registers.get(&id).copied();
        raw.inputs = match inst.kind() {
            OpKind::Phi => vec![self.incoming[&id]],
            _ => inst
                .inputs()
                .iter()
                .map(|input| self.register_of(*input, id))
                .collect::<Result<_>>()?,
        };
        raw.imms = inst.imms().to_vec();
        raw.reference = inst.reference();
        raw.cc = inst.condition_code();
        raw.constant = inst.constant();
        raw.ic_slot = if inst.opcode().has_ic_slot() {
            slots.get(&id).copied()
        } else {
            inst.ic_slot()
        };
        match inst.kind() {
            OpKind::If => {
                let target = self.graph.true_branch(block)?;
                raw.target = Some(pc_of(target)?);
            }
            // a region closed by leaving the function names its try exit
            OpKind::Return | OpKind::Throw => {
                let exit = self.exit_of(block)?;
                if exit != self.graph.end() {
                    raw.target = Some(pc_of(exit)?);
                }
            }
            _ => {}
        }
        Ok(raw)
    }

    fn tries(
        &self,
        item_pc: &HashMap<InstId, u32>,
        pc_of: &impl Fn(BlockId) -> Result<u32>,
    ) -> Result<Vec<TryRange>> {
        let mut tries = Vec::new();

        for block in &self.layout {
            let node = self.graph.block(*block)?;
            if !node.is_try_begin() {
                continue;
            }
            let marker = node
                .last_inst()
                .filter(|inst| {
                    self.graph
                        .inst(*inst)
                        .is_ok_and(|inst| inst.kind() == OpKind::Try)
                })
                .ok_or_else(|| bad_argument!("try entry {} does not end with a try", block))?;
            let handler = node
                .successors()
                .get(1)
                .copied()
                .ok_or_else(|| bad_argument!("try entry {} has no handler", block))?;

            let try_end = self
                .layout
                .iter()
                .copied()
                .find(|candidate| {
                    self.graph.block(*candidate).is_ok_and(|candidate| {
                        candidate.is_try_end() && candidate.try_id() == node.try_id()
                    })
                })
                .ok_or_else(|| bad_argument!("try region of {} has no reachable exit", block))?;

            tries.push(TryRange {
                try_pc: item_pc[&marker],
                end_pc: pc_of(try_end)?,
                handler_pc: pc_of(handler)?,
            });
        }
        Ok(tries)
    }
}
