//! Body to graph decoding.
//!
//! Decoding runs in three passes over the instruction list:
//!
//! 1. find the block boundaries (leader flags, branch targets, try boundaries and the
//!    instruction after every unconditional transfer) and create one block per range, the first
//!    range becoming the start block;
//! 2. create the graph instructions, remember the register each one defines and wire up the
//!    successor edges of every range;
//! 3. resolve inputs through the register map, rebuild the try regions and fill every phi from
//!    the moves its predecessors make into its incoming register.
//!
//! Registers are written once, so no dataflow solver is needed: a value register always names
//! the same instruction, and a phi input is the source of the last move into the phi's incoming
//! register inside the corresponding predecessor.

use std::collections::{BTreeSet, HashMap};

use crate::{
    bytecode::{Body, RawInst, TryRange, JUMP, MOV},
    graph::{inst::InstData, BlockFlags, BlockId, Graph, InstId, Reference},
    isa::{OpKind, Opcode},
    metadata::{ids::FunctionId, AbcFile},
    Result,
};

/// Decodes the body `code` of `function` into a fresh graph.
///
/// # Errors
/// [`crate::Error::Malformed`] for inconsistent bodies: unknown opcodes, undefined or twice
/// defined registers, branch targets inside a block, references past the arenas of `file` or a
/// parameter count that does not match the signature.
pub(crate) fn decode(file: &AbcFile, function: FunctionId, code: &[u8]) -> Result<Graph> {
    let body = Body::read(code)?;
    let params = file.function(function)?.signature().params().to_vec();
    if body.param_count as usize != params.len() {
        return Err(malformed_error!(
            "body of {} declares {} parameters, signature has {}",
            function,
            body.param_count,
            params.len()
        ));
    }
    if body.register_count < body.param_count {
        return Err(malformed_error!(
            "{} registers can not hold {} parameters",
            body.register_count,
            body.param_count
        ));
    }

    let mut graph = Graph::new(file.id(), function, file.target(), &params)?;
    graph.create_parameters()?;
    if body.insts.is_empty() {
        return Ok(graph);
    }

    let mut decoder = Decoder::new(file, &body, &mut graph)?;
    decoder.split()?;
    decoder.build()?;
    decoder.link_tries()?;
    decoder.fill_phis()?;

    log::debug!(
        "decoded {} into {} blocks, {} instructions",
        function,
        graph.block_count(),
        body.insts.len()
    );
    Ok(graph)
}

/// Block covering the instructions `start..end` of the body.
struct Range {
    start: usize,
    end: usize,
    block: BlockId,
}

struct Decoder<'a> {
    file: &'a AbcFile,
    body: &'a Body,
    graph: &'a mut Graph,
    ranges: Vec<Range>,
    block_at: HashMap<usize, BlockId>,
    registers: Vec<Option<InstId>>,
    pc_inst: HashMap<usize, InstId>,
    pending_inputs: Vec<(InstId, &'a [u32])>,
    phis: Vec<(InstId, BlockId, u32)>,
    moves: HashMap<BlockId, Vec<(u32, u32)>>,
}

impl<'a> Decoder<'a> {
    fn new(file: &'a AbcFile, body: &'a Body, graph: &'a mut Graph) -> Result<Self> {
        let mut registers = vec![None; body.register_count as usize];
        for (index, slot) in registers
            .iter_mut()
            .enumerate()
            .take(body.param_count as usize)
        {
            *slot = Some(graph.parameter(index)?);
        }

        Ok(Decoder {
            file,
            body,
            graph,
            ranges: Vec::new(),
            block_at: HashMap::new(),
            registers,
            pc_inst: HashMap::new(),
            pending_inputs: Vec::new(),
            phis: Vec::new(),
            moves: HashMap::new(),
        })
    }

    fn inst_count(&self) -> usize {
        self.body.insts.len()
    }

    fn opcode(&self, raw: &RawInst) -> Result<Opcode> {
        Opcode::from_code(self.file.target(), raw.code).ok_or_else(|| {
            malformed_error!("unknown {} opcode {:#04x}", self.file.target(), raw.code)
        })
    }

    fn check_target(&self, pc: usize, target: Option<u32>) -> Result<usize> {
        let Some(target) = target else {
            return Err(malformed_error!("branch at pc {} has no target", pc));
        };
        let target = target as usize;
        if target > self.inst_count() {
            return Err(malformed_error!(
                "branch at pc {} targets {} past the {} instructions",
                pc,
                target,
                self.inst_count()
            ));
        }
        Ok(target)
    }

    /// Pass 1: block boundaries.
    fn split(&mut self) -> Result<()> {
        let count = self.inst_count();
        let mut leaders = BTreeSet::from([0]);

        for (pc, raw) in self.body.insts.iter().enumerate() {
            if raw.leader {
                leaders.insert(pc);
            }
            let transfers = match raw.code {
                JUMP => {
                    leaders.insert(self.check_target(pc, raw.target)?);
                    true
                }
                MOV => false,
                _ => match self.opcode(raw)?.kind() {
                    OpKind::If => {
                        leaders.insert(self.check_target(pc, raw.target)?);
                        false
                    }
                    OpKind::Return | OpKind::Throw => {
                        if raw.target.is_some() {
                            leaders.insert(self.check_target(pc, raw.target)?);
                        }
                        true
                    }
                    _ => false,
                },
            };
            if transfers {
                leaders.insert(pc + 1);
            }
        }
        for range in &self.body.tries {
            for pc in [range.try_pc, range.end_pc, range.handler_pc] {
                if pc as usize >= count {
                    return Err(malformed_error!("try boundary {} past the body", pc));
                }
            }
            leaders.insert(range.end_pc as usize);
            leaders.insert(range.handler_pc as usize);
        }
        leaders.retain(|pc| *pc < count);

        let starts: Vec<usize> = leaders.into_iter().collect();
        for (index, start) in starts.iter().enumerate() {
            let end = starts.get(index + 1).copied().unwrap_or(count);
            let block = if index == 0 {
                self.graph.start()
            } else {
                self.graph.create_empty_block()?
            };
            self.block_at.insert(*start, block);
            self.ranges.push(Range {
                start: *start,
                end,
                block,
            });
        }
        Ok(())
    }

    /// Block starting at `pc`, the end block for the pc one past the last instruction.
    fn block_starting_at(&self, pc: usize) -> Result<BlockId> {
        if pc == self.inst_count() {
            return Ok(self.graph.end());
        }
        self.block_at
            .get(&pc)
            .copied()
            .ok_or_else(|| malformed_error!("pc {} is not the start of a block", pc))
    }

    fn check_reference(&self, reference: Reference) -> Result<()> {
        let file = self.file;
        let (index, len) = match reference {
            Reference::String(id) => (id.index(), file.strings.len()),
            Reference::Function(id) => (id.index(), file.functions.len()),
            Reference::LiteralArray(id) => (id.index(), file.literal_arrays.len()),
            Reference::Import(id) => (id.index(), file.imports.len()),
            Reference::Export(id) => (id.index(), file.exports.len()),
            Reference::Module(id) => (id.index(), file.modules.len()),
            Reference::Class(id) => (id.index(), file.classes.len()),
        };
        if index >= len {
            return Err(malformed_error!("reference {} past its arena of {}", reference, len));
        }
        Ok(())
    }

    fn define(&mut self, register: u32, inst: InstId) -> Result<()> {
        match self.registers.get_mut(register as usize) {
            Some(slot @ None) => {
                *slot = Some(inst);
                Ok(())
            }
            Some(Some(_)) => Err(malformed_error!("register {} is defined twice", register)),
            None => Err(malformed_error!(
                "register {} past the {} declared registers",
                register,
                self.body.register_count
            )),
        }
    }

    fn resolve(&self, register: u32) -> Result<InstId> {
        self.registers
            .get(register as usize)
            .copied()
            .flatten()
            .ok_or_else(|| malformed_error!("register {} is read but never defined", register))
    }

    fn create(&mut self, pc: usize, raw: &'a RawInst, block: BlockId) -> Result<InstId> {
        let opcode = self.opcode(raw)?;
        let kind = opcode.kind();
        if kind == OpKind::Parameter {
            return Err(malformed_error!("parameters are implicit, found one at pc {}", pc));
        }

        let mut data = InstData::new(opcode, raw.ty).imms(raw.imms.clone());
        if let Some(reference) = raw.reference {
            self.check_reference(reference)?;
            data = data.reference(reference);
        }
        if let Some(cc) = raw.cc {
            data = data.cc(cc);
        }
        if let Some(constant) = raw.constant {
            data = data.constant(constant);
        } else if kind == OpKind::Constant {
            return Err(malformed_error!("constant at pc {} has no value", pc));
        }
        if let Some(slot) = raw.ic_slot {
            data = data.ic_slot(slot);
        }

        let inst = self.graph.create_inst(data)?;
        self.graph.add_inst_back(block, inst)?;
        if let Some(dst) = raw.dst {
            self.define(dst, inst)?;
        }

        if kind == OpKind::Phi {
            let [incoming] = raw.inputs.as_slice() else {
                return Err(malformed_error!("phi at pc {} needs one incoming register", pc));
            };
            self.phis.push((inst, block, *incoming));
        } else {
            self.pending_inputs.push((inst, raw.inputs.as_slice()));
        }
        self.pc_inst.insert(pc, inst);
        Ok(inst)
    }

    /// Pass 2: instructions and normal successor edges.
    fn build(&mut self) -> Result<()> {
        let body = self.body;
        let ranges: Vec<(usize, usize, BlockId)> = self
            .ranges
            .iter()
            .map(|range| (range.start, range.end, range.block))
            .collect();

        for (start, end, block) in ranges {
            let mut terminator: Option<(usize, OpKind)> = None;
            let mut jump: Option<usize> = None;

            for pc in start..end {
                let raw = &body.insts[pc];
                if jump.is_some() {
                    return Err(malformed_error!("pc {} follows a jump inside its block", pc));
                }
                match raw.code {
                    JUMP => jump = Some(self.check_target(pc, raw.target)?),
                    MOV => {
                        if terminator.is_some() {
                            return Err(malformed_error!("move at pc {} follows a terminator", pc));
                        }
                        let (Some(dst), [src]) = (raw.dst, raw.inputs.as_slice()) else {
                            return Err(malformed_error!("move at pc {} is incomplete", pc));
                        };
                        self.moves.entry(block).or_default().push((dst, *src));
                    }
                    _ => {
                        if terminator.is_some() {
                            return Err(malformed_error!(
                                "pc {} follows the terminator of its block",
                                pc
                            ));
                        }
                        self.create(pc, raw, block)?;
                        let kind = self.opcode(raw)?.kind();
                        if kind.is_terminator() {
                            terminator = Some((pc, kind));
                        }
                    }
                }
            }

            let normal = self.block_starting_at(jump.unwrap_or(end))?;
            match terminator {
                Some((pc, OpKind::Return | OpKind::Throw)) => {
                    if jump.is_some() {
                        return Err(malformed_error!("jump after leaving the function"));
                    }
                    let exit = match body.insts[pc].target {
                        Some(_) => self.block_starting_at(self.check_target(pc, body.insts[pc].target)?)?,
                        None => self.graph.end(),
                    };
                    self.graph.append_succ(block, exit)?;
                }
                Some((pc, OpKind::If)) => {
                    let target = self.check_target(pc, body.insts[pc].target)?;
                    let taken = self.block_starting_at(target)?;
                    self.graph.append_succ(block, taken)?;
                    self.graph.append_succ(block, normal)?;
                }
                _ => self.graph.append_succ(block, normal)?,
            }
        }

        let pending = std::mem::take(&mut self.pending_inputs);
        for (inst, registers) in pending {
            let inputs = registers
                .iter()
                .map(|register| self.resolve(*register))
                .collect::<Result<Vec<_>>>()?;
            self.graph.set_inputs(inst, &inputs)?;
        }
        Ok(())
    }

    fn block_containing(&self, pc: usize) -> Result<BlockId> {
        self.ranges
            .iter()
            .find(|range| range.start <= pc && pc < range.end)
            .map(|range| range.block)
            .ok_or_else(|| malformed_error!("pc {} lies outside of the body", pc))
    }

    /// Pass 3a: exceptional edges and try/catch flags.
    fn link_tries(&mut self) -> Result<()> {
        let tries: Vec<TryRange> = self.body.tries.clone();

        for (index, range) in tries.iter().enumerate() {
            let try_id = u32::try_from(index).map_err(|_| malformed_error!("too many try regions"))?;
            let marker = self
                .pc_inst
                .get(&(range.try_pc as usize))
                .copied()
                .ok_or_else(|| malformed_error!("try pc {} is not an instruction", range.try_pc))?;
            let begin = self.block_containing(range.try_pc as usize)?;
            if self.graph.inst(marker)?.kind() != OpKind::Try
                || self.graph.block(begin)?.last_inst() != Some(marker)
            {
                return Err(malformed_error!(
                    "try pc {} does not close its block with a try",
                    range.try_pc
                ));
            }
            let exit = self.block_starting_at(range.end_pc as usize)?;
            let handler = self.block_starting_at(range.handler_pc as usize)?;

            self.graph.append_succ(begin, handler)?;
            self.graph.append_succ(exit, handler)?;

            let first = self.graph.block(begin)?.successors()[0];
            let next = self
                .graph
                .block(exit)?
                .successors()
                .first()
                .copied()
                .unwrap_or(self.graph.end());
            let end = self.graph.end();

            {
                let node = self.graph.block_mut(begin)?;
                node.flags.insert(BlockFlags::TRY_BEGIN);
                node.try_id = Some(try_id);
            }
            {
                let node = self.graph.block_mut(exit)?;
                node.flags.insert(BlockFlags::TRY_END);
                node.try_id = Some(try_id);
            }
            for block in self.graph.region(first, &[exit, end])? {
                let node = self.graph.block_mut(block)?;
                node.flags.insert(BlockFlags::TRY);
                node.try_id = Some(try_id);
            }
            self.graph
                .block_mut(handler)?
                .flags
                .insert(BlockFlags::CATCH_BEGIN | BlockFlags::CATCH);
            for block in self.graph.region(handler, &[next, end])? {
                self.graph.block_mut(block)?.flags.insert(BlockFlags::CATCH);
            }
        }

        self.graph
            .reserve_try_ids(u32::try_from(tries.len()).unwrap_or(u32::MAX));
        Ok(())
    }

    /// Pass 3b: phi inputs, one per predecessor in predecessor order.
    fn fill_phis(&mut self) -> Result<()> {
        let phis = std::mem::take(&mut self.phis);
        for (phi, block, incoming) in phis {
            let preds = self.graph.block(block)?.predecessors().to_vec();
            let mut inputs = Vec::with_capacity(preds.len());
            for pred in preds {
                let source = self
                    .moves
                    .get(&pred)
                    .and_then(|moves| moves.iter().rev().find(|(dst, _)| *dst == incoming))
                    .map(|(_, src)| *src)
                    .ok_or_else(|| {
                        malformed_error!("{} does not feed phi {} of {}", pred, phi, block)
                    })?;
                inputs.push(self.resolve(source)?);
            }
            self.graph.set_inputs(phi, &inputs)?;
        }
        Ok(())
    }
}
