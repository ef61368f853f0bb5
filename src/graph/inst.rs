//! Instructions and data-flow editing.
//!
//! Every operation in this module keeps the input/user relation symmetric: when an instruction
//! lists `A` as an input `n` times, `A` lists that instruction as a user `n` times.

use std::fmt;

use crate::{
    graph::{BlockId, Graph, InstId},
    isa::{ConditionCode, OpKind, Opcode, Target},
    metadata::{
        ids::{ClassId, ExportId, FunctionId, ImportId, LiteralArrayId, ModuleId, StringId},
        types::TypeId,
    },
    Error::{HasUsers, WrongTarget},
    Result,
};

/// Value of a constant instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit unsigned integer
    U64(u64),
    /// 64-bit float
    F64(f64),
}

impl ConstantValue {
    /// Result type of a constant holding this value.
    #[must_use]
    pub fn ty(self) -> TypeId {
        match self {
            ConstantValue::I32(_) => TypeId::I32,
            ConstantValue::I64(_) => TypeId::I64,
            ConstantValue::U64(_) => TypeId::U64,
            ConstantValue::F64(_) => TypeId::F64,
        }
    }

    /// Bitwise equality, so that `NaN` constants are found again and `0.0` is not `-0.0`.
    #[must_use]
    pub fn same(self, other: ConstantValue) -> bool {
        self.tag() == other.tag() && self.bits() == other.bits()
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            ConstantValue::I32(_) => 0,
            ConstantValue::I64(_) => 1,
            ConstantValue::U64(_) => 2,
            ConstantValue::F64(_) => 3,
        }
    }

    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn bits(self) -> u64 {
        match self {
            ConstantValue::I32(value) => i64::from(value) as u64,
            ConstantValue::I64(value) => value as u64,
            ConstantValue::U64(value) => value,
            ConstantValue::F64(value) => value.to_bits(),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub(crate) fn from_parts(tag: u8, bits: u64) -> Option<ConstantValue> {
        match tag {
            0 => Some(ConstantValue::I32(bits as i64 as i32)),
            1 => Some(ConstantValue::I64(bits as i64)),
            2 => Some(ConstantValue::U64(bits)),
            3 => Some(ConstantValue::F64(f64::from_bits(bits))),
            _ => None,
        }
    }

    /// Returns `true` if the value equals zero of its type.
    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            ConstantValue::F64(value) => value == 0.0,
            _ => self.bits() == 0,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::I32(value) => write!(f, "{value}"),
            ConstantValue::I64(value) => write!(f, "{value}"),
            ConstantValue::U64(value) => write!(f, "{value}"),
            ConstantValue::F64(value) => write!(f, "{value:?}"),
        }
    }
}

/// Entity of the container an instruction refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Interned string
    String(StringId),
    /// Function or method
    Function(FunctionId),
    /// Literal array
    LiteralArray(LiteralArrayId),
    /// Import descriptor
    Import(ImportId),
    /// Export descriptor
    Export(ExportId),
    /// Module
    Module(ModuleId),
    /// Class
    Class(ClassId),
}

impl Reference {
    pub(crate) fn kind_code(self) -> u8 {
        match self {
            Reference::String(_) => 0,
            Reference::Function(_) => 1,
            Reference::LiteralArray(_) => 2,
            Reference::Import(_) => 3,
            Reference::Export(_) => 4,
            Reference::Module(_) => 5,
            Reference::Class(_) => 6,
        }
    }

    pub(crate) fn raw_index(self) -> u32 {
        match self {
            Reference::String(id) => id.0,
            Reference::Function(id) => id.0,
            Reference::LiteralArray(id) => id.0,
            Reference::Import(id) => id.0,
            Reference::Export(id) => id.0,
            Reference::Module(id) => id.0,
            Reference::Class(id) => id.0,
        }
    }

    pub(crate) fn from_parts(kind: u8, index: u32) -> Option<Reference> {
        match kind {
            0 => Some(Reference::String(StringId::new(index))),
            1 => Some(Reference::Function(FunctionId::new(index))),
            2 => Some(Reference::LiteralArray(LiteralArrayId::new(index))),
            3 => Some(Reference::Import(ImportId::new(index))),
            4 => Some(Reference::Export(ExportId::new(index))),
            5 => Some(Reference::Module(ModuleId::new(index))),
            6 => Some(Reference::Class(ClassId::new(index))),
            _ => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::String(id) => write!(f, "{id}"),
            Reference::Function(id) => write!(f, "{id}"),
            Reference::LiteralArray(id) => write!(f, "{id}"),
            Reference::Import(id) => write!(f, "{id}"),
            Reference::Export(id) => write!(f, "{id}"),
            Reference::Module(id) => write!(f, "{id}"),
            Reference::Class(id) => write!(f, "{id}"),
        }
    }
}

/// An instruction of a [`Graph`].
#[derive(Debug, Clone)]
pub struct Inst {
    pub(crate) id: InstId,
    pub(crate) opcode: Opcode,
    pub(crate) ty: TypeId,
    pub(crate) inputs: Vec<InstId>,
    pub(crate) users: Vec<InstId>,
    pub(crate) imms: Vec<u64>,
    pub(crate) cc: Option<ConditionCode>,
    pub(crate) reference: Option<Reference>,
    pub(crate) constant: Option<ConstantValue>,
    pub(crate) ic_slot: Option<u16>,
    pub(crate) block: Option<BlockId>,
    pub(crate) prev: Option<InstId>,
    pub(crate) next: Option<InstId>,
}

impl Inst {
    /// Handle of this instruction.
    #[must_use]
    pub fn id(&self) -> InstId {
        self.id
    }

    /// Opcode.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Classification of the opcode.
    #[must_use]
    pub fn kind(&self) -> OpKind {
        self.opcode.kind()
    }

    /// Result type, [`TypeId::Void`] for instructions without a result.
    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Ordered inputs.
    #[must_use]
    pub fn inputs(&self) -> &[InstId] {
        &self.inputs
    }

    /// Input at `index`.
    #[must_use]
    pub fn input(&self, index: usize) -> Option<InstId> {
        self.inputs.get(index).copied()
    }

    /// Instructions consuming the result, with one entry per use.
    #[must_use]
    pub fn users(&self) -> &[InstId] {
        &self.users
    }

    /// Number of uses of the result.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Immediate operands.
    #[must_use]
    pub fn imms(&self) -> &[u64] {
        &self.imms
    }

    /// Condition code of a conditional branch.
    #[must_use]
    pub fn condition_code(&self) -> Option<ConditionCode> {
        self.cc
    }

    /// Referenced container entity.
    #[must_use]
    pub fn reference(&self) -> Option<Reference> {
        self.reference
    }

    /// Value of a constant instruction.
    #[must_use]
    pub fn constant(&self) -> Option<ConstantValue> {
        self.constant
    }

    /// Inline cache slot.
    #[must_use]
    pub fn ic_slot(&self) -> Option<u16> {
        self.ic_slot
    }

    /// Block the instruction is linked into, `None` while unlinked.
    #[must_use]
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Previous instruction of the same block.
    #[must_use]
    pub fn prev(&self) -> Option<InstId> {
        self.prev
    }

    /// Next instruction of the same block.
    #[must_use]
    pub fn next(&self) -> Option<InstId> {
        self.next
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.id, self.ty, self.opcode)?;
        if let Some(cc) = self.cc {
            write!(f, " {cc}")?;
        }
        let inputs: Vec<String> = self.inputs.iter().map(ToString::to_string).collect();
        if !inputs.is_empty() {
            write!(f, " {}", inputs.join(", "))?;
        }
        if let Some(constant) = self.constant {
            write!(f, " {constant}")?;
        }
        if !self.imms.is_empty() {
            write!(f, " imm{:?}", self.imms)?;
        }
        if let Some(reference) = self.reference {
            write!(f, " @{reference}")?;
        }
        if let Some(slot) = self.ic_slot {
            write!(f, " ic:{slot:#x}")?;
        }
        Ok(())
    }
}

/// Everything needed to create an instruction.
#[derive(Debug, Clone)]
pub(crate) struct InstData {
    opcode: Opcode,
    ty: TypeId,
    inputs: Vec<InstId>,
    imms: Vec<u64>,
    cc: Option<ConditionCode>,
    reference: Option<Reference>,
    constant: Option<ConstantValue>,
    ic_slot: Option<u16>,
}

impl InstData {
    pub(crate) fn new(opcode: Opcode, ty: TypeId) -> Self {
        InstData {
            opcode,
            ty,
            inputs: Vec::new(),
            imms: Vec::new(),
            cc: None,
            reference: None,
            constant: None,
            ic_slot: None,
        }
    }

    pub(crate) fn inputs(mut self, inputs: Vec<InstId>) -> Self {
        self.inputs = inputs;
        self
    }

    pub(crate) fn imms(mut self, imms: Vec<u64>) -> Self {
        self.imms = imms;
        self
    }

    pub(crate) fn cc(mut self, cc: ConditionCode) -> Self {
        self.cc = Some(cc);
        self
    }

    pub(crate) fn reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub(crate) fn constant(mut self, constant: ConstantValue) -> Self {
        self.constant = Some(constant);
        self
    }

    pub(crate) fn ic_slot(mut self, slot: u16) -> Self {
        self.ic_slot = Some(slot);
        self
    }
}

fn remove_one(list: &mut Vec<InstId>, value: InstId) {
    if let Some(position) = list.iter().position(|entry| *entry == value) {
        list.remove(position);
    }
}

impl Graph {
    /// Allocates a new unlinked instruction and registers it as a user of its inputs.
    pub(crate) fn create_inst(&mut self, data: InstData) -> Result<InstId> {
        if data.opcode.target() != self.target() {
            return Err(WrongTarget {
                expected: self.target(),
                found: data.opcode.target(),
            });
        }
        for input in &data.inputs {
            self.inst(*input)?;
        }

        let id = self.make_inst_id()?;
        self.insts.push(Some(Inst {
            id,
            opcode: data.opcode,
            ty: data.ty,
            inputs: data.inputs.clone(),
            users: Vec::new(),
            imms: data.imms,
            cc: data.cc,
            reference: data.reference,
            constant: data.constant,
            ic_slot: data.ic_slot,
            block: None,
            prev: None,
            next: None,
        }));

        for input in data.inputs {
            self.inst_mut(input)?.users.push(id);
        }

        Ok(id)
    }

    /// Detaches `id` from its block, if it is linked.
    pub(crate) fn unlink(&mut self, id: InstId) -> Result<()> {
        let (block, prev, next) = {
            let inst = self.inst(id)?;
            (inst.block, inst.prev, inst.next)
        };
        let Some(block) = block else {
            return Ok(());
        };

        match prev {
            Some(prev) => self.inst_mut(prev)?.next = next,
            None => self.block_mut(block)?.first = next,
        }
        match next {
            Some(next) => self.inst_mut(next)?.prev = prev,
            None => self.block_mut(block)?.last = prev,
        }
        self.block_mut(block)?.len -= 1;

        let inst = self.inst_mut(id)?;
        inst.block = None;
        inst.prev = None;
        inst.next = None;
        Ok(())
    }

    /// Links the unlinked `id` between the adjacent `prev` and `next` of `block`.
    fn link_between(
        &mut self,
        id: InstId,
        block: BlockId,
        prev: Option<InstId>,
        next: Option<InstId>,
    ) -> Result<()> {
        {
            let inst = self.inst_mut(id)?;
            inst.block = Some(block);
            inst.prev = prev;
            inst.next = next;
        }
        match prev {
            Some(prev) => self.inst_mut(prev)?.next = Some(id),
            None => self.block_mut(block)?.first = Some(id),
        }
        match next {
            Some(next) => self.inst_mut(next)?.prev = Some(id),
            None => self.block_mut(block)?.last = Some(id),
        }
        self.block_mut(block)?.len += 1;
        Ok(())
    }

    /// Checks that `id` may sit between `prev` and `next` inside `block`.
    fn check_placement(
        &self,
        id: InstId,
        block: BlockId,
        prev: Option<InstId>,
        next: Option<InstId>,
    ) -> Result<()> {
        if self.block(block)?.is_end() {
            return Err(bad_argument!("the end block {} can not hold instructions", block));
        }

        if self.inst(id)?.kind().is_phi() {
            if let Some(prev) = prev {
                if !self.inst(prev)?.kind().is_phi() {
                    return Err(bad_argument!(
                        "phi {} can not be placed after the ordinary instruction {}",
                        id,
                        prev
                    ));
                }
            }
        } else if let Some(next) = next {
            if self.inst(next)?.kind().is_phi() {
                return Err(bad_argument!(
                    "{} can not be placed before the phi {}",
                    id,
                    next
                ));
            }
        }
        Ok(())
    }

    fn place(&mut self, id: InstId, block: BlockId, prev: Option<InstId>, next: Option<InstId>) -> Result<()> {
        self.check_placement(id, block, prev, next)?;
        self.unlink(id)?;
        self.link_between(id, block, prev, next)
    }

    /// Returns the last leading phi and the first ordinary instruction of `block`, ignoring `skip`.
    fn phi_boundary(&self, block: BlockId, skip: InstId) -> Result<(Option<InstId>, Option<InstId>)> {
        let mut last_phi = None;
        for inst in self.block_insts(block)? {
            if inst == skip {
                continue;
            }
            if !self.inst(inst)?.kind().is_phi() {
                return Ok((last_phi, Some(inst)));
            }
            last_phi = Some(inst);
        }
        Ok((last_phi, None))
    }

    fn check_linked(&self, anchor: InstId) -> Result<BlockId> {
        match self.inst(anchor)?.block {
            Some(block) => Ok(block),
            None => Err(bad_argument!("anchor {} is not linked into a block", anchor)),
        }
    }

    /// Moves `inst` directly in front of `anchor`, detaching it from its previous block.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if either handle is invalid, `anchor` is unlinked, both are
    /// the same instruction, or the placement would put an ordinary instruction before a phi
    /// (or a phi after an ordinary instruction).
    pub fn insert_before(&mut self, inst: InstId, anchor: InstId) -> Result<()> {
        self.inst(inst)?;
        if inst == anchor {
            return Err(bad_argument!("can not insert {} relative to itself", inst));
        }
        let block = self.check_linked(anchor)?;

        let mut prev = self.inst(anchor)?.prev;
        if prev == Some(inst) {
            prev = self.inst(inst)?.prev;
        }
        self.place(inst, block, prev, Some(anchor))
    }

    /// Moves `inst` directly behind `anchor`, detaching it from its previous block.
    ///
    /// # Errors
    /// See [`Graph::insert_before`].
    pub fn insert_after(&mut self, inst: InstId, anchor: InstId) -> Result<()> {
        self.inst(inst)?;
        if inst == anchor {
            return Err(bad_argument!("can not insert {} relative to itself", inst));
        }
        let block = self.check_linked(anchor)?;

        let mut next = self.inst(anchor)?.next;
        if next == Some(inst) {
            next = self.inst(inst)?.next;
        }
        self.place(inst, block, Some(anchor), next)
    }

    /// Moves `inst` to the front of `block`.
    ///
    /// Ordinary instructions are placed behind the leading phis.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles or the end block.
    pub fn add_inst_front(&mut self, block: BlockId, inst: InstId) -> Result<()> {
        let (prev, next) = if self.inst(inst)?.kind().is_phi() {
            let mut first = self.block(block)?.first;
            if first == Some(inst) {
                first = self.inst(inst)?.next;
            }
            (None, first)
        } else {
            self.phi_boundary(block, inst)?
        };
        self.place(inst, block, prev, next)
    }

    /// Moves `inst` to the back of `block`.
    ///
    /// Phis are placed behind the existing leading phis.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles or the end block.
    pub fn add_inst_back(&mut self, block: BlockId, inst: InstId) -> Result<()> {
        let (prev, next) = if self.inst(inst)?.kind().is_phi() {
            self.phi_boundary(block, inst)?
        } else {
            let mut last = self.block(block)?.last;
            if last == Some(inst) {
                last = self.inst(inst)?.prev;
            }
            (last, None)
        };
        self.place(inst, block, prev, next)
    }

    /// Replaces input `index` of `user` with `input`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles or an index past the inputs.
    pub fn set_input(&mut self, user: InstId, input: InstId, index: usize) -> Result<()> {
        self.inst(input)?;
        let old = match self.inst(user)?.inputs.get(index) {
            Some(old) => *old,
            None => {
                return Err(bad_argument!(
                    "{} has no input {} ({} inputs)",
                    user,
                    index,
                    self.inst(user)?.inputs.len()
                ))
            }
        };

        self.inst_mut(user)?.inputs[index] = input;
        remove_one(&mut self.inst_mut(old)?.users, user);
        self.inst_mut(input)?.users.push(user);
        Ok(())
    }

    /// Replaces all inputs of `user`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles.
    pub fn set_inputs(&mut self, user: InstId, inputs: &[InstId]) -> Result<()> {
        for input in inputs {
            self.inst(*input)?;
        }

        let old = std::mem::replace(&mut self.inst_mut(user)?.inputs, inputs.to_vec());
        for input in old {
            remove_one(&mut self.inst_mut(input)?.users, user);
        }
        for input in inputs {
            self.inst_mut(*input)?.users.push(user);
        }
        Ok(())
    }

    /// Appends `input` to the inputs of `user`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles.
    pub fn append_input(&mut self, user: InstId, input: InstId) -> Result<()> {
        self.inst(input)?;
        self.inst_mut(user)?.inputs.push(input);
        self.inst_mut(input)?.users.push(user);
        Ok(())
    }

    /// Drops input `index` of `user`.
    pub(crate) fn remove_input(&mut self, user: InstId, index: usize) -> Result<()> {
        let inst = self.inst_mut(user)?;
        if index >= inst.inputs.len() {
            return Err(bad_argument!("{} has no input {}", user, index));
        }
        let old = inst.inputs.remove(index);
        remove_one(&mut self.inst_mut(old)?.users, user);
        Ok(())
    }

    /// Removes `inst` from its block and frees it.
    ///
    /// # Errors
    /// [`crate::Error::HasUsers`] while other instructions still consume the result,
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn remove_inst(&mut self, inst: InstId) -> Result<()> {
        let users = self.inst(inst)?.users.len();
        if users != 0 {
            return Err(HasUsers {
                inst: inst.to_string(),
                users,
            });
        }

        self.unlink(inst)?;
        let inputs = std::mem::take(&mut self.inst_mut(inst)?.inputs);
        for input in inputs {
            remove_one(&mut self.inst_mut(input)?.users, inst);
        }
        self.insts[inst.index()] = None;
        Ok(())
    }

    /// Rewires every use of `old` to `new`. Uses inside `new` itself are left alone.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles.
    pub fn replace_all_users(&mut self, old: InstId, new: InstId) -> Result<()> {
        self.inst(new)?;
        if old == new {
            return Ok(());
        }

        let mut users = self.inst(old)?.users.clone();
        users.sort_unstable();
        users.dedup();

        for user in users {
            if user == new {
                continue;
            }
            let positions: Vec<usize> = self
                .inst(user)?
                .inputs
                .iter()
                .enumerate()
                .filter(|(_, input)| **input == old)
                .map(|(position, _)| position)
                .collect();
            for position in positions {
                self.set_input(user, new, position)?;
            }
        }
        Ok(())
    }

    /// Removes every instruction of `block`.
    ///
    /// # Errors
    /// [`crate::Error::HasUsers`] if an instruction of the block is used outside of it; nothing
    /// is removed in that case.
    pub fn remove_all_insts(&mut self, block: BlockId) -> Result<()> {
        let insts: Vec<InstId> = self.block_insts(block)?.collect();
        for inst in &insts {
            let outside = self
                .inst(*inst)?
                .users
                .iter()
                .filter(|user| !insts.contains(user))
                .count();
            if outside != 0 {
                return Err(HasUsers {
                    inst: inst.to_string(),
                    users: outside,
                });
            }
        }

        for inst in &insts {
            let inputs = std::mem::take(&mut self.inst_mut(*inst)?.inputs);
            for input in inputs {
                remove_one(&mut self.inst_mut(input)?.users, *inst);
            }
        }
        for inst in insts.iter().rev() {
            self.inst_mut(*inst)?.users.clear();
            self.unlink(*inst)?;
            self.insts[inst.index()] = None;
        }
        Ok(())
    }

    /// Changes the condition of a conditional branch.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for [`ConditionCode::None`], for an instruction that is not a
    /// branch, and for conditions other than `Eq`/`Ne` on dynamic branches.
    pub fn set_condition_code(&mut self, inst: InstId, cc: ConditionCode) -> Result<()> {
        if cc == ConditionCode::None {
            return Err(bad_argument!("a branch needs a condition"));
        }
        if self.inst(inst)?.kind() != OpKind::If {
            return Err(bad_argument!("{} is not a conditional branch", inst));
        }
        if self.target() == Target::Dynamic && !matches!(cc, ConditionCode::Eq | ConditionCode::Ne) {
            return Err(bad_argument!(
                "dynamic branches only compare for equality, got {}",
                cc
            ));
        }
        self.inst_mut(inst)?.cc = Some(cc);
        Ok(())
    }

    /// Overwrites immediate `index` of `inst`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle or index.
    pub fn set_imm(&mut self, inst: InstId, index: usize, value: u64) -> Result<()> {
        let target = self.inst_mut(inst)?;
        match target.imms.get_mut(index) {
            Some(imm) => {
                *imm = value;
                Ok(())
            }
            None => Err(bad_argument!("{} has no immediate {}", inst, index)),
        }
    }

    pub(crate) fn set_reference(&mut self, inst: InstId, reference: Reference) -> Result<()> {
        self.inst_mut(inst)?.reference = Some(reference);
        Ok(())
    }

    pub(crate) fn set_ic_slot(&mut self, inst: InstId, slot: u16) -> Result<()> {
        self.inst_mut(inst)?.ic_slot = Some(slot);
        Ok(())
    }

    /// Returns the constant of the start block holding `value`, creating it if needed.
    ///
    /// # Errors
    /// Only fails on arena exhaustion.
    pub fn find_or_create_constant(&mut self, value: ConstantValue) -> Result<InstId> {
        let start = self.start();
        for inst in self.block_insts(start)? {
            let existing = self.inst(inst)?;
            if existing.kind() == OpKind::Constant
                && existing.constant.is_some_and(|constant| constant.same(value))
            {
                return Ok(inst);
            }
        }

        let Some(opcode) = Opcode::graph_op(self.target(), OpKind::Constant) else {
            return Err(crate::Error::NotSupported);
        };
        let ty = match self.target() {
            Target::Static => value.ty(),
            Target::Dynamic => TypeId::Any,
        };
        let constant = self.create_inst(InstData::new(opcode, ty).constant(value))?;
        self.add_inst_back(start, constant)?;
        Ok(constant)
    }

    /// Returns the parameter instruction with the given index.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if there is no such parameter.
    pub fn parameter(&self, index: usize) -> Result<InstId> {
        for inst in self.block_insts(self.start())? {
            let candidate = self.inst(inst)?;
            if candidate.kind() == OpKind::Parameter && candidate.imms.first() == Some(&(index as u64)) {
                return Ok(inst);
            }
        }
        Err(bad_argument!(
            "function has no parameter {} ({} parameters)",
            index,
            self.param_count()
        ))
    }

    /// Creates a phi merging `inputs` and appends it to the leading phis of `block`.
    ///
    /// Input `i` must be the value flowing in from predecessor `i` of `block`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles, an empty input list or, in static
    /// graphs, inputs of different types.
    pub fn create_phi(&mut self, block: BlockId, inputs: &[InstId]) -> Result<InstId> {
        self.block(block)?;
        let Some(first) = inputs.first() else {
            return Err(bad_argument!("a phi needs at least one input"));
        };
        let ty = match self.target() {
            Target::Static => self.inst(*first)?.ty,
            Target::Dynamic => TypeId::Any,
        };
        for input in inputs {
            let input_ty = self.inst(*input)?.ty;
            if self.target() == Target::Static && input_ty != ty {
                return Err(bad_argument!("phi inputs have different types: {} and {}", ty, input_ty));
            }
        }

        let Some(opcode) = Opcode::graph_op(self.target(), OpKind::Phi) else {
            return Err(crate::Error::NotSupported);
        };
        let phi = self.create_inst(InstData::new(opcode, ty).inputs(inputs.to_vec()))?;
        self.add_inst_back(block, phi)?;
        Ok(phi)
    }

    /// Creates the catch phi of a handler block, yielding the caught exception.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block.
    pub fn create_catch_phi(&mut self, block: BlockId) -> Result<InstId> {
        self.block(block)?;
        let Some(opcode) = Opcode::graph_op(self.target(), OpKind::CatchPhi) else {
            return Err(crate::Error::NotSupported);
        };
        let ty = match self.target() {
            Target::Static => TypeId::Reference,
            Target::Dynamic => TypeId::Any,
        };
        let phi = self.create_inst(InstData::new(opcode, ty))?;
        self.add_inst_front(block, phi)?;
        Ok(phi)
    }
}
