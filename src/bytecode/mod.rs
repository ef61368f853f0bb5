//! Function body codec.
//!
//! A body is a flat list of register instructions. The [`decoder`] turns it into an editable
//! [`crate::graph::Graph`], the [`encoder`] lays a graph out again, and [`ic_slots`] numbers the
//! inline cache slots of a graph in layout order before it is encoded.
//!
//! ```text
//! body   cu param count, cu register count,
//!        cu try count, tries (cu try pc, cu try end pc, cu handler pc),
//!        cu instruction count, instructions
//! inst   u8 opcode, u8 flags, u8 result type, [cu dst], cu input count, cu input registers,
//!        [cu imm count, u64 imms], [u8 reference kind, cu reference index], [u8 condition],
//!        [u8 constant tag, u64 constant bits], [u16 ic slot], [cu target pc]
//! ```
//!
//! Parameters occupy registers `0..param count` and are not encoded. Every other value owns
//! exactly one register. A phi owns a second, incoming register which its predecessors fill
//! with [`MOV`] instructions; [`JUMP`] transfers control. Neither of them exists in a graph. A
//! branch target equal to the instruction count denotes the end block. A `Return` or `Throw`
//! carrying a target closes a try region whose exit block starts at that target.

pub(crate) mod decoder;
pub(crate) mod encoder;
pub(crate) mod ic_slots;

pub(crate) use decoder::decode;
pub(crate) use encoder::encode;

use bitflags::bitflags;

use crate::{
    file::{
        io::{push_le, write_compressed_uint, write_compressed_usize},
        parser::Parser,
    },
    graph::{ConstantValue, Reference},
    isa::ConditionCode,
    metadata::types::TypeId,
    Result,
};

/// Codec-only opcode copying a register into a phi's incoming register.
pub(crate) const MOV: u8 = 0xFE;

/// Codec-only opcode transferring control to its target pc.
pub(crate) const JUMP: u8 = 0xFF;

bitflags! {
    /// Optional parts present in an encoded instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct InstFlags: u8 {
        const DST = 0x01;
        const IMMS = 0x02;
        const REF = 0x04;
        const CC = 0x08;
        const CONST = 0x10;
        const IC = 0x20;
        const TARGET = 0x40;
        /// First instruction of a block
        const LEADER = 0x80;
    }
}

/// One encoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawInst {
    pub code: u8,
    pub leader: bool,
    pub ty: TypeId,
    pub dst: Option<u32>,
    pub inputs: Vec<u32>,
    pub imms: Vec<u64>,
    pub reference: Option<Reference>,
    pub cc: Option<ConditionCode>,
    pub constant: Option<ConstantValue>,
    pub ic_slot: Option<u16>,
    pub target: Option<u32>,
}

impl RawInst {
    pub(crate) fn new(code: u8, ty: TypeId) -> Self {
        RawInst {
            code,
            leader: false,
            ty,
            dst: None,
            inputs: Vec::new(),
            imms: Vec::new(),
            reference: None,
            cc: None,
            constant: None,
            ic_slot: None,
            target: None,
        }
    }

    pub(crate) fn mov(dst: u32, src: u32) -> Self {
        RawInst {
            dst: Some(dst),
            inputs: vec![src],
            ..RawInst::new(MOV, TypeId::Void)
        }
    }

    pub(crate) fn jump(target: u32) -> Self {
        RawInst {
            target: Some(target),
            ..RawInst::new(JUMP, TypeId::Void)
        }
    }

    /// Returns `true` for the codec-only opcodes.
    pub(crate) fn is_pseudo(&self) -> bool {
        self.code == MOV || self.code == JUMP
    }

    fn flags(&self) -> InstFlags {
        let mut flags = InstFlags::empty();
        flags.set(InstFlags::DST, self.dst.is_some());
        flags.set(InstFlags::IMMS, !self.imms.is_empty());
        flags.set(InstFlags::REF, self.reference.is_some());
        flags.set(InstFlags::CC, self.cc.is_some());
        flags.set(InstFlags::CONST, self.constant.is_some());
        flags.set(InstFlags::IC, self.ic_slot.is_some());
        flags.set(InstFlags::TARGET, self.target.is_some());
        flags.set(InstFlags::LEADER, self.leader);
        flags
    }

    pub(crate) fn read(parser: &mut Parser<'_>) -> Result<RawInst> {
        let code = parser.read_le::<u8>()?;
        let flags = InstFlags::from_bits_truncate(parser.read_le::<u8>()?);
        let ty_code = parser.read_le::<u8>()?;
        let ty = TypeId::from_repr(ty_code)
            .ok_or_else(|| malformed_error!("unknown result type {}", ty_code))?;

        let mut inst = RawInst::new(code, ty);
        inst.leader = flags.contains(InstFlags::LEADER);
        if flags.contains(InstFlags::DST) {
            inst.dst = Some(parser.read_compressed_uint()?);
        }

        let input_count = parser.read_count(1)?;
        inst.inputs = (0..input_count)
            .map(|_| parser.read_compressed_uint())
            .collect::<Result<_>>()?;

        if flags.contains(InstFlags::IMMS) {
            let count = parser.read_count(8)?;
            inst.imms = (0..count)
                .map(|_| parser.read_le::<u64>())
                .collect::<Result<_>>()?;
        }
        if flags.contains(InstFlags::REF) {
            let kind = parser.read_le::<u8>()?;
            let index = parser.read_compressed_uint()?;
            inst.reference = Some(
                Reference::from_parts(kind, index)
                    .ok_or_else(|| malformed_error!("unknown reference kind {}", kind))?,
            );
        }
        if flags.contains(InstFlags::CC) {
            let cc = parser.read_le::<u8>()?;
            inst.cc = Some(
                ConditionCode::from_repr(cc)
                    .ok_or_else(|| malformed_error!("unknown condition code {}", cc))?,
            );
        }
        if flags.contains(InstFlags::CONST) {
            let tag = parser.read_le::<u8>()?;
            let bits = parser.read_le::<u64>()?;
            inst.constant = Some(
                ConstantValue::from_parts(tag, bits)
                    .ok_or_else(|| malformed_error!("unknown constant tag {}", tag))?,
            );
        }
        if flags.contains(InstFlags::IC) {
            inst.ic_slot = Some(parser.read_le::<u16>()?);
        }
        if flags.contains(InstFlags::TARGET) {
            inst.target = Some(parser.read_compressed_uint()?);
        }

        Ok(inst)
    }

    pub(crate) fn write(&self, buffer: &mut Vec<u8>) -> Result<()> {
        buffer.push(self.code);
        buffer.push(self.flags().bits());
        buffer.push(self.ty as u8);
        if let Some(dst) = self.dst {
            write_compressed_uint(dst, buffer)?;
        }

        write_compressed_usize(self.inputs.len(), buffer)?;
        for input in &self.inputs {
            write_compressed_uint(*input, buffer)?;
        }

        if !self.imms.is_empty() {
            write_compressed_usize(self.imms.len(), buffer)?;
            for imm in &self.imms {
                push_le(buffer, *imm);
            }
        }
        if let Some(reference) = self.reference {
            buffer.push(reference.kind_code());
            write_compressed_uint(reference.raw_index(), buffer)?;
        }
        if let Some(cc) = self.cc {
            buffer.push(cc as u8);
        }
        if let Some(constant) = self.constant {
            buffer.push(constant.tag());
            push_le(buffer, constant.bits());
        }
        if let Some(slot) = self.ic_slot {
            push_le(buffer, slot);
        }
        if let Some(target) = self.target {
            write_compressed_uint(target, buffer)?;
        }
        Ok(())
    }
}

/// Try region of an encoded body, as instruction indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TryRange {
    /// The `Try` instruction opening the region
    pub try_pc: u32,
    /// First instruction of the block leaving the region
    pub end_pc: u32,
    /// First instruction of the handler
    pub handler_pc: u32,
}

/// A complete encoded body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Body {
    pub param_count: u32,
    pub register_count: u32,
    pub tries: Vec<TryRange>,
    pub insts: Vec<RawInst>,
}

impl Body {
    pub(crate) fn read(data: &[u8]) -> Result<Body> {
        let mut parser = Parser::new(data);
        let param_count = parser.read_compressed_uint()?;
        let register_count = parser.read_compressed_uint()?;

        let try_count = parser.read_count(3)?;
        let mut tries = Vec::with_capacity(try_count);
        for _ in 0..try_count {
            tries.push(TryRange {
                try_pc: parser.read_compressed_uint()?,
                end_pc: parser.read_compressed_uint()?,
                handler_pc: parser.read_compressed_uint()?,
            });
        }

        let inst_count = parser.read_count(4)?;
        let mut insts = Vec::with_capacity(inst_count);
        for _ in 0..inst_count {
            insts.push(RawInst::read(&mut parser)?);
        }

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after the last instruction",
                parser.remaining()
            ));
        }

        Ok(Body {
            param_count,
            register_count,
            tries,
            insts,
        })
    }

    pub(crate) fn write(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        write_compressed_uint(self.param_count, &mut buffer)?;
        write_compressed_uint(self.register_count, &mut buffer)?;

        write_compressed_usize(self.tries.len(), &mut buffer)?;
        for range in &self.tries {
            write_compressed_uint(range.try_pc, &mut buffer)?;
            write_compressed_uint(range.end_pc, &mut buffer)?;
            write_compressed_uint(range.handler_pc, &mut buffer)?;
        }

        write_compressed_usize(self.insts.len(), &mut buffer)?;
        for inst in &self.insts {
            inst.write(&mut buffer)?;
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ids::StringId;

    #[test]
    fn instruction_with_every_part() {
        let inst = RawInst {
            code: 9,
            leader: true,
            ty: TypeId::I64,
            dst: Some(300),
            inputs: vec![1, 2],
            imms: vec![u64::MAX],
            reference: Some(Reference::String(StringId::new(7))),
            cc: Some(ConditionCode::Ge),
            constant: Some(ConstantValue::F64(-0.5)),
            ic_slot: Some(0x1234),
            target: Some(40),
        };
        let mut buffer = Vec::new();
        inst.write(&mut buffer).unwrap();

        assert_eq!(buffer[1], 0xFF);
        let mut parser = Parser::new(&buffer);
        assert_eq!(RawInst::read(&mut parser).unwrap(), inst);
        assert!(!parser.has_more_data());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let body = Body {
            param_count: 0,
            register_count: 0,
            tries: vec![],
            insts: vec![RawInst::jump(1)],
        };
        let mut bytes = body.write().unwrap();
        assert_eq!(Body::read(&bytes).unwrap(), body);

        bytes.push(0);
        assert!(matches!(Body::read(&bytes), Err(crate::Error::Malformed { .. })));
    }

    #[test]
    fn unknown_type_rejected() {
        let bytes = [JUMP, 0, 0xEE, 0];
        let mut parser = Parser::new(&bytes);
        assert!(RawInst::read(&mut parser).is_err());
    }
}
