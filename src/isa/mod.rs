//! Instruction set abstraction.
//!
//! One graph engine serves two instruction set flavors:
//!
//! - the **static** ISA ([`StaticOpcode`], [`StaticFactory`]) with typed values, resolved call
//!   targets and two-operand conditional branches;
//! - the **dynamic** ISA ([`DynamicOpcode`], [`DynamicFactory`]) with untyped values, inline cache
//!   slots on property and call sites and conditional branches against zero.
//!
//! The engine itself only asks an [`Opcode`] for its [`OpKind`], mnemonic and whether it carries an
//! inline cache slot. Everything opcode specific (operand shape, immediates, references) is
//! decided by the factories, which are selected once per file through [`crate::AbcFile::factory`]
//! and share the [`InstructionFactory`] capability.
//!
//! # Examples
//!
//! ```rust,no_run
//! use abckit::{AbcFile, isa::ConditionCode};
//! use std::path::Path;
//!
//! let mut file = AbcFile::from_path(Path::new("module.abc"))?;
//! let hello = file.create_string("hello")?;
//! let function = file.find_function("main").expect("main");
//!
//! let mut graph = file.create_graph_from_function(function)?;
//! let factory = file.factory();
//! let string = factory.create_load_string(&mut graph, hello)?;
//! let first = graph.block(graph.start())?.successors()[0];
//! graph.add_inst_front(first, string)?;
//! # Ok::<(), abckit::Error>(())
//! ```

mod dynamic_isa;
mod static_isa;

pub use dynamic_isa::{DynamicFactory, DynamicOpcode, Operands, ReferenceKind};
pub use static_isa::{StaticFactory, StaticOpcode};

use strum::{Display, EnumIter, FromRepr};

use crate::{
    graph::{Graph, InstId, Reference},
    metadata::{ids::StringId, AbcFile},
    Error::{WrongContext, WrongTarget},
    Result,
};

/// Placeholder stored in the inline cache slot of freshly created instructions. Real slots are
/// assigned when a graph is written back into its function.
pub const IC_SLOT_PLACEHOLDER: u16 = 0xF;

/// Instruction set flavor of a file, and of every graph created from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    /// Typed, ahead-of-time compiled bytecode
    Static,
    /// Untyped, dynamically typed bytecode
    Dynamic,
}

/// Coarse classification of opcodes, the only opcode property the graph engine relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OpKind {
    /// Constant materialized in the start block
    Constant,
    /// Function parameter, lives in the start block
    Parameter,
    /// Control flow merge; input `i` belongs to predecessor `i`
    Phi,
    /// Value of the exception caught by a handler block
    CatchPhi,
    /// Opens a try region
    Try,
    /// Two-way conditional branch
    If,
    /// Leaves the function normally
    Return,
    /// Leaves the function by throwing
    Throw,
    /// Calls a function
    Call,
    /// Everything else
    Other,
}

impl OpKind {
    /// Returns `true` for instructions that must be the last of their block.
    #[must_use]
    pub fn is_terminator(self) -> bool {
        matches!(self, OpKind::If | OpKind::Return | OpKind::Throw | OpKind::Try)
    }

    /// Returns `true` for instructions that live among the leading phis of a block.
    #[must_use]
    pub fn is_phi(self) -> bool {
        matches!(self, OpKind::Phi | OpKind::CatchPhi)
    }
}

/// Condition of a conditional branch.
///
/// `B`, `Be`, `A` and `Ae` are the unsigned below / above comparisons, `TstEq` and `TstNe` test the
/// bitwise and of both operands against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ConditionCode {
    /// No condition, invalid on a branch
    None = 0,
    /// Equal
    Eq = 1,
    /// Not equal
    Ne = 2,
    /// Signed less
    Lt = 3,
    /// Signed less or equal
    Le = 4,
    /// Signed greater
    Gt = 5,
    /// Signed greater or equal
    Ge = 6,
    /// Unsigned below
    B = 7,
    /// Unsigned below or equal
    Be = 8,
    /// Unsigned above
    A = 9,
    /// Unsigned above or equal
    Ae = 10,
    /// Bitwise test equals zero
    TstEq = 11,
    /// Bitwise test not zero
    TstNe = 12,
}

/// Opcode of an instruction in either instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Static ISA opcode
    Static(StaticOpcode),
    /// Dynamic ISA opcode
    Dynamic(DynamicOpcode),
}

impl Opcode {
    /// Instruction set this opcode belongs to.
    #[must_use]
    pub fn target(self) -> Target {
        match self {
            Opcode::Static(_) => Target::Static,
            Opcode::Dynamic(_) => Target::Dynamic,
        }
    }

    /// Classification used by the graph engine.
    #[must_use]
    pub fn kind(self) -> OpKind {
        match self {
            Opcode::Static(op) => op.kind(),
            Opcode::Dynamic(op) => op.kind(),
        }
    }

    /// Assembly mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Static(op) => op.into(),
            Opcode::Dynamic(op) => op.into(),
        }
    }

    /// Returns `true` if instructions with this opcode own an inline cache slot.
    #[must_use]
    pub fn has_ic_slot(self) -> bool {
        match self {
            Opcode::Static(_) => false,
            Opcode::Dynamic(op) => op.has_ic_slot(),
        }
    }

    /// Encoding of this opcode inside a function body.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Opcode::Static(op) => op as u8,
            Opcode::Dynamic(op) => op as u8,
        }
    }

    /// Decodes an opcode of the given instruction set.
    #[must_use]
    pub fn from_code(target: Target, code: u8) -> Option<Opcode> {
        match target {
            Target::Static => StaticOpcode::from_repr(code).map(Opcode::Static),
            Target::Dynamic => DynamicOpcode::from_repr(code).map(Opcode::Dynamic),
        }
    }

    /// Opcode of a graph level instruction of `kind` in the instruction set of `target`.
    ///
    /// Returns `None` for kinds that are not shared by both instruction sets.
    #[must_use]
    pub fn graph_op(target: Target, kind: OpKind) -> Option<Opcode> {
        let opcode = match (target, kind) {
            (Target::Static, OpKind::Constant) => Opcode::Static(StaticOpcode::Constant),
            (Target::Static, OpKind::Parameter) => Opcode::Static(StaticOpcode::Parameter),
            (Target::Static, OpKind::Phi) => Opcode::Static(StaticOpcode::Phi),
            (Target::Static, OpKind::CatchPhi) => Opcode::Static(StaticOpcode::CatchPhi),
            (Target::Static, OpKind::Try) => Opcode::Static(StaticOpcode::Try),
            (Target::Dynamic, OpKind::Constant) => Opcode::Dynamic(DynamicOpcode::Constant),
            (Target::Dynamic, OpKind::Parameter) => Opcode::Dynamic(DynamicOpcode::Parameter),
            (Target::Dynamic, OpKind::Phi) => Opcode::Dynamic(DynamicOpcode::Phi),
            (Target::Dynamic, OpKind::CatchPhi) => Opcode::Dynamic(DynamicOpcode::CatchPhi),
            (Target::Dynamic, OpKind::Try) => Opcode::Dynamic(DynamicOpcode::Try),
            _ => return None,
        };
        Some(opcode)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Instruction creation shared by both instruction sets.
///
/// Every creator returns a fresh instruction that is not linked into any block yet; the user
/// edges of its inputs are already populated. Link it with [`Graph::insert_before`],
/// [`Graph::insert_after`], [`Graph::add_inst_front`] or [`Graph::add_inst_back`].
pub trait InstructionFactory {
    /// Instruction set of the graphs this factory works on.
    fn target(&self) -> Target;

    /// Loads a string constant.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown string, [`crate::Error::WrongTarget`] or
    /// [`crate::Error::WrongContext`] for a graph of another target or file.
    fn create_load_string(&self, graph: &mut Graph, string: StringId) -> Result<InstId>;

    /// Returns `value` from the function.
    ///
    /// # Errors
    /// See [`InstructionFactory::create_load_string`].
    fn create_return(&self, graph: &mut Graph, value: InstId) -> Result<InstId>;

    /// Returns from the function without a value.
    ///
    /// # Errors
    /// See [`InstructionFactory::create_load_string`].
    fn create_return_void(&self, graph: &mut Graph) -> Result<InstId>;

    /// Throws `value`.
    ///
    /// # Errors
    /// See [`InstructionFactory::create_load_string`].
    fn create_throw(&self, graph: &mut Graph, value: InstId) -> Result<InstId>;

    /// Creates the marker instruction of a try region entry block.
    ///
    /// # Errors
    /// See [`InstructionFactory::create_load_string`].
    fn create_try(&self, graph: &mut Graph) -> Result<InstId>;

    /// Branches on `input` compared against zero.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for a condition code the instruction set does not allow
    /// for this comparison, otherwise see [`InstructionFactory::create_load_string`].
    fn create_if_zero(&self, graph: &mut Graph, input: InstId, cc: ConditionCode)
        -> Result<InstId>;
}

/// Checks that `graph` was created from `file` and uses the instruction set `expected`.
pub(crate) fn check_graph(file: &AbcFile, graph: &Graph, expected: Target) -> Result<()> {
    if graph.file_id() != file.id() {
        return Err(WrongContext(format!(
            "graph {} was created from {}, not from {}",
            graph.id(),
            graph.file_id(),
            file.id()
        )));
    }

    if graph.target() != expected {
        return Err(WrongTarget {
            expected,
            found: graph.target(),
        });
    }

    Ok(())
}

/// Checks that the entity behind `reference` exists (and, for descriptors, was not removed).
pub(crate) fn check_reference(file: &AbcFile, reference: Reference) -> Result<()> {
    match reference {
        Reference::String(id) => file.string(id).map(|_| ()),
        Reference::Function(id) => file.function(id).map(|_| ()),
        Reference::LiteralArray(id) => file.literal_array(id).map(|_| ()),
        Reference::Import(id) => file.import(id).map(|_| ()),
        Reference::Export(id) => file.export(id).map(|_| ()),
        Reference::Module(id) => file.module(id).map(|_| ()),
        Reference::Class(id) => file.class(id).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_codes_roundtrip() {
        use strum::IntoEnumIterator;

        for op in StaticOpcode::iter() {
            let opcode = Opcode::Static(op);
            assert_eq!(Opcode::from_code(Target::Static, opcode.code()), Some(opcode));
            assert!(opcode.code() < 0xF0);
        }
        for op in DynamicOpcode::iter() {
            let opcode = Opcode::Dynamic(op);
            assert_eq!(Opcode::from_code(Target::Dynamic, opcode.code()), Some(opcode));
            assert!(opcode.code() < 0xF0);
        }
    }

    #[test]
    fn graph_ops() {
        for target in [Target::Static, Target::Dynamic] {
            for kind in [
                OpKind::Constant,
                OpKind::Parameter,
                OpKind::Phi,
                OpKind::CatchPhi,
                OpKind::Try,
            ] {
                let opcode = Opcode::graph_op(target, kind).unwrap();
                assert_eq!(opcode.kind(), kind);
                assert_eq!(opcode.target(), target);
            }
            assert!(Opcode::graph_op(target, OpKind::Call).is_none());
        }
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::Dynamic(DynamicOpcode::TryLdGlobalByName).mnemonic(), "tryldglobalbyname");
        assert_eq!(Opcode::Static(StaticOpcode::CallStatic).to_string(), "callstatic");
        assert_eq!(ConditionCode::TstNe.to_string(), "tstne");
        assert_eq!(Target::Dynamic.to_string(), "dynamic");
    }
}
