//! The dynamic (untyped) instruction set.
//!
//! Every value of a dynamic graph is typed [`TypeId::Any`]. Opcodes are described by an operand
//! table ([`DynamicOpcode::operands`]) which the factory checks each creation against, so the
//! generic creators and the named convenience creators share one validation path.
//!
//! Input order conventions: calls take the callee first, then the receiver (`callthis*`), then
//! the arguments; stores take the stored value first, then the object and the key.

use strum::{EnumIter, FromRepr, IntoStaticStr};

use crate::{
    graph::{inst::InstData, ConstantValue, Graph, InstId, Reference},
    isa::{
        check_graph, check_reference, ConditionCode, InstructionFactory, OpKind, Opcode, Target,
        IC_SLOT_PLACEHOLDER,
    },
    metadata::{
        ids::{ExportId, FunctionId, ImportId, LiteralArrayId, ModuleId, StringId},
        types::TypeId,
        AbcFile,
    },
    Result,
};

/// Opcodes of the dynamic instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum DynamicOpcode {
    Constant = 0,
    Parameter,
    Phi,
    CatchPhi,
    Try,
    If,
    // loads of well known values
    LoadString,
    LdUndefined,
    LdNull,
    LdTrue,
    LdFalse,
    LdNan,
    LdInfinity,
    LdHole,
    LdThis,
    LdGlobal,
    LdSymbol,
    LdNewTarget,
    LdFunction,
    LdBigInt,
    Debugger,
    PopLexEnv,
    // object creation
    CreateEmptyObject,
    CreateEmptyArray,
    CreateArrayWithBuffer,
    CreateObjectWithBuffer,
    NewObjRange,
    NewLexEnv,
    // arithmetic and comparison
    Add2,
    Sub2,
    Mul2,
    Div2,
    Mod2,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Shl2,
    Shr2,
    Ashr2,
    And2,
    Or2,
    Xor2,
    Exp,
    StrictNotEq,
    StrictEq,
    IsIn,
    InstanceOf,
    Typeof,
    ToNumber,
    ToNumeric,
    Neg,
    Not,
    Inc,
    Dec,
    IsTrue,
    IsFalse,
    // calls
    CallArg0,
    CallArg1,
    CallArgs2,
    CallArgs3,
    CallRange,
    CallThis0,
    CallThis1,
    CallThis2,
    CallThis3,
    CallThisRange,
    DefineFunc,
    DefineMethod,
    DefineClassWithBuffer,
    // properties
    LdObjByName,
    StObjByName,
    LdObjByValue,
    StObjByValue,
    LdObjByIndex,
    StObjByIndex,
    StOwnByName,
    StOwnByValue,
    DelObjProp,
    GetIterator,
    // globals and lexical environments
    TryLdGlobalByName,
    TryStGlobalByName,
    LdGlobalVar,
    StGlobalVar,
    LdLexVar,
    StLexVar,
    // modules
    GetModuleNamespace,
    LdLocalModuleVar,
    LdExternalModuleVar,
    StModuleVar,
    DynamicImport,
    // exits
    Throw,
    ThrowNotExists,
    ThrowUndefinedIfHoleWithName,
    Return,
    ReturnUndefined,
}

/// Entity kind an opcode references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// [`Reference::String`]
    String,
    /// [`Reference::Function`]
    Function,
    /// [`Reference::LiteralArray`]
    LiteralArray,
    /// [`Reference::Import`]
    Import,
    /// [`Reference::Export`]
    Export,
    /// [`Reference::Module`]
    Module,
}

impl ReferenceKind {
    fn of(reference: Reference) -> Option<ReferenceKind> {
        Some(match reference {
            Reference::String(_) => ReferenceKind::String,
            Reference::Function(_) => ReferenceKind::Function,
            Reference::LiteralArray(_) => ReferenceKind::LiteralArray,
            Reference::Import(_) => ReferenceKind::Import,
            Reference::Export(_) => ReferenceKind::Export,
            Reference::Module(_) => ReferenceKind::Module,
            Reference::Class(_) => return None,
        })
    }
}

/// Operand shape of a dynamic opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    /// Number of inputs, the minimum for variadic opcodes
    pub inputs: usize,
    /// Accepts any number of inputs beyond `inputs`
    pub variadic: bool,
    /// Number of immediates
    pub imms: usize,
    /// Referenced entity kind
    pub reference: Option<ReferenceKind>,
    /// Produces a value
    pub has_result: bool,
}

const fn shape(inputs: usize, imms: usize, reference: Option<ReferenceKind>, has_result: bool) -> Operands {
    Operands {
        inputs,
        variadic: false,
        imms,
        reference,
        has_result,
    }
}

const fn value(inputs: usize) -> Operands {
    shape(inputs, 0, None, true)
}

const fn effect(inputs: usize) -> Operands {
    shape(inputs, 0, None, false)
}

const fn variadic(inputs: usize) -> Operands {
    Operands {
        inputs,
        variadic: true,
        imms: 0,
        reference: None,
        has_result: true,
    }
}

impl DynamicOpcode {
    /// Classification used by the graph engine.
    #[must_use]
    pub fn kind(self) -> OpKind {
        use DynamicOpcode as D;
        match self {
            D::Constant => OpKind::Constant,
            D::Parameter => OpKind::Parameter,
            D::Phi => OpKind::Phi,
            D::CatchPhi => OpKind::CatchPhi,
            D::Try => OpKind::Try,
            D::If => OpKind::If,
            D::Return | D::ReturnUndefined => OpKind::Return,
            D::Throw | D::ThrowNotExists => OpKind::Throw,
            D::CallArg0
            | D::CallArg1
            | D::CallArgs2
            | D::CallArgs3
            | D::CallRange
            | D::CallThis0
            | D::CallThis1
            | D::CallThis2
            | D::CallThis3
            | D::CallThisRange
            | D::NewObjRange => OpKind::Call,
            _ => OpKind::Other,
        }
    }

    /// Returns `true` if instructions with this opcode own an inline cache slot.
    #[must_use]
    pub fn has_ic_slot(self) -> bool {
        use DynamicOpcode as D;
        match self {
            D::CreateEmptyArray
            | D::CreateArrayWithBuffer
            | D::CreateObjectWithBuffer
            | D::NewObjRange
            | D::DefineFunc
            | D::DefineMethod
            | D::DefineClassWithBuffer
            | D::LdObjByName
            | D::StObjByName
            | D::LdObjByValue
            | D::StObjByValue
            | D::LdObjByIndex
            | D::StObjByIndex
            | D::StOwnByName
            | D::StOwnByValue
            | D::GetIterator
            | D::TryLdGlobalByName
            | D::TryStGlobalByName
            | D::LdGlobalVar
            | D::StGlobalVar => true,
            D::IsIn | D::InstanceOf => true,
            op if op.is_binary() || op.is_unary() || op.kind() == OpKind::Call => {
                !matches!(op, D::IsTrue | D::IsFalse)
            }
            _ => false,
        }
    }

    /// Returns `true` for the two-operand arithmetic and comparison opcodes.
    #[must_use]
    pub fn is_binary(self) -> bool {
        (DynamicOpcode::Add2 as u8..=DynamicOpcode::StrictEq as u8).contains(&(self as u8))
    }

    /// Returns `true` for the one-operand opcodes `typeof` through `isfalse`.
    #[must_use]
    pub fn is_unary(self) -> bool {
        (DynamicOpcode::Typeof as u8..=DynamicOpcode::IsFalse as u8).contains(&(self as u8))
    }

    /// Operand shape checked by [`DynamicFactory`].
    #[must_use]
    pub fn operands(self) -> Operands {
        use DynamicOpcode as D;
        use ReferenceKind as R;
        match self {
            D::Constant | D::Parameter => value(0),
            D::Phi => variadic(1),
            D::CatchPhi => value(0),
            D::Try | D::ThrowNotExists | D::ReturnUndefined | D::Debugger | D::PopLexEnv => {
                effect(0)
            }
            D::If => Operands {
                inputs: 2,
                variadic: false,
                imms: 0,
                reference: None,
                has_result: false,
            },
            D::LoadString | D::LdBigInt => shape(0, 0, Some(R::String), true),
            D::LdUndefined
            | D::LdNull
            | D::LdTrue
            | D::LdFalse
            | D::LdNan
            | D::LdInfinity
            | D::LdHole
            | D::LdThis
            | D::LdGlobal
            | D::LdSymbol
            | D::LdNewTarget
            | D::LdFunction
            | D::CreateEmptyObject
            | D::CreateEmptyArray => value(0),
            D::CreateArrayWithBuffer | D::CreateObjectWithBuffer => {
                shape(0, 0, Some(R::LiteralArray), true)
            }
            D::NewObjRange => variadic(1),
            D::NewLexEnv => shape(0, 1, None, true),
            op if op.is_binary() => value(2),
            op if op.is_unary() => value(1),
            D::IsIn | D::InstanceOf => value(2),
            D::CallArg0 => value(1),
            D::CallArg1 => value(2),
            D::CallArgs2 => value(3),
            D::CallArgs3 => value(4),
            D::CallRange => variadic(1),
            D::CallThis0 => value(2),
            D::CallThis1 => value(3),
            D::CallThis2 => value(4),
            D::CallThis3 => value(5),
            D::CallThisRange => variadic(2),
            D::DefineFunc => shape(0, 1, Some(R::Function), true),
            D::DefineMethod => shape(1, 1, Some(R::Function), true),
            D::DefineClassWithBuffer => shape(1, 2, Some(R::Function), true),
            D::LdObjByName => shape(1, 0, Some(R::String), true),
            D::StObjByName | D::StOwnByName => shape(2, 0, Some(R::String), false),
            D::LdObjByValue => value(2),
            D::StObjByValue | D::StOwnByValue => effect(3),
            D::LdObjByIndex => shape(1, 1, None, true),
            D::StObjByIndex => shape(2, 1, None, false),
            D::DelObjProp => value(2),
            D::GetIterator => value(1),
            D::TryLdGlobalByName | D::LdGlobalVar => shape(0, 0, Some(R::String), true),
            D::TryStGlobalByName | D::StGlobalVar => shape(1, 0, Some(R::String), false),
            D::LdLexVar => shape(0, 2, None, true),
            D::StLexVar => shape(1, 2, None, false),
            D::GetModuleNamespace => shape(0, 0, Some(R::Module), true),
            D::LdLocalModuleVar => shape(0, 0, Some(R::Export), true),
            D::LdExternalModuleVar => shape(0, 0, Some(R::Import), true),
            D::StModuleVar => shape(1, 0, Some(R::Export), false),
            D::DynamicImport => value(1),
            D::Throw | D::Return => effect(1),
            D::ThrowUndefinedIfHoleWithName => shape(1, 0, Some(R::String), false),
            // unreachable: the guards above cover the arithmetic ranges
            _ => value(0),
        }
    }

    fn is_graph_op(self) -> bool {
        matches!(
            self,
            DynamicOpcode::Constant
                | DynamicOpcode::Parameter
                | DynamicOpcode::Phi
                | DynamicOpcode::CatchPhi
                | DynamicOpcode::Try
                | DynamicOpcode::If
        )
    }
}

/// Creates and inspects instructions of dynamic graphs.
#[derive(Clone, Copy)]
pub struct DynamicFactory<'a> {
    file: &'a AbcFile,
}

impl<'a> DynamicFactory<'a> {
    pub(crate) fn new(file: &'a AbcFile) -> Self {
        DynamicFactory { file }
    }

    fn check(&self, graph: &Graph) -> Result<()> {
        check_graph(self.file, graph, Target::Dynamic)
    }

    /// Creates an instruction after checking `inputs`, `imms` and `reference` against the operand
    /// table of `opcode`.
    ///
    /// Graph level opcodes (constants, parameters, phis, `try`, `if`) have dedicated creators and
    /// are rejected here.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for a shape mismatch, an unknown or removed referenced
    /// entity, or a graph level opcode.
    pub fn create_full(
        &self,
        graph: &mut Graph,
        opcode: DynamicOpcode,
        inputs: &[InstId],
        imms: &[u64],
        reference: Option<Reference>,
    ) -> Result<InstId> {
        self.check(graph)?;
        if opcode.is_graph_op() {
            return Err(bad_argument!(
                "{} has a dedicated creator",
                Opcode::Dynamic(opcode)
            ));
        }
        self.create_checked(graph, opcode, inputs, imms, reference)
    }

    fn create_checked(
        &self,
        graph: &mut Graph,
        opcode: DynamicOpcode,
        inputs: &[InstId],
        imms: &[u64],
        reference: Option<Reference>,
    ) -> Result<InstId> {
        let operands = opcode.operands();
        let arity_ok = if operands.variadic {
            inputs.len() >= operands.inputs
        } else {
            inputs.len() == operands.inputs
        };
        if !arity_ok {
            return Err(bad_argument!(
                "{} takes {}{} inputs, got {}",
                Opcode::Dynamic(opcode),
                if operands.variadic { "at least " } else { "" },
                operands.inputs,
                inputs.len()
            ));
        }
        if imms.len() != operands.imms {
            return Err(bad_argument!(
                "{} takes {} immediates, got {}",
                Opcode::Dynamic(opcode),
                operands.imms,
                imms.len()
            ));
        }
        if reference.and_then(ReferenceKind::of) != operands.reference {
            return Err(bad_argument!(
                "{} expects a {:?} reference",
                Opcode::Dynamic(opcode),
                operands.reference
            ));
        }
        if let Some(reference) = reference {
            check_reference(self.file, reference)?;
        }

        let ty = if operands.has_result {
            TypeId::Any
        } else {
            TypeId::Void
        };
        let mut data = InstData::new(Opcode::Dynamic(opcode), ty)
            .inputs(inputs.to_vec())
            .imms(imms.to_vec());
        if let Some(reference) = reference {
            data = data.reference(reference);
        }
        if opcode.has_ic_slot() {
            data = data.ic_slot(IC_SLOT_PLACEHOLDER);
        }
        graph.create_inst(data)
    }

    /// Creates an instruction without immediates or references.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create(
        &self,
        graph: &mut Graph,
        opcode: DynamicOpcode,
        inputs: &[InstId],
    ) -> Result<InstId> {
        self.create_full(graph, opcode, inputs, &[], None)
    }

    /// Calls `callee` with `args`, choosing the fixed arity form when one exists.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_call(
        &self,
        graph: &mut Graph,
        callee: InstId,
        args: &[InstId],
    ) -> Result<InstId> {
        let opcode = match args.len() {
            0 => DynamicOpcode::CallArg0,
            1 => DynamicOpcode::CallArg1,
            2 => DynamicOpcode::CallArgs2,
            3 => DynamicOpcode::CallArgs3,
            _ => DynamicOpcode::CallRange,
        };
        let mut inputs = Vec::with_capacity(args.len() + 1);
        inputs.push(callee);
        inputs.extend_from_slice(args);
        self.create(graph, opcode, &inputs)
    }

    /// Calls `callee` with receiver `this` and `args`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_call_this(
        &self,
        graph: &mut Graph,
        callee: InstId,
        this: InstId,
        args: &[InstId],
    ) -> Result<InstId> {
        let opcode = match args.len() {
            0 => DynamicOpcode::CallThis0,
            1 => DynamicOpcode::CallThis1,
            2 => DynamicOpcode::CallThis2,
            3 => DynamicOpcode::CallThis3,
            _ => DynamicOpcode::CallThisRange,
        };
        let mut inputs = Vec::with_capacity(args.len() + 2);
        inputs.push(callee);
        inputs.push(this);
        inputs.extend_from_slice(args);
        self.create(graph, opcode, &inputs)
    }

    /// Loads the global `name`, throwing if it does not exist.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_try_ld_global_by_name(&self, graph: &mut Graph, name: StringId) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::TryLdGlobalByName,
            &[],
            &[],
            Some(Reference::String(name)),
        )
    }

    /// Loads property `name` of `object`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_ld_obj_by_name(
        &self,
        graph: &mut Graph,
        object: InstId,
        name: StringId,
    ) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::LdObjByName,
            &[object],
            &[],
            Some(Reference::String(name)),
        )
    }

    /// Stores `value` into property `name` of `object`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_st_obj_by_name(
        &self,
        graph: &mut Graph,
        value: InstId,
        object: InstId,
        name: StringId,
    ) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::StObjByName,
            &[value, object],
            &[],
            Some(Reference::String(name)),
        )
    }

    /// Creates a closure of `function` taking `argc` arguments.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_define_func(
        &self,
        graph: &mut Graph,
        function: FunctionId,
        argc: u64,
    ) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::DefineFunc,
            &[],
            &[argc],
            Some(Reference::Function(function)),
        )
    }

    /// Materializes a literal array as an array object.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_array_with_buffer(
        &self,
        graph: &mut Graph,
        literal_array: LiteralArrayId,
    ) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::CreateArrayWithBuffer,
            &[],
            &[],
            Some(Reference::LiteralArray(literal_array)),
        )
    }

    /// Loads slot `slot` of the lexical environment `level` frames up.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_ld_lex_var(&self, graph: &mut Graph, level: u64, slot: u64) -> Result<InstId> {
        self.create_full(graph, DynamicOpcode::LdLexVar, &[], &[level, slot], None)
    }

    /// Stores `value` into slot `slot` of the lexical environment `level` frames up.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_st_lex_var(
        &self,
        graph: &mut Graph,
        value: InstId,
        level: u64,
        slot: u64,
    ) -> Result<InstId> {
        self.create_full(graph, DynamicOpcode::StLexVar, &[value], &[level, slot], None)
    }

    /// Loads the namespace object of `module`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_get_module_namespace(&self, graph: &mut Graph, module: ModuleId) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::GetModuleNamespace,
            &[],
            &[],
            Some(Reference::Module(module)),
        )
    }

    /// Loads the binding exported by this module through `export`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_ld_local_module_var(&self, graph: &mut Graph, export: ExportId) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::LdLocalModuleVar,
            &[],
            &[],
            Some(Reference::Export(export)),
        )
    }

    /// Loads the binding imported through `import`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_ld_external_module_var(
        &self,
        graph: &mut Graph,
        import: ImportId,
    ) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::LdExternalModuleVar,
            &[],
            &[],
            Some(Reference::Import(import)),
        )
    }

    /// Stores `value` into the binding exported through `export`.
    ///
    /// # Errors
    /// See [`DynamicFactory::create_full`].
    pub fn create_st_module_var(
        &self,
        graph: &mut Graph,
        value: InstId,
        export: ExportId,
    ) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::StModuleVar,
            &[value],
            &[],
            Some(Reference::Export(export)),
        )
    }

    /// Branches on `input` compared with zero; only `Eq` and `Ne` are valid.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for any other condition code.
    pub fn create_if(&self, graph: &mut Graph, input: InstId, cc: ConditionCode) -> Result<InstId> {
        self.check(graph)?;
        if !matches!(cc, ConditionCode::Eq | ConditionCode::Ne) {
            return Err(bad_argument!(
                "dynamic branches only compare for equality, got {}",
                cc
            ));
        }
        graph.inst(input)?;
        let zero = graph.find_or_create_constant(ConstantValue::I32(0))?;
        graph.create_inst(
            InstData::new(Opcode::Dynamic(DynamicOpcode::If), TypeId::Void)
                .inputs(vec![input, zero])
                .cc(cc),
        )
    }

    fn opcode_of(graph: &Graph, inst: InstId) -> Result<DynamicOpcode> {
        match graph.inst(inst)?.opcode() {
            Opcode::Dynamic(opcode) => Ok(opcode),
            Opcode::Static(_) => Err(bad_argument!("{} is not a dynamic instruction", inst)),
        }
    }

    fn reference_of(&self, graph: &Graph, inst: InstId) -> Result<Reference> {
        self.check(graph)?;
        graph
            .inst(inst)?
            .reference()
            .ok_or_else(|| bad_argument!("{} does not reference an entity", inst))
    }

    fn replace_reference(&self, graph: &mut Graph, inst: InstId, reference: Reference) -> Result<()> {
        self.check(graph)?;
        let expected = Self::opcode_of(graph, inst)?.operands().reference;
        if expected.is_none() || expected != ReferenceKind::of(reference) {
            return Err(bad_argument!(
                "{} can not reference {}",
                inst,
                reference
            ));
        }
        check_reference(self.file, reference)?;
        graph.set_reference(inst, reference)
    }

    /// Opcode of a dynamic instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn get_opcode(&self, graph: &Graph, inst: InstId) -> Result<DynamicOpcode> {
        self.check(graph)?;
        Self::opcode_of(graph, inst)
    }

    /// Import descriptor of an `ldexternalmodulevar`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference an import or the descriptor
    /// was removed.
    pub fn get_import_descriptor(&self, graph: &Graph, inst: InstId) -> Result<ImportId> {
        match self.reference_of(graph, inst)? {
            Reference::Import(id) => {
                self.file.import(id)?;
                Ok(id)
            }
            other => Err(bad_argument!("{} references {}, not an import", inst, other)),
        }
    }

    /// Replaces the import descriptor of an `ldexternalmodulevar`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown or removed descriptor or a mismatching opcode.
    pub fn set_import_descriptor(&self, graph: &mut Graph, inst: InstId, import: ImportId) -> Result<()> {
        self.replace_reference(graph, inst, Reference::Import(import))
    }

    /// Export descriptor of an `ldlocalmodulevar` or `stmodulevar`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference an export or the descriptor
    /// was removed.
    pub fn get_export_descriptor(&self, graph: &Graph, inst: InstId) -> Result<ExportId> {
        match self.reference_of(graph, inst)? {
            Reference::Export(id) => {
                self.file.export(id)?;
                Ok(id)
            }
            other => Err(bad_argument!("{} references {}, not an export", inst, other)),
        }
    }

    /// Replaces the export descriptor of a module variable access.
    ///
    /// # Errors
    /// See [`DynamicFactory::set_import_descriptor`].
    pub fn set_export_descriptor(&self, graph: &mut Graph, inst: InstId, export: ExportId) -> Result<()> {
        self.replace_reference(graph, inst, Reference::Export(export))
    }

    /// Module of a `getmodulenamespace`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a module.
    pub fn get_module(&self, graph: &Graph, inst: InstId) -> Result<ModuleId> {
        match self.reference_of(graph, inst)? {
            Reference::Module(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a module", inst, other)),
        }
    }

    /// Replaces the module of a `getmodulenamespace`.
    ///
    /// # Errors
    /// See [`DynamicFactory::set_import_descriptor`].
    pub fn set_module(&self, graph: &mut Graph, inst: InstId, module: ModuleId) -> Result<()> {
        self.replace_reference(graph, inst, Reference::Module(module))
    }

    /// String operand of an instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a string.
    pub fn get_string(&self, graph: &Graph, inst: InstId) -> Result<StringId> {
        match self.reference_of(graph, inst)? {
            Reference::String(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a string", inst, other)),
        }
    }

    /// Replaces the string operand of an instruction.
    ///
    /// # Errors
    /// See [`DynamicFactory::set_import_descriptor`].
    pub fn set_string(&self, graph: &mut Graph, inst: InstId, string: StringId) -> Result<()> {
        self.replace_reference(graph, inst, Reference::String(string))
    }

    /// Function operand of a `define*` instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a function.
    pub fn get_function(&self, graph: &Graph, inst: InstId) -> Result<FunctionId> {
        match self.reference_of(graph, inst)? {
            Reference::Function(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a function", inst, other)),
        }
    }

    /// Replaces the function operand of a `define*` instruction.
    ///
    /// # Errors
    /// See [`DynamicFactory::set_import_descriptor`].
    pub fn set_function(&self, graph: &mut Graph, inst: InstId, function: FunctionId) -> Result<()> {
        self.replace_reference(graph, inst, Reference::Function(function))
    }

    /// Literal array operand of a `create*withbuffer` instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a literal array.
    pub fn get_literal_array(&self, graph: &Graph, inst: InstId) -> Result<LiteralArrayId> {
        match self.reference_of(graph, inst)? {
            Reference::LiteralArray(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a literal array", inst, other)),
        }
    }

    /// Replaces the literal array operand of a `create*withbuffer` instruction.
    ///
    /// # Errors
    /// See [`DynamicFactory::set_import_descriptor`].
    pub fn set_literal_array(
        &self,
        graph: &mut Graph,
        inst: InstId,
        literal_array: LiteralArrayId,
    ) -> Result<()> {
        self.replace_reference(graph, inst, Reference::LiteralArray(literal_array))
    }
}

impl InstructionFactory for DynamicFactory<'_> {
    fn target(&self) -> Target {
        Target::Dynamic
    }

    fn create_load_string(&self, graph: &mut Graph, string: StringId) -> Result<InstId> {
        self.create_full(
            graph,
            DynamicOpcode::LoadString,
            &[],
            &[],
            Some(Reference::String(string)),
        )
    }

    fn create_return(&self, graph: &mut Graph, value: InstId) -> Result<InstId> {
        self.create(graph, DynamicOpcode::Return, &[value])
    }

    fn create_return_void(&self, graph: &mut Graph) -> Result<InstId> {
        self.create(graph, DynamicOpcode::ReturnUndefined, &[])
    }

    fn create_throw(&self, graph: &mut Graph, value: InstId) -> Result<InstId> {
        self.create(graph, DynamicOpcode::Throw, &[value])
    }

    fn create_try(&self, graph: &mut Graph) -> Result<InstId> {
        self.check(graph)?;
        graph.create_inst(InstData::new(
            Opcode::Dynamic(DynamicOpcode::Try),
            TypeId::Void,
        ))
    }

    fn create_if_zero(
        &self,
        graph: &mut Graph,
        input: InstId,
        cc: ConditionCode,
    ) -> Result<InstId> {
        self.create_if(graph, input, cc)
    }
}
