//! The static (typed) instruction set.

use strum::{EnumIter, FromRepr, IntoStaticStr};

use crate::{
    graph::{inst::InstData, ConstantValue, Graph, InstId, Reference},
    isa::{check_graph, check_reference, ConditionCode, InstructionFactory, OpKind, Opcode, Target},
    metadata::{
        ids::{ClassId, FunctionId, LiteralArrayId, StringId},
        types::TypeId,
        AbcFile,
    },
    Result,
};

/// Opcodes of the static instruction set.
///
/// Binary opcodes with an `I` suffix take their right operand as an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum StaticOpcode {
    Constant = 0,
    Parameter,
    Phi,
    CatchPhi,
    Try,
    If,
    CallStatic,
    CallVirtual,
    LoadString,
    LoadUndefined,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    AddI,
    SubI,
    MulI,
    DivI,
    ModI,
    Shl,
    Shr,
    AShr,
    ShlI,
    ShrI,
    AShrI,
    And,
    Or,
    Xor,
    AndI,
    OrI,
    XorI,
    Not,
    Neg,
    Cmp,
    Equals,
    Cast,
    IsUndefined,
    NewArray,
    LoadArray,
    StoreArray,
    LenArray,
    LoadConstArray,
    CheckCast,
    IsInstance,
    Return,
    ReturnVoid,
    Throw,
}

impl StaticOpcode {
    /// Classification used by the graph engine.
    #[must_use]
    pub fn kind(self) -> OpKind {
        match self {
            StaticOpcode::Constant => OpKind::Constant,
            StaticOpcode::Parameter => OpKind::Parameter,
            StaticOpcode::Phi => OpKind::Phi,
            StaticOpcode::CatchPhi => OpKind::CatchPhi,
            StaticOpcode::Try => OpKind::Try,
            StaticOpcode::If => OpKind::If,
            StaticOpcode::CallStatic | StaticOpcode::CallVirtual => OpKind::Call,
            StaticOpcode::Return | StaticOpcode::ReturnVoid => OpKind::Return,
            StaticOpcode::Throw => OpKind::Throw,
            _ => OpKind::Other,
        }
    }

    /// Returns `true` for the two-register arithmetic and bitwise opcodes.
    #[must_use]
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            StaticOpcode::Add
                | StaticOpcode::Sub
                | StaticOpcode::Mul
                | StaticOpcode::Div
                | StaticOpcode::Mod
                | StaticOpcode::Shl
                | StaticOpcode::Shr
                | StaticOpcode::AShr
                | StaticOpcode::And
                | StaticOpcode::Or
                | StaticOpcode::Xor
        )
    }

    /// Returns `true` for the register-immediate arithmetic and bitwise opcodes.
    #[must_use]
    pub fn is_binary_imm(self) -> bool {
        matches!(
            self,
            StaticOpcode::AddI
                | StaticOpcode::SubI
                | StaticOpcode::MulI
                | StaticOpcode::DivI
                | StaticOpcode::ModI
                | StaticOpcode::ShlI
                | StaticOpcode::ShrI
                | StaticOpcode::AShrI
                | StaticOpcode::AndI
                | StaticOpcode::OrI
                | StaticOpcode::XorI
        )
    }

    /// Returns `true` for opcodes that only accept integral operands.
    #[must_use]
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            StaticOpcode::Shl
                | StaticOpcode::Shr
                | StaticOpcode::AShr
                | StaticOpcode::And
                | StaticOpcode::Or
                | StaticOpcode::Xor
                | StaticOpcode::ShlI
                | StaticOpcode::ShrI
                | StaticOpcode::AShrI
                | StaticOpcode::AndI
                | StaticOpcode::OrI
                | StaticOpcode::XorI
                | StaticOpcode::Not
        )
    }
}

/// Creates and inspects instructions of static graphs.
///
/// Operand types are checked when an instruction is created: arithmetic needs operands of one
/// numeric type, array accesses need a reference array and an integral index.
#[derive(Clone, Copy)]
pub struct StaticFactory<'a> {
    file: &'a AbcFile,
}

fn op(opcode: StaticOpcode) -> Opcode {
    Opcode::Static(opcode)
}

fn is_numeric(ty: TypeId) -> bool {
    ty.is_integral() || ty.is_floating()
}

impl<'a> StaticFactory<'a> {
    pub(crate) fn new(file: &'a AbcFile) -> Self {
        StaticFactory { file }
    }

    fn check(&self, graph: &Graph) -> Result<()> {
        check_graph(self.file, graph, Target::Static)
    }

    fn ty(graph: &Graph, inst: InstId) -> Result<TypeId> {
        Ok(graph.inst(inst)?.ty())
    }

    fn create(&self, graph: &mut Graph, data: InstData) -> Result<InstId> {
        self.check(graph)?;
        graph.create_inst(data)
    }

    fn create_with_reference(
        &self,
        graph: &mut Graph,
        data: InstData,
        reference: Reference,
    ) -> Result<InstId> {
        check_reference(self.file, reference)?;
        self.create(graph, data.reference(reference))
    }

    /// Calls a static function.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `args` does not match the parameter count of `function`.
    pub fn create_call_static(
        &self,
        graph: &mut Graph,
        function: FunctionId,
        args: &[InstId],
    ) -> Result<InstId> {
        let callee = self.file.function(function)?;
        if callee.signature().params().len() != args.len() {
            return Err(bad_argument!(
                "{} expects {} arguments, got {}",
                self.file.function_name(function)?,
                callee.signature().params().len(),
                args.len()
            ));
        }
        let ret = callee.signature().return_type();
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::CallStatic), ret).inputs(args.to_vec()),
            Reference::Function(function),
        )
    }

    /// Calls a virtual method on `this`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for a static `function`, a `this` that is not a reference or
    /// an argument count mismatch.
    pub fn create_call_virtual(
        &self,
        graph: &mut Graph,
        this: InstId,
        function: FunctionId,
        args: &[InstId],
    ) -> Result<InstId> {
        let callee = self.file.function(function)?;
        if callee.is_static() {
            return Err(bad_argument!(
                "{} is static and can not be called virtually",
                self.file.function_name(function)?
            ));
        }
        if !Self::ty(graph, this)?.is_reference() {
            return Err(bad_argument!("receiver {} is not a reference", this));
        }
        // the receiver is the first parameter of an instance method
        if callee.signature().params().len() != args.len() + 1 {
            return Err(bad_argument!(
                "{} expects {} arguments besides the receiver, got {}",
                self.file.function_name(function)?,
                callee.signature().params().len().saturating_sub(1),
                args.len()
            ));
        }

        let mut inputs = Vec::with_capacity(args.len() + 1);
        inputs.push(this);
        inputs.extend_from_slice(args);
        let ret = callee.signature().return_type();
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::CallVirtual), ret).inputs(inputs),
            Reference::Function(function),
        )
    }

    /// Loads the `undefined` reference.
    ///
    /// # Errors
    /// [`crate::Error::WrongTarget`] or [`crate::Error::WrongContext`] for a foreign graph.
    pub fn create_load_undefined(&self, graph: &mut Graph) -> Result<InstId> {
        self.create(
            graph,
            InstData::new(op(StaticOpcode::LoadUndefined), TypeId::Reference),
        )
    }

    /// Creates a two-operand arithmetic or bitwise instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `opcode` is not binary, the operand types differ or are
    /// not numeric (integral for bitwise opcodes).
    pub fn create_binary(
        &self,
        graph: &mut Graph,
        opcode: StaticOpcode,
        lhs: InstId,
        rhs: InstId,
    ) -> Result<InstId> {
        if !opcode.is_binary() {
            return Err(bad_argument!("{} is not a binary opcode", Opcode::Static(opcode)));
        }
        let ty = Self::ty(graph, lhs)?;
        let rhs_ty = Self::ty(graph, rhs)?;
        if ty != rhs_ty {
            return Err(bad_argument!("operand types differ: {} and {}", ty, rhs_ty));
        }
        self.check_operand(opcode, ty)?;
        self.create(
            graph,
            InstData::new(op(opcode), ty).inputs(vec![lhs, rhs]),
        )
    }

    fn check_operand(&self, opcode: StaticOpcode, ty: TypeId) -> Result<()> {
        let valid = if opcode.is_bitwise() {
            ty.is_integral()
        } else {
            is_numeric(ty)
        };
        if valid {
            Ok(())
        } else {
            Err(bad_argument!(
                "{} does not accept operands of type {}",
                Opcode::Static(opcode),
                ty
            ))
        }
    }

    /// Creates an arithmetic or bitwise instruction with an immediate right operand.
    ///
    /// # Errors
    /// See [`StaticFactory::create_binary`].
    pub fn create_binary_imm(
        &self,
        graph: &mut Graph,
        opcode: StaticOpcode,
        input: InstId,
        imm: u64,
    ) -> Result<InstId> {
        if !opcode.is_binary_imm() {
            return Err(bad_argument!(
                "{} is not an immediate binary opcode",
                Opcode::Static(opcode)
            ));
        }
        let ty = Self::ty(graph, input)?;
        self.check_operand(opcode, ty)?;
        self.create(
            graph,
            InstData::new(op(opcode), ty)
                .inputs(vec![input])
                .imms(vec![imm]),
        )
    }

    /// Creates `Not` or `Neg`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for other opcodes or operands of the wrong type.
    pub fn create_unary(
        &self,
        graph: &mut Graph,
        opcode: StaticOpcode,
        input: InstId,
    ) -> Result<InstId> {
        if !matches!(opcode, StaticOpcode::Not | StaticOpcode::Neg) {
            return Err(bad_argument!("{} is not a unary opcode", Opcode::Static(opcode)));
        }
        let ty = Self::ty(graph, input)?;
        self.check_operand(opcode, ty)?;
        self.create(graph, InstData::new(op(opcode), ty).inputs(vec![input]))
    }

    /// Three-way comparison yielding -1, 0 or 1 as `i32`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for operands of different or non numeric types.
    pub fn create_cmp(&self, graph: &mut Graph, lhs: InstId, rhs: InstId) -> Result<InstId> {
        let ty = Self::ty(graph, lhs)?;
        let rhs_ty = Self::ty(graph, rhs)?;
        if ty != rhs_ty || !is_numeric(ty) {
            return Err(bad_argument!("can not compare {} with {}", ty, rhs_ty));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::Cmp), TypeId::I32).inputs(vec![lhs, rhs]),
        )
    }

    /// Reference equality.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] unless both operands are references.
    pub fn create_equals(&self, graph: &mut Graph, lhs: InstId, rhs: InstId) -> Result<InstId> {
        if !Self::ty(graph, lhs)?.is_reference() || !Self::ty(graph, rhs)?.is_reference() {
            return Err(bad_argument!("equals compares references"));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::Equals), TypeId::U1).inputs(vec![lhs, rhs]),
        )
    }

    /// Converts a numeric value to `ty`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for [`TypeId::Invalid`], [`TypeId::Void`] or a non numeric
    /// target type.
    pub fn create_cast(&self, graph: &mut Graph, input: InstId, ty: TypeId) -> Result<InstId> {
        if !is_numeric(ty) {
            return Err(bad_argument!("can not cast to {}", ty));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::Cast), ty).inputs(vec![input]),
        )
    }

    /// Tests a reference against `undefined`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] unless `input` is a reference.
    pub fn create_is_undefined(&self, graph: &mut Graph, input: InstId) -> Result<InstId> {
        if !Self::ty(graph, input)?.is_reference() {
            return Err(bad_argument!("{} is not a reference", input));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::IsUndefined), TypeId::U1).inputs(vec![input]),
        )
    }

    /// Checks that `input` is an instance of `class`, throwing otherwise.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown class or a non reference input.
    pub fn create_check_cast(
        &self,
        graph: &mut Graph,
        input: InstId,
        class: ClassId,
    ) -> Result<InstId> {
        if !Self::ty(graph, input)?.is_reference() {
            return Err(bad_argument!("{} is not a reference", input));
        }
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::CheckCast), TypeId::Reference).inputs(vec![input]),
            Reference::Class(class),
        )
    }

    /// Tests whether `input` is an instance of `class`.
    ///
    /// # Errors
    /// See [`StaticFactory::create_check_cast`].
    pub fn create_is_instance(
        &self,
        graph: &mut Graph,
        input: InstId,
        class: ClassId,
    ) -> Result<InstId> {
        if !Self::ty(graph, input)?.is_reference() {
            return Err(bad_argument!("{} is not a reference", input));
        }
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::IsInstance), TypeId::U1).inputs(vec![input]),
            Reference::Class(class),
        )
    }

    /// Allocates an array of `size` elements of `class`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown class or a non integral size.
    pub fn create_new_array(
        &self,
        graph: &mut Graph,
        class: ClassId,
        size: InstId,
    ) -> Result<InstId> {
        if !Self::ty(graph, size)?.is_integral() {
            return Err(bad_argument!("array size {} is not integral", size));
        }
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::NewArray), TypeId::Reference).inputs(vec![size]),
            Reference::Class(class),
        )
    }

    fn check_array_access(graph: &Graph, array: InstId, index: Option<InstId>) -> Result<()> {
        if Self::ty(graph, array)? != TypeId::Reference {
            return Err(bad_argument!("{} is not an array reference", array));
        }
        if let Some(index) = index {
            if !Self::ty(graph, index)?.is_integral() {
                return Err(bad_argument!("array index {} is not integral", index));
            }
        }
        Ok(())
    }

    /// Loads element `index` of `array` as `ty`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for a non reference array, a non integral index or a `ty`
    /// without value.
    pub fn create_load_array(
        &self,
        graph: &mut Graph,
        array: InstId,
        index: InstId,
        ty: TypeId,
    ) -> Result<InstId> {
        Self::check_array_access(graph, array, Some(index))?;
        if !ty.has_value() || ty == TypeId::Invalid || ty == TypeId::Any {
            return Err(bad_argument!("can not load array elements of type {}", ty));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::LoadArray), ty).inputs(vec![array, index]),
        )
    }

    /// Stores `value` into element `index` of `array`.
    ///
    /// # Errors
    /// See [`StaticFactory::create_load_array`].
    pub fn create_store_array(
        &self,
        graph: &mut Graph,
        array: InstId,
        index: InstId,
        value: InstId,
    ) -> Result<InstId> {
        Self::check_array_access(graph, array, Some(index))?;
        self.create(
            graph,
            InstData::new(op(StaticOpcode::StoreArray), TypeId::Void)
                .inputs(vec![array, index, value]),
        )
    }

    /// Length of `array` as `i32`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for a non reference array.
    pub fn create_len_array(&self, graph: &mut Graph, array: InstId) -> Result<InstId> {
        Self::check_array_access(graph, array, None)?;
        self.create(
            graph,
            InstData::new(op(StaticOpcode::LenArray), TypeId::I32).inputs(vec![array]),
        )
    }

    /// Materializes a literal array as an array reference.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown literal array.
    pub fn create_load_const_array(
        &self,
        graph: &mut Graph,
        literal_array: LiteralArrayId,
    ) -> Result<InstId> {
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::LoadConstArray), TypeId::Reference),
            Reference::LiteralArray(literal_array),
        )
    }

    /// Branches on `lhs cc rhs`; successor 0 is taken when the condition holds.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for [`ConditionCode::None`] or operands of different types.
    pub fn create_if(
        &self,
        graph: &mut Graph,
        lhs: InstId,
        rhs: InstId,
        cc: ConditionCode,
    ) -> Result<InstId> {
        if cc == ConditionCode::None {
            return Err(bad_argument!("a branch needs a condition"));
        }
        let ty = Self::ty(graph, lhs)?;
        let rhs_ty = Self::ty(graph, rhs)?;
        if ty != rhs_ty {
            return Err(bad_argument!("can not compare {} with {}", ty, rhs_ty));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::If), TypeId::Void)
                .inputs(vec![lhs, rhs])
                .cc(cc),
        )
    }

    fn reference_of(graph: &Graph, inst: InstId) -> Result<Reference> {
        graph
            .inst(inst)?
            .reference()
            .ok_or_else(|| bad_argument!("{} does not reference an entity", inst))
    }

    /// Function called by a call instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a function.
    pub fn get_function(&self, graph: &Graph, inst: InstId) -> Result<FunctionId> {
        self.check(graph)?;
        match Self::reference_of(graph, inst)? {
            Reference::Function(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a function", inst, other)),
        }
    }

    /// Retargets a call instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` is not a call or the parameter count differs.
    pub fn set_function(&self, graph: &mut Graph, inst: InstId, function: FunctionId) -> Result<()> {
        self.check(graph)?;
        let current = self.get_function(graph, inst)?;
        let expected = self.file.function(current)?.signature().params().len();
        if self.file.function(function)?.signature().params().len() != expected {
            return Err(bad_argument!(
                "{} does not take {} arguments",
                self.file.function_name(function)?,
                expected
            ));
        }
        graph.set_reference(inst, Reference::Function(function))
    }

    /// String loaded by a `LoadString`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a string.
    pub fn get_string(&self, graph: &Graph, inst: InstId) -> Result<StringId> {
        self.check(graph)?;
        match Self::reference_of(graph, inst)? {
            Reference::String(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a string", inst, other)),
        }
    }

    /// Replaces the string loaded by a `LoadString`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown string or an instruction without string.
    pub fn set_string(&self, graph: &mut Graph, inst: InstId, string: StringId) -> Result<()> {
        self.get_string(graph, inst)?;
        check_reference(self.file, Reference::String(string))?;
        graph.set_reference(inst, Reference::String(string))
    }

    /// Class checked by `CheckCast`, `IsInstance` or allocated by `NewArray`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a class.
    pub fn get_class(&self, graph: &Graph, inst: InstId) -> Result<ClassId> {
        self.check(graph)?;
        match Self::reference_of(graph, inst)? {
            Reference::Class(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a class", inst, other)),
        }
    }

    /// Replaces the class of a class referencing instruction.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown class or an instruction without class.
    pub fn set_class(&self, graph: &mut Graph, inst: InstId, class: ClassId) -> Result<()> {
        self.get_class(graph, inst)?;
        check_reference(self.file, Reference::Class(class))?;
        graph.set_reference(inst, Reference::Class(class))
    }

    /// Literal array of a `LoadConstArray`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` does not reference a literal array.
    pub fn get_literal_array(&self, graph: &Graph, inst: InstId) -> Result<LiteralArrayId> {
        self.check(graph)?;
        match Self::reference_of(graph, inst)? {
            Reference::LiteralArray(id) => Ok(id),
            other => Err(bad_argument!("{} references {}, not a literal array", inst, other)),
        }
    }

    /// Replaces the literal array of a `LoadConstArray`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an unknown array or an instruction without array.
    pub fn set_literal_array(
        &self,
        graph: &mut Graph,
        inst: InstId,
        literal_array: LiteralArrayId,
    ) -> Result<()> {
        self.get_literal_array(graph, inst)?;
        check_reference(self.file, Reference::LiteralArray(literal_array))?;
        graph.set_reference(inst, Reference::LiteralArray(literal_array))
    }
}

impl InstructionFactory for StaticFactory<'_> {
    fn target(&self) -> Target {
        Target::Static
    }

    fn create_load_string(&self, graph: &mut Graph, string: StringId) -> Result<InstId> {
        self.create_with_reference(
            graph,
            InstData::new(op(StaticOpcode::LoadString), TypeId::String),
            Reference::String(string),
        )
    }

    fn create_return(&self, graph: &mut Graph, value: InstId) -> Result<InstId> {
        let ty = Self::ty(graph, value)?;
        if !ty.has_value() {
            return Err(bad_argument!("{} has no value to return", value));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::Return), TypeId::Void).inputs(vec![value]),
        )
    }

    fn create_return_void(&self, graph: &mut Graph) -> Result<InstId> {
        self.create(graph, InstData::new(op(StaticOpcode::ReturnVoid), TypeId::Void))
    }

    fn create_throw(&self, graph: &mut Graph, value: InstId) -> Result<InstId> {
        if !Self::ty(graph, value)?.is_reference() {
            return Err(bad_argument!("only references can be thrown"));
        }
        self.create(
            graph,
            InstData::new(op(StaticOpcode::Throw), TypeId::Void).inputs(vec![value]),
        )
    }

    fn create_try(&self, graph: &mut Graph) -> Result<InstId> {
        self.create(graph, InstData::new(op(StaticOpcode::Try), TypeId::Void))
    }

    fn create_if_zero(
        &self,
        graph: &mut Graph,
        input: InstId,
        cc: ConditionCode,
    ) -> Result<InstId> {
        self.check(graph)?;
        let ty = Self::ty(graph, input)?;
        let zero = match ty {
            TypeId::I64 => ConstantValue::I64(0),
            TypeId::U64 => ConstantValue::U64(0),
            TypeId::F32 | TypeId::F64 => ConstantValue::F64(0.0),
            ty if ty.is_integral() => ConstantValue::I32(0),
            ty => return Err(bad_argument!("can not compare {} against zero", ty)),
        };
        if cc == ConditionCode::None {
            return Err(bad_argument!("a branch needs a condition"));
        }

        let zero = graph.find_or_create_constant(zero)?;
        let zero_ty = Self::ty(graph, zero)?;
        // narrow integers and f32 are widened to the type of the constant first
        let lhs = if ty == zero_ty {
            input
        } else {
            self.create_cast(graph, input, zero_ty)?
        };
        self.create_if(graph, lhs, zero, cc)
    }
}
