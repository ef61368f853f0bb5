//! Instruction creation and inspection tables, one per instruction set.
//!
//! Every creator returns a fresh instruction that is not yet placed in a block. The file passed
//! alongside the graph must be the file the graph was created from.

use crate::{
    api::call,
    graph::{Graph, InstId, Reference},
    isa::{ConditionCode, DynamicOpcode, InstructionFactory, Opcode, StaticOpcode, Target},
    metadata::{
        ids::{ClassId, ExportId, FunctionId, ImportId, LiteralArrayId, ModuleId, StringId},
        types::TypeId,
        AbcFile,
    },
    Error, Result,
};

/// Static instruction set table.
pub trait IsaApiStatic: Sync {
    /// Opcode of `inst`.
    fn get_opcode(&self, graph: &Graph, inst: InstId) -> Option<StaticOpcode>;

    /// Creates a `CallStatic` instruction.
    fn create_call_static(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        function: FunctionId,
        args: &[InstId],
    ) -> Option<InstId>;

    /// Creates a `CallVirtual` instruction.
    fn create_call_virtual(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        this: InstId,
        function: FunctionId,
        args: &[InstId],
    ) -> Option<InstId>;

    /// Creates a `LoadString` instruction.
    fn create_load_string(&self, file: &AbcFile, graph: &mut Graph, string: StringId) -> Option<InstId>;

    /// Creates a `LoadUndefined` instruction.
    fn create_load_undefined(&self, file: &AbcFile, graph: &mut Graph) -> Option<InstId>;

    /// `Add`, `Sub`, `Mul`, `Div`, `Mod`, shifts and bitwise operations on two operands.
    fn create_binary(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: StaticOpcode,
        lhs: InstId,
        rhs: InstId,
    ) -> Option<InstId>;

    /// The `*I` forms taking an immediate right operand.
    fn create_binary_imm(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: StaticOpcode,
        input: InstId,
        imm: u64,
    ) -> Option<InstId>;

    /// Creates a `Unary` instruction.
    fn create_unary(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: StaticOpcode,
        input: InstId,
    ) -> Option<InstId>;

    /// Creates a `Cmp` instruction.
    fn create_cmp(&self, file: &AbcFile, graph: &mut Graph, lhs: InstId, rhs: InstId) -> Option<InstId>;

    /// Creates an `Equals` instruction.
    fn create_equals(&self, file: &AbcFile, graph: &mut Graph, lhs: InstId, rhs: InstId)
        -> Option<InstId>;

    /// Creates a `Cast` instruction.
    fn create_cast(&self, file: &AbcFile, graph: &mut Graph, input: InstId, ty: TypeId) -> Option<InstId>;

    /// Creates an `IsUndefined` instruction.
    fn create_is_undefined(&self, file: &AbcFile, graph: &mut Graph, input: InstId) -> Option<InstId>;

    /// Creates a `CheckCast` instruction.
    fn create_check_cast(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        input: InstId,
        class: ClassId,
    ) -> Option<InstId>;

    /// Creates an `IsInstance` instruction.
    fn create_is_instance(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        input: InstId,
        class: ClassId,
    ) -> Option<InstId>;

    /// Creates a `NewArray` instruction.
    fn create_new_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        class: ClassId,
        size: InstId,
    ) -> Option<InstId>;

    /// Creates a `LoadArray` instruction.
    fn create_load_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: InstId,
        index: InstId,
        ty: TypeId,
    ) -> Option<InstId>;

    /// Creates a `StoreArray` instruction.
    fn create_store_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: InstId,
        index: InstId,
        value: InstId,
    ) -> Option<InstId>;

    /// Creates a `LenArray` instruction.
    fn create_len_array(&self, file: &AbcFile, graph: &mut Graph, array: InstId) -> Option<InstId>;

    /// Creates a `LoadConstArray` instruction.
    fn create_load_const_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: LiteralArrayId,
    ) -> Option<InstId>;

    /// Creates an `If` instruction.
    fn create_if(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        lhs: InstId,
        rhs: InstId,
        cc: ConditionCode,
    ) -> Option<InstId>;

    /// Creates a `Return` instruction.
    fn create_return(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId>;

    /// Creates a `ReturnVoid` instruction.
    fn create_return_void(&self, file: &AbcFile, graph: &mut Graph) -> Option<InstId>;

    /// Creates a `Throw` instruction.
    fn create_throw(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId>;

    /// The function referenced by `inst`.
    fn get_function(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<FunctionId>;

    /// Replaces the function referenced by `inst`.
    fn set_function(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, function: FunctionId)
        -> bool;

    /// The string referenced by `inst`.
    fn get_string(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<StringId>;

    /// Replaces the string referenced by `inst`.
    fn set_string(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, string: StringId) -> bool;

    /// The class referenced by `inst`.
    fn get_class(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ClassId>;

    /// Replaces the class referenced by `inst`.
    fn set_class(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, class: ClassId) -> bool;

    /// The literal array referenced by `inst`.
    fn get_literal_array(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<LiteralArrayId>;

    /// Replaces the literal array referenced by `inst`.
    fn set_literal_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        array: LiteralArrayId,
    ) -> bool;
}

/// Dynamic instruction set table.
pub trait IsaApiDynamic: Sync {
    /// Opcode of `inst`.
    fn get_opcode(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<DynamicOpcode>;

    /// Generic creator for opcodes without a dedicated one.
    fn create(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: DynamicOpcode,
        inputs: &[InstId],
        imms: &[u64],
        reference: Option<Reference>,
    ) -> Option<InstId>;

    /// Creates a `LoadString` instruction.
    fn create_load_string(&self, file: &AbcFile, graph: &mut Graph, string: StringId) -> Option<InstId>;

    /// Calls `callee`; the call form is picked from the argument count.
    fn create_call(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        callee: InstId,
        args: &[InstId],
    ) -> Option<InstId>;

    /// Creates a `CallThis` instruction.
    fn create_call_this(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        callee: InstId,
        this: InstId,
        args: &[InstId],
    ) -> Option<InstId>;

    /// Creates a `TryLdGlobalByName` instruction.
    fn create_try_ld_global_by_name(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        name: StringId,
    ) -> Option<InstId>;

    /// Creates a `LdObjByName` instruction.
    fn create_ld_obj_by_name(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        object: InstId,
        name: StringId,
    ) -> Option<InstId>;

    /// Creates a `StObjByName` instruction.
    fn create_st_obj_by_name(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        value: InstId,
        object: InstId,
        name: StringId,
    ) -> Option<InstId>;

    /// Creates a `DefineFunc` instruction.
    fn create_define_func(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        function: FunctionId,
        argc: u64,
    ) -> Option<InstId>;

    /// Creates an `ArrayWithBuffer` instruction.
    fn create_array_with_buffer(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: LiteralArrayId,
    ) -> Option<InstId>;

    /// Creates a `LdLexVar` instruction.
    fn create_ld_lex_var(&self, file: &AbcFile, graph: &mut Graph, level: u64, slot: u64)
        -> Option<InstId>;

    /// Creates a `StLexVar` instruction.
    fn create_st_lex_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        value: InstId,
        level: u64,
        slot: u64,
    ) -> Option<InstId>;

    /// Creates a `GetModuleNamespace` instruction.
    fn create_get_module_namespace(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        module: ModuleId,
    ) -> Option<InstId>;

    /// Creates a `LdLocalModuleVar` instruction.
    fn create_ld_local_module_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        export: ExportId,
    ) -> Option<InstId>;

    /// Creates a `LdExternalModuleVar` instruction.
    fn create_ld_external_module_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        import: ImportId,
    ) -> Option<InstId>;

    /// Creates a `StModuleVar` instruction.
    fn create_st_module_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        value: InstId,
        export: ExportId,
    ) -> Option<InstId>;

    /// Branches on `input` compared with zero; only `Eq` and `Ne` are accepted.
    fn create_if(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        input: InstId,
        cc: ConditionCode,
    ) -> Option<InstId>;

    /// Creates a `Return` instruction.
    fn create_return(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId>;

    /// Creates a `ReturnUndefined` instruction.
    fn create_return_undefined(&self, file: &AbcFile, graph: &mut Graph) -> Option<InstId>;

    /// Creates a `Throw` instruction.
    fn create_throw(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId>;

    /// The import descriptor referenced by `inst`.
    fn get_import_descriptor(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ImportId>;

    /// Replaces the import descriptor referenced by `inst`.
    fn set_import_descriptor(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        import: ImportId,
    ) -> bool;

    /// The export descriptor referenced by `inst`.
    fn get_export_descriptor(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ExportId>;

    /// Replaces the export descriptor referenced by `inst`.
    fn set_export_descriptor(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        export: ExportId,
    ) -> bool;

    /// The module referenced by `inst`.
    fn get_module(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ModuleId>;

    /// Replaces the module referenced by `inst`.
    fn set_module(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, module: ModuleId) -> bool;

    /// The string referenced by `inst`.
    fn get_string(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<StringId>;

    /// Replaces the string referenced by `inst`.
    fn set_string(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, string: StringId) -> bool;

    /// The function referenced by `inst`.
    fn get_function(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<FunctionId>;

    /// Replaces the function referenced by `inst`.
    fn set_function(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, function: FunctionId)
        -> bool;

    /// The literal array referenced by `inst`.
    fn get_literal_array(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<LiteralArrayId>;

    /// Replaces the literal array referenced by `inst`.
    fn set_literal_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        array: LiteralArrayId,
    ) -> bool;
}

pub(crate) struct IsaStaticV1;

pub(crate) struct IsaDynamicV1;

impl IsaApiStatic for IsaStaticV1 {
    fn get_opcode(&self, graph: &Graph, inst: InstId) -> Option<StaticOpcode> {
        call("static::get_opcode", || match graph.inst(inst)?.opcode() {
            Opcode::Static(opcode) => Ok(opcode),
            Opcode::Dynamic(_) => Err(Error::WrongTarget {
                expected: Target::Static,
                found: Target::Dynamic,
            }),
        })
    }

    fn create_call_static(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        function: FunctionId,
        args: &[InstId],
    ) -> Option<InstId> {
        call("static::create_call_static", || {
            file.static_factory()?
                .create_call_static(graph, function, args)
        })
    }

    fn create_call_virtual(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        this: InstId,
        function: FunctionId,
        args: &[InstId],
    ) -> Option<InstId> {
        call("static::create_call_virtual", || {
            file.static_factory()?
                .create_call_virtual(graph, this, function, args)
        })
    }

    fn create_load_string(&self, file: &AbcFile, graph: &mut Graph, string: StringId) -> Option<InstId> {
        call("static::create_load_string", || {
            file.static_factory()?.create_load_string(graph, string)
        })
    }

    fn create_load_undefined(&self, file: &AbcFile, graph: &mut Graph) -> Option<InstId> {
        call("static::create_load_undefined", || {
            file.static_factory()?.create_load_undefined(graph)
        })
    }

    fn create_binary(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: StaticOpcode,
        lhs: InstId,
        rhs: InstId,
    ) -> Option<InstId> {
        call("static::create_binary", || {
            file.static_factory()?.create_binary(graph, opcode, lhs, rhs)
        })
    }

    fn create_binary_imm(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: StaticOpcode,
        input: InstId,
        imm: u64,
    ) -> Option<InstId> {
        call("static::create_binary_imm", || {
            file.static_factory()?
                .create_binary_imm(graph, opcode, input, imm)
        })
    }

    fn create_unary(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: StaticOpcode,
        input: InstId,
    ) -> Option<InstId> {
        call("static::create_unary", || {
            file.static_factory()?.create_unary(graph, opcode, input)
        })
    }

    fn create_cmp(&self, file: &AbcFile, graph: &mut Graph, lhs: InstId, rhs: InstId) -> Option<InstId> {
        call("static::create_cmp", || {
            file.static_factory()?.create_cmp(graph, lhs, rhs)
        })
    }

    fn create_equals(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        lhs: InstId,
        rhs: InstId,
    ) -> Option<InstId> {
        call("static::create_equals", || {
            file.static_factory()?.create_equals(graph, lhs, rhs)
        })
    }

    fn create_cast(&self, file: &AbcFile, graph: &mut Graph, input: InstId, ty: TypeId) -> Option<InstId> {
        call("static::create_cast", || {
            file.static_factory()?.create_cast(graph, input, ty)
        })
    }

    fn create_is_undefined(&self, file: &AbcFile, graph: &mut Graph, input: InstId) -> Option<InstId> {
        call("static::create_is_undefined", || {
            file.static_factory()?.create_is_undefined(graph, input)
        })
    }

    fn create_check_cast(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        input: InstId,
        class: ClassId,
    ) -> Option<InstId> {
        call("static::create_check_cast", || {
            file.static_factory()?.create_check_cast(graph, input, class)
        })
    }

    fn create_is_instance(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        input: InstId,
        class: ClassId,
    ) -> Option<InstId> {
        call("static::create_is_instance", || {
            file.static_factory()?.create_is_instance(graph, input, class)
        })
    }

    fn create_new_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        class: ClassId,
        size: InstId,
    ) -> Option<InstId> {
        call("static::create_new_array", || {
            file.static_factory()?.create_new_array(graph, class, size)
        })
    }

    fn create_load_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: InstId,
        index: InstId,
        ty: TypeId,
    ) -> Option<InstId> {
        call("static::create_load_array", || {
            file.static_factory()?
                .create_load_array(graph, array, index, ty)
        })
    }

    fn create_store_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: InstId,
        index: InstId,
        value: InstId,
    ) -> Option<InstId> {
        call("static::create_store_array", || {
            file.static_factory()?
                .create_store_array(graph, array, index, value)
        })
    }

    fn create_len_array(&self, file: &AbcFile, graph: &mut Graph, array: InstId) -> Option<InstId> {
        call("static::create_len_array", || {
            file.static_factory()?.create_len_array(graph, array)
        })
    }

    fn create_load_const_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: LiteralArrayId,
    ) -> Option<InstId> {
        call("static::create_load_const_array", || {
            file.static_factory()?.create_load_const_array(graph, array)
        })
    }

    fn create_if(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        lhs: InstId,
        rhs: InstId,
        cc: ConditionCode,
    ) -> Option<InstId> {
        call("static::create_if", || {
            file.static_factory()?.create_if(graph, lhs, rhs, cc)
        })
    }

    fn create_return(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId> {
        call("static::create_return", || {
            file.static_factory()?.create_return(graph, value)
        })
    }

    fn create_return_void(&self, file: &AbcFile, graph: &mut Graph) -> Option<InstId> {
        call("static::create_return_void", || {
            file.static_factory()?.create_return_void(graph)
        })
    }

    fn create_throw(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId> {
        call("static::create_throw", || {
            file.static_factory()?.create_throw(graph, value)
        })
    }

    fn get_function(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<FunctionId> {
        call("static::get_function", || {
            file.static_factory()?.get_function(graph, inst)
        })
    }

    fn set_function(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        function: FunctionId,
    ) -> bool {
        call("static::set_function", || {
            file.static_factory()?.set_function(graph, inst, function)
        })
        .is_some()
    }

    fn get_string(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<StringId> {
        call("static::get_string", || {
            file.static_factory()?.get_string(graph, inst)
        })
    }

    fn set_string(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, string: StringId) -> bool {
        call("static::set_string", || {
            file.static_factory()?.set_string(graph, inst, string)
        })
        .is_some()
    }

    fn get_class(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ClassId> {
        call("static::get_class", || {
            file.static_factory()?.get_class(graph, inst)
        })
    }

    fn set_class(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, class: ClassId) -> bool {
        call("static::set_class", || {
            file.static_factory()?.set_class(graph, inst, class)
        })
        .is_some()
    }

    fn get_literal_array(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<LiteralArrayId> {
        call("static::get_literal_array", || {
            file.static_factory()?.get_literal_array(graph, inst)
        })
    }

    fn set_literal_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        array: LiteralArrayId,
    ) -> bool {
        call("static::set_literal_array", || {
            file.static_factory()?.set_literal_array(graph, inst, array)
        })
        .is_some()
    }
}

fn dynamic_call<T>(
    name: &'static str,
    file: &AbcFile,
    body: impl FnOnce(crate::isa::DynamicFactory<'_>) -> Result<T>,
) -> Option<T> {
    call(name, || body(file.dynamic_factory()?))
}

impl IsaApiDynamic for IsaDynamicV1 {
    fn get_opcode(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<DynamicOpcode> {
        dynamic_call("dynamic::get_opcode", file, |f| f.get_opcode(graph, inst))
    }

    fn create(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        opcode: DynamicOpcode,
        inputs: &[InstId],
        imms: &[u64],
        reference: Option<Reference>,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create", file, |f| {
            f.create_full(graph, opcode, inputs, imms, reference)
        })
    }

    fn create_load_string(&self, file: &AbcFile, graph: &mut Graph, string: StringId) -> Option<InstId> {
        dynamic_call("dynamic::create_load_string", file, |f| {
            f.create_load_string(graph, string)
        })
    }

    fn create_call(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        callee: InstId,
        args: &[InstId],
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_call", file, |f| {
            f.create_call(graph, callee, args)
        })
    }

    fn create_call_this(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        callee: InstId,
        this: InstId,
        args: &[InstId],
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_call_this", file, |f| {
            f.create_call_this(graph, callee, this, args)
        })
    }

    fn create_try_ld_global_by_name(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        name: StringId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_try_ld_global_by_name", file, |f| {
            f.create_try_ld_global_by_name(graph, name)
        })
    }

    fn create_ld_obj_by_name(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        object: InstId,
        name: StringId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_ld_obj_by_name", file, |f| {
            f.create_ld_obj_by_name(graph, object, name)
        })
    }

    fn create_st_obj_by_name(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        value: InstId,
        object: InstId,
        name: StringId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_st_obj_by_name", file, |f| {
            f.create_st_obj_by_name(graph, value, object, name)
        })
    }

    fn create_define_func(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        function: FunctionId,
        argc: u64,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_define_func", file, |f| {
            f.create_define_func(graph, function, argc)
        })
    }

    fn create_array_with_buffer(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        array: LiteralArrayId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_array_with_buffer", file, |f| {
            f.create_array_with_buffer(graph, array)
        })
    }

    fn create_ld_lex_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        level: u64,
        slot: u64,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_ld_lex_var", file, |f| {
            f.create_ld_lex_var(graph, level, slot)
        })
    }

    fn create_st_lex_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        value: InstId,
        level: u64,
        slot: u64,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_st_lex_var", file, |f| {
            f.create_st_lex_var(graph, value, level, slot)
        })
    }

    fn create_get_module_namespace(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        module: ModuleId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_get_module_namespace", file, |f| {
            f.create_get_module_namespace(graph, module)
        })
    }

    fn create_ld_local_module_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        export: ExportId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_ld_local_module_var", file, |f| {
            f.create_ld_local_module_var(graph, export)
        })
    }

    fn create_ld_external_module_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        import: ImportId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_ld_external_module_var", file, |f| {
            f.create_ld_external_module_var(graph, import)
        })
    }

    fn create_st_module_var(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        value: InstId,
        export: ExportId,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_st_module_var", file, |f| {
            f.create_st_module_var(graph, value, export)
        })
    }

    fn create_if(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        input: InstId,
        cc: ConditionCode,
    ) -> Option<InstId> {
        dynamic_call("dynamic::create_if", file, |f| f.create_if(graph, input, cc))
    }

    fn create_return(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId> {
        dynamic_call("dynamic::create_return", file, |f| {
            f.create_return(graph, value)
        })
    }

    fn create_return_undefined(&self, file: &AbcFile, graph: &mut Graph) -> Option<InstId> {
        dynamic_call("dynamic::create_return_undefined", file, |f| {
            f.create_return_void(graph)
        })
    }

    fn create_throw(&self, file: &AbcFile, graph: &mut Graph, value: InstId) -> Option<InstId> {
        dynamic_call("dynamic::create_throw", file, |f| f.create_throw(graph, value))
    }

    fn get_import_descriptor(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ImportId> {
        dynamic_call("dynamic::get_import_descriptor", file, |f| {
            f.get_import_descriptor(graph, inst)
        })
    }

    fn set_import_descriptor(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        import: ImportId,
    ) -> bool {
        dynamic_call("dynamic::set_import_descriptor", file, |f| {
            f.set_import_descriptor(graph, inst, import)
        })
        .is_some()
    }

    fn get_export_descriptor(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ExportId> {
        dynamic_call("dynamic::get_export_descriptor", file, |f| {
            f.get_export_descriptor(graph, inst)
        })
    }

    fn set_export_descriptor(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        export: ExportId,
    ) -> bool {
        dynamic_call("dynamic::set_export_descriptor", file, |f| {
            f.set_export_descriptor(graph, inst, export)
        })
        .is_some()
    }

    fn get_module(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<ModuleId> {
        dynamic_call("dynamic::get_module", file, |f| f.get_module(graph, inst))
    }

    fn set_module(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, module: ModuleId) -> bool {
        dynamic_call("dynamic::set_module", file, |f| {
            f.set_module(graph, inst, module)
        })
        .is_some()
    }

    fn get_string(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<StringId> {
        dynamic_call("dynamic::get_string", file, |f| f.get_string(graph, inst))
    }

    fn set_string(&self, file: &AbcFile, graph: &mut Graph, inst: InstId, string: StringId) -> bool {
        dynamic_call("dynamic::set_string", file, |f| {
            f.set_string(graph, inst, string)
        })
        .is_some()
    }

    fn get_function(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<FunctionId> {
        dynamic_call("dynamic::get_function", file, |f| f.get_function(graph, inst))
    }

    fn set_function(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        function: FunctionId,
    ) -> bool {
        dynamic_call("dynamic::set_function", file, |f| {
            f.set_function(graph, inst, function)
        })
        .is_some()
    }

    fn get_literal_array(&self, file: &AbcFile, graph: &Graph, inst: InstId) -> Option<LiteralArrayId> {
        dynamic_call("dynamic::get_literal_array", file, |f| {
            f.get_literal_array(graph, inst)
        })
    }

    fn set_literal_array(
        &self,
        file: &AbcFile,
        graph: &mut Graph,
        inst: InstId,
        array: LiteralArrayId,
    ) -> bool {
        dynamic_call("dynamic::set_literal_array", file, |f| {
            f.set_literal_array(graph, inst, array)
        })
        .is_some()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::{
            get_graph_api_impl, get_isa_api_dynamic_impl, get_isa_api_static_impl,
            get_last_error, ApiVersion, Status,
        },
        graph::ConstantValue,
        isa::{ConditionCode, DynamicOpcode, StaticOpcode},
        metadata::types::TypeId,
        test::files::{dynamic_sample, static_sample},
    };

    #[test]
    fn static_arithmetic_type_checks() {
        let file = static_sample();
        let isa = get_isa_api_static_impl(ApiVersion::V1).unwrap();
        let graph_api = get_graph_api_impl(ApiVersion::V1).unwrap();
        let main = file.find_function("main").unwrap();
        let mut graph = file.create_empty_graph(main).unwrap();

        let int = graph_api
            .graph_find_or_create_constant(&mut graph, ConstantValue::I32(3))
            .unwrap();
        let long = graph_api
            .graph_find_or_create_constant(&mut graph, ConstantValue::I64(3))
            .unwrap();

        let add = isa
            .create_binary(&file, &mut graph, StaticOpcode::Add, int, int)
            .unwrap();
        assert_eq!(isa.get_opcode(&graph, add), Some(StaticOpcode::Add));
        assert_eq!(graph_api.inst_get_type(&graph, add), Some(TypeId::I32));

        assert!(isa
            .create_binary(&file, &mut graph, StaticOpcode::Add, int, long)
            .is_none());
        assert_eq!(get_last_error(), Status::BadArgument);

        assert!(isa.create_cmp(&file, &mut graph, int, long).is_none());
        assert!(isa.create_cast(&file, &mut graph, int, TypeId::Invalid).is_none());
    }

    #[test]
    fn static_table_on_dynamic_file() {
        let file = dynamic_sample();
        let isa = get_isa_api_static_impl(ApiVersion::V1).unwrap();
        let handle = file.find_function("handle").unwrap();
        let mut graph = file.create_empty_graph(handle).unwrap();

        assert!(isa.create_load_undefined(&file, &mut graph).is_none());
        assert_eq!(get_last_error(), Status::WrongTarget);
    }

    #[test]
    fn dynamic_if_only_accepts_equality() {
        let file = dynamic_sample();
        let isa = get_isa_api_dynamic_impl(ApiVersion::V1).unwrap();
        let handle = file.find_function("handle").unwrap();
        let mut graph = file.create_empty_graph(handle).unwrap();
        let param = graph.parameter(0).unwrap();

        assert!(isa
            .create_if(&file, &mut graph, param, ConditionCode::Lt)
            .is_none());
        assert_eq!(get_last_error(), Status::BadArgument);

        let branch = isa
            .create_if(&file, &mut graph, param, ConditionCode::Eq)
            .unwrap();
        assert_eq!(isa.get_opcode(&file, &graph, branch), Some(DynamicOpcode::If));
        assert_eq!(graph.inst(branch).unwrap().inputs().len(), 2);
    }

    #[test]
    fn dynamic_string_reference() {
        let file = dynamic_sample();
        let isa = get_isa_api_dynamic_impl(ApiVersion::V1).unwrap();
        let handle = file.find_function("handle").unwrap();
        let mut graph = file.create_empty_graph(handle).unwrap();
        let print = file.strings().find("print").unwrap();

        let load = isa
            .create_try_ld_global_by_name(&file, &mut graph, print)
            .unwrap();
        assert_eq!(isa.get_string(&file, &graph, load), Some(print));

        let undefined = isa
            .create(&file, &mut graph, DynamicOpcode::LdUndefined, &[], &[], None)
            .unwrap();
        assert!(isa.get_string(&file, &graph, undefined).is_none());
        assert_eq!(get_last_error(), Status::BadArgument);
    }
}
