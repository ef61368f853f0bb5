//! Read-only view of the container model.

use crate::{
    api::{call, visit},
    graph::Graph,
    isa::Target,
    metadata::{
        annotation::{AnnotationOwner, Value},
        descriptors::{ExportKind, ImportKind},
        function::Signature,
        ids::{
            AnnotationId, AnnotationInterfaceId, ClassId, ExportId, FunctionId, ImportId,
            LiteralArrayId, ModuleId, NamespaceId, StringId,
        },
        literals::Literal,
        module::Parent,
        types::TypeId,
        AbcFile,
    },
};

/// Inspection table.
///
/// Name getters borrow from the file; enumerations call the visitor once per entity in
/// declaration order and return `false` if the visitor stopped the walk early (or the handle was
/// invalid, in which case the register holds [`crate::api::Status::BadArgument`]).
pub trait InspectApi: Sync {
    /// Instruction set of the file.
    fn file_get_target(&self, file: &AbcFile) -> Target;

    /// Container format version.
    fn file_get_version(&self, file: &AbcFile) -> [u8; 4];

    /// Modules defined by the file.
    fn file_enumerate_modules(&self, file: &AbcFile, visitor: &mut dyn FnMut(ModuleId) -> bool) -> bool;

    /// Modules the file only refers to.
    fn file_enumerate_external_modules(
        &self,
        file: &AbcFile,
        visitor: &mut dyn FnMut(ModuleId) -> bool,
    ) -> bool;

    /// Contents of an interned string.
    fn string<'f>(&self, file: &'f AbcFile, string: StringId) -> Option<&'f str>;

    /// Name of a module.
    fn module_name<'f>(&self, file: &'f AbcFile, module: ModuleId) -> Option<&'f str>;

    /// Whether a module is external.
    fn module_is_external(&self, file: &AbcFile, module: ModuleId) -> bool;

    /// Visits the namespaces of a module.
    fn module_enumerate_namespaces(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(NamespaceId) -> bool,
    ) -> bool;

    /// Visits the classes of a module.
    fn module_enumerate_classes(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(ClassId) -> bool,
    ) -> bool;

    /// Functions declared directly in the module, outside namespaces and classes.
    fn module_enumerate_top_level_functions(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool;

    /// Live import descriptors of the module.
    fn module_enumerate_imports(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(ImportId) -> bool,
    ) -> bool;

    /// Live export descriptors of the module.
    fn module_enumerate_exports(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(ExportId) -> bool,
    ) -> bool;

    /// Visits the annotation interfaces of a module.
    fn module_enumerate_annotation_interfaces(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(AnnotationInterfaceId) -> bool,
    ) -> bool;

    /// Name of a namespace.
    fn namespace_name<'f>(&self, file: &'f AbcFile, namespace: NamespaceId) -> Option<&'f str>;

    /// Module or namespace the namespace is declared in.
    fn namespace_get_parent(&self, file: &AbcFile, namespace: NamespaceId) -> Option<Parent>;

    /// Visits the namespaces of a namespace.
    fn namespace_enumerate_namespaces(
        &self,
        file: &AbcFile,
        namespace: NamespaceId,
        visitor: &mut dyn FnMut(NamespaceId) -> bool,
    ) -> bool;

    /// Visits the classes of a namespace.
    fn namespace_enumerate_classes(
        &self,
        file: &AbcFile,
        namespace: NamespaceId,
        visitor: &mut dyn FnMut(ClassId) -> bool,
    ) -> bool;

    /// Visits the functions of a namespace.
    fn namespace_enumerate_functions(
        &self,
        file: &AbcFile,
        namespace: NamespaceId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool;

    /// Name of a class.
    fn class_name<'f>(&self, file: &'f AbcFile, class: ClassId) -> Option<&'f str>;

    /// The module of a class.
    fn class_get_module(&self, file: &AbcFile, class: ClassId) -> Option<ModuleId>;

    /// Super class, `None` also for a root class (check the register to tell them apart).
    fn class_get_super_class(&self, file: &AbcFile, class: ClassId) -> Option<ClassId>;

    /// Visits the methods of a class.
    fn class_enumerate_methods(
        &self,
        file: &AbcFile,
        class: ClassId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool;

    /// Visits the annotations of a class.
    fn class_enumerate_annotations(
        &self,
        file: &AbcFile,
        class: ClassId,
        visitor: &mut dyn FnMut(AnnotationId) -> bool,
    ) -> bool;

    /// Name of a function.
    fn function_name<'f>(&self, file: &'f AbcFile, function: FunctionId) -> Option<&'f str>;

    /// The module of a function.
    fn function_get_module(&self, file: &AbcFile, function: FunctionId) -> Option<ModuleId>;

    /// Class declaring the method, `None` for free functions.
    fn function_get_parent_class(&self, file: &AbcFile, function: FunctionId) -> Option<ClassId>;

    /// The signature of a function.
    fn function_get_signature(&self, file: &AbcFile, function: FunctionId) -> Option<Signature>;

    /// Whether a function is static.
    fn function_is_static(&self, file: &AbcFile, function: FunctionId) -> bool;

    /// Whether a function is a constructor.
    fn function_is_ctor(&self, file: &AbcFile, function: FunctionId) -> bool;

    /// Whether a function is anonymous.
    fn function_is_anonymous(&self, file: &AbcFile, function: FunctionId) -> bool;

    /// Whether a function carries code, i.e. is not external.
    fn function_has_body(&self, file: &AbcFile, function: FunctionId) -> bool;

    /// Visits the nested functions of a function.
    fn function_enumerate_nested_functions(
        &self,
        file: &AbcFile,
        function: FunctionId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool;

    /// Visits the nested classes of a function.
    fn function_enumerate_nested_classes(
        &self,
        file: &AbcFile,
        function: FunctionId,
        visitor: &mut dyn FnMut(ClassId) -> bool,
    ) -> bool;

    /// Visits the annotations of a function.
    fn function_enumerate_annotations(
        &self,
        file: &AbcFile,
        function: FunctionId,
        visitor: &mut dyn FnMut(AnnotationId) -> bool,
    ) -> bool;

    /// Decodes the body of `function` into a fresh graph.
    fn create_graph_from_function(&self, file: &AbcFile, function: FunctionId) -> Option<Graph>;

    /// The interface of an annotation.
    fn annotation_get_interface(
        &self,
        file: &AbcFile,
        annotation: AnnotationId,
    ) -> Option<AnnotationInterfaceId>;

    /// The owner of an annotation.
    fn annotation_get_owner(&self, file: &AbcFile, annotation: AnnotationId)
        -> Option<AnnotationOwner>;

    /// Elements as `(name, value)` pairs.
    fn annotation_enumerate_elements(
        &self,
        file: &AbcFile,
        annotation: AnnotationId,
        visitor: &mut dyn FnMut(StringId, Value) -> bool,
    ) -> bool;

    /// Name of an annotation interface.
    fn annotation_interface_name<'f>(
        &self,
        file: &'f AbcFile,
        interface: AnnotationInterfaceId,
    ) -> Option<&'f str>;

    /// Fields as `(name, type, default value)` triples.
    fn annotation_interface_enumerate_fields(
        &self,
        file: &AbcFile,
        interface: AnnotationInterfaceId,
        visitor: &mut dyn FnMut(StringId, TypeId, Option<Value>) -> bool,
    ) -> bool;

    /// The name of an import descriptor.
    fn import_get_name<'f>(&self, file: &'f AbcFile, import: ImportId) -> Option<&'f str>;

    /// The alias of an import descriptor.
    fn import_get_alias<'f>(&self, file: &'f AbcFile, import: ImportId) -> Option<&'f str>;

    /// The imported module of an import descriptor.
    fn import_get_imported_module(&self, file: &AbcFile, import: ImportId) -> Option<ModuleId>;

    /// The kind of an import descriptor.
    fn import_get_kind(&self, file: &AbcFile, import: ImportId) -> Option<ImportKind>;

    /// The name of an export descriptor.
    fn export_get_name<'f>(&self, file: &'f AbcFile, export: ExportId) -> Option<&'f str>;

    /// The alias of an export descriptor.
    fn export_get_alias<'f>(&self, file: &'f AbcFile, export: ExportId) -> Option<&'f str>;

    /// The exported module of an export descriptor.
    fn export_get_exported_module(&self, file: &AbcFile, export: ExportId) -> Option<ModuleId>;

    /// The kind of an export descriptor.
    fn export_get_kind(&self, file: &AbcFile, export: ExportId) -> Option<ExportKind>;

    /// Visits the elements of a literal array.
    fn literal_array_enumerate_elements(
        &self,
        file: &AbcFile,
        array: LiteralArrayId,
        visitor: &mut dyn FnMut(Literal) -> bool,
    ) -> bool;
}

pub(crate) struct InspectV1;

/// Runs an enumeration whose handle lookup may fail.
fn walk<T: Copy>(
    name: &'static str,
    items: crate::Result<&[T]>,
    visitor: &mut dyn FnMut(T) -> bool,
) -> bool {
    call(name, || items.map(|items| visit(items.iter().copied(), visitor))).unwrap_or(false)
}

impl InspectApi for InspectV1 {
    fn file_get_target(&self, file: &AbcFile) -> Target {
        call("file_get_target", || Ok(file.target())).unwrap_or(Target::Dynamic)
    }

    fn file_get_version(&self, file: &AbcFile) -> [u8; 4] {
        call("file_get_version", || Ok(file.version())).unwrap_or_default()
    }

    fn file_enumerate_modules(&self, file: &AbcFile, visitor: &mut dyn FnMut(ModuleId) -> bool) -> bool {
        call("file_enumerate_modules", || Ok(visit(file.modules(), visitor))).unwrap_or(false)
    }

    fn file_enumerate_external_modules(
        &self,
        file: &AbcFile,
        visitor: &mut dyn FnMut(ModuleId) -> bool,
    ) -> bool {
        call("file_enumerate_external_modules", || {
            Ok(visit(file.external_modules(), visitor))
        })
        .unwrap_or(false)
    }

    fn string<'f>(&self, file: &'f AbcFile, string: StringId) -> Option<&'f str> {
        call("string", || file.string(string))
    }

    fn module_name<'f>(&self, file: &'f AbcFile, module: ModuleId) -> Option<&'f str> {
        call("module_name", || file.module_name(module))
    }

    fn module_is_external(&self, file: &AbcFile, module: ModuleId) -> bool {
        call("module_is_external", || Ok(file.module(module)?.is_external())).unwrap_or(false)
    }

    fn module_enumerate_namespaces(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(NamespaceId) -> bool,
    ) -> bool {
        walk(
            "module_enumerate_namespaces",
            file.module(module).map(|m| m.namespaces()),
            visitor,
        )
    }

    fn module_enumerate_classes(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(ClassId) -> bool,
    ) -> bool {
        walk(
            "module_enumerate_classes",
            file.module(module).map(|m| m.classes()),
            visitor,
        )
    }

    fn module_enumerate_top_level_functions(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool {
        walk(
            "module_enumerate_top_level_functions",
            file.module(module).map(|m| m.functions()),
            visitor,
        )
    }

    fn module_enumerate_imports(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(ImportId) -> bool,
    ) -> bool {
        walk(
            "module_enumerate_imports",
            file.module(module).map(|m| m.imports()),
            visitor,
        )
    }

    fn module_enumerate_exports(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(ExportId) -> bool,
    ) -> bool {
        walk(
            "module_enumerate_exports",
            file.module(module).map(|m| m.exports()),
            visitor,
        )
    }

    fn module_enumerate_annotation_interfaces(
        &self,
        file: &AbcFile,
        module: ModuleId,
        visitor: &mut dyn FnMut(AnnotationInterfaceId) -> bool,
    ) -> bool {
        walk(
            "module_enumerate_annotation_interfaces",
            file.module(module).map(|m| m.annotation_interfaces()),
            visitor,
        )
    }

    fn namespace_name<'f>(&self, file: &'f AbcFile, namespace: NamespaceId) -> Option<&'f str> {
        call("namespace_name", || file.namespace_name(namespace))
    }

    fn namespace_get_parent(&self, file: &AbcFile, namespace: NamespaceId) -> Option<Parent> {
        call("namespace_get_parent", || Ok(file.namespace(namespace)?.parent()))
    }

    fn namespace_enumerate_namespaces(
        &self,
        file: &AbcFile,
        namespace: NamespaceId,
        visitor: &mut dyn FnMut(NamespaceId) -> bool,
    ) -> bool {
        walk(
            "namespace_enumerate_namespaces",
            file.namespace(namespace).map(|n| n.namespaces()),
            visitor,
        )
    }

    fn namespace_enumerate_classes(
        &self,
        file: &AbcFile,
        namespace: NamespaceId,
        visitor: &mut dyn FnMut(ClassId) -> bool,
    ) -> bool {
        walk(
            "namespace_enumerate_classes",
            file.namespace(namespace).map(|n| n.classes()),
            visitor,
        )
    }

    fn namespace_enumerate_functions(
        &self,
        file: &AbcFile,
        namespace: NamespaceId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool {
        walk(
            "namespace_enumerate_functions",
            file.namespace(namespace).map(|n| n.functions()),
            visitor,
        )
    }

    fn class_name<'f>(&self, file: &'f AbcFile, class: ClassId) -> Option<&'f str> {
        call("class_name", || file.class_name(class))
    }

    fn class_get_module(&self, file: &AbcFile, class: ClassId) -> Option<ModuleId> {
        call("class_get_module", || Ok(file.class(class)?.module()))
    }

    fn class_get_super_class(&self, file: &AbcFile, class: ClassId) -> Option<ClassId> {
        call("class_get_super_class", || Ok(file.class(class)?.super_class())).flatten()
    }

    fn class_enumerate_methods(
        &self,
        file: &AbcFile,
        class: ClassId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool {
        walk(
            "class_enumerate_methods",
            file.class(class).map(|c| c.methods()),
            visitor,
        )
    }

    fn class_enumerate_annotations(
        &self,
        file: &AbcFile,
        class: ClassId,
        visitor: &mut dyn FnMut(AnnotationId) -> bool,
    ) -> bool {
        walk(
            "class_enumerate_annotations",
            file.class(class).map(|c| c.annotations()),
            visitor,
        )
    }

    fn function_name<'f>(&self, file: &'f AbcFile, function: FunctionId) -> Option<&'f str> {
        call("function_name", || file.function_name(function))
    }

    fn function_get_module(&self, file: &AbcFile, function: FunctionId) -> Option<ModuleId> {
        call("function_get_module", || Ok(file.function(function)?.module()))
    }

    fn function_get_parent_class(&self, file: &AbcFile, function: FunctionId) -> Option<ClassId> {
        call("function_get_parent_class", || {
            Ok(file.function(function)?.parent_class())
        })
        .flatten()
    }

    fn function_get_signature(&self, file: &AbcFile, function: FunctionId) -> Option<Signature> {
        call("function_get_signature", || {
            Ok(file.function(function)?.signature().clone())
        })
    }

    fn function_is_static(&self, file: &AbcFile, function: FunctionId) -> bool {
        call("function_is_static", || Ok(file.function(function)?.is_static())).unwrap_or(false)
    }

    fn function_is_ctor(&self, file: &AbcFile, function: FunctionId) -> bool {
        call("function_is_ctor", || Ok(file.function(function)?.is_ctor())).unwrap_or(false)
    }

    fn function_is_anonymous(&self, file: &AbcFile, function: FunctionId) -> bool {
        call("function_is_anonymous", || {
            Ok(file.function(function)?.is_anonymous())
        })
        .unwrap_or(false)
    }

    fn function_has_body(&self, file: &AbcFile, function: FunctionId) -> bool {
        call("function_has_body", || Ok(file.function(function)?.has_body())).unwrap_or(false)
    }

    fn function_enumerate_nested_functions(
        &self,
        file: &AbcFile,
        function: FunctionId,
        visitor: &mut dyn FnMut(FunctionId) -> bool,
    ) -> bool {
        walk(
            "function_enumerate_nested_functions",
            file.function(function).map(|f| f.functions()),
            visitor,
        )
    }

    fn function_enumerate_nested_classes(
        &self,
        file: &AbcFile,
        function: FunctionId,
        visitor: &mut dyn FnMut(ClassId) -> bool,
    ) -> bool {
        walk(
            "function_enumerate_nested_classes",
            file.function(function).map(|f| f.classes()),
            visitor,
        )
    }

    fn function_enumerate_annotations(
        &self,
        file: &AbcFile,
        function: FunctionId,
        visitor: &mut dyn FnMut(AnnotationId) -> bool,
    ) -> bool {
        walk(
            "function_enumerate_annotations",
            file.function(function).map(|f| f.annotations()),
            visitor,
        )
    }

    fn create_graph_from_function(&self, file: &AbcFile, function: FunctionId) -> Option<Graph> {
        call("create_graph_from_function", || {
            file.create_graph_from_function(function)
        })
    }

    fn annotation_get_interface(
        &self,
        file: &AbcFile,
        annotation: AnnotationId,
    ) -> Option<AnnotationInterfaceId> {
        call("annotation_get_interface", || {
            Ok(file.annotation(annotation)?.interface())
        })
    }

    fn annotation_get_owner(
        &self,
        file: &AbcFile,
        annotation: AnnotationId,
    ) -> Option<AnnotationOwner> {
        call("annotation_get_owner", || Ok(file.annotation(annotation)?.owner()))
    }

    fn annotation_enumerate_elements(
        &self,
        file: &AbcFile,
        annotation: AnnotationId,
        visitor: &mut dyn FnMut(StringId, Value) -> bool,
    ) -> bool {
        call("annotation_enumerate_elements", || {
            let elements = file.annotation(annotation)?.elements();
            Ok(elements
                .iter()
                .all(|element| visitor(element.name(), element.value())))
        })
        .unwrap_or(false)
    }

    fn annotation_interface_name<'f>(
        &self,
        file: &'f AbcFile,
        interface: AnnotationInterfaceId,
    ) -> Option<&'f str> {
        call("annotation_interface_name", || {
            file.annotation_interface_name(interface)
        })
    }

    fn annotation_interface_enumerate_fields(
        &self,
        file: &AbcFile,
        interface: AnnotationInterfaceId,
        visitor: &mut dyn FnMut(StringId, TypeId, Option<Value>) -> bool,
    ) -> bool {
        call("annotation_interface_enumerate_fields", || {
            let fields = file.annotation_interface(interface)?.fields();
            Ok(fields
                .iter()
                .all(|field| visitor(field.name(), field.ty(), field.default_value())))
        })
        .unwrap_or(false)
    }

    fn import_get_name<'f>(&self, file: &'f AbcFile, import: ImportId) -> Option<&'f str> {
        call("import_get_name", || file.string(file.import(import)?.name()))
    }

    fn import_get_alias<'f>(&self, file: &'f AbcFile, import: ImportId) -> Option<&'f str> {
        call("import_get_alias", || file.string(file.import(import)?.alias()))
    }

    fn import_get_imported_module(&self, file: &AbcFile, import: ImportId) -> Option<ModuleId> {
        call("import_get_imported_module", || {
            Ok(file.import(import)?.imported_module())
        })
    }

    fn import_get_kind(&self, file: &AbcFile, import: ImportId) -> Option<ImportKind> {
        call("import_get_kind", || Ok(file.import(import)?.kind()))
    }

    fn export_get_name<'f>(&self, file: &'f AbcFile, export: ExportId) -> Option<&'f str> {
        call("export_get_name", || file.string(file.export(export)?.name()))
    }

    fn export_get_alias<'f>(&self, file: &'f AbcFile, export: ExportId) -> Option<&'f str> {
        call("export_get_alias", || file.string(file.export(export)?.alias()))
    }

    fn export_get_exported_module(&self, file: &AbcFile, export: ExportId) -> Option<ModuleId> {
        call("export_get_exported_module", || {
            Ok(file.export(export)?.exported_module())
        })
    }

    fn export_get_kind(&self, file: &AbcFile, export: ExportId) -> Option<ExportKind> {
        call("export_get_kind", || Ok(file.export(export)?.kind()))
    }

    fn literal_array_enumerate_elements(
        &self,
        file: &AbcFile,
        array: LiteralArrayId,
        visitor: &mut dyn FnMut(Literal) -> bool,
    ) -> bool {
        walk(
            "literal_array_enumerate_elements",
            file.literal_array(array).map(|a| a.literals()),
            visitor,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::{get_inspect_api_impl, get_last_error, ApiVersion, Status},
        metadata::ids::ModuleId,
        test::files::{dynamic_sample, static_sample},
    };

    #[test]
    fn enumerates_modules_and_functions() {
        let file = static_sample();
        let inspect = get_inspect_api_impl(ApiVersion::V1).unwrap();

        let mut names = Vec::new();
        assert!(inspect.file_enumerate_modules(&file, &mut |module| {
            names.push(inspect.module_name(&file, module).unwrap().to_string());
            true
        }));
        assert_eq!(names, vec!["app"]);

        let mut external = Vec::new();
        inspect.file_enumerate_external_modules(&file, &mut |module| {
            external.push(module);
            true
        });
        assert_eq!(external.len(), 1);
        assert!(inspect.module_is_external(&file, external[0]));

        let app = file.find_module("app").unwrap();
        let mut functions = Vec::new();
        inspect.module_enumerate_top_level_functions(&file, app, &mut |function| {
            functions.push(inspect.function_name(&file, function).unwrap());
            true
        });
        assert_eq!(functions, vec!["main"]);
    }

    #[test]
    fn visitor_can_stop_early() {
        let file = dynamic_sample();
        let inspect = get_inspect_api_impl(ApiVersion::V1).unwrap();
        let mut visited = 0;
        let completed = inspect.file_enumerate_external_modules(&file, &mut |_| {
            visited += 1;
            false
        });
        assert!(!completed);
        assert_eq!(visited, 1);
        assert_eq!(get_last_error(), Status::NoError);
    }

    #[test]
    fn stale_handle_sets_bad_argument() {
        let file = static_sample();
        let inspect = get_inspect_api_impl(ApiVersion::V1).unwrap();

        assert!(inspect.module_name(&file, ModuleId::new(99)).is_none());
        assert_eq!(get_last_error(), Status::BadArgument);

        assert!(!inspect.module_enumerate_classes(&file, ModuleId::new(99), &mut |_| true));
        assert_eq!(get_last_error(), Status::BadArgument);

        let main = file.find_function("main").unwrap();
        assert!(inspect.function_is_static(&file, main));
        assert_eq!(get_last_error(), Status::NoError);
    }

    #[test]
    fn import_descriptors() {
        let file = dynamic_sample();
        let inspect = get_inspect_api_impl(ApiVersion::V1).unwrap();
        let index = file.find_module("index").unwrap();

        let mut imports = Vec::new();
        inspect.module_enumerate_imports(&file, index, &mut |import| {
            imports.push(import);
            true
        });
        assert_eq!(imports.len(), 1);
        assert_eq!(inspect.import_get_name(&file, imports[0]), Some("render"));
        assert_eq!(inspect.import_get_alias(&file, imports[0]), Some("render"));
        let lib = inspect.import_get_imported_module(&file, imports[0]).unwrap();
        assert_eq!(inspect.module_name(&file, lib), Some("lib"));
    }

    #[test]
    fn graph_of_external_function_fails() {
        let file = static_sample();
        let inspect = get_inspect_api_impl(ApiVersion::V1).unwrap();
        let log = file.find_function("log").unwrap();
        assert!(!inspect.function_has_body(&file, log));
        assert!(inspect.create_graph_from_function(&file, log).is_none());
        assert_eq!(get_last_error(), Status::BadArgument);

        let main = file.find_function("main").unwrap();
        assert!(inspect.create_graph_from_function(&file, main).is_some());
        assert_eq!(get_last_error(), Status::NoError);
    }
}
