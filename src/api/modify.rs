//! Mutations of the container model.

use crate::{
    api::{call, call_ok},
    graph::Graph,
    metadata::{
        annotation::Value,
        class::ClassFlags,
        function::{FunctionFlags, Signature},
        ids::{
            AnnotationId, AnnotationInterfaceId, ClassId, ExportId, FunctionId, ImportId,
            LiteralArrayId, ModuleId, NamespaceId, StringId,
        },
        literals::Literal,
        module::{ModuleFlags, Parent},
        types::TypeId,
        AbcFile,
    },
};

/// Modification table.
pub trait ModifyApi: Sync {
    /// Interns `value` in the string table.
    fn create_string(&self, file: &mut AbcFile, value: &str) -> Option<StringId>;

    /// Adds a literal array to the file.
    fn create_literal_array(&self, file: &mut AbcFile, literals: Vec<Literal>)
        -> Option<LiteralArrayId>;

    /// Encodes `graph` and installs it as the body of `function`.
    fn function_set_graph(&self, file: &mut AbcFile, function: FunctionId, graph: &Graph) -> bool;

    /// Imports `name` from `imported` into `module` as `alias` (dynamic files only).
    fn module_add_import_from_dynamic_module(
        &self,
        file: &mut AbcFile,
        module: ModuleId,
        imported: ModuleId,
        name: &str,
        alias: &str,
    ) -> Option<ImportId>;

    /// Removes an import descriptor from its module.
    fn module_remove_import(&self, file: &mut AbcFile, module: ModuleId, import: ImportId) -> bool;

    /// Exports `name` of `exported` from `module` as `alias` (dynamic files only).
    fn module_add_export_from_dynamic_module(
        &self,
        file: &mut AbcFile,
        module: ModuleId,
        exported: ModuleId,
        name: &str,
        alias: &str,
    ) -> Option<ExportId>;

    /// Removes an export descriptor from its module.
    fn module_remove_export(&self, file: &mut AbcFile, module: ModuleId, export: ExportId) -> bool;

    /// Declares an annotation interface in `module`.
    fn add_annotation_interface(
        &self,
        file: &mut AbcFile,
        module: ModuleId,
        name: &str,
    ) -> Option<AnnotationInterfaceId>;

    /// Declares a field, optionally with a default value.
    fn annotation_interface_add_field(
        &self,
        file: &mut AbcFile,
        interface: AnnotationInterfaceId,
        name: &str,
        ty: TypeId,
        default: Option<Value>,
    ) -> bool;

    /// Adds annotation to a function.
    fn function_add_annotation(
        &self,
        file: &mut AbcFile,
        function: FunctionId,
        interface: AnnotationInterfaceId,
    ) -> Option<AnnotationId>;

    /// Adds annotation to a class.
    fn class_add_annotation(
        &self,
        file: &mut AbcFile,
        class: ClassId,
        interface: AnnotationInterfaceId,
    ) -> Option<AnnotationId>;

    /// Sets a named element on an annotation.
    fn annotation_add_element(
        &self,
        file: &mut AbcFile,
        annotation: AnnotationId,
        name: &str,
        value: Value,
    ) -> bool;

    /// Detaches an annotation from its owner.
    fn remove_annotation(&self, file: &mut AbcFile, annotation: AnnotationId) -> bool;

    /// Adds a module to the file.
    fn add_module(&self, file: &mut AbcFile, name: &str, flags: ModuleFlags) -> Option<ModuleId>;

    /// Adds a namespace under `parent`.
    fn add_namespace(&self, file: &mut AbcFile, parent: Parent, name: &str) -> Option<NamespaceId>;

    /// Adds a class under `parent`.
    fn add_class(
        &self,
        file: &mut AbcFile,
        parent: Parent,
        name: &str,
        super_class: Option<ClassId>,
        flags: ClassFlags,
    ) -> Option<ClassId>;

    /// Adds a function without a body under `parent`.
    fn add_function(
        &self,
        file: &mut AbcFile,
        parent: Parent,
        name: &str,
        flags: FunctionFlags,
        signature: Signature,
    ) -> Option<FunctionId>;
}

pub(crate) struct ModifyV1;

impl ModifyApi for ModifyV1 {
    fn create_string(&self, file: &mut AbcFile, value: &str) -> Option<StringId> {
        call("create_string", || file.create_string(value))
    }

    fn create_literal_array(
        &self,
        file: &mut AbcFile,
        literals: Vec<Literal>,
    ) -> Option<LiteralArrayId> {
        call("create_literal_array", || file.create_literal_array(literals))
    }

    fn function_set_graph(&self, file: &mut AbcFile, function: FunctionId, graph: &Graph) -> bool {
        call_ok("function_set_graph", || file.function_set_graph(function, graph))
    }

    fn module_add_import_from_dynamic_module(
        &self,
        file: &mut AbcFile,
        module: ModuleId,
        imported: ModuleId,
        name: &str,
        alias: &str,
    ) -> Option<ImportId> {
        call("module_add_import_from_dynamic_module", || {
            file.module_add_import_from_dynamic_module(module, imported, name, alias)
        })
    }

    fn module_remove_import(&self, file: &mut AbcFile, module: ModuleId, import: ImportId) -> bool {
        call_ok("module_remove_import", || file.module_remove_import(module, import))
    }

    fn module_add_export_from_dynamic_module(
        &self,
        file: &mut AbcFile,
        module: ModuleId,
        exported: ModuleId,
        name: &str,
        alias: &str,
    ) -> Option<ExportId> {
        call("module_add_export_from_dynamic_module", || {
            file.module_add_export_from_dynamic_module(module, exported, name, alias)
        })
    }

    fn module_remove_export(&self, file: &mut AbcFile, module: ModuleId, export: ExportId) -> bool {
        call_ok("module_remove_export", || file.module_remove_export(module, export))
    }

    fn add_annotation_interface(
        &self,
        file: &mut AbcFile,
        module: ModuleId,
        name: &str,
    ) -> Option<AnnotationInterfaceId> {
        call("add_annotation_interface", || {
            file.add_annotation_interface(module, name)
        })
    }

    fn annotation_interface_add_field(
        &self,
        file: &mut AbcFile,
        interface: AnnotationInterfaceId,
        name: &str,
        ty: TypeId,
        default: Option<Value>,
    ) -> bool {
        call_ok("annotation_interface_add_field", || {
            file.annotation_interface_add_field(interface, name, ty, default)
        })
    }

    fn function_add_annotation(
        &self,
        file: &mut AbcFile,
        function: FunctionId,
        interface: AnnotationInterfaceId,
    ) -> Option<AnnotationId> {
        call("function_add_annotation", || {
            file.function_add_annotation(function, interface)
        })
    }

    fn class_add_annotation(
        &self,
        file: &mut AbcFile,
        class: ClassId,
        interface: AnnotationInterfaceId,
    ) -> Option<AnnotationId> {
        call("class_add_annotation", || file.class_add_annotation(class, interface))
    }

    fn annotation_add_element(
        &self,
        file: &mut AbcFile,
        annotation: AnnotationId,
        name: &str,
        value: Value,
    ) -> bool {
        call_ok("annotation_add_element", || {
            file.annotation_add_element(annotation, name, value)
        })
    }

    fn remove_annotation(&self, file: &mut AbcFile, annotation: AnnotationId) -> bool {
        call_ok("remove_annotation", || file.remove_annotation(annotation))
    }

    fn add_module(&self, file: &mut AbcFile, name: &str, flags: ModuleFlags) -> Option<ModuleId> {
        call("add_module", || file.add_module(name, flags))
    }

    fn add_namespace(&self, file: &mut AbcFile, parent: Parent, name: &str) -> Option<NamespaceId> {
        call("add_namespace", || file.add_namespace(parent, name))
    }

    fn add_class(
        &self,
        file: &mut AbcFile,
        parent: Parent,
        name: &str,
        super_class: Option<ClassId>,
        flags: ClassFlags,
    ) -> Option<ClassId> {
        call("add_class", || file.add_class(parent, name, super_class, flags))
    }

    fn add_function(
        &self,
        file: &mut AbcFile,
        parent: Parent,
        name: &str,
        flags: FunctionFlags,
        signature: Signature,
    ) -> Option<FunctionId> {
        call("add_function", || file.add_function(parent, name, flags, signature))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::{get_inspect_api_impl, get_last_error, get_modify_api_impl, ApiVersion, Status},
        metadata::{annotation::Value, types::TypeId},
        test::{
            files::{dynamic_sample, static_sample},
            graphs::void_body,
        },
    };

    #[test]
    fn import_on_static_file_is_wrong_target() {
        let mut file = static_sample();
        let modify = get_modify_api_impl(ApiVersion::V1).unwrap();
        let app = file.find_module("app").unwrap();
        let std = file.find_module("std").unwrap();

        let import = modify.module_add_import_from_dynamic_module(&mut file, app, std, "log", "log");
        assert!(import.is_none());
        assert_eq!(get_last_error(), Status::WrongTarget);
    }

    #[test]
    fn remove_import_twice() {
        let mut file = dynamic_sample();
        let modify = get_modify_api_impl(ApiVersion::V1).unwrap();
        let index = file.find_module("index").unwrap();
        let import = file.module(index).unwrap().imports()[0];

        assert!(modify.module_remove_import(&mut file, index, import));
        assert_eq!(get_last_error(), Status::NoError);
        assert!(file.module(index).unwrap().imports().is_empty());

        assert!(!modify.module_remove_import(&mut file, index, import));
        assert_eq!(get_last_error(), Status::BadArgument);
    }

    #[test]
    fn annotations() {
        let mut file = static_sample();
        let modify = get_modify_api_impl(ApiVersion::V1).unwrap();
        let inspect = get_inspect_api_impl(ApiVersion::V1).unwrap();
        let app = file.find_module("app").unwrap();
        let main = file.find_function("main").unwrap();

        let interface = modify
            .add_annotation_interface(&mut file, app, "Traced")
            .unwrap();
        assert!(modify.annotation_interface_add_field(
            &mut file,
            interface,
            "enabled",
            TypeId::U1,
            Some(Value::Bool(true))
        ));
        assert!(!modify.annotation_interface_add_field(
            &mut file,
            interface,
            "level",
            TypeId::F64,
            Some(Value::Bool(false))
        ));
        assert_eq!(get_last_error(), Status::BadArgument);

        let annotation = modify
            .function_add_annotation(&mut file, main, interface)
            .unwrap();
        assert!(modify.annotation_add_element(&mut file, annotation, "enabled", Value::Bool(false)));
        assert!(!modify.annotation_add_element(&mut file, annotation, "missing", Value::Bool(false)));

        let mut seen = Vec::new();
        inspect.function_enumerate_annotations(&file, main, &mut |annotation| {
            seen.push(annotation);
            true
        });
        assert_eq!(seen, vec![annotation]);

        assert!(modify.remove_annotation(&mut file, annotation));
        assert!(file.function(main).unwrap().annotations().is_empty());
        assert!(!modify.remove_annotation(&mut file, annotation));
    }

    #[test]
    fn set_graph_of_external_function() {
        let mut file = static_sample();
        let modify = get_modify_api_impl(ApiVersion::V1).unwrap();
        let log = file.find_function("log").unwrap();
        let main = file.find_function("main").unwrap();

        let graph = void_body(&file, main);
        assert!(modify.function_set_graph(&mut file, main, &graph));

        let other = dynamic_sample();
        let handle = other.find_function("handle").unwrap();
        let foreign = other.create_empty_graph(handle).unwrap();
        assert!(!modify.function_set_graph(&mut file, main, &foreign));
        assert_eq!(get_last_error(), Status::WrongContext);

        assert!(!modify.function_set_graph(&mut file, log, &graph));
        assert_eq!(get_last_error(), Status::BadArgument);
    }
}
