//! The in-memory model of a bytecode container.
//!
//! [`AbcFile`] owns every entity of a file in typed arenas. Entities refer to each other through
//! the handles of [`crate::metadata::ids`], never through references, so the model can be
//! edited freely and written back with [`AbcFile::write`].
//!
//! # Reading
//!
//! ```rust,no_run
//! use abckit::AbcFile;
//! use std::path::Path;
//!
//! let file = AbcFile::from_path(Path::new("module.abc"))?;
//! for module in file.modules() {
//!     println!("module {}", file.module_name(module)?);
//!     for function in file.module(module)?.functions() {
//!         println!("  {}", file.function_name(*function)?);
//!     }
//! }
//! # Ok::<(), abckit::Error>(())
//! ```
//!
//! # Rewriting a function
//!
//! ```rust,no_run
//! use abckit::AbcFile;
//! use std::path::Path;
//!
//! let mut file = AbcFile::from_path(Path::new("module.abc"))?;
//! let function = file.find_function("handle").expect("handle");
//!
//! let mut graph = file.create_graph_from_function(function)?;
//! graph.remove_unreachable_blocks()?;
//! file.function_set_graph(function, &graph)?;
//! file.write(Path::new("module.out.abc"))?;
//! # Ok::<(), abckit::Error>(())
//! ```

use std::{fs, path::Path};

use crate::{
    bytecode,
    file::{header::SectionKind, File},
    graph::Graph,
    isa::{DynamicFactory, InstructionFactory, StaticFactory, Target},
    metadata::{
        annotation::{
            Annotation, AnnotationElement, AnnotationField, AnnotationInterface, AnnotationOwner,
            Value,
        },
        class::Class,
        descriptors::{
            DescriptorFlags, ExportDescriptor, ExportKind, ImportDescriptor, ImportKind,
        },
        function::{Body, Function, FunctionFlags},
        ids::{
            AnnotationId, AnnotationInterfaceId, ClassId, ExportId, FileId, FunctionId, ImportId,
            LiteralArrayId, ModuleId, NamespaceId, StringId,
        },
        literals::{Literal, LiteralArray},
        loader,
        module::Module,
        namespace::Namespace,
        strings::StringPool,
        types::TypeId,
        validation::ValidationConfig,
        writer,
    },
    Error::{WrongContext, WrongTarget},
    Result,
};

/// Format version written by this crate.
pub const FORMAT_VERSION: [u8; 4] = crate::file::header::VERSION;

/// A loaded (or newly built) bytecode container.
pub struct AbcFile {
    pub(crate) id: FileId,
    pub(crate) target: Target,
    pub(crate) version: [u8; 4],
    /// Source the untouched function bodies are read from
    pub(crate) source: Option<File>,
    pub(crate) strings: StringPool,
    pub(crate) literal_arrays: Vec<LiteralArray>,
    pub(crate) modules: Vec<Module>,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) classes: Vec<Class>,
    pub(crate) functions: Vec<Function>,
    pub(crate) annotation_interfaces: Vec<AnnotationInterface>,
    pub(crate) annotations: Vec<Option<Annotation>>,
    pub(crate) imports: Vec<ImportDescriptor>,
    pub(crate) exports: Vec<ExportDescriptor>,
}

impl AbcFile {
    /// Creates an empty file of the given instruction set.
    #[must_use]
    pub fn new(target: Target) -> AbcFile {
        AbcFile {
            id: FileId::next(),
            target,
            version: FORMAT_VERSION,
            source: None,
            strings: StringPool::new(),
            literal_arrays: Vec::new(),
            modules: Vec::new(),
            namespaces: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            annotation_interfaces: Vec::new(),
            annotations: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Opens and parses the container at `path` with the default validation.
    ///
    /// The file is memory mapped; function bodies are decoded lazily by
    /// [`AbcFile::create_graph_from_function`].
    ///
    /// # Errors
    /// [`crate::Error::FileError`] if the file can not be read, [`crate::Error::Empty`] for an
    /// empty file, [`crate::Error::Malformed`] or [`crate::Error::NotSupported`] for an invalid
    /// container.
    pub fn from_path(path: &Path) -> Result<AbcFile> {
        Self::from_path_with_validation(path, ValidationConfig::default())
    }

    /// Opens and parses the container at `path` with the given validation.
    ///
    /// # Errors
    /// See [`AbcFile::from_path`]; [`crate::Error::RecursionLimit`] if nesting exceeds the limit.
    pub fn from_path_with_validation(path: &Path, config: ValidationConfig) -> Result<AbcFile> {
        log::debug!("opening {}", path.display());
        loader::load(File::from_file(path)?, &config)
    }

    /// Parses a container held in memory with the default validation.
    ///
    /// # Errors
    /// See [`AbcFile::from_path`].
    pub fn from_mem(data: Vec<u8>) -> Result<AbcFile> {
        Self::from_mem_with_validation(data, ValidationConfig::default())
    }

    /// Parses a container held in memory with the given validation.
    ///
    /// # Errors
    /// See [`AbcFile::from_path_with_validation`].
    pub fn from_mem_with_validation(data: Vec<u8>, config: ValidationConfig) -> Result<AbcFile> {
        loader::load(File::from_mem(data)?, &config)
    }

    /// Serializes the file.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if a record exceeds the limits of the format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        writer::write(self)
    }

    /// Serializes the file to `path`.
    ///
    /// The output is written to a temporary sibling first and renamed into place, so an existing
    /// file at `path` is only replaced by a complete one.
    ///
    /// # Errors
    /// [`crate::Error::FileError`] for I/O failures, otherwise see [`AbcFile::to_bytes`].
    pub fn write(&self, path: &Path) -> Result<()> {
        let data = self.to_bytes()?;

        let mut temporary = path.as_os_str().to_owned();
        temporary.push(".tmp");
        let temporary = Path::new(&temporary);

        fs::write(temporary, &data)?;
        if let Err(error) = fs::rename(temporary, path) {
            let _ = fs::remove_file(temporary);
            return Err(error.into());
        }

        log::debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    /// Process-wide unique identity of this file.
    #[must_use]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Instruction set of every function in the file.
    #[must_use]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Format version of the container.
    #[must_use]
    pub fn version(&self) -> [u8; 4] {
        self.version
    }

    /// Instruction factory matching the target of the file.
    #[must_use]
    pub fn factory(&self) -> Box<dyn InstructionFactory + '_> {
        match self.target {
            Target::Static => Box::new(StaticFactory::new(self)),
            Target::Dynamic => Box::new(DynamicFactory::new(self)),
        }
    }

    /// Factory of the static instruction set.
    ///
    /// # Errors
    /// [`crate::Error::WrongTarget`] for a dynamic file.
    pub fn static_factory(&self) -> Result<StaticFactory<'_>> {
        self.expect_target(Target::Static)?;
        Ok(StaticFactory::new(self))
    }

    /// Factory of the dynamic instruction set.
    ///
    /// # Errors
    /// [`crate::Error::WrongTarget`] for a static file.
    pub fn dynamic_factory(&self) -> Result<DynamicFactory<'_>> {
        self.expect_target(Target::Dynamic)?;
        Ok(DynamicFactory::new(self))
    }

    pub(crate) fn expect_target(&self, expected: Target) -> Result<()> {
        if self.target == expected {
            Ok(())
        } else {
            Err(WrongTarget {
                expected,
                found: self.target,
            })
        }
    }

    // Lookups

    /// Interned string pool.
    #[must_use]
    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Text of `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn string(&self, id: StringId) -> Result<&str> {
        self.strings.get(id)
    }

    /// Returns the literal array behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn literal_array(&self, id: LiteralArrayId) -> Result<&LiteralArray> {
        self.literal_arrays
            .get(id.index())
            .ok_or_else(|| bad_argument!("literal array {} does not exist", id))
    }

    /// Returns the module behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn module(&self, id: ModuleId) -> Result<&Module> {
        self.modules
            .get(id.index())
            .ok_or_else(|| bad_argument!("module {} does not exist", id))
    }

    /// Returns the namespace behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn namespace(&self, id: NamespaceId) -> Result<&Namespace> {
        self.namespaces
            .get(id.index())
            .ok_or_else(|| bad_argument!("namespace {} does not exist", id))
    }

    /// Returns the class behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn class(&self, id: ClassId) -> Result<&Class> {
        self.classes
            .get(id.index())
            .ok_or_else(|| bad_argument!("class {} does not exist", id))
    }

    /// Returns the function behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn function(&self, id: FunctionId) -> Result<&Function> {
        self.functions
            .get(id.index())
            .ok_or_else(|| bad_argument!("function {} does not exist", id))
    }

    /// Returns the annotation interface behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn annotation_interface(&self, id: AnnotationInterfaceId) -> Result<&AnnotationInterface> {
        self.annotation_interfaces
            .get(id.index())
            .ok_or_else(|| bad_argument!("annotation interface {} does not exist", id))
    }

    /// Returns the annotation behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid or removed annotation.
    pub fn annotation(&self, id: AnnotationId) -> Result<&Annotation> {
        match self.annotations.get(id.index()) {
            Some(Some(annotation)) => Ok(annotation),
            Some(None) => Err(bad_argument!("annotation {} was removed", id)),
            None => Err(bad_argument!("annotation {} does not exist", id)),
        }
    }

    /// Returns the import descriptor behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid or removed descriptor.
    pub fn import(&self, id: ImportId) -> Result<&ImportDescriptor> {
        match self.imports.get(id.index()) {
            Some(import) if import.is_removed() => Err(bad_argument!("import {} was removed", id)),
            Some(import) => Ok(import),
            None => Err(bad_argument!("import {} does not exist", id)),
        }
    }

    /// Returns the export descriptor behind `id`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid or removed descriptor.
    pub fn export(&self, id: ExportId) -> Result<&ExportDescriptor> {
        match self.exports.get(id.index()) {
            Some(export) if export.is_removed() => Err(bad_argument!("export {} was removed", id)),
            Some(export) => Ok(export),
            None => Err(bad_argument!("export {} does not exist", id)),
        }
    }

    /// Name of a module.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn module_name(&self, id: ModuleId) -> Result<&str> {
        self.string(self.module(id)?.name())
    }

    /// Name of a namespace.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn namespace_name(&self, id: NamespaceId) -> Result<&str> {
        self.string(self.namespace(id)?.name())
    }

    /// Name of a class.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn class_name(&self, id: ClassId) -> Result<&str> {
        self.string(self.class(id)?.name())
    }

    /// Name of a function.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn function_name(&self, id: FunctionId) -> Result<&str> {
        self.string(self.function(id)?.name())
    }

    /// Name of an annotation interface.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn annotation_interface_name(&self, id: AnnotationInterfaceId) -> Result<&str> {
        self.string(self.annotation_interface(id)?.name())
    }

    /// First function named `name`, in declaration order.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        let name = self.strings.find(name)?;
        self.functions()
            .find(|id| self.functions[id.index()].name == name)
    }

    /// First module named `name`, external modules included.
    #[must_use]
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        let name = self.strings.find(name)?;
        (0..self.modules.len())
            .map(|index| ModuleId::new(index as u32))
            .find(|id| self.modules[id.index()].name == name)
    }

    /// First class named `name`.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        let name = self.strings.find(name)?;
        self.classes().find(|id| self.classes[id.index()].name == name)
    }

    // Enumeration

    /// Modules declared by this file.
    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, module)| !module.is_external())
            .map(|(index, _)| ModuleId::new(index as u32))
    }

    /// Modules only referenced by imports.
    pub fn external_modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, module)| module.is_external())
            .map(|(index, _)| ModuleId::new(index as u32))
    }

    /// All namespaces.
    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceId> + '_ {
        (0..self.namespaces.len()).map(|index| NamespaceId::new(index as u32))
    }

    /// All classes.
    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(|index| ClassId::new(index as u32))
    }

    /// All functions, methods and closures included.
    pub fn functions(&self) -> impl Iterator<Item = FunctionId> + '_ {
        (0..self.functions.len()).map(|index| FunctionId::new(index as u32))
    }

    /// All literal arrays.
    pub fn literal_arrays(&self) -> impl Iterator<Item = LiteralArrayId> + '_ {
        (0..self.literal_arrays.len()).map(|index| LiteralArrayId::new(index as u32))
    }

    /// All annotation interfaces.
    pub fn annotation_interfaces(&self) -> impl Iterator<Item = AnnotationInterfaceId> + '_ {
        (0..self.annotation_interfaces.len())
            .map(|index| AnnotationInterfaceId::new(index as u32))
    }

    /// All live annotations.
    pub fn annotations(&self) -> impl Iterator<Item = AnnotationId> + '_ {
        self.annotations
            .iter()
            .enumerate()
            .filter(|(_, annotation)| annotation.is_some())
            .map(|(index, _)| AnnotationId::new(index as u32))
    }

    /// All live import descriptors.
    pub fn imports(&self) -> impl Iterator<Item = ImportId> + '_ {
        self.imports
            .iter()
            .enumerate()
            .filter(|(_, import)| !import.is_removed())
            .map(|(index, _)| ImportId::new(index as u32))
    }

    /// All live export descriptors.
    pub fn exports(&self) -> impl Iterator<Item = ExportId> + '_ {
        self.exports
            .iter()
            .enumerate()
            .filter(|(_, export)| !export.is_removed())
            .map(|(index, _)| ExportId::new(index as u32))
    }

    /// Encoded instructions of a function.
    pub(crate) fn function_code(&self, id: FunctionId) -> Result<&[u8]> {
        match &self.function(id)?.body {
            Some(Body::Modified(code)) => Ok(code),
            Some(Body::Original { offset, len }) => {
                let code = match &self.source {
                    Some(source) => source.section(SectionKind::Code),
                    None => &[],
                };
                code.get(*offset..*offset + *len)
                    .ok_or_else(|| malformed_error!("body of {} lies outside the Code section", id))
            }
            None => Err(bad_argument!(
                "function {} has no body",
                self.function_name(id).unwrap_or("<unnamed>")
            )),
        }
    }

    // Graphs

    /// Decodes the body of `function` into an editable graph.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if the function has no body (external, abstract or native),
    /// [`crate::Error::Malformed`] for a corrupt body.
    pub fn create_graph_from_function(&self, function: FunctionId) -> Result<Graph> {
        let code = self.function_code(function)?;
        bytecode::decode(self, function, code)
    }

    /// Creates a graph holding only the parameters of `function`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid handle.
    pub fn create_empty_graph(&self, function: FunctionId) -> Result<Graph> {
        let params = self.function(function)?.signature.params.clone();
        let mut graph = Graph::new(self.id, function, self.target, &params)?;
        graph.create_parameters()?;
        Ok(graph)
    }

    /// Encodes `graph` and installs it as the body of `function`.
    ///
    /// The graph is not consumed; later edits to it do not affect the function until it is set
    /// again.
    ///
    /// # Errors
    /// [`crate::Error::WrongContext`] for a graph of another file, [`crate::Error::WrongTarget`]
    /// for a graph of the other instruction set, [`crate::Error::BadArgument`] for functions that
    /// can not carry a body or a parameter count mismatch.
    pub fn function_set_graph(&mut self, function: FunctionId, graph: &Graph) -> Result<()> {
        if graph.file_id() != self.id {
            return Err(WrongContext(format!(
                "graph {} was created from {}, not from {}",
                graph.id(),
                graph.file_id(),
                self.id
            )));
        }
        if graph.target() != self.target {
            return Err(WrongTarget {
                expected: self.target,
                found: graph.target(),
            });
        }

        let target = self.function(function)?;
        if target
            .flags
            .intersects(FunctionFlags::NATIVE | FunctionFlags::ABSTRACT | FunctionFlags::EXTERNAL)
        {
            return Err(bad_argument!(
                "function {} can not carry a body",
                self.function_name(function)?
            ));
        }
        if target.signature.params.len() != graph.param_count() {
            return Err(bad_argument!(
                "graph has {} parameters, function {} expects {}",
                graph.param_count(),
                function,
                target.signature.params.len()
            ));
        }

        let code = bytecode::encode(graph)?;
        log::debug!("set body of {} ({} bytes)", function, code.len());
        self.functions[function.index()].body = Some(Body::Modified(code));
        Ok(())
    }

    // Modification

    /// Interns `value` and returns its handle.
    ///
    /// # Errors
    /// [`crate::Error::NotSupported`] once the pool is exhausted.
    pub fn create_string(&mut self, value: &str) -> Result<StringId> {
        self.strings.intern(value)
    }

    /// Adds a literal array.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if a literal refers to an unknown string, function or array.
    pub fn create_literal_array(&mut self, literals: Vec<Literal>) -> Result<LiteralArrayId> {
        for literal in &literals {
            match literal {
                Literal::String(id) => {
                    self.string(*id)?;
                }
                Literal::Method(id) => {
                    self.function(*id)?;
                }
                Literal::LiteralArray(id) => {
                    self.literal_array(*id)?;
                }
                _ => {}
            }
        }

        let id = next_id!(LiteralArrayId, self.literal_arrays)?;
        self.literal_arrays.push(LiteralArray::new(literals));
        Ok(id)
    }

    fn local_dynamic_module(&self, module: ModuleId) -> Result<()> {
        self.expect_target(Target::Dynamic)?;
        if self.module(module)?.is_external() {
            return Err(bad_argument!(
                "external module {} can not be edited",
                self.module_name(module)?
            ));
        }
        Ok(())
    }

    /// Adds an import of `name` from `imported` to `module`, bound locally as `alias`.
    ///
    /// A `name` of `*` creates a namespace import.
    ///
    /// # Errors
    /// [`crate::Error::WrongTarget`] for a static file, [`crate::Error::BadArgument`] for invalid
    /// modules or an external importing module.
    pub fn module_add_import_from_dynamic_module(
        &mut self,
        module: ModuleId,
        imported: ModuleId,
        name: &str,
        alias: &str,
    ) -> Result<ImportId> {
        self.local_dynamic_module(module)?;
        self.module(imported)?;

        let kind = if name == "*" {
            ImportKind::Namespace
        } else {
            ImportKind::Regular
        };
        let name = self.strings.intern(name)?;
        let alias = self.strings.intern(alias)?;

        let id = next_id!(ImportId, self.imports)?;
        self.imports.push(ImportDescriptor {
            module,
            imported_module: imported,
            kind,
            name,
            alias,
            flags: DescriptorFlags::empty(),
        });
        self.modules[module.index()].imports.push(id);
        Ok(id)
    }

    /// Removes an import of `module`, leaving a tombstone.
    ///
    /// # Errors
    /// [`crate::Error::WrongTarget`] for a static file, [`crate::Error::BadArgument`] if the
    /// import does not belong to `module` or was already removed.
    pub fn module_remove_import(&mut self, module: ModuleId, import: ImportId) -> Result<()> {
        self.local_dynamic_module(module)?;
        if self.import(import)?.module != module {
            return Err(bad_argument!("import {} does not belong to {}", import, module));
        }

        self.imports[import.index()].flags.insert(DescriptorFlags::REMOVED);
        self.modules[module.index()]
            .imports
            .retain(|entry| *entry != import);
        Ok(())
    }

    /// Exports `name` from `exported` out of `module` as `alias`.
    ///
    /// Exporting from `module` itself creates a local export, a `name` of `*` a star export and
    /// anything else an indirect export.
    ///
    /// # Errors
    /// See [`AbcFile::module_add_import_from_dynamic_module`].
    pub fn module_add_export_from_dynamic_module(
        &mut self,
        module: ModuleId,
        exported: ModuleId,
        name: &str,
        alias: &str,
    ) -> Result<ExportId> {
        self.local_dynamic_module(module)?;
        self.module(exported)?;

        let kind = if exported == module {
            ExportKind::Local
        } else if name == "*" {
            ExportKind::Star
        } else {
            ExportKind::Indirect
        };
        let name = self.strings.intern(name)?;
        let alias = self.strings.intern(alias)?;

        let id = next_id!(ExportId, self.exports)?;
        self.exports.push(ExportDescriptor {
            module,
            exported_module: exported,
            kind,
            name,
            alias,
            flags: DescriptorFlags::empty(),
        });
        self.modules[module.index()].exports.push(id);
        Ok(id)
    }

    /// Removes an export of `module`, leaving a tombstone.
    ///
    /// # Errors
    /// See [`AbcFile::module_remove_import`].
    pub fn module_remove_export(&mut self, module: ModuleId, export: ExportId) -> Result<()> {
        self.local_dynamic_module(module)?;
        if self.export(export)?.module != module {
            return Err(bad_argument!("export {} does not belong to {}", export, module));
        }

        self.exports[export.index()].flags.insert(DescriptorFlags::REMOVED);
        self.modules[module.index()]
            .exports
            .retain(|entry| *entry != export);
        Ok(())
    }

    /// Declares a new annotation interface in `module`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid module.
    pub fn add_annotation_interface(
        &mut self,
        module: ModuleId,
        name: &str,
    ) -> Result<AnnotationInterfaceId> {
        self.module(module)?;
        let name = self.strings.intern(name)?;

        let id = next_id!(AnnotationInterfaceId, self.annotation_interfaces)?;
        self.annotation_interfaces.push(AnnotationInterface {
            name,
            module,
            fields: Vec::new(),
        });
        self.modules[module.index()].annotation_interfaces.push(id);
        Ok(id)
    }

    /// Adds a field to an annotation interface.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid interface, a duplicate field name or a
    /// default value of another type.
    pub fn annotation_interface_add_field(
        &mut self,
        interface: AnnotationInterfaceId,
        name: &str,
        ty: TypeId,
        default: Option<Value>,
    ) -> Result<()> {
        self.annotation_interface(interface)?;
        if let Some(value) = default {
            self.check_value(value)?;
            if value.ty() != ty {
                return Err(bad_argument!(
                    "default value of type {} for a field of type {}",
                    value.ty(),
                    ty
                ));
            }
        }

        let name = self.strings.intern(name)?;
        let target = &mut self.annotation_interfaces[interface.index()];
        if target.fields.iter().any(|field| field.name == name) {
            return Err(bad_argument!("annotation field {} already exists", name));
        }
        target.fields.push(AnnotationField { name, ty, default });
        Ok(())
    }

    fn check_value(&self, value: Value) -> Result<()> {
        match value {
            Value::String(id) => self.string(id).map(|_| ()),
            Value::LiteralArray(id) => self.literal_array(id).map(|_| ()),
            Value::Bool(_) | Value::Double(_) => Ok(()),
        }
    }

    fn add_annotation(
        &mut self,
        owner: AnnotationOwner,
        interface: AnnotationInterfaceId,
    ) -> Result<AnnotationId> {
        self.annotation_interface(interface)?;
        let id = next_id!(AnnotationId, self.annotations)?;
        self.annotations.push(Some(Annotation {
            interface,
            owner,
            elements: Vec::new(),
        }));
        match owner {
            AnnotationOwner::Class(class) => self.classes[class.index()].annotations.push(id),
            AnnotationOwner::Function(function) => {
                self.functions[function.index()].annotations.push(id);
            }
        }
        Ok(id)
    }

    /// Annotates a function with an instance of `interface`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles.
    pub fn function_add_annotation(
        &mut self,
        function: FunctionId,
        interface: AnnotationInterfaceId,
    ) -> Result<AnnotationId> {
        self.function(function)?;
        self.add_annotation(AnnotationOwner::Function(function), interface)
    }

    /// Annotates a class with an instance of `interface`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid handles.
    pub fn class_add_annotation(
        &mut self,
        class: ClassId,
        interface: AnnotationInterfaceId,
    ) -> Result<AnnotationId> {
        self.class(class)?;
        self.add_annotation(AnnotationOwner::Class(class), interface)
    }

    /// Sets element `name` of an annotation.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if the interface has no field `name`, the value type does
    /// not match the field, or the annotation was removed.
    pub fn annotation_add_element(
        &mut self,
        annotation: AnnotationId,
        name: &str,
        value: Value,
    ) -> Result<()> {
        self.check_value(value)?;
        let interface = self.annotation(annotation)?.interface;
        let Some(name_id) = self.strings.find(name) else {
            return Err(bad_argument!("annotation has no field {}", name));
        };
        let Some(field) = self
            .annotation_interface(interface)?
            .fields
            .iter()
            .find(|field| field.name == name_id)
        else {
            return Err(bad_argument!("annotation has no field {}", name));
        };
        if field.ty != value.ty() {
            return Err(bad_argument!(
                "field {} has type {}, got {}",
                name,
                field.ty,
                value.ty()
            ));
        }

        if let Some(Some(target)) = self.annotations.get_mut(annotation.index()) {
            target.elements.push(AnnotationElement {
                name: name_id,
                value,
            });
        }
        Ok(())
    }

    /// Removes an annotation from its owner.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid or already removed annotation.
    pub fn remove_annotation(&mut self, annotation: AnnotationId) -> Result<()> {
        let owner = self.annotation(annotation)?.owner;
        match owner {
            AnnotationOwner::Class(class) => self.classes[class.index()]
                .annotations
                .retain(|entry| *entry != annotation),
            AnnotationOwner::Function(function) => self.functions[function.index()]
                .annotations
                .retain(|entry| *entry != annotation),
        }
        self.annotations[annotation.index()] = None;
        Ok(())
    }
}

impl std::fmt::Debug for AbcFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbcFile")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("modules", &self.modules.len())
            .field("functions", &self.functions.len())
            .finish_non_exhaustive()
    }
}
