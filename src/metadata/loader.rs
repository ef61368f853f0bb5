//! Parsing of the container sections into an [`AbcFile`].
//!
//! Loading happens in three steps: every section is decoded into its arena, every stored handle
//! is checked against the arena it points into, and the member lists of modules, namespaces,
//! classes and functions are rebuilt from the parent handles. The checks selected by the
//! [`ValidationConfig`] run last.

use crate::{
    file::{header::SectionKind, parser::Parser, File},
    metadata::{
        abcfile::AbcFile,
        annotation::{
            Annotation, AnnotationElement, AnnotationField, AnnotationInterface, AnnotationOwner,
            Value,
        },
        builder::Child,
        class::{Class, ClassFlags},
        descriptors::{
            DescriptorFlags, ExportDescriptor, ExportKind, ImportDescriptor, ImportKind,
        },
        function::{Body, Function, FunctionFlags, Signature},
        ids::{
            AnnotationId, AnnotationInterfaceId, ClassId, ExportId, FunctionId, ImportId,
            ModuleId, NamespaceId, StringId,
        },
        literals::{Literal, LiteralArray},
        module::{Module, ModuleFlags, Parent},
        namespace::Namespace,
        types::TypeId,
        validation::{validate, ValidationConfig},
    },
    Result,
};

/// Builds the model of `source`.
pub(crate) fn load(source: File, config: &ValidationConfig) -> Result<AbcFile> {
    let mut file = AbcFile::new(source.target());
    file.version = source.version();

    read_strings(&mut Parser::new(source.section(SectionKind::Strings)), &mut file)?;
    read_literal_arrays(
        &mut Parser::new(source.section(SectionKind::LiteralArrays)),
        &mut file,
    )?;
    read_modules(&mut Parser::new(source.section(SectionKind::Modules)), &mut file)?;
    read_namespaces(
        &mut Parser::new(source.section(SectionKind::Namespaces)),
        &mut file,
    )?;
    read_classes(&mut Parser::new(source.section(SectionKind::Classes)), &mut file)?;
    read_functions(
        &mut Parser::new(source.section(SectionKind::Functions)),
        source.section(SectionKind::Code).len(),
        &mut file,
    )?;
    read_annotation_interfaces(
        &mut Parser::new(source.section(SectionKind::AnnotationInterfaces)),
        &mut file,
    )?;
    read_annotations(
        &mut Parser::new(source.section(SectionKind::Annotations)),
        &mut file,
    )?;
    read_imports(&mut Parser::new(source.section(SectionKind::Imports)), &mut file)?;
    read_exports(&mut Parser::new(source.section(SectionKind::Exports)), &mut file)?;
    file.source = Some(source);

    check_handles(&file)?;
    link(&mut file);

    log::debug!(
        "loaded {} modules, {} classes, {} functions",
        file.modules.len(),
        file.classes.len(),
        file.functions.len()
    );

    validate(&file, config)?;
    Ok(file)
}

fn read_parent(parser: &mut Parser<'_>) -> Result<Parent> {
    let kind = parser.read_le::<u8>()?;
    let index = parser.read_compressed_uint()?;
    Parent::from_parts(kind, index).ok_or_else(|| malformed_error!("Invalid parent kind {}", kind))
}

fn read_type(parser: &mut Parser<'_>) -> Result<TypeId> {
    let raw = parser.read_le::<u8>()?;
    TypeId::from_repr(raw).ok_or_else(|| malformed_error!("Invalid type id {}", raw))
}

fn read_string_id(parser: &mut Parser<'_>) -> Result<StringId> {
    Ok(StringId::new(parser.read_compressed_uint()?))
}

fn read_module_id(parser: &mut Parser<'_>) -> Result<ModuleId> {
    Ok(ModuleId::new(parser.read_compressed_uint()?))
}

fn read_strings(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(1)?;
    for _ in 0..count {
        let value = parser.read_compressed_string_utf8()?;
        file.strings.push_raw(value)?;
    }
    Ok(())
}

fn read_literal_arrays(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(1)?;
    file.literal_arrays.reserve(count);
    for _ in 0..count {
        let len = parser.read_count(1)?;
        let mut literals = Vec::with_capacity(len);
        for _ in 0..len {
            literals.push(Literal::read(parser)?);
        }
        file.literal_arrays.push(LiteralArray::new(literals));
    }
    Ok(())
}

fn read_modules(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(2)?;
    file.modules.reserve(count);
    for _ in 0..count {
        let name = read_string_id(parser)?;
        let flags = ModuleFlags::from_bits_truncate(parser.read_le::<u8>()?);
        file.modules.push(Module::new(name, flags));
    }
    Ok(())
}

fn read_namespaces(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(4)?;
    file.namespaces.reserve(count);
    for _ in 0..count {
        let name = read_string_id(parser)?;
        let module = read_module_id(parser)?;
        let parent = read_parent(parser)?;
        if matches!(parent, Parent::Class(_) | Parent::Function(_)) {
            return Err(malformed_error!("Namespace nested in {:?}", parent));
        }
        file.namespaces.push(Namespace::new(name, module, parent));
    }
    Ok(())
}

fn read_classes(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(6)?;
    file.classes.reserve(count);
    for _ in 0..count {
        let name = read_string_id(parser)?;
        let module = read_module_id(parser)?;
        let parent = read_parent(parser)?;
        if matches!(parent, Parent::Class(_)) {
            return Err(malformed_error!("Class nested in {:?}", parent));
        }
        let super_class = match parser.read_compressed_uint()? {
            0 => None,
            raw => Some(ClassId::new(raw - 1)),
        };
        let flags = ClassFlags::from_bits_truncate(parser.read_le::<u8>()?);
        file.classes
            .push(Class::new(name, module, parent, super_class, flags));
    }
    Ok(())
}

fn read_functions(parser: &mut Parser<'_>, code_len: usize, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(8)?;
    file.functions.reserve(count);
    for _ in 0..count {
        let name = read_string_id(parser)?;
        let module = read_module_id(parser)?;
        let parent = read_parent(parser)?;
        let flags = FunctionFlags::from_bits_truncate(parser.read_le::<u8>()?);
        let ret = read_type(parser)?;

        let param_count = parser.read_count(1)?;
        let mut params = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            params.push(read_type(parser)?);
        }

        let body = match parser.read_le::<u8>()? {
            0 => None,
            1 => {
                let offset = parser.read_compressed_index()?;
                let len = parser.read_compressed_index()?;
                if offset.checked_add(len).is_none_or(|end| end > code_len) {
                    return Err(malformed_error!(
                        "Body [{:#x}; {}] lies outside the Code section",
                        offset,
                        len
                    ));
                }
                Some(Body::Original { offset, len })
            }
            other => return Err(malformed_error!("Invalid body marker {}", other)),
        };

        file.functions.push(Function::new(
            name,
            module,
            parent,
            flags,
            Signature::new(ret, params),
            body,
        ));
    }
    Ok(())
}

fn read_annotation_interfaces(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(3)?;
    file.annotation_interfaces.reserve(count);
    for _ in 0..count {
        let name = read_string_id(parser)?;
        let module = read_module_id(parser)?;

        let field_count = parser.read_count(3)?;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let name = read_string_id(parser)?;
            let ty = read_type(parser)?;
            let default = match parser.read_le::<u8>()? {
                0 => None,
                _ => Some(Value::read(parser)?),
            };
            fields.push(AnnotationField { name, ty, default });
        }

        file.annotation_interfaces.push(AnnotationInterface {
            name,
            module,
            fields,
        });
    }
    Ok(())
}

fn read_annotations(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(4)?;
    file.annotations.reserve(count);
    for _ in 0..count {
        let interface = AnnotationInterfaceId::new(parser.read_compressed_uint()?);
        let owner = match parser.read_le::<u8>()? {
            0 => AnnotationOwner::Class(ClassId::new(parser.read_compressed_uint()?)),
            1 => AnnotationOwner::Function(FunctionId::new(parser.read_compressed_uint()?)),
            other => return Err(malformed_error!("Invalid annotation owner kind {}", other)),
        };

        let element_count = parser.read_count(2)?;
        let mut elements = Vec::with_capacity(element_count);
        for _ in 0..element_count {
            let name = read_string_id(parser)?;
            let value = Value::read(parser)?;
            elements.push(AnnotationElement { name, value });
        }

        file.annotations.push(Some(Annotation {
            interface,
            owner,
            elements,
        }));
    }
    Ok(())
}

fn read_imports(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(6)?;
    file.imports.reserve(count);
    for _ in 0..count {
        let flags = DescriptorFlags::from_bits_truncate(parser.read_le::<u8>()?);
        let module = read_module_id(parser)?;
        let imported_module = read_module_id(parser)?;
        let raw_kind = parser.read_le::<u8>()?;
        let Some(kind) = ImportKind::from_repr(raw_kind) else {
            return Err(malformed_error!("Invalid import kind {}", raw_kind));
        };
        let name = read_string_id(parser)?;
        let alias = read_string_id(parser)?;

        file.imports.push(ImportDescriptor {
            module,
            imported_module,
            kind,
            name,
            alias,
            flags,
        });
    }
    Ok(())
}

fn read_exports(parser: &mut Parser<'_>, file: &mut AbcFile) -> Result<()> {
    let count = parser.read_count(6)?;
    file.exports.reserve(count);
    for _ in 0..count {
        let flags = DescriptorFlags::from_bits_truncate(parser.read_le::<u8>()?);
        let module = read_module_id(parser)?;
        let exported_module = read_module_id(parser)?;
        let raw_kind = parser.read_le::<u8>()?;
        let Some(kind) = ExportKind::from_repr(raw_kind) else {
            return Err(malformed_error!("Invalid export kind {}", raw_kind));
        };
        let name = read_string_id(parser)?;
        let alias = read_string_id(parser)?;

        file.exports.push(ExportDescriptor {
            module,
            exported_module,
            kind,
            name,
            alias,
            flags,
        });
    }
    Ok(())
}

/// Fails unless `index` lies inside an arena of `len` entries.
fn check(index: usize, len: usize, what: &str) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(malformed_error!(
            "Reference to {} {} exceeds the {} entries present",
            what,
            index,
            len
        ))
    }
}

fn check_parent(file: &AbcFile, parent: Parent) -> Result<()> {
    match parent {
        Parent::Module(id) => check(id.index(), file.modules.len(), "module"),
        Parent::Namespace(id) => check(id.index(), file.namespaces.len(), "namespace"),
        Parent::Class(id) => check(id.index(), file.classes.len(), "class"),
        Parent::Function(id) => check(id.index(), file.functions.len(), "function"),
    }
}

fn check_value(file: &AbcFile, value: Value) -> Result<()> {
    match value {
        Value::String(id) => check(id.index(), file.strings.len(), "string"),
        Value::LiteralArray(id) => check(id.index(), file.literal_arrays.len(), "literal array"),
        Value::Bool(_) | Value::Double(_) => Ok(()),
    }
}

/// Checks every handle stored in a record against the arena it points into.
fn check_handles(file: &AbcFile) -> Result<()> {
    let strings = file.strings.len();
    let modules = file.modules.len();

    for array in &file.literal_arrays {
        for literal in array.literals() {
            match literal {
                Literal::String(id) => check(id.index(), strings, "string")?,
                Literal::Method(id) => check(id.index(), file.functions.len(), "function")?,
                Literal::LiteralArray(id) => {
                    check(id.index(), file.literal_arrays.len(), "literal array")?;
                }
                _ => {}
            }
        }
    }
    for module in &file.modules {
        check(module.name.index(), strings, "string")?;
    }
    for namespace in &file.namespaces {
        check(namespace.name.index(), strings, "string")?;
        check(namespace.module.index(), modules, "module")?;
        check_parent(file, namespace.parent)?;
    }
    for class in &file.classes {
        check(class.name.index(), strings, "string")?;
        check(class.module.index(), modules, "module")?;
        check_parent(file, class.parent)?;
        if let Some(super_class) = class.super_class {
            check(super_class.index(), file.classes.len(), "class")?;
        }
    }
    for function in &file.functions {
        check(function.name.index(), strings, "string")?;
        check(function.module.index(), modules, "module")?;
        check_parent(file, function.parent)?;
    }
    for interface in &file.annotation_interfaces {
        check(interface.name.index(), strings, "string")?;
        check(interface.module.index(), modules, "module")?;
        for field in &interface.fields {
            check(field.name.index(), strings, "string")?;
            if let Some(value) = field.default {
                check_value(file, value)?;
            }
        }
    }
    for annotation in file.annotations.iter().flatten() {
        check(
            annotation.interface.index(),
            file.annotation_interfaces.len(),
            "annotation interface",
        )?;
        match annotation.owner {
            AnnotationOwner::Class(id) => check(id.index(), file.classes.len(), "class")?,
            AnnotationOwner::Function(id) => check(id.index(), file.functions.len(), "function")?,
        }
        for element in &annotation.elements {
            check(element.name.index(), strings, "string")?;
            check_value(file, element.value)?;
        }
    }
    for import in &file.imports {
        check(import.module.index(), modules, "module")?;
        check(import.imported_module.index(), modules, "module")?;
        check(import.name.index(), strings, "string")?;
        check(import.alias.index(), strings, "string")?;
    }
    for export in &file.exports {
        check(export.module.index(), modules, "module")?;
        check(export.exported_module.index(), modules, "module")?;
        check(export.name.index(), strings, "string")?;
        check(export.alias.index(), strings, "string")?;
    }
    Ok(())
}

/// Rebuilds the member lists from the parent handles, in record order.
#[allow(clippy::cast_possible_truncation)]
fn link(file: &mut AbcFile) {
    for index in 0..file.namespaces.len() {
        let parent = file.namespaces[index].parent;
        file.attach(parent, Child::Namespace(NamespaceId::new(index as u32)));
    }
    for index in 0..file.classes.len() {
        let parent = file.classes[index].parent;
        file.attach(parent, Child::Class(ClassId::new(index as u32)));
    }
    for index in 0..file.functions.len() {
        let parent = file.functions[index].parent;
        file.attach(parent, Child::Function(FunctionId::new(index as u32)));
    }
    for (index, interface) in file.annotation_interfaces.iter().enumerate() {
        file.modules[interface.module.index()]
            .annotation_interfaces
            .push(AnnotationInterfaceId::new(index as u32));
    }
    for index in 0..file.annotations.len() {
        let Some(annotation) = &file.annotations[index] else {
            continue;
        };
        let id = AnnotationId::new(index as u32);
        match annotation.owner {
            AnnotationOwner::Class(class) => file.classes[class.index()].annotations.push(id),
            AnnotationOwner::Function(function) => {
                file.functions[function.index()].annotations.push(id);
            }
        }
    }
    for (index, import) in file.imports.iter().enumerate() {
        if !import.is_removed() {
            file.modules[import.module.index()]
                .imports
                .push(ImportId::new(index as u32));
        }
    }
    for (index, export) in file.exports.iter().enumerate() {
        if !export.is_removed() {
            file.modules[export.module.index()]
                .exports
                .push(ExportId::new(index as u32));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file::header::assemble,
        isa::Target,
        test::files::{dynamic_sample, static_sample},
        Error,
    };
    use strum::IntoEnumIterator;

    fn with_section(kind: SectionKind, data: Vec<u8>) -> Vec<u8> {
        let sections: Vec<(SectionKind, Vec<u8>)> = SectionKind::iter()
            .map(|section| {
                if section == kind {
                    (section, data.clone())
                } else {
                    (section, vec![0])
                }
            })
            .collect();
        assemble(Target::Dynamic, &sections).unwrap()
    }

    #[test]
    fn empty_container() {
        let sections: Vec<(SectionKind, Vec<u8>)> =
            SectionKind::iter().map(|kind| (kind, vec![0])).collect();
        let bytes = assemble(Target::Static, &sections).unwrap();
        let file = AbcFile::from_mem(bytes).unwrap();
        assert_eq!(file.target(), Target::Static);
        assert_eq!(file.modules().count(), 0);
    }

    #[test]
    fn dangling_module_reference() {
        // one namespace: name s0, module m5, parent module m0
        let bytes = with_section(SectionKind::Namespaces, vec![1, 0, 5, 0, 0]);
        assert!(matches!(
            AbcFile::from_mem(bytes),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated_record() {
        let bytes = with_section(SectionKind::Modules, vec![3, 0]);
        assert!(AbcFile::from_mem(bytes).is_err());
    }

    #[test]
    fn members_are_linked() {
        let file = AbcFile::from_mem(static_sample().to_bytes().unwrap()).unwrap();
        let module = file.modules().next().unwrap();
        let main = file.find_function("main").unwrap();
        assert!(file.module(module).unwrap().functions().contains(&main));
    }

    #[test]
    fn tombstones_survive_reload() {
        let mut file = dynamic_sample();
        let module = file.find_module("index").unwrap();
        let import = file.module(module).unwrap().imports()[0];
        file.module_remove_import(module, import).unwrap();

        let reloaded = AbcFile::from_mem(file.to_bytes().unwrap()).unwrap();
        let module = reloaded.find_module("index").unwrap();
        assert!(reloaded.import(import).is_err());
        assert!(!reloaded.module(module).unwrap().imports().contains(&import));
    }
}
