//! Serialization of an [`AbcFile`] into the container format.
//!
//! Each arena becomes one section of records. Handles are written as their arena position, so
//! a file that was loaded and written without changes reproduces its input byte for byte.
//! Removed annotations are dropped; removed import and export descriptors keep their slot as
//! tombstones so that descriptor handles stay stable across a write and reload.
//!
//! Record layouts (`cu` is a compressed unsigned integer):
//!
//! ```text
//! string      cu length, utf-8 bytes
//! literals    cu count, tagged literals
//! module      cu name, u8 flags
//! namespace   cu name, cu module, u8 parent kind, cu parent
//! class       cu name, cu module, u8 parent kind, cu parent, cu super + 1 (0 = none), u8 flags
//! function    cu name, cu module, u8 parent kind, cu parent, u8 flags, u8 return type,
//!             cu param count, u8 param types, u8 has body, [cu code offset, cu code length]
//! interface   cu name, cu module, cu field count, fields (cu name, u8 type, u8 has default,
//!             [value])
//! annotation  cu interface, u8 owner kind, cu owner, cu element count, elements (cu name, value)
//! import      u8 flags, cu module, cu imported module, u8 kind, cu name, cu alias
//! export      u8 flags, cu module, cu exported module, u8 kind, cu name, cu alias
//! ```

use crate::{
    file::{
        header::{assemble, SectionKind},
        io::{write_compressed_string_utf8, write_compressed_uint, write_compressed_usize},
    },
    metadata::{
        abcfile::AbcFile,
        annotation::AnnotationOwner,
        function::Body,
        ids::FunctionId,
        module::Parent,
    },
    Result,
};

/// Serializes `file` into a complete container.
pub(crate) fn write(file: &AbcFile) -> Result<Vec<u8>> {
    let (functions, code) = write_functions(file)?;

    let sections = vec![
        (SectionKind::Strings, write_strings(file)?),
        (SectionKind::LiteralArrays, write_literal_arrays(file)?),
        (SectionKind::Modules, write_modules(file)?),
        (SectionKind::Namespaces, write_namespaces(file)?),
        (SectionKind::Classes, write_classes(file)?),
        (SectionKind::Functions, functions),
        (
            SectionKind::AnnotationInterfaces,
            write_annotation_interfaces(file)?,
        ),
        (SectionKind::Annotations, write_annotations(file)?),
        (SectionKind::Imports, write_imports(file)?),
        (SectionKind::Exports, write_exports(file)?),
        (SectionKind::Code, code),
    ];

    assemble(file.target, &sections)
}

fn write_parent(parent: Parent, buffer: &mut Vec<u8>) -> Result<()> {
    buffer.push(parent.kind_code());
    write_compressed_uint(parent.raw_index(), buffer)
}

fn write_strings(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.strings.len(), &mut buffer)?;
    for (_, value) in file.strings.iter() {
        write_compressed_string_utf8(value, &mut buffer)?;
    }
    Ok(buffer)
}

fn write_literal_arrays(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.literal_arrays.len(), &mut buffer)?;
    for array in &file.literal_arrays {
        write_compressed_usize(array.len(), &mut buffer)?;
        for literal in array.literals() {
            literal.write(&mut buffer)?;
        }
    }
    Ok(buffer)
}

fn write_modules(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.modules.len(), &mut buffer)?;
    for module in &file.modules {
        write_compressed_uint(module.name.0, &mut buffer)?;
        buffer.push(module.flags.bits());
    }
    Ok(buffer)
}

fn write_namespaces(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.namespaces.len(), &mut buffer)?;
    for namespace in &file.namespaces {
        write_compressed_uint(namespace.name.0, &mut buffer)?;
        write_compressed_uint(namespace.module.0, &mut buffer)?;
        write_parent(namespace.parent, &mut buffer)?;
    }
    Ok(buffer)
}

fn write_classes(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.classes.len(), &mut buffer)?;
    for class in &file.classes {
        write_compressed_uint(class.name.0, &mut buffer)?;
        write_compressed_uint(class.module.0, &mut buffer)?;
        write_parent(class.parent, &mut buffer)?;
        match class.super_class {
            Some(id) => write_compressed_usize(id.index() + 1, &mut buffer)?,
            None => buffer.push(0),
        }
        buffer.push(class.flags.bits());
    }
    Ok(buffer)
}

/// Writes the function records together with the Code section they point into.
fn write_functions(file: &AbcFile) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut buffer = Vec::new();
    let mut code = Vec::new();

    write_compressed_usize(file.functions.len(), &mut buffer)?;
    for (index, function) in file.functions.iter().enumerate() {
        write_compressed_uint(function.name.0, &mut buffer)?;
        write_compressed_uint(function.module.0, &mut buffer)?;
        write_parent(function.parent, &mut buffer)?;
        buffer.push(function.flags.bits());
        buffer.push(function.signature.ret as u8);
        write_compressed_usize(function.signature.params.len(), &mut buffer)?;
        for param in &function.signature.params {
            buffer.push(*param as u8);
        }

        let body = match &function.body {
            None => None,
            Some(Body::Modified(bytes)) => Some(bytes.as_slice()),
            #[allow(clippy::cast_possible_truncation)]
            Some(Body::Original { .. }) => Some(file.function_code(FunctionId::new(index as u32))?),
        };
        match body {
            Some(bytes) => {
                buffer.push(1);
                write_compressed_usize(code.len(), &mut buffer)?;
                write_compressed_usize(bytes.len(), &mut buffer)?;
                code.extend_from_slice(bytes);
            }
            None => buffer.push(0),
        }
    }

    Ok((buffer, code))
}

fn write_annotation_interfaces(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.annotation_interfaces.len(), &mut buffer)?;
    for interface in &file.annotation_interfaces {
        write_compressed_uint(interface.name.0, &mut buffer)?;
        write_compressed_uint(interface.module.0, &mut buffer)?;
        write_compressed_usize(interface.fields.len(), &mut buffer)?;
        for field in &interface.fields {
            write_compressed_uint(field.name.0, &mut buffer)?;
            buffer.push(field.ty as u8);
            match field.default {
                Some(value) => {
                    buffer.push(1);
                    value.write(&mut buffer)?;
                }
                None => buffer.push(0),
            }
        }
    }
    Ok(buffer)
}

fn write_annotations(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let live = file.annotations.iter().flatten();

    write_compressed_usize(live.clone().count(), &mut buffer)?;
    for annotation in live {
        write_compressed_uint(annotation.interface.0, &mut buffer)?;
        match annotation.owner {
            AnnotationOwner::Class(id) => {
                buffer.push(0);
                write_compressed_uint(id.0, &mut buffer)?;
            }
            AnnotationOwner::Function(id) => {
                buffer.push(1);
                write_compressed_uint(id.0, &mut buffer)?;
            }
        }
        write_compressed_usize(annotation.elements.len(), &mut buffer)?;
        for element in &annotation.elements {
            write_compressed_uint(element.name.0, &mut buffer)?;
            element.value.write(&mut buffer)?;
        }
    }
    Ok(buffer)
}

fn write_imports(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.imports.len(), &mut buffer)?;
    for import in &file.imports {
        buffer.push(import.flags.bits());
        write_compressed_uint(import.module.0, &mut buffer)?;
        write_compressed_uint(import.imported_module.0, &mut buffer)?;
        buffer.push(import.kind as u8);
        write_compressed_uint(import.name.0, &mut buffer)?;
        write_compressed_uint(import.alias.0, &mut buffer)?;
    }
    Ok(buffer)
}

fn write_exports(file: &AbcFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compressed_usize(file.exports.len(), &mut buffer)?;
    for export in &file.exports {
        buffer.push(export.flags.bits());
        write_compressed_uint(export.module.0, &mut buffer)?;
        write_compressed_uint(export.exported_module.0, &mut buffer)?;
        buffer.push(export.kind as u8);
        write_compressed_uint(export.name.0, &mut buffer)?;
        write_compressed_uint(export.alias.0, &mut buffer)?;
    }
    Ok(buffer)
}
