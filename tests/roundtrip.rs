//! Files written without touching any function body come back identical, in model and in bytes.

mod common;

use abckit::{prelude::*, Result};
use common::{debug_flag_file, note_file, reload};

/// Static file exercising every declaration kind: namespaces, a class hierarchy with methods,
/// nested functions, literal arrays and annotations with defaults and elements.
fn declarations() -> Result<AbcFile> {
    let mut file = AbcFile::new(Target::Static);
    let app = file.add_module("app", ModuleFlags::empty())?;
    let std = file.add_module("std", ModuleFlags::EXTERNAL)?;
    let util = file.add_namespace(Parent::Module(app), "util")?;
    let inner = file.add_namespace(Parent::Namespace(util), "inner")?;

    let base = file.add_class(Parent::Module(app), "Base", None, ClassFlags::ABSTRACT)?;
    let derived = file.add_class(Parent::Namespace(inner), "Derived", Some(base), ClassFlags::FINAL)?;
    file.add_function(
        Parent::Class(base),
        "<ctor>",
        FunctionFlags::CTOR,
        Signature::new(TypeId::Void, vec![]),
    )?;
    let area = file.add_function(
        Parent::Class(derived),
        "area",
        FunctionFlags::empty(),
        Signature::new(TypeId::F64, vec![TypeId::F64, TypeId::F64]),
    )?;
    file.add_function(
        Parent::Function(area),
        "lambda$0",
        FunctionFlags::ANONYMOUS,
        Signature::new(TypeId::F64, vec![]),
    )?;
    file.add_function(
        Parent::Module(std),
        "sqrt",
        FunctionFlags::STATIC | FunctionFlags::EXTERNAL,
        Signature::new(TypeId::F64, vec![TypeId::F64]),
    )?;

    let label = file.create_string("label")?;
    let nested = file.create_literal_array(vec![Literal::U8(7), Literal::Null])?;
    let literals = file.create_literal_array(vec![
        Literal::Bool(true),
        Literal::U32(0xDEAD_BEEF),
        Literal::F64(-0.5),
        Literal::String(label),
        Literal::Method(area),
        Literal::MethodAffiliate(2),
        Literal::LiteralArray(nested),
    ])?;

    let traced = file.add_annotation_interface(app, "Traced")?;
    file.annotation_interface_add_field(traced, "enabled", TypeId::U1, Some(Value::Bool(true)))?;
    file.annotation_interface_add_field(traced, "tags", TypeId::Reference, None)?;
    let on_area = file.function_add_annotation(area, traced)?;
    file.annotation_add_element(on_area, "tags", Value::LiteralArray(literals))?;
    let on_class = file.class_add_annotation(derived, traced)?;
    file.annotation_add_element(on_class, "enabled", Value::Bool(false))?;

    Ok(file)
}

/// Names of every declared entity, in arena order.
fn shape(file: &AbcFile) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for module in file.modules().chain(file.external_modules()) {
        names.push(format!("module {}", file.module_name(module)?));
    }
    for namespace in file.namespaces() {
        names.push(format!("namespace {}", file.namespace_name(namespace)?));
    }
    for class in file.classes() {
        let node = file.class(class)?;
        names.push(format!(
            "class {} super {:?} flags {:?}",
            file.class_name(class)?,
            node.super_class(),
            node.flags()
        ));
    }
    for function in file.functions() {
        let node = file.function(function)?;
        names.push(format!(
            "function {} parent {:?} flags {:?} sig {:?} body {}",
            file.function_name(function)?,
            node.parent(),
            node.flags(),
            node.signature(),
            node.has_body()
        ));
    }
    for array in file.literal_arrays() {
        names.push(format!("literals {:?}", file.literal_array(array)?.literals()));
    }
    for annotation in file.annotations() {
        let node = file.annotation(annotation)?;
        names.push(format!(
            "annotation {:?} on {:?} elements {:?}",
            node.interface(),
            node.owner(),
            node.elements()
        ));
    }
    for import in file.imports() {
        let node = file.import(import)?;
        names.push(format!(
            "import {} as {} kind {:?}",
            file.string(node.name())?,
            file.string(node.alias())?,
            node.kind()
        ));
    }
    Ok(names)
}

fn assert_roundtrip(file: &AbcFile) -> Result<()> {
    let bytes = file.to_bytes()?;
    let reopened = AbcFile::from_mem(bytes.clone())?;

    assert_eq!(reopened.target(), file.target());
    assert_eq!(shape(&reopened)?, shape(file)?);
    assert_eq!(reopened.to_bytes()?, bytes);
    Ok(())
}

#[test]
fn test_declarations_roundtrip() -> Result<()> {
    assert_roundtrip(&declarations()?)
}

#[test]
fn test_dynamic_files_roundtrip() -> Result<()> {
    assert_roundtrip(&note_file()?)?;
    assert_roundtrip(&debug_flag_file()?)
}

#[test]
fn test_roundtrip_through_disk() -> Result<()> {
    let file = declarations()?;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("declarations.abc");
    file.write(&path)?;

    let reopened = AbcFile::from_path(&path)?;
    assert_eq!(shape(&reopened)?, shape(&file)?);
    assert_eq!(std::fs::read(&path)?, reopened.to_bytes()?);
    Ok(())
}

/// Graph dump without the header line, which names the graph's process-unique id.
fn body_dump(file: &AbcFile, name: &str) -> Result<String> {
    let function = file.find_function(name).expect("function");
    let dump = file.create_graph_from_function(function)?.to_string();
    Ok(dump.lines().skip(1).collect::<Vec<_>>().join("\n"))
}

#[test]
fn test_bodies_survive_reencoding() -> Result<()> {
    let file = debug_flag_file()?;
    let before = body_dump(&file, "main")?;
    assert!(!before.is_empty());

    let again = reload(&file)?;
    assert_eq!(body_dump(&again, "main")?, before);
    Ok(())
}

#[test]
fn test_corrupt_input_is_rejected() -> Result<()> {
    let mut bytes = declarations()?.to_bytes()?;
    assert!(AbcFile::from_mem(Vec::new()).is_err());
    assert!(AbcFile::from_mem(bytes[..bytes.len() / 2].to_vec()).is_err());

    bytes[0] ^= 0xFF;
    assert!(AbcFile::from_mem(bytes).is_err());

    let api = get_api_impl(ApiVersion::V1)?;
    assert!(api.open_file(std::path::Path::new("/nonexistent/file.abc")).is_none());
    assert_eq!(get_last_error(), Status::IoError);
    Ok(())
}
