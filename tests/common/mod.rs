//! Fixtures shared by the integration tests.
#![allow(dead_code)]

pub mod eval;

use abckit::{prelude::*, Result};

/// Serializes `file` and opens the bytes again.
pub fn reload(file: &AbcFile) -> Result<AbcFile> {
    AbcFile::from_mem(file.to_bytes()?)
}

/// Appends `insts` to `block` in order.
pub fn append(graph: &mut Graph, block: BlockId, insts: &[InstId]) -> Result<()> {
    for inst in insts {
        graph.add_inst_back(block, *inst)?;
    }
    Ok(())
}

/// Unlinked `print(<text>)`: the global load, the string and the call.
pub fn print_text(
    factory: &DynamicFactory<'_>,
    graph: &mut Graph,
    print: StringId,
    text: StringId,
) -> Result<Vec<InstId>> {
    let callee = factory.create_try_ld_global_by_name(graph, print)?;
    let value = factory.create_load_string(graph, text)?;
    let call = factory.create_call(graph, callee, &[value])?;
    Ok(vec![callee, value, call])
}

/// Unlinked `print(value)`.
pub fn print_value(
    factory: &DynamicFactory<'_>,
    graph: &mut Graph,
    print: StringId,
    value: InstId,
) -> Result<Vec<InstId>> {
    let callee = factory.create_try_ld_global_by_name(graph, print)?;
    let call = factory.create_call(graph, callee, &[value])?;
    Ok(vec![callee, call])
}

/// `start -> body -> end` with an empty `body`.
pub fn single_block(graph: &mut Graph) -> Result<BlockId> {
    let body = graph.create_empty_block()?;
    graph.append_succ(graph.start(), body)?;
    graph.append_succ(body, graph.end())?;
    Ok(body)
}

/// Dynamic file with module `NOTE` whose `handle()` prints `buisiness logic...`.
pub fn note_file() -> Result<AbcFile> {
    let mut file = AbcFile::new(Target::Dynamic);
    let note = file.add_module("NOTE", ModuleFlags::empty())?;
    let handle = file.add_function(
        Parent::Module(note),
        "handle",
        FunctionFlags::empty(),
        Signature::new(TypeId::Any, vec![]),
    )?;
    let print = file.create_string("print")?;
    let text = file.create_string("buisiness logic...")?;

    let mut graph = file.create_empty_graph(handle)?;
    let body = single_block(&mut graph)?;
    let factory = file.dynamic_factory()?;
    let mut insts = print_text(&factory, &mut graph, print, text)?;
    insts.push(factory.create_return_void(&mut graph)?);
    append(&mut graph, body, &insts)?;

    file.function_set_graph(handle, &graph)?;
    reload(&file)
}

/// Dynamic file where `index.main()` branches on the import `isDebug` of module `config`.
///
/// ```text
/// start -> check: if isDebug == 0 -> release else -> debug
/// release: print("release") -> exit
/// debug:   print("debug")   -> exit
/// exit:    return undefined
/// ```
pub fn debug_flag_file() -> Result<AbcFile> {
    let mut file = AbcFile::new(Target::Dynamic);
    let index = file.add_module("index", ModuleFlags::empty())?;
    let config = file.add_module("config", ModuleFlags::EXTERNAL)?;
    let import = file.module_add_import_from_dynamic_module(index, config, "isDebug", "isDebug")?;
    let main = file.add_function(
        Parent::Module(index),
        "main",
        FunctionFlags::empty(),
        Signature::new(TypeId::Any, vec![]),
    )?;
    let print = file.create_string("print")?;
    let release_text = file.create_string("release")?;
    let debug_text = file.create_string("debug")?;

    let mut graph = file.create_empty_graph(main)?;
    let check = graph.create_empty_block()?;
    let release = graph.create_empty_block()?;
    let debug = graph.create_empty_block()?;
    let exit = graph.create_empty_block()?;
    graph.append_succ(graph.start(), check)?;
    graph.append_succ(check, release)?;
    graph.append_succ(check, debug)?;
    graph.append_succ(release, exit)?;
    graph.append_succ(debug, exit)?;
    graph.append_succ(exit, graph.end())?;

    let factory = file.dynamic_factory()?;
    let flag = factory.create_ld_external_module_var(&mut graph, import)?;
    let branch = factory.create_if(&mut graph, flag, ConditionCode::Eq)?;
    append(&mut graph, check, &[flag, branch])?;
    let insts = print_text(&factory, &mut graph, print, release_text)?;
    append(&mut graph, release, &insts)?;
    let insts = print_text(&factory, &mut graph, print, debug_text)?;
    append(&mut graph, debug, &insts)?;
    let ret = factory.create_return_void(&mut graph)?;
    graph.add_inst_back(exit, ret)?;

    file.function_set_graph(main, &graph)?;
    reload(&file)
}
