//! Wraps a throwing block into a try region and checks the handler sees the thrown value.

mod common;

use abckit::{prelude::*, Result};
use common::{
    append,
    eval::{Interpreter, Outcome, Val},
    print_text, print_value, reload,
};

struct Thrower {
    file: AbcFile,
    graph: Graph,
    body: BlockId,
    handler: BlockId,
}

/// `main()` prints `THROW` and throws `new Error("DUMMY_ERROR")`.
///
/// ```text
/// start -> body -> done -> end
/// body:    print("THROW"); throw new Error("DUMMY_ERROR")
/// done:    return undefined
/// handler: e = catch phi; print(e); print(e === undefined)   (not yet connected)
/// ```
fn thrower() -> Result<Thrower> {
    let mut file = AbcFile::new(Target::Dynamic);
    let index = file.add_module("index", ModuleFlags::empty())?;
    let main = file.add_function(
        Parent::Module(index),
        "main",
        FunctionFlags::empty(),
        Signature::new(TypeId::Any, vec![]),
    )?;
    let print = file.create_string("print")?;
    let throw_text = file.create_string("THROW")?;
    let error = file.create_string("Error")?;
    let message = file.create_string("DUMMY_ERROR")?;

    let mut graph = file.create_empty_graph(main)?;
    let body = graph.create_empty_block()?;
    let done = graph.create_empty_block()?;
    let handler = graph.create_empty_block()?;
    graph.append_succ(graph.start(), body)?;
    graph.append_succ(body, done)?;
    graph.append_succ(done, graph.end())?;

    let factory = file.dynamic_factory()?;
    let mut insts = print_text(&factory, &mut graph, print, throw_text)?;
    let ctor = factory.create_try_ld_global_by_name(&mut graph, error)?;
    let text = factory.create_load_string(&mut graph, message)?;
    let exception = factory.create(&mut graph, DynamicOpcode::NewObjRange, &[ctor, text])?;
    let throw = factory.create_throw(&mut graph, exception)?;
    insts.extend([ctor, text, exception, throw]);
    append(&mut graph, body, &insts)?;

    let ret = factory.create_return_void(&mut graph)?;
    graph.add_inst_back(done, ret)?;

    let caught = graph.create_catch_phi(handler)?;
    let mut insts = print_value(&factory, &mut graph, print, caught)?;
    let undefined = factory.create(&mut graph, DynamicOpcode::LdUndefined, &[])?;
    let same = factory.create(&mut graph, DynamicOpcode::StrictEq, &[caught, undefined])?;
    insts.extend([undefined, same]);
    insts.extend(print_value(&factory, &mut graph, print, same)?);
    append(&mut graph, handler, &insts)?;

    Ok(Thrower {
        file,
        graph,
        body,
        handler,
    })
}

fn run(file: &AbcFile, graph: &Graph) -> Result<(Outcome, String)> {
    let mut interpreter = Interpreter::new(file);
    let outcome = interpreter.run(graph, &[])?;
    Ok((outcome, interpreter.output))
}

#[test]
fn test_unprotected_throw_escapes() -> Result<()> {
    let Thrower { file, graph, .. } = thrower()?;
    let (outcome, output) = run(&file, &graph)?;
    assert_eq!(outcome, Outcome::Threw(Val::Error("DUMMY_ERROR".into())));
    assert_eq!(output, "THROW\n");
    Ok(())
}

#[test]
fn test_handler_receives_exception() -> Result<()> {
    let Thrower {
        file,
        mut graph,
        body,
        handler,
    } = thrower()?;
    let (try_begin, try_end) = graph.insert_try_catch(body, body, handler, handler)?;
    graph.verify()?;

    assert!(graph.block(try_begin)?.is_try_begin());
    assert!(graph.block(try_end)?.is_try_end());
    assert!(graph.block(body)?.is_try());
    assert!(graph.block(handler)?.is_catch_begin());
    assert_eq!(graph.catch_handler(body)?, Some(handler));
    assert_eq!(graph.catch_handler(try_begin)?, None);

    // the handler already had its catch phi, no second one is added
    let catch_phis = graph
        .block_insts(handler)?
        .filter(|inst| {
            graph
                .inst(*inst)
                .is_ok_and(|node| node.opcode() == Opcode::Dynamic(DynamicOpcode::CatchPhi))
        })
        .count();
    assert_eq!(catch_phis, 1);

    let (outcome, output) = run(&file, &graph)?;
    assert_eq!(outcome, Outcome::Returned(Val::Undefined));
    assert_eq!(output, "THROW\nError: DUMMY_ERROR\nfalse\n");
    Ok(())
}

#[test]
fn test_try_region_survives_encoding() -> Result<()> {
    let Thrower {
        mut file,
        mut graph,
        body,
        handler,
    } = thrower()?;
    graph.insert_try_catch(body, body, handler, handler)?;
    let main = graph.function();
    file.function_set_graph(main, &graph)?;

    let file = reload(&file)?;
    let main = file.find_function("main").expect("main");
    let decoded = file.create_graph_from_function(main)?;
    decoded.verify()?;
    assert!(decoded
        .blocks()
        .any(|block| decoded.block(block).is_ok_and(|node| node.is_try_begin())));

    let (outcome, output) = run(&file, &decoded)?;
    assert_eq!(outcome, Outcome::Returned(Val::Undefined));
    assert_eq!(output, "THROW\nError: DUMMY_ERROR\nfalse\n");
    Ok(())
}

#[test]
fn test_invalid_regions() -> Result<()> {
    let Thrower {
        mut graph,
        body,
        handler,
        ..
    } = thrower()?;
    let start = graph.start();
    assert!(matches!(
        graph.insert_try_catch(start, body, handler, handler),
        Err(Error::BadArgument(_))
    ));

    // a handler that is already reachable can not become a catch block
    graph.append_succ(body, handler)?;
    assert!(matches!(
        graph.insert_try_catch(body, body, handler, handler),
        Err(Error::BadArgument(_))
    ));
    Ok(())
}
