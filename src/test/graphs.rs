//! Hand-made graphs.
//!
//! Graphs built without a file use a fresh [`FileId`] and function 0; they can be edited and
//! verified but not installed into a file.

use crate::{
    graph::{inst::InstData, BlockId, ConstantValue, Graph, InstId},
    isa::{ConditionCode, DynamicOpcode, InstructionFactory, Opcode, StaticOpcode, Target},
    metadata::{
        ids::{FileId, FunctionId},
        types::TypeId,
        AbcFile,
    },
};

fn pick(target: Target, stat: StaticOpcode, dynamic: DynamicOpcode) -> Opcode {
    match target {
        Target::Static => Opcode::Static(stat),
        Target::Dynamic => Opcode::Dynamic(dynamic),
    }
}

fn value_type(target: Target, stat: TypeId) -> TypeId {
    match target {
        Target::Static => stat,
        Target::Dynamic => TypeId::Any,
    }
}

/// Graph with the given parameters and nothing else.
pub fn empty_graph(target: Target, params: &[TypeId]) -> Graph {
    let mut graph = Graph::new(FileId::next(), FunctionId::new(0), target, params).unwrap();
    graph.create_parameters().unwrap();
    graph
}

/// A block, not connected to anything, holding `n` instructions where each one uses the
/// previous one as its only input.
pub fn constant_chain(target: Target, n: usize) -> (Graph, BlockId, Vec<InstId>) {
    let mut graph = empty_graph(target, &[]);
    let block = graph.create_empty_block().unwrap();
    let first = pick(target, StaticOpcode::LoadUndefined, DynamicOpcode::LdUndefined);
    let next = pick(target, StaticOpcode::Cast, DynamicOpcode::ToNumeric);
    let ty = value_type(target, TypeId::Reference);

    let mut insts: Vec<InstId> = Vec::with_capacity(n);
    for _ in 0..n {
        let data = match insts.last() {
            None => InstData::new(first, ty),
            Some(prev) => InstData::new(next, ty).inputs(vec![*prev]),
        };
        let inst = graph.create_inst(data).unwrap();
        graph.add_inst_back(block, inst).unwrap();
        insts.push(inst);
    }
    (graph, block, insts)
}

/// `start -> top -> {left, right} -> merge -> end`.
///
/// `top` branches on two constants, `merge` returns a phi of the constants `1` (from `left`)
/// and `2` (from `right`).
pub fn diamond(target: Target) -> (Graph, [BlockId; 4], InstId) {
    let mut graph = empty_graph(target, &[]);
    let top = graph.create_empty_block().unwrap();
    let left = graph.create_empty_block().unwrap();
    let right = graph.create_empty_block().unwrap();
    let merge = graph.create_empty_block().unwrap();

    graph.append_succ(graph.start(), top).unwrap();
    graph.append_succ(top, left).unwrap();
    graph.append_succ(top, right).unwrap();
    graph.append_succ(left, merge).unwrap();
    graph.append_succ(right, merge).unwrap();
    graph.append_succ(merge, graph.end()).unwrap();

    let one = graph.find_or_create_constant(ConstantValue::I32(1)).unwrap();
    let two = graph.find_or_create_constant(ConstantValue::I32(2)).unwrap();
    let branch = graph
        .create_inst(
            InstData::new(pick(target, StaticOpcode::If, DynamicOpcode::If), TypeId::Void)
                .inputs(vec![one, two])
                .cc(ConditionCode::Eq),
        )
        .unwrap();
    graph.add_inst_back(top, branch).unwrap();

    let phi = graph.create_phi(merge, &[one, two]).unwrap();
    let ret = graph
        .create_inst(
            InstData::new(
                pick(target, StaticOpcode::Return, DynamicOpcode::Return),
                TypeId::Void,
            )
            .inputs(vec![phi]),
        )
        .unwrap();
    graph.add_inst_back(merge, ret).unwrap();

    (graph, [top, left, right, merge], phi)
}

/// `start -> b0 -> .. -> b(n-1) -> end` with empty blocks.
pub fn straight_line(target: Target, n: usize) -> (Graph, Vec<BlockId>) {
    let mut graph = empty_graph(target, &[]);
    let blocks: Vec<BlockId> = (0..n).map(|_| graph.create_empty_block().unwrap()).collect();

    let mut prev = graph.start();
    for block in &blocks {
        graph.append_succ(prev, *block).unwrap();
        prev = *block;
    }
    graph.append_succ(prev, graph.end()).unwrap();
    (graph, blocks)
}

/// Unlinked static `Return` of `value`.
pub fn static_return(graph: &mut Graph, value: InstId) -> InstId {
    graph
        .create_inst(
            InstData::new(Opcode::Static(StaticOpcode::Return), TypeId::Void).inputs(vec![value]),
        )
        .unwrap()
}

/// `start -> exit -> end` where `exit` returns nothing.
pub fn void_body(file: &AbcFile, function: FunctionId) -> Graph {
    let mut graph = file.create_empty_graph(function).unwrap();
    let exit = graph.create_empty_block().unwrap();
    graph.append_succ(graph.start(), exit).unwrap();
    graph.append_succ(exit, graph.end()).unwrap();

    let ret = file.factory().create_return_void(&mut graph).unwrap();
    graph.add_inst_back(exit, ret).unwrap();
    graph
}

/// Static loop counting from 0 to 10.
///
/// ```text
/// start -> header
/// header: i = phi(0, i + 1); if i >= 10 -> exit else -> body
/// body:   i + 1 -> header
/// exit:   return
/// ```
pub fn counting_loop(file: &AbcFile, function: FunctionId) -> Graph {
    let factory = file.static_factory().unwrap();
    let mut graph = file.create_empty_graph(function).unwrap();
    let header = graph.create_empty_block().unwrap();
    let body = graph.create_empty_block().unwrap();
    let exit = graph.create_empty_block().unwrap();

    graph.append_succ(graph.start(), header).unwrap();
    graph.append_succ(header, exit).unwrap();
    graph.append_succ(header, body).unwrap();
    graph.append_succ(body, header).unwrap();
    graph.append_succ(exit, graph.end()).unwrap();

    let zero = graph.find_or_create_constant(ConstantValue::I32(0)).unwrap();
    let one = graph.find_or_create_constant(ConstantValue::I32(1)).unwrap();
    let limit = graph.find_or_create_constant(ConstantValue::I32(10)).unwrap();

    let counter = graph.create_phi(header, &[zero, zero]).unwrap();
    let branch = factory
        .create_if(&mut graph, counter, limit, ConditionCode::Ge)
        .unwrap();
    graph.add_inst_back(header, branch).unwrap();

    let next = factory
        .create_binary(&mut graph, StaticOpcode::Add, counter, one)
        .unwrap();
    graph.add_inst_back(body, next).unwrap();
    graph.set_input(counter, next, 1).unwrap();

    let ret = factory.create_return_void(&mut graph).unwrap();
    graph.add_inst_back(exit, ret).unwrap();
    graph
}

/// Dynamic body calling the global `print` inside a try region.
///
/// ```text
/// start -> try_begin -> call -> try_end -> done -> end
///          try_begin, try_end -> handler -> done
/// ```
pub fn guarded_call(file: &AbcFile, function: FunctionId) -> Graph {
    let factory = file.dynamic_factory().unwrap();
    let mut graph = file.create_empty_graph(function).unwrap();
    let call_block = graph.create_empty_block().unwrap();
    let done = graph.create_empty_block().unwrap();
    let handler = graph.create_empty_block().unwrap();

    graph.append_succ(graph.start(), call_block).unwrap();
    graph.append_succ(call_block, done).unwrap();
    graph.append_succ(done, graph.end()).unwrap();

    let print = file.strings().find("print").unwrap();
    let callee = factory.create_try_ld_global_by_name(&mut graph, print).unwrap();
    let text = factory.create_load_string(&mut graph, print).unwrap();
    let call = factory.create_call(&mut graph, callee, &[text]).unwrap();
    for inst in [callee, text, call] {
        graph.add_inst_back(call_block, inst).unwrap();
    }
    let ret = factory.create_return_void(&mut graph).unwrap();
    graph.add_inst_back(done, ret).unwrap();

    graph
        .insert_try_catch(call_block, call_block, handler, handler)
        .unwrap();
    graph
}

/// Dynamic body throwing a string from inside a try region.
///
/// ```text
/// start -> try_begin -> thrower -> try_end -> end
///          try_begin, try_end -> handler -> end
/// ```
///
/// Returns the graph with the `thrower` and `handler` blocks.
pub fn guarded_throw(file: &AbcFile, function: FunctionId) -> (Graph, BlockId, BlockId) {
    let factory = file.dynamic_factory().unwrap();
    let mut graph = file.create_empty_graph(function).unwrap();
    let thrower = graph.create_empty_block().unwrap();
    let handler = graph.create_empty_block().unwrap();

    graph.append_succ(graph.start(), thrower).unwrap();
    graph.append_succ(thrower, graph.end()).unwrap();

    let print = file.strings().find("print").unwrap();
    let text = factory.create_load_string(&mut graph, print).unwrap();
    let throw = factory.create_throw(&mut graph, text).unwrap();
    graph.add_inst_back(thrower, text).unwrap();
    graph.add_inst_back(thrower, throw).unwrap();
    let ret = factory.create_return_void(&mut graph).unwrap();
    graph.add_inst_back(handler, ret).unwrap();

    graph.insert_try_catch(thrower, thrower, handler, handler).unwrap();
    (graph, thrower, handler)
}
