//! Structural properties of graph editing, checked through the public API.

mod common;

use abckit::{isa::OpKind, prelude::*, Result};
use common::append;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::HashMap;

/// Static file with `app.compute(i32) -> i32` declared but without a body.
fn compute_file() -> Result<(AbcFile, FunctionId)> {
    let mut file = AbcFile::new(Target::Static);
    let app = file.add_module("app", ModuleFlags::empty())?;
    let compute = file.add_function(
        Parent::Module(app),
        "compute",
        FunctionFlags::STATIC,
        Signature::new(TypeId::I32, vec![TypeId::I32]),
    )?;
    Ok((file, compute))
}

/// `start -> body -> end` where `body` returns `((p + 1) + 2) + ... + n`.
fn additions(file: &AbcFile, function: FunctionId, n: i32) -> Result<(Graph, BlockId, Vec<InstId>)> {
    let factory = file.static_factory()?;
    let mut graph = file.create_empty_graph(function)?;
    let body = common::single_block(&mut graph)?;

    let mut value = graph.parameter(0)?;
    let mut insts = Vec::new();
    for step in 1..=n {
        let constant = graph.find_or_create_constant(ConstantValue::I32(step))?;
        value = factory.create_binary(&mut graph, StaticOpcode::Add, value, constant)?;
        insts.push(value);
    }
    let ret = factory.create_return(&mut graph, value)?;
    insts.push(ret);
    append(&mut graph, body, &insts)?;
    Ok((graph, body, insts))
}

fn assert_edges_mirrored(graph: &Graph) -> Result<()> {
    for block in graph.blocks() {
        let node = graph.block(block)?;
        for succ in node.successors() {
            let forward = node.successors().iter().filter(|b| *b == succ).count();
            let backward = graph
                .block(*succ)?
                .predecessors()
                .iter()
                .filter(|b| **b == block)
                .count();
            assert_eq!(forward, backward, "edge {block} -> {succ}");
        }
    }
    for inst in graph.insts() {
        let node = graph.inst(inst)?;
        for input in node.inputs() {
            let uses = node.inputs().iter().filter(|i| *i == input).count();
            let users = graph
                .inst(*input)?
                .users()
                .iter()
                .filter(|u| **u == inst)
                .count();
            assert_eq!(uses, users, "use of {input} by {inst}");
        }
    }
    graph.verify_structure()
}

#[test]
fn test_random_edits_keep_edges_symmetric() -> Result<()> {
    let (file, compute) = compute_file()?;
    let factory = file.static_factory()?;
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _round in 0..8 {
        let (mut graph, body, _) = additions(&file, compute, 6)?;
        let mut blocks = vec![body];

        for _ in 0..64 {
            match rng.gen_range(0..6) {
                0 => {
                    let block = graph.create_empty_block()?;
                    let from = blocks[rng.gen_range(0..blocks.len())];
                    let index = rng.gen_range(0..3).min(graph.block(from)?.successors().len());
                    graph.insert_succ(from, block, index)?;
                    blocks.push(block);
                }
                1 => {
                    let from = blocks[rng.gen_range(0..blocks.len())];
                    let to = blocks[rng.gen_range(0..blocks.len())];
                    graph.append_succ(from, to)?;
                }
                2 => {
                    let from = blocks[rng.gen_range(0..blocks.len())];
                    let count = graph.block(from)?.successors().len();
                    if count > 0 {
                        graph.erase_succ(from, rng.gen_range(0..count))?;
                    }
                }
                3 => {
                    let adds: Vec<InstId> = graph
                        .insts()
                        .filter(|inst| {
                            graph
                                .inst(*inst)
                                .is_ok_and(|node| node.opcode() == Opcode::Static(StaticOpcode::Add))
                        })
                        .collect();
                    if adds.len() >= 2 {
                        let user = adds[rng.gen_range(0..adds.len())];
                        let input = adds[rng.gen_range(0..adds.len())];
                        if user != input {
                            graph.set_input(user, input, rng.gen_range(0..2))?;
                        }
                    }
                }
                4 => {
                    let insts: Vec<InstId> = graph
                        .insts()
                        .filter(|inst| {
                            graph.inst(*inst).is_ok_and(|node| {
                                node.block().is_some()
                                    && !matches!(node.kind(), OpKind::Constant | OpKind::Parameter)
                            })
                        })
                        .collect();
                    let Some(&inst) = insts.choose(&mut rng) else {
                        continue;
                    };
                    // only values nobody consumes can go
                    if graph.inst(inst)?.user_count() == 0 {
                        graph.remove_inst(inst)?;
                    } else {
                        assert!(matches!(
                            graph.remove_inst(inst),
                            Err(Error::HasUsers { .. })
                        ));
                    }
                }
                _ => {
                    let one = graph.find_or_create_constant(ConstantValue::I32(1))?;
                    let param = graph.parameter(0)?;
                    let extra = factory.create_binary(&mut graph, StaticOpcode::Mul, param, one)?;
                    let block = blocks[rng.gen_range(0..blocks.len())];
                    match graph.block(block)?.first_inst() {
                        Some(anchor) => graph.insert_before(extra, anchor)?,
                        None => graph.add_inst_back(block, extra)?,
                    }
                }
            }
            assert_edges_mirrored(&graph)?;
        }
    }
    Ok(())
}

#[test]
fn test_insert_before_and_after() -> Result<()> {
    let (file, compute) = compute_file()?;
    let factory = file.static_factory()?;
    let (mut graph, body, insts) = additions(&file, compute, 3)?;
    let param = graph.parameter(0)?;

    let before = factory.create_unary(&mut graph, StaticOpcode::Neg, param)?;
    graph.insert_before(before, insts[1])?;
    let after = factory.create_unary(&mut graph, StaticOpcode::Not, param)?;
    graph.insert_after(after, insts[1])?;

    let order: Vec<InstId> = graph.block_insts(body)?.collect();
    assert_eq!(order, vec![insts[0], before, insts[1], after, insts[2], insts[3]]);
    assert_eq!(graph.inst(before)?.block(), Some(body));
    assert_eq!(graph.inst(insts[1])?.prev(), Some(before));
    assert_eq!(graph.inst(insts[1])?.next(), Some(after));

    // placing a linked instruction moves it
    graph.insert_after(before, insts[2])?;
    let order: Vec<InstId> = graph.block_insts(body)?.collect();
    assert_eq!(order, vec![insts[0], insts[1], after, insts[2], before, insts[3]]);
    assert!(graph.insert_before(before, before).is_err());
    graph.verify()
}

#[test]
fn test_rpo_defines_before_use() -> Result<()> {
    let (file, compute) = compute_file()?;
    let factory = file.static_factory()?;
    let mut graph = file.create_empty_graph(compute)?;

    // start -> a -> {b, c} -> d -> end
    let a = graph.create_empty_block()?;
    let b = graph.create_empty_block()?;
    let c = graph.create_empty_block()?;
    let d = graph.create_empty_block()?;
    graph.append_succ(graph.start(), a)?;
    graph.append_succ(a, b)?;
    graph.append_succ(a, c)?;
    graph.append_succ(b, d)?;
    graph.append_succ(c, d)?;
    graph.append_succ(d, graph.end())?;

    let param = graph.parameter(0)?;
    let zero = graph.find_or_create_constant(ConstantValue::I32(0))?;
    let two = graph.find_or_create_constant(ConstantValue::I32(2))?;
    let branch = factory.create_if(&mut graph, param, zero, ConditionCode::Gt)?;
    graph.add_inst_back(a, branch)?;
    let doubled = factory.create_binary(&mut graph, StaticOpcode::Mul, param, two)?;
    graph.add_inst_back(b, doubled)?;
    let negated = factory.create_unary(&mut graph, StaticOpcode::Neg, param)?;
    graph.add_inst_back(c, negated)?;
    let merged = graph.create_phi(d, &[doubled, negated])?;
    let ret = factory.create_return(&mut graph, merged)?;
    graph.add_inst_back(d, ret)?;
    graph.verify()?;

    let mut position = HashMap::new();
    let mut order = Vec::new();
    assert!(graph.visit_blocks_rpo(|block| {
        position.insert(block, order.len());
        order.push(block);
        true
    }));
    assert_eq!(order.first(), Some(&graph.start()));
    assert!(position[&a] < position[&b] && position[&a] < position[&c]);
    assert!(position[&b] < position[&d] && position[&c] < position[&d]);

    for inst in graph.insts() {
        let node = graph.inst(inst)?;
        if node.kind() == OpKind::Phi {
            continue;
        }
        let Some(block) = node.block() else { continue };
        for input in node.inputs() {
            let Some(def_block) = graph.inst(*input)?.block() else { continue };
            assert!(
                position[&def_block] <= position[&block],
                "{input} in {def_block} does not precede its use in {block}"
            );
        }
    }

    assert_eq!(graph.immediate_dominator(d)?, Some(a));
    assert!(graph.check_dominance(a, d)?);
    assert!(!graph.check_dominance(b, d)?);
    Ok(())
}

#[test]
fn test_split_block_after() -> Result<()> {
    let (file, compute) = compute_file()?;
    let (mut graph, body, insts) = additions(&file, compute, 4)?;
    let successors = graph.block(body)?.successors().to_vec();
    let blocks_before = graph.block_count();

    let tail = graph.split_block_after(insts[1], true)?;
    assert_eq!(graph.block_count(), blocks_before + 1);

    let head: Vec<InstId> = graph.block_insts(body)?.collect();
    let moved: Vec<InstId> = graph.block_insts(tail)?.collect();
    assert_eq!(head, insts[..2].to_vec());
    assert_eq!(moved, insts[2..].to_vec());
    for inst in &moved {
        assert_eq!(graph.inst(*inst)?.block(), Some(tail));
    }

    assert_eq!(graph.block(body)?.successors(), &[tail]);
    assert_eq!(graph.block(tail)?.successors(), successors.as_slice());
    assert_eq!(graph.block(tail)?.predecessors(), &[body]);
    assert_edges_mirrored(&graph)?;

    // without the edge the head is left dangling
    let last = graph.split_block_after(insts[0], false)?;
    assert!(graph.block(body)?.successors().is_empty());
    assert_eq!(graph.block(last)?.successors(), &[tail]);
    graph.verify_structure()?;
    assert!(graph.verify().is_err());
    Ok(())
}

#[test]
fn test_set_graph_and_reload() -> Result<()> {
    let (mut file, compute) = compute_file()?;
    let (graph, _, _) = additions(&file, compute, 5)?;
    file.function_set_graph(compute, &graph)?;
    assert!(file.function(compute)?.has_body());

    let reopened = common::reload(&file)?;
    let compute = reopened.find_function("compute").expect("compute");
    let decoded = reopened.create_graph_from_function(compute)?;
    let adds = decoded
        .insts()
        .filter(|inst| {
            decoded
                .inst(*inst)
                .is_ok_and(|node| node.opcode() == Opcode::Static(StaticOpcode::Add))
        })
        .count();
    assert_eq!(adds, 5);
    decoded.verify()
}
