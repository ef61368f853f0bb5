#![allow(unused)]
extern crate abckit;

use abckit::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

/// Static file with `functions` bodies, each a chain of `length` additions.
fn arithmetic_file(functions: usize, length: i32) -> abckit::Result<AbcFile> {
    let mut file = AbcFile::new(Target::Static);
    let app = file.add_module("app", ModuleFlags::empty())?;
    for n in 0..functions {
        let function = file.add_function(
            Parent::Module(app),
            &format!("f{n}"),
            FunctionFlags::STATIC,
            Signature::new(TypeId::I32, vec![TypeId::I32]),
        )?;
        let graph = chain(&file, function, length)?;
        file.function_set_graph(function, &graph)?;
    }
    Ok(file)
}

fn chain(file: &AbcFile, function: FunctionId, length: i32) -> abckit::Result<Graph> {
    let factory = file.static_factory()?;
    let mut graph = file.create_empty_graph(function)?;
    let body = graph.create_empty_block()?;
    graph.append_succ(graph.start(), body)?;
    graph.append_succ(body, graph.end())?;

    let mut value = graph.parameter(0)?;
    for step in 0..length {
        let constant = graph.find_or_create_constant(ConstantValue::I32(step))?;
        value = factory.create_binary(&mut graph, StaticOpcode::Add, value, constant)?;
        graph.add_inst_back(body, value)?;
    }
    let ret = factory.create_return(&mut graph, value)?;
    graph.add_inst_back(body, ret)?;
    Ok(graph)
}

/// Graph construction and verification for a single long body.
fn bench_build_graph(c: &mut Criterion) {
    let mut file = AbcFile::new(Target::Static);
    let app = file.add_module("app", ModuleFlags::empty()).unwrap();
    let function = file
        .add_function(
            Parent::Module(app),
            "f",
            FunctionFlags::STATIC,
            Signature::new(TypeId::I32, vec![TypeId::I32]),
        )
        .unwrap();

    let mut group = c.benchmark_group("graph_build");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("chain_1000", |b| {
        b.iter(|| {
            let graph = chain(&file, function, black_box(1000)).unwrap();
            graph.verify().unwrap();
            black_box(graph)
        });
    });
    group.finish();
}

/// Encoding a file and decoding every body back into a graph.
fn bench_encode_decode(c: &mut Criterion) {
    let file = arithmetic_file(50, 100).unwrap();
    let bytes = file.to_bytes().unwrap();

    println!(
        "Benchmarking file: {} bytes ({:.2} KB)",
        bytes.len(),
        bytes.len() as f64 / 1024.0
    );

    let mut group = c.benchmark_group("file");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("to_bytes", |b| {
        b.iter(|| black_box(file.to_bytes().unwrap()));
    });
    group.bench_function("from_mem", |b| {
        b.iter(|| black_box(AbcFile::from_mem(black_box(bytes.clone())).unwrap()));
    });
    group.bench_function("decode_bodies", |b| {
        let reopened = AbcFile::from_mem(bytes.clone()).unwrap();
        let functions: Vec<FunctionId> = reopened.functions().collect();
        b.iter(|| {
            for function in &functions {
                black_box(reopened.create_graph_from_function(*function).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build_graph, bench_encode_decode);
criterion_main!(benches);
