//! A tiny interpreter for dynamic graphs.
//!
//! Covers the opcodes the integration tests emit: global loads of `print`, `Date` and `Error`,
//! string and boolean loads, calls, `sub2`/`add2`, strict equality, module variable loads,
//! branches against zero, phis, throws and try regions. Everything `print` receives is appended
//! to [`Interpreter::output`].

use std::{collections::HashMap, fmt, time::Instant};

use abckit::{
    graph::Reference,
    isa::{DynamicOpcode, OpKind},
    prelude::*,
    Result,
};

const STEP_LIMIT: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Undefined,
    Bool(bool),
    Num(f64),
    Str(String),
    Builtin(Builtin),
    Object(Vec<(String, Val)>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Builtin {
    Print,
    Now,
    ErrorCtor,
}

impl Val {
    fn truthy(&self) -> bool {
        match self {
            Val::Undefined => false,
            Val::Bool(value) => *value,
            Val::Num(value) => *value != 0.0 && !value.is_nan(),
            Val::Str(value) => !value.is_empty(),
            Val::Builtin(_) | Val::Object(_) | Val::Error(_) => true,
        }
    }

    fn num(&self) -> f64 {
        match self {
            Val::Num(value) => *value,
            Val::Bool(value) => f64::from(u8::from(*value)),
            _ => f64::NAN,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Undefined => write!(f, "undefined"),
            Val::Bool(value) => write!(f, "{value}"),
            Val::Num(value) if value.fract() == 0.0 && value.is_finite() => {
                write!(f, "{}", *value as i64)
            }
            Val::Num(value) => write!(f, "{value}"),
            Val::Str(value) => write!(f, "{value}"),
            Val::Builtin(builtin) => write!(f, "function {builtin:?}"),
            Val::Object(_) => write!(f, "[object Object]"),
            Val::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Returned(Val),
    Threw(Val),
}

pub struct Interpreter<'f> {
    file: &'f AbcFile,
    imports: HashMap<String, Val>,
    clock: Instant,
    pub output: String,
}

enum Flow {
    Next,
    Goto(BlockId),
    Throw(Val),
    Exit(Outcome),
}

impl<'f> Interpreter<'f> {
    pub fn new(file: &'f AbcFile) -> Self {
        Interpreter {
            file,
            imports: HashMap::new(),
            clock: Instant::now(),
            output: String::new(),
        }
    }

    /// Value loaded for imports aliased `alias`.
    pub fn with_import(mut self, alias: &str, value: Val) -> Self {
        self.imports.insert(alias.to_string(), value);
        self
    }

    fn global(&self, name: &str) -> Option<Val> {
        match name {
            "print" => Some(Val::Builtin(Builtin::Print)),
            "Error" => Some(Val::Builtin(Builtin::ErrorCtor)),
            "Date" => Some(Val::Object(vec![(
                "now".to_string(),
                Val::Builtin(Builtin::Now),
            )])),
            _ => None,
        }
    }

    fn call(&mut self, callee: &Val, args: &[Val]) -> std::result::Result<Val, Val> {
        match callee {
            Val::Builtin(Builtin::Print) => {
                let line: Vec<String> = args.iter().map(ToString::to_string).collect();
                self.output.push_str(&line.join(" "));
                self.output.push('\n');
                Ok(Val::Undefined)
            }
            Val::Builtin(Builtin::Now) => Ok(Val::Num(self.clock.elapsed().as_millis() as f64)),
            Val::Builtin(Builtin::ErrorCtor) => Ok(Val::Error(
                args.first().map(ToString::to_string).unwrap_or_default(),
            )),
            other => Err(Val::Error(format!("{other} is not callable"))),
        }
    }

    fn string(&self, inst: &abckit::graph::Inst) -> String {
        match inst.reference() {
            Some(Reference::String(id)) => self.file.string(id).unwrap().to_string(),
            other => panic!("{inst} references {other:?}, not a string"),
        }
    }

    /// Runs `graph` with `args` bound to its parameters.
    pub fn run(&mut self, graph: &Graph, args: &[Val]) -> Result<Outcome> {
        let mut values: HashMap<InstId, Val> = HashMap::new();
        let mut block = graph.start();
        let mut came_from: Option<BlockId> = None;
        let mut thrown: Option<Val> = None;

        for _ in 0..STEP_LIMIT {
            if block == graph.end() {
                return Ok(Outcome::Returned(Val::Undefined));
            }

            // phis read the edge the block was entered through, all at once
            let insts: Vec<InstId> = graph.block_insts(block)?.collect();
            let mut phi_values = Vec::new();
            for inst in &insts {
                let node = graph.inst(*inst)?;
                match node.kind() {
                    OpKind::Phi => {
                        let slot = came_from
                            .and_then(|pred| {
                                graph
                                    .block(block)
                                    .ok()?
                                    .predecessors()
                                    .iter()
                                    .position(|candidate| *candidate == pred)
                            })
                            .expect("phi reached without an incoming edge");
                        let input = node.input(slot).expect("phi input per predecessor");
                        phi_values.push((*inst, values[&input].clone()));
                    }
                    OpKind::CatchPhi => {
                        phi_values.push((*inst, thrown.take().unwrap_or(Val::Undefined)));
                    }
                    _ => break,
                }
            }
            values.extend(phi_values);

            let mut flow = Flow::Next;
            for inst in insts {
                flow = self.step(graph, &mut values, block, inst, args)?;
                if !matches!(flow, Flow::Next) {
                    break;
                }
            }

            let next = match flow {
                Flow::Next => graph.true_branch(block)?,
                Flow::Goto(next) => next,
                Flow::Exit(outcome) => return Ok(outcome),
                Flow::Throw(value) => match graph.catch_handler(block)? {
                    Some(handler) => {
                        thrown = Some(value);
                        handler
                    }
                    None => return Ok(Outcome::Threw(value)),
                },
            };
            came_from = Some(block);
            block = next;
        }
        panic!("step limit exceeded");
    }

    fn step(
        &mut self,
        graph: &Graph,
        values: &mut HashMap<InstId, Val>,
        block: BlockId,
        id: InstId,
        args: &[Val],
    ) -> Result<Flow> {
        use DynamicOpcode as D;

        let inst = graph.inst(id)?;
        let Opcode::Dynamic(opcode) = inst.opcode() else {
            panic!("{inst} is not a dynamic instruction");
        };
        let input = |index: usize| -> Val {
            let source = inst.input(index).expect("missing input");
            values
                .get(&source)
                .cloned()
                .unwrap_or_else(|| panic!("{source} used before definition"))
        };

        let result = match opcode {
            D::Phi | D::CatchPhi | D::Try => return Ok(Flow::Next),
            D::Constant => match inst.constant() {
                Some(ConstantValue::I32(value)) => Val::Num(f64::from(value)),
                Some(ConstantValue::I64(value)) => Val::Num(value as f64),
                Some(ConstantValue::U64(value)) => Val::Num(value as f64),
                Some(ConstantValue::F64(value)) => Val::Num(value),
                None => panic!("{inst} has no value"),
            },
            D::Parameter => {
                let index = inst.imms()[0] as usize;
                args.get(index).cloned().unwrap_or(Val::Undefined)
            }
            D::LoadString => Val::Str(self.string(inst)),
            D::LdUndefined => Val::Undefined,
            D::LdTrue => Val::Bool(true),
            D::LdFalse => Val::Bool(false),
            D::TryLdGlobalByName => {
                let name = self.string(inst);
                match self.global(&name) {
                    Some(value) => value,
                    None => {
                        return Ok(Flow::Throw(Val::Error(format!("{name} is not defined"))));
                    }
                }
            }
            D::LdObjByName => {
                let name = self.string(inst);
                match input(0) {
                    Val::Object(fields) => fields
                        .into_iter()
                        .find(|(field, _)| *field == name)
                        .map_or(Val::Undefined, |(_, value)| value),
                    _ => Val::Undefined,
                }
            }
            D::LdExternalModuleVar => {
                let Some(Reference::Import(import)) = inst.reference() else {
                    panic!("{inst} does not reference an import");
                };
                let alias = self.file.import(import)?.alias();
                let alias = self.file.string(alias)?;
                self.imports.get(alias).cloned().unwrap_or(Val::Undefined)
            }
            D::CallArg0 | D::CallArg1 | D::CallArgs2 | D::CallArgs3 | D::CallRange => {
                let callee = input(0);
                let call_args: Vec<Val> = (1..inst.inputs().len()).map(input).collect();
                match self.call(&callee, &call_args) {
                    Ok(value) => value,
                    Err(error) => return Ok(Flow::Throw(error)),
                }
            }
            D::CallThis0 | D::CallThis1 | D::CallThis2 | D::CallThis3 | D::CallThisRange => {
                let callee = input(0);
                let call_args: Vec<Val> = (2..inst.inputs().len()).map(input).collect();
                match self.call(&callee, &call_args) {
                    Ok(value) => value,
                    Err(error) => return Ok(Flow::Throw(error)),
                }
            }
            D::NewObjRange => {
                let ctor = input(0);
                let call_args: Vec<Val> = (1..inst.inputs().len()).map(input).collect();
                match self.call(&ctor, &call_args) {
                    Ok(value) => value,
                    Err(error) => return Ok(Flow::Throw(error)),
                }
            }
            D::Add2 => match (input(0), input(1)) {
                (Val::Str(lhs), rhs) => Val::Str(format!("{lhs}{rhs}")),
                (lhs, Val::Str(rhs)) => Val::Str(format!("{lhs}{rhs}")),
                (lhs, rhs) => Val::Num(lhs.num() + rhs.num()),
            },
            D::Sub2 => Val::Num(input(0).num() - input(1).num()),
            D::StrictEq => Val::Bool(input(0) == input(1)),
            D::StrictNotEq => Val::Bool(input(0) != input(1)),
            D::IsTrue => Val::Bool(input(0).truthy()),
            D::IsFalse => Val::Bool(!input(0).truthy()),
            D::If => {
                // dynamic branches compare against zero, i.e. test falsiness
                let lhs = input(0);
                let rhs = input(1);
                let equal = match (&lhs, &rhs) {
                    (_, Val::Num(zero)) if *zero == 0.0 => !lhs.truthy(),
                    _ => lhs == rhs,
                };
                let holds = match inst.condition_code() {
                    Some(ConditionCode::Eq) => equal,
                    Some(ConditionCode::Ne) => !equal,
                    other => panic!("unexpected condition {other:?}"),
                };
                let next = if holds {
                    graph.true_branch(block)?
                } else {
                    graph.false_branch(block)?
                };
                return Ok(Flow::Goto(next));
            }
            D::Throw => return Ok(Flow::Throw(input(0))),
            D::Return => return Ok(Flow::Exit(Outcome::Returned(input(0)))),
            D::ReturnUndefined => return Ok(Flow::Exit(Outcome::Returned(Val::Undefined))),
            other => panic!("opcode {other:?} is not supported by the test interpreter"),
        };
        values.insert(id, result);
        Ok(Flow::Next)
    }
}
