//! Structural invariant checking.

use crate::{
    graph::{BlockId, Graph, InstId},
    isa::OpKind,
    Result,
};

fn count<T: PartialEq>(list: &[T], value: &T) -> usize {
    list.iter().filter(|entry| *entry == value).count()
}

impl Graph {
    /// Checks that the graph is well formed and has a shape the encoder accepts.
    ///
    /// Runs [`Graph::verify_structure`], then checks the successor count of every block reachable
    /// from start:
    ///
    /// - `Return` and `Throw` blocks flow into the end block, or into the exit block of the try
    ///   region they close
    /// - `If` and `Try` blocks have exactly two successors, as does a try exit block without a
    ///   terminator
    /// - every other block has exactly one successor
    ///
    /// # Errors
    /// [`crate::Error::Malformed`] describing the first violation found.
    pub fn verify(&self) -> Result<()> {
        self.verify_structure()?;

        let reachable = self.reachable();
        for block in self.blocks() {
            if block != self.end() && reachable[block.index()] {
                self.verify_successors(block)?;
            }
        }
        Ok(())
    }

    /// Checks the structural invariants of the graph, allowing blocks whose successors are still
    /// being edited.
    ///
    /// - successor and predecessor lists mirror each other with equal multiplicity
    /// - inputs and users mirror each other with equal multiplicity, and reference live
    ///   instructions only
    /// - the instruction list of every block is consistent in both directions
    /// - phis are leading, and every phi has one input per predecessor
    /// - terminators end their block
    /// - start has no predecessors, end has no successors and no instructions
    ///
    /// # Errors
    /// [`crate::Error::Malformed`] describing the first violation found.
    pub fn verify_structure(&self) -> Result<()> {
        for block in self.blocks() {
            self.verify_edges(block)?;
            self.verify_list(block)?;
        }

        let start = self.block(self.start())?;
        if !start.preds.is_empty() {
            return Err(malformed_error!("start block {} has predecessors", start.id));
        }
        let end = self.block(self.end())?;
        if !end.succs.is_empty() || !end.is_empty() {
            return Err(malformed_error!("end block {} has successors or instructions", end.id));
        }

        for inst in self.insts() {
            self.verify_def_use(inst)?;
        }
        Ok(())
    }

    fn verify_edges(&self, block: BlockId) -> Result<()> {
        let node = self.block(block)?;
        for succ in &node.succs {
            let Ok(target) = self.block(*succ) else {
                return Err(malformed_error!("{} has the dead successor {}", block, succ));
            };
            if count(&node.succs, succ) != count(&target.preds, &block) {
                return Err(malformed_error!("edge {} -> {} is not mirrored", block, succ));
            }
        }
        for pred in &node.preds {
            let Ok(source) = self.block(*pred) else {
                return Err(malformed_error!("{} has the dead predecessor {}", block, pred));
            };
            if count(&node.preds, pred) != count(&source.succs, &block) {
                return Err(malformed_error!("edge {} -> {} is not mirrored", pred, block));
            }
        }
        Ok(())
    }

    fn verify_successors(&self, block: BlockId) -> Result<()> {
        let node = self.block(block)?;
        let terminator = match node.last {
            Some(last) => Some(self.inst(last)?.kind()).filter(|kind| kind.is_terminator()),
            None => None,
        };

        let expected = match terminator {
            Some(OpKind::Return | OpKind::Throw) => {
                return match node.succs.as_slice() {
                    [exit] if *exit == self.end() || self.block(*exit)?.is_try_end() => Ok(()),
                    _ => Err(malformed_error!(
                        "{} leaves the function but does not flow into the end block or a try exit",
                        block
                    )),
                };
            }
            Some(_) => 2,
            None if node.is_try_end() => 2,
            None => 1,
        };

        if node.succs.len() != expected {
            return Err(malformed_error!(
                "{} needs {} successor(s), has {}",
                block,
                expected,
                node.succs.len()
            ));
        }
        Ok(())
    }

    fn verify_list(&self, block: BlockId) -> Result<()> {
        let node = self.block(block)?;
        let mut prev: Option<InstId> = None;
        let mut len = 0;
        let mut in_phis = true;

        let mut cursor = node.first;
        while let Some(current) = cursor {
            let inst = self.inst(current)?;
            if inst.block != Some(block) || inst.prev != prev {
                return Err(malformed_error!("broken instruction list in {} at {}", block, current));
            }

            let kind = inst.kind();
            if kind.is_phi() {
                if !in_phis {
                    return Err(malformed_error!("phi {} follows ordinary instructions", current));
                }
                if kind == OpKind::Phi && inst.inputs.len() != node.preds.len() {
                    return Err(malformed_error!(
                        "phi {} has {} inputs but {} has {} predecessors",
                        current,
                        inst.inputs.len(),
                        block,
                        node.preds.len()
                    ));
                }
            } else {
                in_phis = false;
            }
            if kind.is_terminator() && inst.next.is_some() {
                return Err(malformed_error!("terminator {} is not the last instruction", current));
            }

            len += 1;
            prev = Some(current);
            cursor = inst.next;
        }

        if node.last != prev || node.len != len {
            return Err(malformed_error!("instruction count or tail of {} is stale", block));
        }
        Ok(())
    }

    fn verify_def_use(&self, id: InstId) -> Result<()> {
        let inst = self.inst(id)?;
        for input in &inst.inputs {
            let Ok(definition) = self.inst(*input) else {
                return Err(malformed_error!("{} uses the removed instruction {}", id, input));
            };
            if count(&inst.inputs, input) != count(&definition.users, &id) {
                return Err(malformed_error!("use of {} by {} is not mirrored", input, id));
            }
        }
        for user in &inst.users {
            let Ok(consumer) = self.inst(*user) else {
                return Err(malformed_error!("{} is used by the removed instruction {}", id, user));
            };
            if count(&inst.users, user) != count(&consumer.inputs, &id) {
                return Err(malformed_error!("use of {} by {} is not mirrored", id, user));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        isa::Target,
        test::{
            files::dynamic_sample,
            graphs::{diamond, guarded_throw},
        },
        Error,
    };

    #[test]
    fn valid_graph_passes() {
        let (graph, _, _) = diamond(Target::Dynamic);
        graph.verify().unwrap();
    }

    #[test]
    fn detects_unmirrored_edge() {
        let (mut graph, [top, left, ..], _) = diamond(Target::Static);
        graph.block_mut(top).unwrap().succs.push(left);
        assert!(matches!(graph.verify(), Err(Error::Malformed { .. })));
    }

    #[test]
    fn detects_phi_arity() {
        let (mut graph, _, phi) = diamond(Target::Static);
        let extra = graph.inst(phi).unwrap().inputs()[0];
        graph.append_input(phi, extra).unwrap();
        assert!(graph.verify().is_err());
    }

    #[test]
    fn return_must_flow_into_end() {
        let (mut graph, [_, left, _, merge], _) = diamond(Target::Static);
        graph.append_succ(merge, left).unwrap();

        graph.verify_structure().unwrap();
        assert!(matches!(graph.verify(), Err(Error::Malformed { .. })));
    }

    #[test]
    fn throw_may_flow_into_try_exit() {
        let file = dynamic_sample();
        let handle = file.find_function("handle").unwrap();
        let (graph, thrower, _) = guarded_throw(&file, handle);

        let exit = graph.block(thrower).unwrap().successors()[0];
        assert!(graph.block(exit).unwrap().is_try_end());
        graph.verify().unwrap();
    }

    #[test]
    fn if_needs_two_successors() {
        let (mut graph, [top, _, right, _], _) = diamond(Target::Static);
        let index = graph
            .block(top)
            .unwrap()
            .successors()
            .iter()
            .position(|succ| *succ == right)
            .unwrap();
        graph.erase_succ(top, index).unwrap();

        graph.verify_structure().unwrap();
        assert!(matches!(graph.verify(), Err(Error::Malformed { .. })));
    }

    #[test]
    fn plain_block_needs_one_successor() {
        let (mut graph, [_, left, right, _], _) = diamond(Target::Static);
        graph.append_succ(left, right).unwrap();
        graph.verify_structure().unwrap();
        assert!(matches!(graph.verify(), Err(Error::Malformed { .. })));

        let (mut graph, [_, left, _, merge], _) = diamond(Target::Static);
        let index = graph
            .block(left)
            .unwrap()
            .successors()
            .iter()
            .position(|succ| *succ == merge)
            .unwrap();
        graph.erase_succ(left, index).unwrap();
        graph.verify_structure().unwrap();
        assert!(graph.verify().is_err());
    }

    #[test]
    fn unreachable_blocks_are_not_shape_checked() {
        let (mut graph, _, _) = diamond(Target::Static);
        let loose = graph.create_empty_block().unwrap();
        assert!(graph.block(loose).unwrap().successors().is_empty());
        graph.verify().unwrap();
    }
}
