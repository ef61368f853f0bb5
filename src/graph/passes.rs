//! Whole-graph transformations.

use std::collections::{HashSet, VecDeque};

use crate::{
    graph::{inst::InstData, BlockFlags, BlockId, Graph, InstId},
    isa::{OpKind, Opcode},
    metadata::types::TypeId,
    Error::HasUsers,
    Result,
};

impl Graph {
    /// Removes every block that is not reachable from start, except the end block.
    ///
    /// Instructions of removed blocks are freed, their edges are dropped and phis of surviving
    /// successors lose the inputs that flowed in from removed blocks. Returns the number of
    /// removed blocks.
    ///
    /// # Errors
    /// [`crate::Error::HasUsers`] if a value defined in an unreachable block is used by a
    /// reachable instruction other than through a removed edge; the graph is left untouched.
    pub fn remove_unreachable_blocks(&mut self) -> Result<usize> {
        let reachable = self.reachable();
        let end = self.end();
        let dead: Vec<BlockId> = self
            .blocks()
            .filter(|block| !reachable[block.index()] && *block != end)
            .collect();
        if dead.is_empty() {
            return Ok(0);
        }
        let is_dead = |block: Option<BlockId>| {
            block.is_some_and(|block| dead.contains(&block))
        };

        for block in &dead {
            for inst in self.block_insts(*block)? {
                for user in &self.inst(inst)?.users {
                    let user_inst = self.inst(*user)?;
                    if is_dead(user_inst.block) {
                        continue;
                    }
                    let through_dead_edge = match user_inst.block {
                        Some(user_block) if user_inst.kind().is_phi() => {
                            let preds = &self.block(user_block)?.preds;
                            user_inst
                                .inputs
                                .iter()
                                .zip(preds)
                                .filter(|(input, _)| **input == inst)
                                .all(|(_, pred)| dead.contains(pred))
                        }
                        _ => false,
                    };
                    if !through_dead_edge {
                        return Err(HasUsers {
                            inst: inst.to_string(),
                            users: self.inst(inst)?.users.len(),
                        });
                    }
                }
            }
        }

        for block in &dead {
            self.erase_block(*block)?;
        }

        log::debug!("removed {} unreachable blocks from {}", dead.len(), self.id());
        Ok(dead.len())
    }

    /// Wraps the blocks from `try_first` to `try_last` into a try region handled by the blocks
    /// from `catch_begin` to `catch_end`.
    ///
    /// A new `try_begin` block holding a `Try` instruction takes over the predecessors (and the
    /// phis) of `try_first`; a new `try_end` block is placed between `try_last` and its single
    /// successor. Both get `catch_begin` as exceptional successor. `catch_end` falls through to
    /// the block that followed `try_last` unless it already has successors, and `catch_begin`
    /// gets a leading catch phi if it has none. Returns the `try_begin` and `try_end` blocks.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if one of the blocks is start or end, if `try_last` does not
    /// have exactly one successor, or if `catch_begin` already has predecessors.
    pub fn insert_try_catch(
        &mut self,
        try_first: BlockId,
        try_last: BlockId,
        catch_begin: BlockId,
        catch_end: BlockId,
    ) -> Result<(BlockId, BlockId)> {
        for block in [try_first, try_last, catch_begin, catch_end] {
            let node = self.block(block)?;
            if node.is_start() || node.is_end() {
                return Err(bad_argument!(
                    "{} can not take part in a try/catch region",
                    block
                ));
            }
        }
        let next = match self.block(try_last)?.succs.as_slice() {
            [next] => *next,
            succs => {
                return Err(bad_argument!(
                    "the last block of a try region needs exactly one successor, {} has {}",
                    try_last,
                    succs.len()
                ))
            }
        };
        if !self.block(catch_begin)?.preds.is_empty() {
            return Err(bad_argument!(
                "catch block {} already has predecessors",
                catch_begin
            ));
        }
        let Some(try_opcode) = Opcode::graph_op(self.target(), OpKind::Try) else {
            return Err(crate::Error::NotSupported);
        };

        let try_id = self.allocate_try_id();

        // try_begin takes over the incoming edges of try_first in place
        let try_begin = self.create_empty_block()?;
        let preds = std::mem::take(&mut self.block_mut(try_first)?.preds);
        for pred in &preds {
            for succ in &mut self.block_mut(*pred)?.succs {
                if *succ == try_first {
                    *succ = try_begin;
                }
            }
        }
        self.block_mut(try_begin)?.preds = preds;

        let phis: Vec<InstId> = self
            .block_insts(try_first)?
            .take_while(|inst| self.inst(*inst).is_ok_and(|inst| inst.kind() == OpKind::Phi))
            .collect();
        for phi in phis {
            self.unlink(phi)?;
            self.add_inst_back(try_begin, phi)?;
        }

        let marker = self.create_inst(InstData::new(try_opcode, TypeId::Void))?;
        self.add_inst_back(try_begin, marker)?;
        self.append_succ(try_begin, try_first)?;
        self.append_succ(try_begin, catch_begin)?;

        // try_end sits in the slot try_last used to occupy in next
        let try_end = self.create_empty_block()?;
        self.block_mut(try_last)?.succs = vec![try_end];
        self.block_mut(try_end)?.preds = vec![try_last];
        if let Some(slot) = self
            .block(next)?
            .preds
            .iter()
            .position(|pred| *pred == try_last)
        {
            self.block_mut(next)?.preds[slot] = try_end;
        }
        self.block_mut(try_end)?.succs.push(next);
        self.append_succ(try_end, catch_begin)?;

        if self.block(catch_end)?.succs.is_empty() {
            let slot = self
                .block(next)?
                .preds
                .iter()
                .position(|pred| *pred == try_end);
            self.append_succ(catch_end, next)?;
            let phis = self.leading_phis(next, OpKind::Phi)?;
            for phi in phis {
                let value = slot.and_then(|slot| self.inst(phi).ok()?.input(slot));
                if let Some(value) = value {
                    self.append_input(phi, value)?;
                }
            }
        }

        if self.leading_phis(catch_begin, OpKind::CatchPhi)?.is_empty() {
            self.create_catch_phi(catch_begin)?;
        }

        {
            let begin = self.block_mut(try_begin)?;
            begin.flags.insert(BlockFlags::TRY_BEGIN);
            begin.try_id = Some(try_id);
        }
        {
            let end = self.block_mut(try_end)?;
            end.flags.insert(BlockFlags::TRY_END);
            end.try_id = Some(try_id);
        }

        for block in self.region(try_first, &[try_end, self.end()])? {
            let node = self.block_mut(block)?;
            node.flags.insert(BlockFlags::TRY);
            node.try_id = Some(try_id);
        }

        self.block_mut(catch_begin)?
            .flags
            .insert(BlockFlags::CATCH_BEGIN | BlockFlags::CATCH);
        let stop = [next, self.end()];
        for block in self.region(catch_begin, &stop)? {
            self.block_mut(block)?.flags.insert(BlockFlags::CATCH);
        }

        log::debug!(
            "inserted try region #{} [{}..{}] handled by {}",
            try_id,
            try_first,
            try_last,
            catch_begin
        );
        Ok((try_begin, try_end))
    }

    /// Blocks reachable from `first` without passing through `stop`, `first` included.
    pub(crate) fn region(&self, first: BlockId, stop: &[BlockId]) -> Result<Vec<BlockId>> {
        let mut seen = HashSet::from([first]);
        let mut queue = VecDeque::from([first]);
        let mut blocks = Vec::new();

        while let Some(block) = queue.pop_front() {
            blocks.push(block);
            for succ in &self.block(block)?.succs {
                if !stop.contains(succ) && seen.insert(*succ) {
                    queue.push_back(*succ);
                }
            }
        }

        Ok(blocks)
    }

    /// First block of the handler protecting `block`, if `block` lies inside a try region.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block.
    pub fn catch_handler(&self, block: BlockId) -> Result<Option<BlockId>> {
        let node = self.block(block)?;
        let Some(try_id) = node.try_id else {
            return Ok(None);
        };
        if node.is_try_begin() {
            return Ok(None);
        }

        for candidate in self.blocks() {
            let candidate = self.block(candidate)?;
            if candidate.is_try_begin() && candidate.try_id == Some(try_id) {
                return Ok(candidate.succs.get(1).copied());
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        graph::{BlockFlags, ConstantValue},
        isa::{OpKind, Target},
        test::graphs::{diamond, empty_graph, straight_line},
    };

    #[test]
    fn removes_dead_branch() {
        let (mut graph, [top, left, right, merge], phi) = diamond(Target::Static);

        let index = graph
            .block(top)
            .unwrap()
            .successors()
            .iter()
            .position(|succ| *succ == right)
            .unwrap();
        graph.erase_succ(top, index).unwrap();

        assert_eq!(graph.remove_unreachable_blocks().unwrap(), 1);
        assert!(graph.block(right).is_err());
        assert_eq!(graph.block(merge).unwrap().predecessors(), &[left]);
        assert_eq!(graph.inst(phi).unwrap().inputs().len(), 1);
        assert_eq!(graph.remove_unreachable_blocks().unwrap(), 0);

        let branch = graph.block(top).unwrap().last_inst().unwrap();
        assert_eq!(graph.inst(branch).unwrap().kind(), OpKind::If);
        graph.remove_inst(branch).unwrap();
        graph.verify().unwrap();
    }

    #[test]
    fn dead_value_with_live_user() {
        let mut graph = empty_graph(Target::Static, &[]);
        let live = graph.create_empty_block().unwrap();
        let dead = graph.create_empty_block().unwrap();
        graph.append_succ(graph.start(), live).unwrap();
        graph.append_succ(live, graph.end()).unwrap();

        let constant = graph.find_or_create_constant(ConstantValue::I32(1)).unwrap();
        graph.add_inst_back(dead, constant).unwrap();
        let ret = crate::test::graphs::static_return(&mut graph, constant);
        graph.add_inst_back(live, ret).unwrap();

        assert!(graph.remove_unreachable_blocks().is_err());
        assert!(graph.block(dead).is_ok());
    }

    #[test]
    fn try_catch_structure() {
        let (mut graph, blocks) = straight_line(Target::Dynamic, 3);
        let [first, middle, last] = [blocks[0], blocks[1], blocks[2]];
        let handler = graph.create_empty_block().unwrap();

        let (try_begin, try_end) = graph
            .insert_try_catch(first, middle, handler, handler)
            .unwrap();

        let begin = graph.block(try_begin).unwrap();
        assert!(begin.is_try_begin());
        assert_eq!(begin.successors(), &[first, handler]);
        assert_eq!(begin.predecessors(), &[graph.start()]);
        let marker = begin.last_inst().unwrap();
        assert_eq!(graph.inst(marker).unwrap().kind(), OpKind::Try);

        let end = graph.block(try_end).unwrap();
        assert!(end.is_try_end());
        assert_eq!(end.successors(), &[last, handler]);
        assert_eq!(end.try_id(), begin.try_id());

        assert_eq!(graph.block(middle).unwrap().successors(), &[try_end]);
        assert_eq!(graph.block(last).unwrap().predecessors(), &[try_end, handler]);

        let catch = graph.block(handler).unwrap();
        assert!(catch
            .flags()
            .contains(BlockFlags::CATCH_BEGIN | BlockFlags::CATCH));
        assert_eq!(catch.predecessors(), &[try_begin, try_end]);
        let catch_phi = catch.first_inst().unwrap();
        assert_eq!(graph.inst(catch_phi).unwrap().kind(), OpKind::CatchPhi);

        assert!(graph.block(first).unwrap().is_try());
        assert!(graph.block(middle).unwrap().is_try());
        assert!(!graph.block(last).unwrap().is_try());
        assert_eq!(graph.catch_handler(middle).unwrap(), Some(handler));
        assert_eq!(graph.catch_handler(last).unwrap(), None);
        graph.verify().unwrap();
    }

    #[test]
    fn try_catch_preconditions() {
        let (mut graph, blocks) = straight_line(Target::Static, 2);
        let handler = graph.create_empty_block().unwrap();

        assert!(graph
            .insert_try_catch(graph.start(), blocks[0], handler, handler)
            .is_err());
        assert!(graph
            .insert_try_catch(blocks[0], blocks[1], blocks[0], blocks[0])
            .is_err());

        let orphan = graph.create_empty_block().unwrap();
        assert!(graph
            .insert_try_catch(blocks[0], orphan, handler, handler)
            .is_err());
    }
}
