//! Depth-first orders over the blocks of a graph.
//!
//! - [`Graph::postorder`] - Blocks reachable from start, children before parents
//! - [`Graph::blocks_rpo`] - Reverse postorder, the usual order for forward passes
//! - [`Graph::visit_blocks_rpo`] - Visitor form with early termination

use std::collections::VecDeque;

use crate::graph::{BlockId, Graph};

impl Graph {
    /// Returns the blocks reachable from start in postorder.
    #[allow(clippy::items_after_statements)]
    #[must_use]
    pub fn postorder(&self) -> Vec<BlockId> {
        let mut visited = vec![false; self.blocks.len()];
        let mut result = Vec::with_capacity(self.blocks.len());

        #[derive(Clone, Copy)]
        enum State {
            Enter,
            Exit,
        }

        let mut stack = vec![(self.start(), State::Enter)];

        while let Some((block, state)) = stack.pop() {
            match state {
                State::Enter => {
                    if visited[block.index()] {
                        continue;
                    }
                    visited[block.index()] = true;

                    stack.push((block, State::Exit));

                    let Ok(node) = self.block(block) else {
                        continue;
                    };
                    for succ in node.successors().iter().rev() {
                        if !visited[succ.index()] {
                            stack.push((*succ, State::Enter));
                        }
                    }
                }
                State::Exit => result.push(block),
            }
        }

        result
    }

    /// Returns the blocks reachable from start in reverse postorder.
    #[must_use]
    pub fn blocks_rpo(&self) -> Vec<BlockId> {
        let mut result = self.postorder();
        result.reverse();
        result
    }

    /// Calls `visitor` for every reachable block in reverse postorder until it returns `false`.
    ///
    /// Returns `false` if the visitor stopped the walk.
    pub fn visit_blocks_rpo<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(BlockId) -> bool,
    {
        self.blocks_rpo().into_iter().all(|block| visitor(block))
    }

    /// Returns a mask over the block arena marking the blocks reachable from start.
    pub(crate) fn reachable(&self) -> Vec<bool> {
        let mut visited = vec![false; self.blocks.len()];
        let mut queue = VecDeque::from([self.start()]);
        visited[self.start().index()] = true;

        while let Some(block) = queue.pop_front() {
            let Ok(node) = self.block(block) else {
                continue;
            };
            for succ in node.successors() {
                if !visited[succ.index()] {
                    visited[succ.index()] = true;
                    queue.push_back(*succ);
                }
            }
        }

        visited
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        graph::InstId,
        isa::Target,
        test::graphs::{diamond, empty_graph},
    };

    #[test]
    fn rpo_of_diamond() {
        let (graph, [top, left, right, merge], _) = diamond(Target::Static);
        let rpo = graph.blocks_rpo();

        assert_eq!(rpo.first(), Some(&graph.start()));
        assert_eq!(rpo[1], top);
        assert_eq!(rpo.last(), Some(&graph.end()));
        let position = |block| rpo.iter().position(|entry| *entry == block).unwrap();
        assert!(position(left) < position(merge));
        assert!(position(right) < position(merge));
        assert_eq!(rpo.len(), 6);
    }

    #[test]
    fn definitions_before_uses() {
        let (graph, _, _) = diamond(Target::Dynamic);
        let mut seen: Vec<InstId> = Vec::new();

        graph.visit_blocks_rpo(|block| {
            for inst in graph.block_insts(block).unwrap() {
                let node = graph.inst(inst).unwrap();
                if !node.kind().is_phi() {
                    for input in node.inputs() {
                        assert!(seen.contains(input), "{input} used before definition");
                    }
                }
                seen.push(inst);
            }
            true
        });
    }

    #[test]
    fn visitor_stops_early() {
        let (graph, _, _) = diamond(Target::Static);
        let mut count = 0;
        let completed = graph.visit_blocks_rpo(|_| {
            count += 1;
            count < 2
        });
        assert!(!completed);
        assert_eq!(count, 2);
    }

    #[test]
    fn unreachable_blocks_skipped() {
        let mut graph = empty_graph(Target::Static, &[]);
        let orphan = graph.create_empty_block().unwrap();
        graph.append_succ(orphan, graph.end()).unwrap();

        let rpo = graph.blocks_rpo();
        assert_eq!(rpo, vec![graph.start()]);
        assert!(!graph.reachable()[orphan.index()]);
    }
}
