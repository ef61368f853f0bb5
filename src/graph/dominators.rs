//! Dominator tree computation using the Lengauer-Tarjan algorithm.
//!
//! A block `d` **dominates** a block `n` if every path from start to `n` passes through `d`. The
//! **immediate dominator** of `n` is the unique strict dominator of `n` that does not strictly
//! dominate any other dominator of `n`. Making every block a child of its immediate dominator
//! yields the dominator tree, rooted at start.
//!
//! The tree is computed on demand from the current edges, so it reflects the graph at the time
//! [`Graph::dominator_tree`] is called. Blocks that are unreachable from start have no dominator
//! and dominate nothing but themselves.

use crate::{
    graph::{BlockId, Graph},
    Result,
};

const UNDEFINED: usize = usize::MAX;

/// Dominator tree of a graph.
///
/// # Examples
///
/// ```rust,no_run
/// use abckit::AbcFile;
/// use std::path::Path;
///
/// let file = AbcFile::from_path(Path::new("module.abc"))?;
/// let function = file.find_function("main").expect("main");
/// let graph = file.create_graph_from_function(function)?;
///
/// let tree = graph.dominator_tree();
/// for block in graph.blocks_rpo() {
///     assert!(tree.dominates(graph.start(), block));
/// }
/// # Ok::<(), abckit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    entry: BlockId,
    /// Immediate dominator per arena slot, `None` for start and unreachable blocks
    idom: Vec<Option<BlockId>>,
    /// Live block handle per arena slot
    blocks: Vec<Option<BlockId>>,
}

impl DominatorTree {
    /// Root of the tree, the start block.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Immediate dominator of `block`, `None` for start and unreachable blocks.
    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.idom.get(block.index()).copied().flatten()
    }

    /// Returns `true` if `block` was reachable from start when the tree was built.
    #[must_use]
    pub fn is_reachable(&self, block: BlockId) -> bool {
        block == self.entry || self.immediate_dominator(block).is_some()
    }

    /// Returns `true` if `dominator` dominates `block`. Every block dominates itself.
    #[must_use]
    pub fn dominates(&self, dominator: BlockId, block: BlockId) -> bool {
        if dominator == block {
            return true;
        }

        let mut current = block;
        while let Some(parent) = self.immediate_dominator(current) {
            if parent == dominator {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Blocks whose immediate dominator is `block`, in arena order.
    #[must_use]
    pub fn children(&self, block: BlockId) -> Vec<BlockId> {
        self.idom
            .iter()
            .zip(&self.blocks)
            .filter(|(idom, _)| **idom == Some(block))
            .filter_map(|(_, child)| *child)
            .collect()
    }

    /// Depth of `block` in the tree, 0 for start.
    #[must_use]
    pub fn depth(&self, block: BlockId) -> usize {
        let mut depth = 0;
        let mut current = block;
        while let Some(parent) = self.immediate_dominator(current) {
            depth += 1;
            current = parent;
        }
        depth
    }
}

impl Graph {
    /// Computes the dominator tree of the current control flow.
    #[must_use]
    pub fn dominator_tree(&self) -> DominatorTree {
        let blocks: Vec<Option<BlockId>> = (0..self.blocks.len())
            .map(|index| self.block_at(index))
            .collect();

        let mut lt = LengauerTarjan::new(self.blocks.len(), self.start().index());
        lt.compute(self);

        let idom = lt
            .idom
            .iter()
            .enumerate()
            .map(|(index, idom)| {
                if index == self.start().index() || *idom == UNDEFINED {
                    None
                } else {
                    blocks[*idom]
                }
            })
            .collect();

        DominatorTree {
            entry: self.start(),
            idom,
            blocks,
        }
    }

    /// Immediate dominator of `block`, `None` for start and unreachable blocks.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block.
    pub fn immediate_dominator(&self, block: BlockId) -> Result<Option<BlockId>> {
        self.block(block)?;
        Ok(self.dominator_tree().immediate_dominator(block))
    }

    /// Returns `true` if `dominator` dominates `block`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid blocks.
    pub fn check_dominance(&self, dominator: BlockId, block: BlockId) -> Result<bool> {
        self.block(dominator)?;
        self.block(block)?;
        Ok(self.dominator_tree().dominates(dominator, block))
    }

    /// Blocks immediately dominated by `block`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block.
    pub fn dominated_blocks(&self, block: BlockId) -> Result<Vec<BlockId>> {
        self.block(block)?;
        Ok(self.dominator_tree().children(block))
    }
}

/// Working state of the Lengauer-Tarjan algorithm over arena slots.
struct LengauerTarjan {
    entry: usize,
    /// DFS number per slot, 0 = not visited
    dfnum: Vec<usize>,
    /// Slot per DFS number - 1
    vertex: Vec<usize>,
    parent: Vec<usize>,
    semi: Vec<usize>,
    idom: Vec<usize>,
    ancestor: Vec<usize>,
    best: Vec<usize>,
    bucket: Vec<Vec<usize>>,
    dfs_counter: usize,
}

impl LengauerTarjan {
    fn new(n: usize, entry: usize) -> Self {
        LengauerTarjan {
            entry,
            dfnum: vec![0; n],
            vertex: vec![UNDEFINED; n],
            parent: vec![UNDEFINED; n],
            semi: (0..n).collect(),
            idom: vec![UNDEFINED; n],
            ancestor: vec![UNDEFINED; n],
            best: (0..n).collect(),
            bucket: vec![Vec::new(); n],
            dfs_counter: 0,
        }
    }

    fn successors(graph: &Graph, slot: usize) -> Vec<usize> {
        graph
            .block_at(slot)
            .and_then(|block| graph.block(block).ok())
            .map(|block| block.successors().iter().map(|succ| succ.index()).collect())
            .unwrap_or_default()
    }

    fn predecessors(graph: &Graph, slot: usize) -> Vec<usize> {
        graph
            .block_at(slot)
            .and_then(|block| graph.block(block).ok())
            .map(|block| block.predecessors().iter().map(|pred| pred.index()).collect())
            .unwrap_or_default()
    }

    fn compute(&mut self, graph: &Graph) {
        if self.entry >= self.dfnum.len() {
            return;
        }
        self.dfs(graph);

        for i in (1..self.dfs_counter).rev() {
            let w = self.vertex[i];
            let parent_w = self.parent[w];

            for v in Self::predecessors(graph, w) {
                if self.dfnum[v] == 0 {
                    continue;
                }
                let u = self.eval(v);
                if self.dfnum[self.semi[u]] < self.dfnum[self.semi[w]] {
                    self.semi[w] = self.semi[u];
                }
            }

            let semi_w = self.semi[w];
            self.bucket[semi_w].push(w);

            self.ancestor[w] = parent_w;

            let bucket = std::mem::take(&mut self.bucket[parent_w]);
            for v in bucket {
                let u = self.eval(v);
                self.idom[v] = if self.semi[u] == self.semi[v] {
                    parent_w
                } else {
                    u
                };
            }
        }

        for i in 1..self.dfs_counter {
            let w = self.vertex[i];
            if self.idom[w] != self.semi[w] {
                self.idom[w] = self.idom[self.idom[w]];
            }
        }

        self.idom[self.entry] = self.entry;
    }

    /// Numbers the reachable slots in preorder; the parent travels with the stack entry so a
    /// slot keeps the parent it was actually discovered from.
    fn dfs(&mut self, graph: &Graph) {
        let mut stack = vec![(self.entry, UNDEFINED)];

        while let Some((slot, parent)) = stack.pop() {
            if self.dfnum[slot] != 0 {
                continue;
            }

            self.dfs_counter += 1;
            self.dfnum[slot] = self.dfs_counter;
            self.vertex[self.dfs_counter - 1] = slot;
            self.parent[slot] = parent;

            for succ in Self::successors(graph, slot).into_iter().rev() {
                if self.dfnum[succ] == 0 {
                    stack.push((succ, slot));
                }
            }
        }
    }

    fn eval(&mut self, v: usize) -> usize {
        if self.ancestor[v] == UNDEFINED {
            return v;
        }
        self.compress(v);
        self.best[v]
    }

    fn compress(&mut self, v: usize) {
        let mut path = Vec::new();
        let mut current = v;
        while self.ancestor[self.ancestor[current]] != UNDEFINED {
            path.push(current);
            current = self.ancestor[current];
        }

        for node in path.into_iter().rev() {
            let ancestor = self.ancestor[node];
            let best_ancestor = self.best[ancestor];
            if self.dfnum[self.semi[best_ancestor]] < self.dfnum[self.semi[self.best[node]]] {
                self.best[node] = best_ancestor;
            }
            self.ancestor[node] = self.ancestor[ancestor];
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{isa::Target, test::graphs::{diamond, empty_graph}};

    #[test]
    fn diamond_dominators() {
        let (graph, [top, left, right, merge], _) = diamond(Target::Static);
        let tree = graph.dominator_tree();

        assert_eq!(tree.immediate_dominator(graph.start()), None);
        assert_eq!(tree.immediate_dominator(top), Some(graph.start()));
        assert_eq!(tree.immediate_dominator(left), Some(top));
        assert_eq!(tree.immediate_dominator(right), Some(top));
        assert_eq!(tree.immediate_dominator(merge), Some(top));
        assert_eq!(tree.immediate_dominator(graph.end()), Some(merge));

        assert!(tree.dominates(top, merge));
        assert!(!tree.dominates(left, merge));
        assert!(tree.dominates(merge, merge));
        assert_eq!(tree.depth(merge), 2);

        let mut children = graph.dominated_blocks(top).unwrap();
        children.sort();
        assert_eq!(children, vec![left, right, merge]);
    }

    #[test]
    fn loop_dominators() {
        let mut graph = empty_graph(Target::Dynamic, &[]);
        let header = graph.create_empty_block().unwrap();
        let body = graph.create_empty_block().unwrap();
        let exit = graph.create_empty_block().unwrap();

        graph.append_succ(graph.start(), header).unwrap();
        graph.append_succ(header, body).unwrap();
        graph.append_succ(header, exit).unwrap();
        graph.append_succ(body, header).unwrap();
        graph.append_succ(exit, graph.end()).unwrap();

        assert_eq!(graph.immediate_dominator(body).unwrap(), Some(header));
        assert_eq!(graph.immediate_dominator(exit).unwrap(), Some(header));
        assert!(graph.check_dominance(header, body).unwrap());
        assert!(!graph.check_dominance(body, header).unwrap());
    }

    #[test]
    fn unreachable_block_has_no_dominator() {
        let mut graph = empty_graph(Target::Static, &[]);
        let orphan = graph.create_empty_block().unwrap();
        let tree = graph.dominator_tree();

        assert_eq!(tree.immediate_dominator(orphan), None);
        assert!(!tree.is_reachable(orphan));
        assert!(!tree.dominates(graph.start(), orphan));
    }
}
