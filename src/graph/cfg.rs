//! Control flow editing.
//!
//! Successor and predecessor lists are kept symmetric with equal multiplicity. When an edge is
//! removed, the phi input belonging to that edge is removed as well, so phi input `i` keeps
//! matching predecessor `i`.

use crate::{
    graph::{BasicBlock, BlockFlags, BlockId, Graph, InstId},
    Result,
};

impl Graph {
    /// Creates a block without instructions or edges.
    ///
    /// # Errors
    /// Only fails on arena exhaustion.
    pub fn create_empty_block(&mut self) -> Result<BlockId> {
        let id = self.make_block_id()?;
        self.blocks.push(Some(BasicBlock::new(id)));
        Ok(id)
    }

    /// Appends the edge `block -> succ`.
    ///
    /// The new predecessor slot of `succ` is the last one; phis of `succ` need a matching input
    /// appended by the caller.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid blocks, edges out of the end block and edges
    /// into the start block.
    pub fn append_succ(&mut self, block: BlockId, succ: BlockId) -> Result<()> {
        let index = self.block(block)?.succs.len();
        self.insert_succ(block, succ, index)
    }

    /// Inserts the edge `block -> succ` as successor `index` of `block`.
    ///
    /// # Errors
    /// See [`Graph::append_succ`]; also fails for an index past the successor list.
    pub fn insert_succ(&mut self, block: BlockId, succ: BlockId, index: usize) -> Result<()> {
        if self.block(block)?.is_end() {
            return Err(bad_argument!("the end block {} has no successors", block));
        }
        if self.block(succ)?.is_start() {
            return Err(bad_argument!("the start block {} has no predecessors", succ));
        }
        let count = self.block(block)?.succs.len();
        if index > count {
            return Err(bad_argument!(
                "successor index {} out of range, {} has {} successors",
                index,
                block,
                count
            ));
        }

        self.block_mut(block)?.succs.insert(index, succ);
        self.block_mut(succ)?.preds.push(block);
        Ok(())
    }

    /// Position of the `occurrence`-th entry of `pred` in the predecessor list of `block`.
    fn pred_slot(&self, block: BlockId, pred: BlockId, occurrence: usize) -> Result<usize> {
        self.block(block)?
            .preds
            .iter()
            .enumerate()
            .filter(|(_, entry)| **entry == pred)
            .nth(occurrence)
            .map(|(slot, _)| slot)
            .ok_or_else(|| bad_argument!("{} is not a predecessor of {}", pred, block))
    }

    /// Drops predecessor `slot` of `block` together with the matching input of every phi.
    pub(crate) fn remove_pred_slot(&mut self, block: BlockId, slot: usize) -> Result<()> {
        let phis: Vec<InstId> = self
            .block_insts(block)?
            .take_while(|inst| self.inst(*inst).is_ok_and(|inst| inst.kind().is_phi()))
            .collect();
        for phi in phis {
            if self.inst(phi)?.inputs.len() > slot {
                self.remove_input(phi, slot)?;
            }
        }
        self.block_mut(block)?.preds.remove(slot);
        Ok(())
    }

    /// Removes successor `index` of `block`, and the phi inputs fed through that edge.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid block or index.
    pub fn erase_succ(&mut self, block: BlockId, index: usize) -> Result<()> {
        let succs = &self.block(block)?.succs;
        let Some(succ) = succs.get(index).copied() else {
            return Err(bad_argument!(
                "successor index {} out of range, {} has {} successors",
                index,
                block,
                succs.len()
            ));
        };
        let occurrence = succs[..index].iter().filter(|entry| **entry == succ).count();

        let slot = self.pred_slot(succ, block, occurrence)?;
        self.block_mut(block)?.succs.remove(index);
        self.remove_pred_slot(succ, slot)
    }

    /// Removes every edge `block -> succ`.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for invalid blocks or if no such edge exists.
    pub fn disconnect_succ(&mut self, block: BlockId, succ: BlockId) -> Result<()> {
        self.block(succ)?;
        let mut removed = false;
        while let Some(index) = self
            .block(block)?
            .succs
            .iter()
            .rposition(|entry| *entry == succ)
        {
            self.erase_succ(block, index)?;
            removed = true;
        }

        if removed {
            Ok(())
        } else {
            Err(bad_argument!("{} is not a successor of {}", succ, block))
        }
    }

    /// Successor taken when the branch ending `block` holds, or its fallthrough.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `block` has no successor.
    pub fn true_branch(&self, block: BlockId) -> Result<BlockId> {
        self.block(block)?
            .succs
            .first()
            .copied()
            .ok_or_else(|| bad_argument!("{} has no successors", block))
    }

    /// Successor taken when the branch ending `block` does not hold.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `block` has fewer than two successors.
    pub fn false_branch(&self, block: BlockId) -> Result<BlockId> {
        self.block(block)?
            .succs
            .get(1)
            .copied()
            .ok_or_else(|| bad_argument!("{} has no false branch", block))
    }

    /// Splits the block of `inst` after `inst`.
    ///
    /// The new block receives every instruction following `inst` and all successor edges of the
    /// original block; successors see the new block in the very predecessor slots the original
    /// block used. With `make_edge` the original block falls through into the new one.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] if `inst` is invalid or not linked into a block.
    pub fn split_block_after(&mut self, inst: InstId, make_edge: bool) -> Result<BlockId> {
        let Some(block) = self.inst(inst)?.block else {
            return Err(bad_argument!("{} is not linked into a block", inst));
        };

        let new = self.create_empty_block()?;
        let (flags, try_id) = {
            let original = self.block(block)?;
            (
                original.flags & (BlockFlags::TRY | BlockFlags::CATCH | BlockFlags::TRY_END),
                original.try_id,
            )
        };
        {
            let created = self.block_mut(new)?;
            created.flags = flags;
            created.try_id = try_id;
        }
        self.block_mut(block)?.flags.remove(BlockFlags::TRY_END);

        let mut moved = Vec::new();
        let mut cursor = self.inst(inst)?.next;
        while let Some(current) = cursor {
            cursor = self.inst(current)?.next;
            moved.push(current);
        }
        for current in moved {
            let last = self.block(new)?.last;
            self.unlink(current)?;
            self.link_at_back(current, new, last)?;
        }

        let succs = std::mem::take(&mut self.block_mut(block)?.succs);
        for succ in &succs {
            for pred in &mut self.block_mut(*succ)?.preds {
                if *pred == block {
                    *pred = new;
                }
            }
        }
        self.block_mut(new)?.succs = succs;

        if make_edge {
            self.block_mut(block)?.succs.push(new);
            self.block_mut(new)?.preds.push(block);
        }

        log::debug!("split {} after {} into {}", block, inst, new);
        Ok(new)
    }

    fn link_at_back(&mut self, inst: InstId, block: BlockId, last: Option<InstId>) -> Result<()> {
        {
            let linked = self.inst_mut(inst)?;
            linked.block = Some(block);
            linked.prev = last;
            linked.next = None;
        }
        match last {
            Some(last) => self.inst_mut(last)?.next = Some(inst),
            None => self.block_mut(block)?.first = Some(inst),
        }
        let target = self.block_mut(block)?;
        target.last = Some(inst);
        target.len += 1;
        Ok(())
    }

    /// Removes `block` together with its instructions and all of its edges.
    pub(crate) fn erase_block(&mut self, block: BlockId) -> Result<()> {
        while let Some(index) = self.block(block)?.succs.len().checked_sub(1) {
            self.erase_succ(block, index)?;
        }
        while let Some(pred) = self.block(block)?.preds.last().copied() {
            let index = self
                .block(pred)?
                .succs
                .iter()
                .rposition(|entry| *entry == block)
                .ok_or_else(|| bad_argument!("{} lost its edge to {}", pred, block))?;
            self.erase_succ(pred, index)?;
        }

        let insts: Vec<InstId> = self.block_insts(block)?.collect();
        for inst in &insts {
            let inputs = std::mem::take(&mut self.inst_mut(*inst)?.inputs);
            for input in inputs {
                if let Ok(input) = self.inst_mut(input) {
                    if let Some(position) = input.users.iter().position(|user| user == inst) {
                        input.users.remove(position);
                    }
                }
            }
        }
        for inst in insts {
            self.insts[inst.index()] = None;
        }
        self.blocks[block.index()] = None;
        Ok(())
    }
}
