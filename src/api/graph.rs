//! Graph, block and instruction editing.

use crate::{
    api::{call, call_ok, visit},
    graph::{BlockId, ConstantValue, Graph, InstId},
    isa::{ConditionCode, Opcode},
    metadata::types::TypeId,
};

/// Graph editing table.
///
/// Handles of another graph fail with [`crate::api::Status::BadArgument`]; removing an
/// instruction that still has users fails the same way.
pub trait GraphApi: Sync {
    /// The start block of the graph.
    fn graph_get_start_block(&self, graph: &Graph) -> BlockId;

    /// The end block of the graph.
    fn graph_get_end_block(&self, graph: &Graph) -> BlockId;

    /// Number of live blocks.
    fn graph_get_number_of_blocks(&self, graph: &Graph) -> usize;

    /// Parameter instruction `index` of the start block.
    fn graph_get_parameter(&self, graph: &Graph, index: usize) -> Option<InstId>;

    /// Visits blocks reachable from start in reverse postorder.
    fn graph_visit_blocks_rpo(&self, graph: &Graph, visitor: &mut dyn FnMut(BlockId) -> bool) -> bool;

    /// Constant node for `value`, reusing an existing one.
    fn graph_find_or_create_constant(&self, graph: &mut Graph, value: ConstantValue) -> Option<InstId>;

    /// Wraps `try_first..=try_last` in a try region handled by `catch_begin..=catch_end`.
    /// Returns the new `try_begin` and `try_end` blocks.
    fn graph_insert_try_catch(
        &self,
        graph: &mut Graph,
        try_first: BlockId,
        try_last: BlockId,
        catch_begin: BlockId,
        catch_end: BlockId,
    ) -> Option<(BlockId, BlockId)>;

    /// Removes blocks unreachable from start; returns how many were removed.
    fn graph_run_pass_remove_unreachable_blocks(&self, graph: &mut Graph) -> Option<usize>;

    /// Checks the structural invariants of the graph.
    fn graph_verify(&self, graph: &Graph) -> bool;

    /// Textual dump of the whole graph.
    fn graph_dump(&self, graph: &Graph) -> String;

    /// Appends a block with no instructions and no edges.
    fn bb_create_empty(&self, graph: &mut Graph) -> Option<BlockId>;

    /// Adds the edge `block -> succ` after the existing successors.
    fn bb_append_succ(&self, graph: &mut Graph, block: BlockId, succ: BlockId) -> bool;

    /// Adds the edge `block -> succ` at position `index`.
    fn bb_insert_succ(&self, graph: &mut Graph, block: BlockId, succ: BlockId, index: usize) -> bool;

    /// Removes the successor edge at `index`.
    fn bb_erase_succ(&self, graph: &mut Graph, block: BlockId, index: usize) -> bool;

    /// Removes the edge `block -> succ`.
    fn bb_disconnect_succ(&self, graph: &mut Graph, block: BlockId, succ: BlockId) -> bool;

    /// Number of successors.
    fn bb_get_succ_count(&self, graph: &Graph, block: BlockId) -> usize;

    /// Successor at `index`.
    fn bb_get_succ(&self, graph: &Graph, block: BlockId, index: usize) -> Option<BlockId>;

    /// Number of predecessors.
    fn bb_get_pred_count(&self, graph: &Graph, block: BlockId) -> usize;

    /// Predecessor at `index`.
    fn bb_get_pred(&self, graph: &Graph, block: BlockId, index: usize) -> Option<BlockId>;

    /// Visits successors in edge order.
    fn bb_visit_succ_blocks(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(BlockId) -> bool,
    ) -> bool;

    /// Visits predecessors in edge order.
    fn bb_visit_pred_blocks(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(BlockId) -> bool,
    ) -> bool;

    /// Successor taken when the terminating `If` holds.
    fn bb_get_true_branch(&self, graph: &Graph, block: BlockId) -> Option<BlockId>;

    /// Successor taken when the terminating `If` fails.
    fn bb_get_false_branch(&self, graph: &Graph, block: BlockId) -> Option<BlockId>;

    /// First instruction, phis included.
    fn bb_get_first_inst(&self, graph: &Graph, block: BlockId) -> Option<InstId>;

    /// Last instruction.
    fn bb_get_last_inst(&self, graph: &Graph, block: BlockId) -> Option<InstId>;

    /// Number of instructions in the block.
    fn bb_get_number_of_instructions(&self, graph: &Graph, block: BlockId) -> usize;

    /// Visits instructions in order.
    fn bb_visit_instructions(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(InstId) -> bool,
    ) -> bool;

    /// Places a detached instruction at the head of the block.
    fn bb_add_inst_front(&self, graph: &mut Graph, block: BlockId, inst: InstId) -> bool;

    /// Places a detached instruction at the end of the block.
    fn bb_add_inst_back(&self, graph: &mut Graph, block: BlockId, inst: InstId) -> bool;

    /// Removes every instruction of the block.
    fn bb_remove_all_insts(&self, graph: &mut Graph, block: BlockId) -> bool;

    /// Moves everything after `inst` into a new block that takes over the successors.
    fn bb_split_block_after_instruction(
        &self,
        graph: &mut Graph,
        inst: InstId,
        make_edge: bool,
    ) -> Option<BlockId>;

    /// Whether the block is the start block.
    fn bb_is_start(&self, graph: &Graph, block: BlockId) -> bool;

    /// Whether the block is the end block.
    fn bb_is_end(&self, graph: &Graph, block: BlockId) -> bool;

    /// Whether the block is the try begin block.
    fn bb_is_try_begin(&self, graph: &Graph, block: BlockId) -> bool;

    /// Whether the block is the try end block.
    fn bb_is_try_end(&self, graph: &Graph, block: BlockId) -> bool;

    /// Whether the block is the try block.
    fn bb_is_try(&self, graph: &Graph, block: BlockId) -> bool;

    /// Whether the block is the catch begin block.
    fn bb_is_catch_begin(&self, graph: &Graph, block: BlockId) -> bool;

    /// Whether the block is the catch block.
    fn bb_is_catch(&self, graph: &Graph, block: BlockId) -> bool;

    /// The immediate dominator of a block.
    fn bb_get_immediate_dominator(&self, graph: &Graph, block: BlockId) -> Option<BlockId>;

    /// Whether `dominator` dominates `block`.
    fn bb_check_dominance(&self, graph: &Graph, dominator: BlockId, block: BlockId) -> bool;

    /// Visits the blocks immediately dominated by `block`.
    fn bb_visit_dominated_blocks(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(BlockId) -> bool,
    ) -> bool;

    /// Creates a phi at the head of the block.
    fn bb_create_phi(&self, graph: &mut Graph, block: BlockId, inputs: &[InstId]) -> Option<InstId>;

    /// Creates a catch phi at the head of the block.
    fn bb_create_catch_phi(&self, graph: &mut Graph, block: BlockId) -> Option<InstId>;

    /// Text rendering of one block.
    fn bb_dump(&self, graph: &Graph, block: BlockId) -> Option<String>;

    /// Places a detached instruction before `anchor`.
    fn inst_insert_before(&self, graph: &mut Graph, inst: InstId, anchor: InstId) -> bool;

    /// Places a detached instruction after `anchor`.
    fn inst_insert_after(&self, graph: &mut Graph, inst: InstId, anchor: InstId) -> bool;

    /// Removes an instruction without users.
    fn inst_remove(&self, graph: &mut Graph, inst: InstId) -> bool;

    /// The opcode of an instruction.
    fn inst_get_opcode(&self, graph: &Graph, inst: InstId) -> Option<Opcode>;

    /// The type of an instruction.
    fn inst_get_type(&self, graph: &Graph, inst: InstId) -> Option<TypeId>;

    /// The block of an instruction.
    fn inst_get_block(&self, graph: &Graph, inst: InstId) -> Option<BlockId>;

    /// Next instruction in the same block.
    fn inst_get_next(&self, graph: &Graph, inst: InstId) -> Option<InstId>;

    /// Previous instruction in the same block.
    fn inst_get_prev(&self, graph: &Graph, inst: InstId) -> Option<InstId>;

    /// Number of inputs.
    fn inst_get_input_count(&self, graph: &Graph, inst: InstId) -> usize;

    /// Input at `index`.
    fn inst_get_input(&self, graph: &Graph, inst: InstId, index: usize) -> Option<InstId>;

    /// Sets the input of an instruction.
    fn inst_set_input(&self, graph: &mut Graph, inst: InstId, input: InstId, index: usize) -> bool;

    /// Replaces every input at once.
    fn inst_set_inputs(&self, graph: &mut Graph, inst: InstId, inputs: &[InstId]) -> bool;

    /// Adds an input after the existing ones.
    fn inst_append_input(&self, graph: &mut Graph, inst: InstId, input: InstId) -> bool;

    /// Visits the inputs of an instruction.
    fn inst_visit_inputs(
        &self,
        graph: &Graph,
        inst: InstId,
        visitor: &mut dyn FnMut(InstId) -> bool,
    ) -> bool;

    /// Number of instructions using `inst`.
    fn inst_get_user_count(&self, graph: &Graph, inst: InstId) -> usize;

    /// Visits users, once per use.
    fn inst_visit_users(
        &self,
        graph: &Graph,
        inst: InstId,
        visitor: &mut dyn FnMut(InstId) -> bool,
    ) -> bool;

    /// Rewires every user of `old` to `new`.
    fn inst_replace_all_users(&self, graph: &mut Graph, old: InstId, new: InstId) -> bool;

    /// The immediate of an instruction.
    fn inst_get_immediate(&self, graph: &Graph, inst: InstId, index: usize) -> Option<u64>;

    /// Sets the immediate of an instruction.
    fn inst_set_immediate(&self, graph: &mut Graph, inst: InstId, index: usize, value: u64) -> bool;

    /// The condition code of an instruction.
    fn inst_get_condition_code(&self, graph: &Graph, inst: InstId) -> Option<ConditionCode>;

    /// Sets the condition code of an instruction.
    fn inst_set_condition_code(&self, graph: &mut Graph, inst: InstId, cc: ConditionCode) -> bool;

    /// Value of a constant instruction.
    fn inst_get_constant(&self, graph: &Graph, inst: InstId) -> Option<ConstantValue>;

    /// Inline cache slot of a dynamic instruction.
    fn inst_get_ic_slot(&self, graph: &Graph, inst: InstId) -> Option<u16>;

    /// Text rendering of one instruction.
    fn inst_dump(&self, graph: &Graph, inst: InstId) -> Option<String>;
}

pub(crate) struct GraphV1;

impl GraphApi for GraphV1 {
    fn graph_get_start_block(&self, graph: &Graph) -> BlockId {
        log::trace!("api: graph_get_start_block");
        graph.start()
    }

    fn graph_get_end_block(&self, graph: &Graph) -> BlockId {
        log::trace!("api: graph_get_end_block");
        graph.end()
    }

    fn graph_get_number_of_blocks(&self, graph: &Graph) -> usize {
        call("graph_get_number_of_blocks", || Ok(graph.block_count())).unwrap_or(0)
    }

    fn graph_get_parameter(&self, graph: &Graph, index: usize) -> Option<InstId> {
        call("graph_get_parameter", || graph.parameter(index))
    }

    fn graph_visit_blocks_rpo(&self, graph: &Graph, visitor: &mut dyn FnMut(BlockId) -> bool) -> bool {
        call("graph_visit_blocks_rpo", || {
            Ok(graph.visit_blocks_rpo(|block| visitor(block)))
        })
        .unwrap_or(false)
    }

    fn graph_find_or_create_constant(&self, graph: &mut Graph, value: ConstantValue) -> Option<InstId> {
        call("graph_find_or_create_constant", || {
            graph.find_or_create_constant(value)
        })
    }

    fn graph_insert_try_catch(
        &self,
        graph: &mut Graph,
        try_first: BlockId,
        try_last: BlockId,
        catch_begin: BlockId,
        catch_end: BlockId,
    ) -> Option<(BlockId, BlockId)> {
        call("graph_insert_try_catch", || {
            graph.insert_try_catch(try_first, try_last, catch_begin, catch_end)
        })
    }

    fn graph_run_pass_remove_unreachable_blocks(&self, graph: &mut Graph) -> Option<usize> {
        call("graph_run_pass_remove_unreachable_blocks", || {
            graph.remove_unreachable_blocks()
        })
    }

    fn graph_verify(&self, graph: &Graph) -> bool {
        call_ok("graph_verify", || graph.verify())
    }

    fn graph_dump(&self, graph: &Graph) -> String {
        call("graph_dump", || Ok(graph.to_string())).unwrap_or_default()
    }

    fn bb_create_empty(&self, graph: &mut Graph) -> Option<BlockId> {
        call("bb_create_empty", || graph.create_empty_block())
    }

    fn bb_append_succ(&self, graph: &mut Graph, block: BlockId, succ: BlockId) -> bool {
        call_ok("bb_append_succ", || graph.append_succ(block, succ))
    }

    fn bb_insert_succ(&self, graph: &mut Graph, block: BlockId, succ: BlockId, index: usize) -> bool {
        call_ok("bb_insert_succ", || graph.insert_succ(block, succ, index))
    }

    fn bb_erase_succ(&self, graph: &mut Graph, block: BlockId, index: usize) -> bool {
        call_ok("bb_erase_succ", || graph.erase_succ(block, index))
    }

    fn bb_disconnect_succ(&self, graph: &mut Graph, block: BlockId, succ: BlockId) -> bool {
        call_ok("bb_disconnect_succ", || graph.disconnect_succ(block, succ))
    }

    fn bb_get_succ_count(&self, graph: &Graph, block: BlockId) -> usize {
        call("bb_get_succ_count", || Ok(graph.block(block)?.successors().len())).unwrap_or(0)
    }

    fn bb_get_succ(&self, graph: &Graph, block: BlockId, index: usize) -> Option<BlockId> {
        call("bb_get_succ", || {
            graph
                .block(block)?
                .successors()
                .get(index)
                .copied()
                .ok_or_else(|| bad_argument!("{} has no successor {}", block, index))
        })
    }

    fn bb_get_pred_count(&self, graph: &Graph, block: BlockId) -> usize {
        call("bb_get_pred_count", || Ok(graph.block(block)?.predecessors().len())).unwrap_or(0)
    }

    fn bb_get_pred(&self, graph: &Graph, block: BlockId, index: usize) -> Option<BlockId> {
        call("bb_get_pred", || {
            graph
                .block(block)?
                .predecessors()
                .get(index)
                .copied()
                .ok_or_else(|| bad_argument!("{} has no predecessor {}", block, index))
        })
    }

    fn bb_visit_succ_blocks(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(BlockId) -> bool,
    ) -> bool {
        call("bb_visit_succ_blocks", || {
            Ok(visit(graph.block(block)?.successors().iter().copied(), visitor))
        })
        .unwrap_or(false)
    }

    fn bb_visit_pred_blocks(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(BlockId) -> bool,
    ) -> bool {
        call("bb_visit_pred_blocks", || {
            Ok(visit(graph.block(block)?.predecessors().iter().copied(), visitor))
        })
        .unwrap_or(false)
    }

    fn bb_get_true_branch(&self, graph: &Graph, block: BlockId) -> Option<BlockId> {
        call("bb_get_true_branch", || graph.true_branch(block))
    }

    fn bb_get_false_branch(&self, graph: &Graph, block: BlockId) -> Option<BlockId> {
        call("bb_get_false_branch", || graph.false_branch(block))
    }

    fn bb_get_first_inst(&self, graph: &Graph, block: BlockId) -> Option<InstId> {
        call("bb_get_first_inst", || Ok(graph.block(block)?.first_inst())).flatten()
    }

    fn bb_get_last_inst(&self, graph: &Graph, block: BlockId) -> Option<InstId> {
        call("bb_get_last_inst", || Ok(graph.block(block)?.last_inst())).flatten()
    }

    fn bb_get_number_of_instructions(&self, graph: &Graph, block: BlockId) -> usize {
        call("bb_get_number_of_instructions", || {
            Ok(graph.block(block)?.inst_count())
        })
        .unwrap_or(0)
    }

    fn bb_visit_instructions(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(InstId) -> bool,
    ) -> bool {
        call("bb_visit_instructions", || {
            Ok(visit(graph.block_insts(block)?, visitor))
        })
        .unwrap_or(false)
    }

    fn bb_add_inst_front(&self, graph: &mut Graph, block: BlockId, inst: InstId) -> bool {
        call_ok("bb_add_inst_front", || graph.add_inst_front(block, inst))
    }

    fn bb_add_inst_back(&self, graph: &mut Graph, block: BlockId, inst: InstId) -> bool {
        call_ok("bb_add_inst_back", || graph.add_inst_back(block, inst))
    }

    fn bb_remove_all_insts(&self, graph: &mut Graph, block: BlockId) -> bool {
        call_ok("bb_remove_all_insts", || graph.remove_all_insts(block))
    }

    fn bb_split_block_after_instruction(
        &self,
        graph: &mut Graph,
        inst: InstId,
        make_edge: bool,
    ) -> Option<BlockId> {
        call("bb_split_block_after_instruction", || {
            graph.split_block_after(inst, make_edge)
        })
    }

    fn bb_is_start(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_start", || Ok(graph.block(block)?.is_start())).unwrap_or(false)
    }

    fn bb_is_end(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_end", || Ok(graph.block(block)?.is_end())).unwrap_or(false)
    }

    fn bb_is_try_begin(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_try_begin", || Ok(graph.block(block)?.is_try_begin())).unwrap_or(false)
    }

    fn bb_is_try_end(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_try_end", || Ok(graph.block(block)?.is_try_end())).unwrap_or(false)
    }

    fn bb_is_try(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_try", || Ok(graph.block(block)?.is_try())).unwrap_or(false)
    }

    fn bb_is_catch_begin(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_catch_begin", || Ok(graph.block(block)?.is_catch_begin())).unwrap_or(false)
    }

    fn bb_is_catch(&self, graph: &Graph, block: BlockId) -> bool {
        call("bb_is_catch", || Ok(graph.block(block)?.is_catch())).unwrap_or(false)
    }

    fn bb_get_immediate_dominator(&self, graph: &Graph, block: BlockId) -> Option<BlockId> {
        call("bb_get_immediate_dominator", || graph.immediate_dominator(block)).flatten()
    }

    fn bb_check_dominance(&self, graph: &Graph, dominator: BlockId, block: BlockId) -> bool {
        call("bb_check_dominance", || graph.check_dominance(dominator, block)).unwrap_or(false)
    }

    fn bb_visit_dominated_blocks(
        &self,
        graph: &Graph,
        block: BlockId,
        visitor: &mut dyn FnMut(BlockId) -> bool,
    ) -> bool {
        call("bb_visit_dominated_blocks", || {
            Ok(visit(graph.dominated_blocks(block)?, visitor))
        })
        .unwrap_or(false)
    }

    fn bb_create_phi(&self, graph: &mut Graph, block: BlockId, inputs: &[InstId]) -> Option<InstId> {
        call("bb_create_phi", || graph.create_phi(block, inputs))
    }

    fn bb_create_catch_phi(&self, graph: &mut Graph, block: BlockId) -> Option<InstId> {
        call("bb_create_catch_phi", || graph.create_catch_phi(block))
    }

    fn bb_dump(&self, graph: &Graph, block: BlockId) -> Option<String> {
        call("bb_dump", || Ok(graph.dump_block(block)?.to_string()))
    }

    fn inst_insert_before(&self, graph: &mut Graph, inst: InstId, anchor: InstId) -> bool {
        call_ok("inst_insert_before", || graph.insert_before(inst, anchor))
    }

    fn inst_insert_after(&self, graph: &mut Graph, inst: InstId, anchor: InstId) -> bool {
        call_ok("inst_insert_after", || graph.insert_after(inst, anchor))
    }

    fn inst_remove(&self, graph: &mut Graph, inst: InstId) -> bool {
        call_ok("inst_remove", || graph.remove_inst(inst))
    }

    fn inst_get_opcode(&self, graph: &Graph, inst: InstId) -> Option<Opcode> {
        call("inst_get_opcode", || Ok(graph.inst(inst)?.opcode()))
    }

    fn inst_get_type(&self, graph: &Graph, inst: InstId) -> Option<TypeId> {
        call("inst_get_type", || Ok(graph.inst(inst)?.ty()))
    }

    fn inst_get_block(&self, graph: &Graph, inst: InstId) -> Option<BlockId> {
        call("inst_get_block", || Ok(graph.inst(inst)?.block())).flatten()
    }

    fn inst_get_next(&self, graph: &Graph, inst: InstId) -> Option<InstId> {
        call("inst_get_next", || Ok(graph.inst(inst)?.next())).flatten()
    }

    fn inst_get_prev(&self, graph: &Graph, inst: InstId) -> Option<InstId> {
        call("inst_get_prev", || Ok(graph.inst(inst)?.prev())).flatten()
    }

    fn inst_get_input_count(&self, graph: &Graph, inst: InstId) -> usize {
        call("inst_get_input_count", || Ok(graph.inst(inst)?.inputs().len())).unwrap_or(0)
    }

    fn inst_get_input(&self, graph: &Graph, inst: InstId, index: usize) -> Option<InstId> {
        call("inst_get_input", || {
            graph
                .inst(inst)?
                .input(index)
                .ok_or_else(|| bad_argument!("{} has no input {}", inst, index))
        })
    }

    fn inst_set_input(&self, graph: &mut Graph, inst: InstId, input: InstId, index: usize) -> bool {
        call_ok("inst_set_input", || graph.set_input(inst, input, index))
    }

    fn inst_set_inputs(&self, graph: &mut Graph, inst: InstId, inputs: &[InstId]) -> bool {
        call_ok("inst_set_inputs", || graph.set_inputs(inst, inputs))
    }

    fn inst_append_input(&self, graph: &mut Graph, inst: InstId, input: InstId) -> bool {
        call_ok("inst_append_input", || graph.append_input(inst, input))
    }

    fn inst_visit_inputs(
        &self,
        graph: &Graph,
        inst: InstId,
        visitor: &mut dyn FnMut(InstId) -> bool,
    ) -> bool {
        call("inst_visit_inputs", || {
            Ok(visit(graph.inst(inst)?.inputs().iter().copied(), visitor))
        })
        .unwrap_or(false)
    }

    fn inst_get_user_count(&self, graph: &Graph, inst: InstId) -> usize {
        call("inst_get_user_count", || Ok(graph.inst(inst)?.user_count())).unwrap_or(0)
    }

    fn inst_visit_users(
        &self,
        graph: &Graph,
        inst: InstId,
        visitor: &mut dyn FnMut(InstId) -> bool,
    ) -> bool {
        call("inst_visit_users", || {
            Ok(visit(graph.inst(inst)?.users().iter().copied(), visitor))
        })
        .unwrap_or(false)
    }

    fn inst_replace_all_users(&self, graph: &mut Graph, old: InstId, new: InstId) -> bool {
        call_ok("inst_replace_all_users", || graph.replace_all_users(old, new))
    }

    fn inst_get_immediate(&self, graph: &Graph, inst: InstId, index: usize) -> Option<u64> {
        call("inst_get_immediate", || {
            graph
                .inst(inst)?
                .imms()
                .get(index)
                .copied()
                .ok_or_else(|| bad_argument!("{} has no immediate {}", inst, index))
        })
    }

    fn inst_set_immediate(&self, graph: &mut Graph, inst: InstId, index: usize, value: u64) -> bool {
        call_ok("inst_set_immediate", || graph.set_imm(inst, index, value))
    }

    fn inst_get_condition_code(&self, graph: &Graph, inst: InstId) -> Option<ConditionCode> {
        call("inst_get_condition_code", || {
            graph
                .inst(inst)?
                .condition_code()
                .ok_or_else(|| bad_argument!("{} has no condition code", inst))
        })
    }

    fn inst_set_condition_code(&self, graph: &mut Graph, inst: InstId, cc: ConditionCode) -> bool {
        call_ok("inst_set_condition_code", || graph.set_condition_code(inst, cc))
    }

    fn inst_get_constant(&self, graph: &Graph, inst: InstId) -> Option<ConstantValue> {
        call("inst_get_constant", || {
            graph
                .inst(inst)?
                .constant()
                .ok_or_else(|| bad_argument!("{} is not a constant", inst))
        })
    }

    fn inst_get_ic_slot(&self, graph: &Graph, inst: InstId) -> Option<u16> {
        call("inst_get_ic_slot", || {
            graph
                .inst(inst)?
                .ic_slot()
                .ok_or_else(|| bad_argument!("{} has no inline cache slot", inst))
        })
    }

    fn inst_dump(&self, graph: &Graph, inst: InstId) -> Option<String> {
        call("inst_dump", || Ok(graph.inst(inst)?.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::{get_graph_api_impl, get_last_error, ApiVersion, Status},
        graph::ConstantValue,
        isa::{ConditionCode, Target},
        test::graphs::{constant_chain, diamond, straight_line},
    };

    #[test]
    fn remove_with_users_is_bad_argument() {
        let (mut graph, _, insts) = constant_chain(Target::Dynamic, 3);
        let api = get_graph_api_impl(ApiVersion::V1).unwrap();

        assert!(!api.inst_remove(&mut graph, insts[1]));
        assert_eq!(get_last_error(), Status::BadArgument);
        assert_eq!(api.inst_get_user_count(&graph, insts[1]), 1);

        assert!(api.inst_remove(&mut graph, insts[2]));
        assert!(api.inst_remove(&mut graph, insts[1]));
        assert_eq!(get_last_error(), Status::NoError);
        assert_eq!(api.inst_get_user_count(&graph, insts[0]), 0);
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let (mut first, blocks, _) = diamond(Target::Static);
        let (second, _) = straight_line(Target::Static, 1);
        let api = get_graph_api_impl(ApiVersion::V1).unwrap();

        assert!(!api.bb_append_succ(&mut first, blocks[0], second.end()));
        assert_eq!(get_last_error(), Status::BadArgument);
        assert_eq!(api.bb_get_succ_count(&first, blocks[0]), 2);
    }

    #[test]
    fn branches_and_dominance() {
        let (graph, [top, left, right, merge], phi) = diamond(Target::Static);
        let api = get_graph_api_impl(ApiVersion::V1).unwrap();

        assert_eq!(api.bb_get_true_branch(&graph, top), Some(left));
        assert_eq!(api.bb_get_false_branch(&graph, top), Some(right));
        assert_eq!(api.bb_get_immediate_dominator(&graph, merge), Some(top));
        assert!(api.bb_check_dominance(&graph, top, merge));
        assert!(!api.bb_check_dominance(&graph, left, merge));

        let mut inputs = Vec::new();
        api.inst_visit_inputs(&graph, phi, &mut |input| {
            inputs.push(api.inst_get_constant(&graph, input).unwrap());
            true
        });
        assert_eq!(inputs, vec![ConstantValue::I32(1), ConstantValue::I32(2)]);

        let branch = api.bb_get_last_inst(&graph, top).unwrap();
        assert_eq!(api.inst_get_condition_code(&graph, branch), Some(ConditionCode::Eq));
        assert!(api.graph_verify(&graph));
    }

    #[test]
    fn condition_code_none_is_rejected() {
        let (mut graph, [top, ..], _) = diamond(Target::Static);
        let api = get_graph_api_impl(ApiVersion::V1).unwrap();
        let branch = api.bb_get_last_inst(&graph, top).unwrap();

        assert!(!api.inst_set_condition_code(&mut graph, branch, ConditionCode::None));
        assert_eq!(get_last_error(), Status::BadArgument);
        assert!(api.inst_set_condition_code(&mut graph, branch, ConditionCode::Ne));
        assert_eq!(api.inst_get_condition_code(&graph, branch), Some(ConditionCode::Ne));
    }

    #[test]
    fn rpo_walk_and_dump() {
        let (graph, blocks) = straight_line(Target::Dynamic, 3);
        let api = get_graph_api_impl(ApiVersion::V1).unwrap();

        let mut order = Vec::new();
        assert!(api.graph_visit_blocks_rpo(&graph, &mut |block| {
            order.push(block);
            true
        }));
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], graph.start());
        assert_eq!(&order[1..4], blocks.as_slice());
        assert_eq!(order[4], graph.end());

        assert!(api.graph_dump(&graph).contains(&blocks[1].to_string()));
        assert!(api.bb_dump(&graph, blocks[0]).is_some());
    }
}
