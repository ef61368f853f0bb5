//! Inline cache slot numbering.
//!
//! Instructions created through a factory carry [`crate::isa::IC_SLOT_PLACEHOLDER`]. Before a
//! graph is encoded every slot-owning instruction gets its final slot: `0, 1, 2, …` in layout
//! order, so the numbering of a function only depends on the shape of its graph.

use std::collections::HashMap;

use crate::{
    graph::{Graph, InstId},
    Error::NotSupported,
    Result,
};

/// Assigns slots to the slot-owning instructions of `order`, which lists instructions in
/// layout order.
///
/// # Errors
/// [`crate::Error::NotSupported`] if the function needs more slots than a `u16` can number.
pub(crate) fn allocate(graph: &Graph, order: &[InstId]) -> Result<HashMap<InstId, u16>> {
    let mut slots = HashMap::new();
    let mut next: u16 = 0;

    for inst in order {
        if !graph.inst(*inst)?.opcode().has_ic_slot() {
            continue;
        }
        slots.insert(*inst, next);
        next = next.checked_add(1).ok_or(NotSupported)?;
    }

    log::trace!("assigned {} ic slots in {}", slots.len(), graph.function());
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        isa::{DynamicOpcode, InstructionFactory, IC_SLOT_PLACEHOLDER},
        test::files::dynamic_sample,
    };

    #[test]
    fn slots_follow_order() {
        let file = dynamic_sample();
        let handle = file.find_function("handle").unwrap();
        let mut graph = file.create_empty_graph(handle).unwrap();
        let factory = file.dynamic_factory().unwrap();

        let undefined = factory
            .create(&mut graph, DynamicOpcode::LdUndefined, &[])
            .unwrap();
        let first = factory
            .create(&mut graph, DynamicOpcode::Add2, &[undefined, undefined])
            .unwrap();
        let second = factory.create_call(&mut graph, undefined, &[]).unwrap();
        let ret = factory.create_return(&mut graph, second).unwrap();
        assert_eq!(
            graph.inst(first).unwrap().ic_slot(),
            Some(IC_SLOT_PLACEHOLDER)
        );

        let slots = allocate(&graph, &[undefined, second, first, ret]).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[&second], 0);
        assert_eq!(slots[&first], 1);
        assert!(!slots.contains_key(&ret));
    }
}
