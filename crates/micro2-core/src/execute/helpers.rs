//! Operand resolution for memory-reference instructions.

use crate::memory::{compose_address, page_index, Memory};

/// Addresses produced while resolving a memory-reference operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    /// Operand offset placed in the page of the instruction.
    pub direct: u8,
    /// Address the instruction finally operates on.
    pub effective: u8,
    /// Pointer word read from `direct`, for indirect operands.
    pub pointer: Option<u8>,
}

/// Computes the effective address of a page-relative operand.
///
/// `instruction_address` is where the instruction was fetched from; the
/// operand offset is placed in that page. An indirect operand reads the
/// word at the direct address from the selected bank and uses it as the
/// full 8-bit effective address.
#[must_use]
pub fn compute_effective_address(
    offset: u8,
    indirect: bool,
    instruction_address: u8,
    memory: &Memory,
) -> ResolvedAddress {
    let direct = compose_address(page_index(instruction_address), offset);
    if indirect {
        let pointer = memory.read(direct);
        ResolvedAddress {
            direct,
            effective: pointer,
            pointer: Some(pointer),
        }
    } else {
        ResolvedAddress {
            direct,
            effective: direct,
            pointer: None,
        }
    }
}
