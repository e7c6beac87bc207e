use std::time::Duration;

use crate::decoder::{DecodedInstruction, Operand};

/// Memory-cycle phases that have fixed costs in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// Instruction fetch.
    Fetch,
    /// Direct operand resolution.
    DirectResolve,
    /// Indirect operand resolution through a pointer word.
    IndirectResolve,
}

/// Single source-of-truth cycle-cost table.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u8)] = &[
    (CycleCostKind::Fetch, 1),
    (CycleCostKind::DirectResolve, 1),
    (CycleCostKind::IndirectResolve, 2),
];

/// Clock rate of the reference front panel, in hertz.
pub const NOMINAL_CLOCK_HZ: u64 = 2_000_000;

/// Looks up the cycle cost for a cycle-cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> u8 {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
        .unwrap_or(1)
}

/// Total memory cycles for one instruction.
///
/// `None` stands for a word that did not decode; it costs the fetch only.
#[must_use]
pub fn instruction_cycles(instruction: Option<&DecodedInstruction>) -> u8 {
    let resolve = match instruction.map(|decoded| decoded.operand) {
        Some(Operand::Memory { indirect: false, .. }) => cycle_cost(CycleCostKind::DirectResolve),
        Some(Operand::Memory { indirect: true, .. }) => cycle_cost(CycleCostKind::IndirectResolve),
        Some(Operand::Device(_) | Operand::None) | None => 0,
    };
    cycle_cost(CycleCostKind::Fetch) + resolve
}

/// Wall-clock time `cycles` take at [`NOMINAL_CLOCK_HZ`].
///
/// The engine never sleeps; hosts that pace execution insert this delay
/// between steps.
#[must_use]
pub fn pacing_delay(cycles: u64) -> Duration {
    Duration::from_nanos(cycles.saturating_mul(1_000_000_000 / NOMINAL_CLOCK_HZ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::{cycle_cost, instruction_cycles, pacing_delay, CycleCostKind, CYCLE_COST_TABLE};
    use crate::decoder::DecodedInstruction;
    use crate::encoding::Mnemonic;

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = CYCLE_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), CYCLE_COST_TABLE.len());
    }

    #[test]
    fn resolve_adds_zero_one_or_two_cycles() {
        let bare = DecodedInstruction::bare(Mnemonic::Clr);
        let device = DecodedInstruction::device(Mnemonic::Out, 2);
        let direct = DecodedInstruction::memory(Mnemonic::Add, 4, false);
        let indirect = DecodedInstruction::memory(Mnemonic::Add, 4, true);

        assert_eq!(cycle_cost(CycleCostKind::Fetch), 1);
        assert_eq!(instruction_cycles(None), 1);
        assert_eq!(instruction_cycles(Some(&bare)), 1);
        assert_eq!(instruction_cycles(Some(&device)), 1);
        assert_eq!(instruction_cycles(Some(&direct)), 2);
        assert_eq!(instruction_cycles(Some(&indirect)), 3);
    }

    #[test]
    fn pacing_uses_nominal_clock() {
        assert_eq!(pacing_delay(0), Duration::ZERO);
        assert_eq!(pacing_delay(4), Duration::from_nanos(2_000));
        assert_eq!(pacing_delay(2_000_000), Duration::from_secs(1));
    }
}
