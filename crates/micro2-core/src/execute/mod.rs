//! Instruction execution pipeline for the MICRO II.
//!
//! One step runs FETCH, DECODE, ADDRESS_RESOLVE and EXECUTE. Execution stages
//! its register, flag, memory and bank-selection effects in an
//! [`ExecuteState`]; [`commit_execution`] applies them afterwards. A bank
//! selection that names a missing bank is checked first, so a faulting
//! instruction commits nothing.

mod flags;
mod helpers;

pub use flags::FlagsUpdate;
pub use helpers::{compute_effective_address, ResolvedAddress};

use crate::api::{StepOutcome, TraceEvent};
use crate::bus::BusWrite;
use crate::decoder::{DecodedInstruction, Decoder, Operand};
use crate::encoding::Mnemonic;
use crate::fault::ConfigurationError;
use crate::state::{MachineState, RunState, SIGN_BIT};
use crate::timing::instruction_cycles;

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction retired.
    Retired {
        /// Memory cycles consumed.
        cycles: u8,
    },
    /// `HLT` retired; the machine must enter the halted state.
    Halted {
        /// Memory cycles consumed.
        cycles: u8,
    },
}

/// Side effects accumulated while executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Program counter after commit.
    pub next_pc: u8,
    /// New accumulator value.
    pub ac: Option<u8>,
    /// Overflow flag update.
    pub flags_update: FlagsUpdate,
    /// Pending `(address, value)` write to the selected bank.
    pub memory_write: Option<(u8, u8)>,
    /// Final memory address register value.
    pub mar: Option<u8>,
    /// Final memory data register value.
    pub mdr: Option<u8>,
    /// Bank requested by a write to device 0.
    pub bank_select: Option<u8>,
    /// `HLT` retired.
    pub halt: bool,
    /// A skip condition held and the next instruction is skipped.
    pub skipped: bool,
    /// Memory cycles consumed.
    pub cycles: u8,
}

impl ExecuteState {
    /// Creates an execute state that falls through to `next_pc`.
    #[must_use]
    pub fn new(next_pc: u8, cycles: u8) -> Self {
        Self {
            next_pc,
            cycles,
            ..Self::default()
        }
    }
}

/// Executes one decoded instruction fetched from the current program counter.
///
/// Device reads and writes happen here; every other effect is staged in the
/// returned [`ExecuteState`] for [`commit_execution`].
pub fn execute_instruction(
    instr: &DecodedInstruction,
    state: &mut MachineState,
) -> (ExecuteOutcome, ExecuteState) {
    let pc = state.registers.pc();
    let mut exec = ExecuteState::new(pc.wrapping_add(1), instruction_cycles(Some(instr)));

    match instr.mnemonic {
        Mnemonic::Jmp => {
            let resolved = resolve_operand(*instr, state, &mut exec, pc);
            exec.next_pc = resolved.effective;
        }
        Mnemonic::Str => {
            let resolved = resolve_operand(*instr, state, &mut exec, pc);
            let ac = state.registers.ac();
            exec.memory_write = Some((resolved.effective, ac));
            exec.mdr = Some(ac);
        }
        Mnemonic::Add => {
            let resolved = resolve_operand(*instr, state, &mut exec, pc);
            let operand = state.memory.read(resolved.effective);
            state.record(TraceEvent::MemoryAccess {
                address: resolved.effective,
                value: operand,
                is_write: false,
            });
            let (sum, overflow) = state.registers.ac().overflowing_add(operand);
            exec.ac = Some(sum);
            exec.mdr = Some(operand);
            exec.flags_update = FlagsUpdate::Overflow(overflow);
        }
        Mnemonic::Clr => exec.ac = Some(0),
        Mnemonic::Cmp => exec.ac = Some(!state.registers.ac()),
        Mnemonic::Rtl => exec.ac = Some(state.registers.ac().rotate_left(1)),
        Mnemonic::Rtr => exec.ac = Some(state.registers.ac().rotate_right(1)),
        Mnemonic::Ors => exec.ac = Some(state.registers.ac() | state.switches),
        Mnemonic::Nop => {}
        Mnemonic::Hlt => exec.halt = true,
        Mnemonic::Sno => skip_if(&mut exec, !state.registers.overflow()),
        Mnemonic::Sna => skip_if(&mut exec, state.registers.ac() != 0),
        Mnemonic::Szs => skip_if(&mut exec, state.registers.ac() & SIGN_BIT == 0),
        Mnemonic::Sfg => {
            let ready = state.bus.flag(device_operand(*instr));
            skip_if(&mut exec, ready);
        }
        Mnemonic::Inp => {
            let device = device_operand(*instr);
            let value = state.bus.read(device);
            state.record(TraceEvent::DeviceAccess {
                device,
                value,
                is_write: false,
            });
            exec.ac = Some(value);
        }
        Mnemonic::Out => execute_out(*instr, state, &mut exec),
    }

    if exec.halt {
        return (
            ExecuteOutcome::Halted {
                cycles: exec.cycles,
            },
            exec,
        );
    }

    (
        ExecuteOutcome::Retired {
            cycles: exec.cycles,
        },
        exec,
    )
}

/// Applies the staged side effects to the machine state.
///
/// # Errors
///
/// Returns [`ConfigurationError::BankOutOfRange`] when a staged bank
/// selection names a bank that is not installed. Nothing is applied in that
/// case.
pub fn commit_execution(
    state: &mut MachineState,
    exec: &ExecuteState,
) -> Result<(), ConfigurationError> {
    if let Some(bank) = exec.bank_select {
        state.memory.select_bank(bank)?;
        state.record(TraceEvent::BankSelected { bank });
    }

    if let Some(ac) = exec.ac {
        state.registers.set_ac(ac);
    }
    let overflow = exec.flags_update.apply(state.registers.overflow());
    state.registers.set_overflow(overflow);

    if let Some((address, value)) = exec.memory_write {
        state.memory.write(address, value);
        state.record(TraceEvent::MemoryAccess {
            address,
            value,
            is_write: true,
        });
    }

    if let Some(mar) = exec.mar {
        state.registers.set_mar(mar);
    }
    if let Some(mdr) = exec.mdr {
        state.registers.set_mdr(mdr);
    }
    state.registers.set_pc(exec.next_pc);
    Ok(())
}

/// Executes exactly one instruction at the current program counter.
///
/// Words that are not valid encodings execute as `NOP`. A halted or faulted
/// machine is left untouched.
pub fn step_one(state: &mut MachineState) -> StepOutcome {
    match state.run_state {
        RunState::Faulted(error) => return StepOutcome::Faulted(error),
        RunState::Halted => return StepOutcome::AlreadyHalted,
        RunState::Running => {}
    }

    let pc = state.registers.pc();
    let word = state.memory.read(pc);
    state.record(TraceEvent::InstructionStart { pc, word });
    state.registers.set_mar(pc);
    state.registers.set_mdr(word);
    state.registers.set_ir(word);

    let instruction = Decoder::decode(word).unwrap_or(DecodedInstruction::bare(Mnemonic::Nop));
    let (outcome, exec) = execute_instruction(&instruction, state);

    if let Err(error) = commit_execution(state, &exec) {
        state.run_state = RunState::Faulted(error);
        return StepOutcome::Faulted(error);
    }

    match outcome {
        ExecuteOutcome::Retired { cycles } => StepOutcome::Retired { cycles },
        ExecuteOutcome::Halted { cycles } => {
            state.run_state = RunState::Halted;
            state.record(TraceEvent::Halted { pc });
            StepOutcome::Halted { cycles }
        }
    }
}

fn resolve_operand(
    instr: DecodedInstruction,
    state: &mut MachineState,
    exec: &mut ExecuteState,
    pc: u8,
) -> ResolvedAddress {
    let (offset, indirect) = match instr.operand {
        Operand::Memory { offset, indirect } => (offset, indirect),
        Operand::Device(_) | Operand::None => (0, false),
    };
    let resolved = compute_effective_address(offset, indirect, pc, &state.memory);
    if let Some(pointer) = resolved.pointer {
        state.record(TraceEvent::MemoryAccess {
            address: resolved.direct,
            value: pointer,
            is_write: false,
        });
        exec.mdr = Some(pointer);
    }
    exec.mar = Some(resolved.effective);
    resolved
}

const fn device_operand(instr: DecodedInstruction) -> u8 {
    match instr.operand {
        Operand::Device(device) => device,
        Operand::Memory { .. } | Operand::None => 0,
    }
}

const fn skip_if(exec: &mut ExecuteState, condition: bool) {
    if condition {
        exec.next_pc = exec.next_pc.wrapping_add(1);
        exec.skipped = true;
    }
}

fn execute_out(instr: DecodedInstruction, state: &mut MachineState, exec: &mut ExecuteState) {
    let device = device_operand(instr);
    let value = state.registers.ac();
    match state.bus.write(device, value) {
        // Traced as `BankSelected` once the commit succeeds.
        BusWrite::BankSelect(bank) => exec.bank_select = Some(bank),
        BusWrite::Delivered | BusWrite::Unconnected => {
            state.record(TraceEvent::DeviceAccess {
                device,
                value,
                is_write: true,
            });
        }
    }
}
