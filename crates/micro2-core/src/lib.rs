//! Core emulator crate for the MICRO II 8-bit minicomputer.

/// Banked memory, page geometry and address decomposition.
pub mod memory;
pub use memory::{
    compose_address, page_base, page_index, page_offset, same_page, Memory, BANK_SELECT_MASK,
    BANK_SIZE, MAX_BANKS, PAGES_PER_BANK, PAGE_SIZE,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    EmulatorConfig, ExecutionStats, RegisterSnapshot, RunPolicy, RunResult, StepOutcome,
    StepResult, StopReason, TraceEvent, TraceLog, TraceSink, DEFAULT_TRACE_CAPACITY,
};

/// Register file and machine state.
pub mod state;
pub use state::{as_signed, MachineState, Registers, RunState, SIGN_BIT};

/// Opcode table and mnemonic classification.
pub mod encoding;
pub use encoding::{
    decode, encode, Instruction, InstructionCategory, Mnemonic, OperandShape, DEVICE_ID_MASK,
    INDIRECT_BIT, OPCODE_TABLE, PAGE_OFFSET_MASK,
};

/// Instruction decoder with operand extraction.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, Operand};

/// Error taxonomy.
pub mod fault;
pub use fault::{ConfigurationError, DecodeError, ErrorClass, UnknownMnemonic};

/// Memory-cycle cost table and pacing helpers.
pub mod timing;
pub use timing::{
    cycle_cost, instruction_cycles, pacing_delay, CycleCostKind, CYCLE_COST_TABLE,
    NOMINAL_CLOCK_HZ,
};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, compute_effective_address, execute_instruction, step_one, ExecuteOutcome,
    ExecuteState, FlagsUpdate, ResolvedAddress,
};

/// Device capability and the eight-slot I/O bus.
pub mod bus;
pub use bus::{BusWrite, Device, IoBus, BANK_SELECT_DEVICE, DEVICE_SLOTS};

/// Standard peripherals.
pub mod peripherals;
pub use peripherals::{
    ConsoleInput, ConsoleOutput, DataSwitches, LedDisplay, PaperTape, CONSOLE_INPUT_SLOT,
    CONSOLE_OUTPUT_SLOT, DATA_SWITCHES_SLOT, LED_DISPLAY_SLOT, PAPER_TAPE_SLOT,
};

/// Sparse program images and symbol tables.
pub mod image;
pub use image::{is_label_name, ImageBlock, ProgramImage, SymbolTable};

/// Execution engine.
pub mod machine;
pub use machine::Machine;

/// Word and image disassembly.
pub mod disasm;
pub use disasm::{
    disassemble, disassemble_memory, disassemble_rows, disassemble_word, operand_address,
    DisassemblyRow,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
