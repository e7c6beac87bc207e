//! Public host-facing API contracts for embedding the emulator core.

use std::collections::VecDeque;

use crate::decoder::DecodedInstruction;
use crate::fault::ConfigurationError;
use crate::memory::MAX_BANKS;
use crate::state::as_signed;

/// Default depth of the execution trace ring buffer.
pub const DEFAULT_TRACE_CAPACITY: usize = 100;

/// Top-level immutable configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EmulatorConfig {
    /// Installed memory banks (`1..=8`).
    pub bank_count: u8,
    /// Enables the trace ring buffer.
    pub tracing_enabled: bool,
    /// Events kept by the trace ring buffer before the oldest are dropped.
    pub trace_capacity: usize,
    /// Optional cap on instructions executed by unbounded run policies.
    pub run_step_limit: Option<u64>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bank_count: MAX_BANKS,
            tracing_enabled: false,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            run_step_limit: None,
        }
    }
}

impl EmulatorConfig {
    /// Checks that the configuration describes a buildable machine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedBankCount`] when the bank
    /// count is zero or above eight.
    pub const fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bank_count == 0 || self.bank_count > MAX_BANKS {
            return Err(ConfigurationError::UnsupportedBankCount(self.bank_count));
        }
        Ok(())
    }
}

/// Output status from one instruction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction retired.
    Retired {
        /// Memory cycles consumed.
        cycles: u8,
    },
    /// `HLT` retired on this step.
    Halted {
        /// Memory cycles consumed.
        cycles: u8,
    },
    /// The machine was already halted; nothing happened.
    AlreadyHalted,
    /// A configuration error is latched.
    Faulted(ConfigurationError),
}

/// Host-visible report of a single `step()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepResult {
    /// The machine is halted after this call.
    pub halted_now: bool,
    /// Program counter before the call.
    pub pc_before: u8,
    /// Program counter after the call.
    pub pc_after: u8,
    /// A breakpoint suspended execution before fetch.
    pub breakpoint_hit: bool,
    /// Decoded form of the executed word; `None` when nothing executed or the
    /// word was not a valid encoding.
    pub instruction: Option<DecodedInstruction>,
    /// Memory cycles consumed.
    pub cycles: u8,
    /// Latched configuration error, if any.
    pub fault: Option<ConfigurationError>,
}

/// Stop conditions for [`crate::Machine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPolicy {
    /// Execute at most this many instructions; breakpoints stop early.
    MaxSteps(u64),
    /// Execute until halt, running through breakpoints.
    UntilHalt,
    /// Execute until a breakpoint or halt.
    UntilBreakpoint,
}

impl RunPolicy {
    /// Returns `true` when breakpoints suspend this policy.
    #[must_use]
    pub const fn honors_breakpoints(self) -> bool {
        !matches!(self, Self::UntilHalt)
    }
}

/// Why a run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// `HLT` retired or the machine was already halted.
    Halted,
    /// Suspended before fetching at this address.
    Breakpoint(u8),
    /// The step budget ran out.
    StepLimit,
    /// The external stop flag was raised.
    Stopped,
    /// A configuration error is latched.
    Faulted(ConfigurationError),
}

/// Aggregated outcome from running multiple steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunResult {
    /// Instructions executed during this call.
    pub steps: u64,
    /// Why the run returned.
    pub stop: StopReason,
    /// Program counter when the run returned.
    pub pc: u8,
}

/// Copy of every processor register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterSnapshot {
    /// Accumulator.
    pub ac: u8,
    /// Program counter.
    pub pc: u8,
    /// Instruction register.
    pub ir: u8,
    /// Memory address register.
    pub mar: u8,
    /// Memory data register.
    pub mdr: u8,
    /// Memory selection register (selected bank).
    pub msr: u8,
    /// Overflow flag.
    pub overflow: bool,
}

impl RegisterSnapshot {
    /// Signed view of the accumulator.
    #[must_use]
    pub const fn ac_signed(&self) -> i8 {
        as_signed(self.ac)
    }
}

/// Counters accumulated since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecutionStats {
    /// Instructions executed.
    pub instructions: u64,
    /// Memory cycles consumed.
    pub cycles: u64,
}

/// Deterministic trace events recorded when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// Instruction fetch.
    InstructionStart {
        /// Address the word was fetched from.
        pc: u8,
        /// Raw instruction word.
        word: u8,
    },
    /// Operand or pointer access in the selected bank.
    MemoryAccess {
        /// Access target address.
        address: u8,
        /// Value read or written.
        value: u8,
        /// True for writes, false for reads.
        is_write: bool,
    },
    /// Device read or write through the bus. Slot 0 writes appear as
    /// [`TraceEvent::BankSelected`] instead.
    DeviceAccess {
        /// Device slot.
        device: u8,
        /// Value read or written.
        value: u8,
        /// True for writes, false for reads.
        is_write: bool,
    },
    /// Memory selection register changed.
    BankSelected {
        /// Newly selected bank.
        bank: u8,
    },
    /// `HLT` retired.
    Halted {
        /// Address of the halt instruction.
        pc: u8,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Bounded ring buffer of trace events; the oldest event is dropped when full.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceLog {
    events: VecDeque<TraceEvent>,
    capacity: usize,
}

impl TraceLog {
    /// Creates an empty log holding at most `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` when no events are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discards every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Moves every recorded event into `sink`, oldest first.
    pub fn drain_into(&mut self, sink: &mut dyn TraceSink) {
        for event in self.events.drain(..) {
            sink.on_event(event);
        }
    }
}

impl TraceSink for TraceLog {
    fn on_event(&mut self, event: TraceEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
