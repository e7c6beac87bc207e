//! Architectural machine state.

/// Processor register file.
pub mod registers;
/// Host-observable execution state machine.
pub mod run_state;

pub use registers::{as_signed, Registers, SIGN_BIT};
pub use run_state::RunState;

use crate::api::{EmulatorConfig, TraceEvent, TraceLog, TraceSink};
use crate::bus::IoBus;
use crate::fault::ConfigurationError;
use crate::memory::Memory;

/// Everything one instruction can read or mutate.
///
/// The execution engine owns exactly one of these per machine; there is no
/// shared or global state.
#[derive(Debug)]
pub struct MachineState {
    /// Processor registers.
    pub registers: Registers,
    /// Banked memory and the memory selection register.
    pub memory: Memory,
    /// Device slots.
    pub bus: IoBus,
    /// Running, halted or faulted.
    pub run_state: RunState,
    /// Front-panel switch register, ORed into the accumulator by `ORS`.
    pub switches: u8,
    trace: Option<TraceLog>,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            registers: Registers::default(),
            memory: Memory::default(),
            bus: IoBus::new(),
            run_state: RunState::Running,
            switches: 0,
            trace: None,
        }
    }
}

impl MachineState {
    /// Creates a state sized and instrumented per `config`, with an empty bus.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedBankCount`] for an invalid
    /// bank count.
    pub fn with_config(config: &EmulatorConfig) -> Result<Self, ConfigurationError> {
        Ok(Self {
            memory: Memory::new(config.bank_count)?,
            trace: config
                .tracing_enabled
                .then(|| TraceLog::with_capacity(config.trace_capacity)),
            ..Self::default()
        })
    }

    /// Memory selection register.
    #[must_use]
    pub const fn msr(&self) -> u8 {
        self.memory.selected_bank()
    }

    /// Applies reset semantics: registers, overflow, MSR and run state return
    /// to power-on values; memory, devices and switches are kept.
    pub fn reset(&mut self) {
        self.registers = Registers::default();
        self.memory.reset_selection();
        self.run_state = RunState::Running;
        if let Some(trace) = &mut self.trace {
            trace.clear();
        }
    }

    /// Returns `true` when trace events are being recorded.
    #[must_use]
    pub const fn tracing_enabled(&self) -> bool {
        self.trace.is_some()
    }

    /// Records a trace event when tracing is enabled.
    pub fn record(&mut self, event: TraceEvent) {
        if let Some(trace) = &mut self.trace {
            trace.on_event(event);
        }
    }

    /// Moves every recorded event into `sink`, oldest first.
    pub fn drain_trace(&mut self, sink: &mut dyn TraceSink) {
        if let Some(trace) = &mut self.trace {
            trace.drain_into(sink);
        }
    }
}
