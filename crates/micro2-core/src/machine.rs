//! Host-facing execution engine.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::{
    EmulatorConfig, ExecutionStats, RegisterSnapshot, RunPolicy, RunResult, StepOutcome,
    StepResult, StopReason, TraceSink,
};
use crate::bus::{Device, IoBus};
use crate::decoder::Decoder;
use crate::execute::step_one;
use crate::fault::ConfigurationError;
use crate::image::ProgramImage;
use crate::memory::Memory;
use crate::state::{MachineState, RunState};

/// A complete MICRO II: registers, banked memory, I/O bus and breakpoints.
///
/// Any number of machines can coexist; each owns its state exclusively.
#[derive(Debug)]
pub struct Machine {
    state: MachineState,
    config: EmulatorConfig,
    breakpoints: BTreeSet<u8>,
    suspended_at: Option<u8>,
    stats: ExecutionStats,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Creates a machine with the default configuration and an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: MachineState::default(),
            config: EmulatorConfig::default(),
            breakpoints: BTreeSet::new(),
            suspended_at: None,
            stats: ExecutionStats::default(),
        }
    }

    /// Creates a machine from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedBankCount`] when the config
    /// does not validate.
    pub fn with_config(config: EmulatorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            state: MachineState::with_config(&config)?,
            config,
            ..Self::new()
        })
    }

    /// Creates a default machine with the standard peripherals installed.
    #[must_use]
    pub fn with_standard_devices() -> Self {
        let mut machine = Self::new();
        machine.state.bus = IoBus::with_standard_devices();
        machine
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Writes `image` into the selected bank. Registers are not touched.
    pub fn load(&mut self, image: &ProgramImage) {
        for (address, word) in image.iter() {
            self.state.memory.write(address, word);
        }
    }

    /// Writes `image` into `bank`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BankOutOfRange`] when `bank` is not
    /// installed.
    pub fn load_into_bank(
        &mut self,
        bank: u8,
        image: &ProgramImage,
    ) -> Result<(), ConfigurationError> {
        self.state.memory.load_image(bank, image)
    }

    /// Returns registers, overflow, MSR and run state to power-on values.
    ///
    /// Memory, devices, breakpoints and the switch register are kept.
    pub fn reset(&mut self) {
        self.state.reset();
        self.suspended_at = None;
        self.stats = ExecutionStats::default();
    }

    /// Executes one instruction, unless a breakpoint suspends it first.
    ///
    /// On an already-halted machine this is a no-op that reports
    /// `halted_now`.
    pub fn step(&mut self) -> StepResult {
        self.step_checked(true)
    }

    /// Executes instructions until `policy` says to stop.
    pub fn run(&mut self, policy: RunPolicy) -> RunResult {
        self.run_until_stopped(policy, &AtomicBool::new(false))
    }

    /// Like [`Machine::run`], additionally returning [`StopReason::Stopped`]
    /// once `stop` is raised.
    ///
    /// `stop` is polled before each fetch, so the machine is always left
    /// between instructions.
    pub fn run_until_stopped(&mut self, policy: RunPolicy, stop: &AtomicBool) -> RunResult {
        let budget = match policy {
            RunPolicy::MaxSteps(steps) => Some(steps),
            RunPolicy::UntilHalt | RunPolicy::UntilBreakpoint => self.config.run_step_limit,
        };
        let mut steps = 0_u64;

        let stop_reason = loop {
            if let Some(fault) = self.state.run_state.latched_fault() {
                break StopReason::Faulted(fault);
            }
            if self.state.run_state.is_halted() {
                break StopReason::Halted;
            }
            if stop.load(Ordering::Relaxed) {
                break StopReason::Stopped;
            }
            if budget.is_some_and(|limit| steps >= limit) {
                break StopReason::StepLimit;
            }

            let result = self.step_checked(policy.honors_breakpoints());
            if result.breakpoint_hit {
                break StopReason::Breakpoint(result.pc_before);
            }
            steps += 1;
        };

        RunResult {
            steps,
            stop: stop_reason,
            pc: self.state.registers.pc(),
        }
    }

    fn step_checked(&mut self, honor_breakpoints: bool) -> StepResult {
        let pc_before = self.state.registers.pc();
        let mut result = StepResult {
            halted_now: self.state.run_state.is_halted(),
            pc_before,
            pc_after: pc_before,
            breakpoint_hit: false,
            instruction: None,
            cycles: 0,
            fault: self.state.run_state.latched_fault(),
        };
        if !self.state.run_state.is_running() {
            return result;
        }

        if honor_breakpoints
            && self.breakpoints.contains(&pc_before)
            && self.suspended_at != Some(pc_before)
        {
            self.suspended_at = Some(pc_before);
            result.breakpoint_hit = true;
            return result;
        }
        self.suspended_at = None;

        let word = self.state.memory.read(pc_before);
        let cycles = match step_one(&mut self.state) {
            StepOutcome::Retired { cycles } | StepOutcome::Halted { cycles } => cycles,
            StepOutcome::AlreadyHalted => 0,
            StepOutcome::Faulted(error) => {
                result.fault = Some(error);
                return result;
            }
        };

        self.stats.instructions += 1;
        self.stats.cycles += u64::from(cycles);
        result.instruction = Decoder::decode(word).ok();
        result.cycles = cycles;
        result.pc_after = self.state.registers.pc();
        result.halted_now = self.state.run_state.is_halted();
        result
    }

    /// Copy of every register, including the MSR.
    #[must_use]
    pub const fn registers(&self) -> RegisterSnapshot {
        let registers = &self.state.registers;
        RegisterSnapshot {
            ac: registers.ac(),
            pc: registers.pc(),
            ir: registers.ir(),
            mar: registers.mar(),
            mdr: registers.mdr(),
            msr: self.state.msr(),
            overflow: registers.overflow(),
        }
    }

    /// Words of the selected bank in `range`.
    #[must_use]
    pub fn inspect_memory(&self, range: RangeInclusive<u8>) -> Vec<u8> {
        self.state.memory.inspect(range).to_vec()
    }

    /// Banked memory.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.state.memory
    }

    /// Mutable banked memory, for hosts that patch words directly.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.state.memory
    }

    /// Adds a breakpoint; returns `false` when it was already set.
    pub fn set_breakpoint(&mut self, address: u8) -> bool {
        self.breakpoints.insert(address)
    }

    /// Removes a breakpoint; returns `false` when none was set.
    pub fn clear_breakpoint(&mut self, address: u8) -> bool {
        self.breakpoints.remove(&address)
    }

    /// Removes every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
        self.suspended_at = None;
    }

    /// Breakpoint addresses in ascending order.
    pub fn breakpoints(&self) -> impl Iterator<Item = u8> + '_ {
        self.breakpoints.iter().copied()
    }

    /// Installs `device` in slot `id`, returning the device it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ReservedDeviceSlot`] for slot 0 and
    /// [`ConfigurationError::DeviceOutOfRange`] for ids above 7.
    pub fn install_device(
        &mut self,
        id: u8,
        device: Box<dyn Device>,
    ) -> Result<Option<Box<dyn Device>>, ConfigurationError> {
        self.state.bus.install(id, device)
    }

    /// Removes the device in slot `id`.
    pub fn remove_device(&mut self, id: u8) -> Option<Box<dyn Device>> {
        self.state.bus.remove(id)
    }

    /// Returns every installed device to its power-on state.
    ///
    /// [`Machine::reset`] leaves devices alone; hosts that want a full
    /// power cycle call both.
    pub fn reset_devices(&mut self) {
        self.state.bus.reset_devices();
    }

    /// Borrows the device in slot `id` as its concrete type.
    #[must_use]
    pub fn device_as<T: Device>(&self, id: u8) -> Option<&T> {
        self.state.bus.device_as(id)
    }

    /// Mutably borrows the device in slot `id` as its concrete type.
    pub fn device_as_mut<T: Device>(&mut self, id: u8) -> Option<&mut T> {
        self.state.bus.device_as_mut(id)
    }

    /// I/O bus.
    #[must_use]
    pub const fn bus(&self) -> &IoBus {
        &self.state.bus
    }

    /// Mutable I/O bus.
    pub const fn bus_mut(&mut self) -> &mut IoBus {
        &mut self.state.bus
    }

    /// Sets the front-panel switch register.
    pub const fn set_switches(&mut self, value: u8) {
        self.state.switches = value;
    }

    /// Front-panel switch register.
    #[must_use]
    pub const fn switches(&self) -> u8 {
        self.state.switches
    }

    /// Sets the program counter.
    pub const fn set_pc(&mut self, pc: u8) {
        self.state.registers.set_pc(pc);
        self.suspended_at = None;
    }

    /// Sets the accumulator.
    pub const fn set_accumulator(&mut self, value: u8) {
        self.state.registers.set_ac(value);
    }

    /// LOAD ADDRESS: copies the switch register into the program counter.
    pub const fn panel_load_address(&mut self) {
        self.set_pc(self.state.switches);
    }

    /// LOAD DATA: deposits the switch register at the program counter and
    /// advances it.
    pub fn panel_deposit(&mut self) {
        let pc = self.state.registers.pc();
        let value = self.state.switches;
        self.state.memory.write(pc, value);
        self.state.registers.set_ir(value);
        self.state.registers.advance_pc(1);
        self.suspended_at = None;
    }

    /// DISPLAY: shows the word at the program counter in the instruction
    /// register and advances the program counter.
    pub fn panel_examine(&mut self) -> u8 {
        let pc = self.state.registers.pc();
        let value = self.state.memory.read(pc);
        self.state.registers.set_ir(value);
        self.state.registers.advance_pc(1);
        self.suspended_at = None;
        value
    }

    /// Running, halted or faulted.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.state.run_state
    }

    /// Returns `true` once `HLT` has retired.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.state.run_state.is_halted()
    }

    /// Counters accumulated since the last reset.
    #[must_use]
    pub const fn stats(&self) -> ExecutionStats {
        self.stats
    }

    /// Moves recorded trace events into `sink`, oldest first.
    pub fn drain_trace(&mut self, sink: &mut dyn TraceSink) {
        self.state.drain_trace(sink);
    }
}
