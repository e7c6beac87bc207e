use crate::fault::ConfigurationError;

/// Execution-state machine observed by hosts between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to fetch the next instruction.
    #[default]
    Running,
    /// `HLT` retired; only reset resumes execution.
    Halted,
    /// Error latched; no further progress is possible without reset.
    Faulted(ConfigurationError),
}

impl RunState {
    /// Returns the latched error, if this state is faulted.
    #[must_use]
    pub const fn latched_fault(self) -> Option<ConfigurationError> {
        match self {
            Self::Faulted(error) => Some(error),
            Self::Running | Self::Halted => None,
        }
    }

    /// Returns `true` when the halt instruction has retired.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Halted)
    }

    /// Returns `true` when the next step would fetch an instruction.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
