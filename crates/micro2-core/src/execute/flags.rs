/// Describes how the overflow flag changes after an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// Overflow keeps its value.
    #[default]
    None,
    /// Overflow is rewritten; only `ADD` does this.
    Overflow(bool),
}

impl FlagsUpdate {
    /// Applies the update to the current flag value.
    #[must_use]
    pub const fn apply(self, current: bool) -> bool {
        match self {
            Self::None => current,
            Self::Overflow(value) => value,
        }
    }
}
