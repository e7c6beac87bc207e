use thiserror::Error;

/// Error classes used by hosts to group core errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Binary content that is not a valid instruction encoding.
    Decode,
    /// Machine configuration or bank selection outside supported limits.
    Configuration,
    /// Mnemonic lookup against the opcode table failed.
    Lookup,
}

/// A word that does not correspond to any entry in the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodeError {
    /// Unassigned instruction encoding.
    #[error("invalid opcode 0x{0:02X}")]
    InvalidOpcode(u8),
}

impl DecodeError {
    /// Returns the raw word that failed to decode.
    #[must_use]
    pub const fn word(self) -> u8 {
        match self {
            Self::InvalidOpcode(word) => word,
        }
    }

    /// Returns the error class for this error.
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        ErrorClass::Decode
    }
}

/// Machine configuration violations.
///
/// `BankOutOfRange` is also latched by the execution engine when a program
/// selects a bank the machine does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConfigurationError {
    /// Selected bank id is not installed.
    #[error("bank {bank} is out of range (machine has {bank_count} banks)")]
    BankOutOfRange {
        /// Requested bank id.
        bank: u8,
        /// Number of installed banks.
        bank_count: u8,
    },
    /// Requested bank count is outside `1..=8`.
    #[error("unsupported bank count {0} (expected 1..=8)")]
    UnsupportedBankCount(u8),
    /// Device slot 0 is reserved for the memory selection register.
    #[error("device slot 0 is reserved for bank selection")]
    ReservedDeviceSlot,
    /// Device id is outside `0..=7`.
    #[error("device id {0} is out of range (expected 1..=7)")]
    DeviceOutOfRange(u8),
}

impl ConfigurationError {
    /// Returns the error class for this error.
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        ErrorClass::Configuration
    }
}

/// Mnemonic not present in the opcode table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("unknown mnemonic '{0}'")]
pub struct UnknownMnemonic(pub String);

impl UnknownMnemonic {
    /// Returns the error class for this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Lookup
    }
}
