//! Instruction decoder for the MICRO II.
//!
//! Splits a word into its opcode-table row and operand fields. The decoded
//! form re-encodes to the exact word it came from.

use crate::encoding::{
    decode, Instruction, InstructionCategory, Mnemonic, OperandShape, DEVICE_ID_MASK,
    INDIRECT_BIT, PAGE_OFFSET_MASK,
};
use crate::fault::DecodeError;

/// Operand fields extracted from an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// Page-relative memory reference.
    Memory {
        /// Offset within the page (`0..=31`).
        offset: u8,
        /// Resolve through a pointer word.
        indirect: bool,
    },
    /// Device id (`0..=7`).
    Device(u8),
    /// No operand.
    None,
}

/// Decoded instruction with all extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Mnemonic selected by the opcode table.
    pub mnemonic: Mnemonic,
    /// Operand fields for this mnemonic's shape.
    pub operand: Operand,
}

impl DecodedInstruction {
    /// Builds a memory-reference instruction; the offset is masked to 5 bits.
    #[must_use]
    pub const fn memory(mnemonic: Mnemonic, offset: u8, indirect: bool) -> Self {
        Self {
            mnemonic,
            operand: Operand::Memory {
                offset: offset & PAGE_OFFSET_MASK,
                indirect,
            },
        }
    }

    /// Builds an I/O instruction; the device id is masked to 3 bits.
    #[must_use]
    pub const fn device(mnemonic: Mnemonic, device: u8) -> Self {
        Self {
            mnemonic,
            operand: Operand::Device(device & DEVICE_ID_MASK),
        }
    }

    /// Builds an instruction without operand.
    #[must_use]
    pub const fn bare(mnemonic: Mnemonic) -> Self {
        Self {
            mnemonic,
            operand: Operand::None,
        }
    }

    /// Opcode-table row for this instruction.
    #[must_use]
    pub const fn instruction(self) -> Instruction {
        self.mnemonic.instruction()
    }

    /// Execute category for this instruction.
    #[must_use]
    pub const fn category(self) -> InstructionCategory {
        self.mnemonic.instruction().category
    }

    /// Re-encodes this decoded instruction back to an 8-bit word.
    #[must_use]
    pub const fn encode(self) -> u8 {
        let opcode = self.mnemonic.instruction().opcode;
        match self.operand {
            Operand::Memory { offset, indirect } => {
                let marker = if indirect { INDIRECT_BIT } else { 0 };
                opcode | marker | (offset & PAGE_OFFSET_MASK)
            }
            Operand::Device(device) => opcode | (device & DEVICE_ID_MASK),
            Operand::None => opcode,
        }
    }
}

impl std::fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operand {
            Operand::Memory { offset, indirect } => {
                let marker = if indirect { "*" } else { "" };
                write!(f, "{} {marker}+{offset}", self.mnemonic)
            }
            Operand::Device(device) => write!(f, "{} {device}", self.mnemonic),
            Operand::None => write!(f, "{}", self.mnemonic),
        }
    }
}

/// Stateless instruction decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder;

impl Decoder {
    /// Decodes a single instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidOpcode`] when no opcode-table row
    /// matches the word.
    pub fn decode(word: u8) -> Result<DecodedInstruction, DecodeError> {
        let row = decode(word)?;
        let operand = match row.operand_shape {
            OperandShape::PageAddress => Operand::Memory {
                offset: word & PAGE_OFFSET_MASK,
                indirect: word & INDIRECT_BIT != 0,
            },
            OperandShape::DeviceId => Operand::Device(word & DEVICE_ID_MASK),
            OperandShape::None => Operand::None,
        };
        Ok(DecodedInstruction {
            mnemonic: row.mnemonic,
            operand,
        })
    }
}
