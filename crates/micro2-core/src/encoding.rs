use crate::fault::{DecodeError, UnknownMnemonic};

/// Indirect-addressing marker of a memory-reference instruction.
pub const INDIRECT_BIT: u8 = 0b0010_0000;
/// Page-relative offset field of a memory-reference instruction.
pub const PAGE_OFFSET_MASK: u8 = 0b0001_1111;
/// Device id field of an I/O instruction.
pub const DEVICE_ID_MASK: u8 = 0b0000_0111;

/// The sixteen MICRO II mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Mnemonic {
    Jmp,
    Str,
    Add,
    Clr,
    Cmp,
    Rtl,
    Rtr,
    Ors,
    Nop,
    Hlt,
    Sno,
    Sna,
    Szs,
    Sfg,
    Inp,
    Out,
}

impl Mnemonic {
    /// Every mnemonic in opcode-table order.
    pub const ALL: [Self; 16] = [
        Self::Jmp,
        Self::Str,
        Self::Add,
        Self::Clr,
        Self::Cmp,
        Self::Rtl,
        Self::Rtr,
        Self::Ors,
        Self::Nop,
        Self::Hlt,
        Self::Sno,
        Self::Sna,
        Self::Szs,
        Self::Sfg,
        Self::Inp,
        Self::Out,
    ];

    /// Canonical upper-case spelling.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jmp => "JMP",
            Self::Str => "STR",
            Self::Add => "ADD",
            Self::Clr => "CLR",
            Self::Cmp => "CMP",
            Self::Rtl => "RTL",
            Self::Rtr => "RTR",
            Self::Ors => "ORS",
            Self::Nop => "NOP",
            Self::Hlt => "HLT",
            Self::Sno => "SNO",
            Self::Sna => "SNA",
            Self::Szs => "SZS",
            Self::Sfg => "SFG",
            Self::Inp => "INP",
            Self::Out => "OUT",
        }
    }

    /// Case-insensitive lookup by spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mnemonic| mnemonic.name().eq_ignore_ascii_case(name))
    }

    /// Returns the opcode-table row for this mnemonic.
    #[must_use]
    pub const fn instruction(self) -> Instruction {
        OPCODE_TABLE[self as usize]
    }
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Instruction categories with distinct execute semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionCategory {
    /// `JMP`, `STR`, `ADD`: page-relative operand with optional indirection.
    MemoryReference,
    /// Accumulator and machine-control operations without operand.
    RegisterControl,
    /// Conditional skip of the following instruction.
    Skip,
    /// Device flag test, input and output.
    Io,
}

/// Operand field carried by an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandShape {
    /// 5-bit page offset plus the indirect marker.
    PageAddress,
    /// 3-bit device id.
    DeviceId,
    /// No operand bits.
    None,
}

/// One immutable row of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Mnemonic for this row.
    pub mnemonic: Mnemonic,
    /// Encoding with every operand bit cleared.
    pub opcode: u8,
    /// Bits of the word that carry the operand.
    pub operand_mask: u8,
    /// Execute category.
    pub category: InstructionCategory,
    /// Operand field layout.
    pub operand_shape: OperandShape,
}

impl Instruction {
    const fn memory_reference(mnemonic: Mnemonic, opcode: u8) -> Self {
        Self {
            mnemonic,
            opcode,
            operand_mask: INDIRECT_BIT | PAGE_OFFSET_MASK,
            category: InstructionCategory::MemoryReference,
            operand_shape: OperandShape::PageAddress,
        }
    }

    const fn fixed(mnemonic: Mnemonic, opcode: u8, category: InstructionCategory) -> Self {
        Self {
            mnemonic,
            opcode,
            operand_mask: 0,
            category,
            operand_shape: OperandShape::None,
        }
    }

    const fn io(mnemonic: Mnemonic, opcode: u8) -> Self {
        Self {
            mnemonic,
            opcode,
            operand_mask: DEVICE_ID_MASK,
            category: InstructionCategory::Io,
            operand_shape: OperandShape::DeviceId,
        }
    }

    /// Returns `true` when `word` belongs to this row.
    #[must_use]
    pub const fn matches(&self, word: u8) -> bool {
        word & !self.operand_mask == self.opcode
    }
}

/// Single source-of-truth opcode table, indexed by `Mnemonic as usize`.
///
/// Any word no row matches is an invalid encoding.
pub const OPCODE_TABLE: [Instruction; 16] = [
    Instruction::memory_reference(Mnemonic::Jmp, 0b0000_0000),
    Instruction::memory_reference(Mnemonic::Str, 0b0100_0000),
    Instruction::memory_reference(Mnemonic::Add, 0b1000_0000),
    Instruction::fixed(Mnemonic::Clr, 0xC0, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Cmp, 0xC1, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Rtl, 0xC2, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Rtr, 0xC3, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Ors, 0xC4, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Nop, 0xC5, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Hlt, 0xC6, InstructionCategory::RegisterControl),
    Instruction::fixed(Mnemonic::Sno, 0xC8, InstructionCategory::Skip),
    Instruction::fixed(Mnemonic::Sna, 0xC9, InstructionCategory::Skip),
    Instruction::fixed(Mnemonic::Szs, 0xCA, InstructionCategory::Skip),
    Instruction::io(Mnemonic::Sfg, 0b1101_0000),
    Instruction::io(Mnemonic::Inp, 0b1110_0000),
    Instruction::io(Mnemonic::Out, 0b1111_0000),
];

const _: () = assert_table_order();

const fn assert_table_order() {
    let mut index = 0;
    while index < OPCODE_TABLE.len() {
        assert!(
            OPCODE_TABLE[index].mnemonic as usize == index,
            "opcode table is not indexed by mnemonic"
        );
        index += 1;
    }
}

/// Looks up the opcode-table row for a mnemonic spelling.
///
/// # Errors
///
/// Returns [`UnknownMnemonic`] when the spelling is not one of the sixteen
/// mnemonics.
pub fn encode(name: &str) -> Result<Instruction, UnknownMnemonic> {
    Mnemonic::from_name(name)
        .map(Mnemonic::instruction)
        .ok_or_else(|| UnknownMnemonic(name.to_string()))
}

/// Classifies an instruction word against the opcode table.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidOpcode`] for unassigned encodings.
pub fn decode(word: u8) -> Result<Instruction, DecodeError> {
    OPCODE_TABLE
        .iter()
        .find(|row| row.matches(word))
        .copied()
        .ok_or(DecodeError::InvalidOpcode(word))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::{
        decode, encode, InstructionCategory, Mnemonic, OperandShape, OPCODE_TABLE,
    };
    use crate::fault::{DecodeError, UnknownMnemonic};

    #[test]
    fn table_contains_sixteen_distinct_mnemonics_and_opcodes() {
        let mnemonics: HashSet<_> = OPCODE_TABLE.iter().map(|row| row.mnemonic).collect();
        let opcodes: HashSet<_> = OPCODE_TABLE.iter().map(|row| row.opcode).collect();
        assert_eq!(mnemonics.len(), 16);
        assert_eq!(opcodes.len(), 16);
    }

    #[test]
    fn every_word_matches_at_most_one_row() {
        for word in 0..=u8::MAX {
            let matches = OPCODE_TABLE.iter().filter(|row| row.matches(word)).count();
            assert!(matches <= 1, "word 0x{word:02X} matched {matches} rows");
        }
    }

    #[rstest]
    #[case("JMP", 0x00, InstructionCategory::MemoryReference, OperandShape::PageAddress)]
    #[case("str", 0x40, InstructionCategory::MemoryReference, OperandShape::PageAddress)]
    #[case("Add", 0x80, InstructionCategory::MemoryReference, OperandShape::PageAddress)]
    #[case("CLR", 0xC0, InstructionCategory::RegisterControl, OperandShape::None)]
    #[case("HLT", 0xC6, InstructionCategory::RegisterControl, OperandShape::None)]
    #[case("SNO", 0xC8, InstructionCategory::Skip, OperandShape::None)]
    #[case("szs", 0xCA, InstructionCategory::Skip, OperandShape::None)]
    #[case("SFG", 0xD0, InstructionCategory::Io, OperandShape::DeviceId)]
    #[case("INP", 0xE0, InstructionCategory::Io, OperandShape::DeviceId)]
    #[case("OUT", 0xF0, InstructionCategory::Io, OperandShape::DeviceId)]
    fn encode_returns_table_row(
        #[case] name: &str,
        #[case] opcode: u8,
        #[case] category: InstructionCategory,
        #[case] shape: OperandShape,
    ) {
        let row = encode(name).expect("known mnemonic");
        assert_eq!(row.opcode, opcode);
        assert_eq!(row.category, category);
        assert_eq!(row.operand_shape, shape);
    }

    #[test]
    fn encode_rejects_unknown_mnemonic() {
        assert_eq!(encode("LDA"), Err(UnknownMnemonic("LDA".into())));
        assert_eq!(encode(""), Err(UnknownMnemonic(String::new())));
    }

    #[rstest]
    #[case(0x3F, Mnemonic::Jmp)]
    #[case(0x65, Mnemonic::Str)]
    #[case(0xA1, Mnemonic::Add)]
    #[case(0xC5, Mnemonic::Nop)]
    #[case(0xC9, Mnemonic::Sna)]
    #[case(0xD7, Mnemonic::Sfg)]
    #[case(0xE1, Mnemonic::Inp)]
    #[case(0xF2, Mnemonic::Out)]
    fn decode_classifies_operand_carrying_words(#[case] word: u8, #[case] mnemonic: Mnemonic) {
        assert_eq!(decode(word).map(|row| row.mnemonic), Ok(mnemonic));
    }

    #[test]
    fn unassigned_words_are_invalid() {
        let invalid: Vec<u8> = (0..=u8::MAX).filter(|word| decode(*word).is_err()).collect();
        let expected: Vec<u8> = std::iter::once(0xC7)
            .chain(0xCB..=0xCF)
            .chain(0xD8..=0xDF)
            .chain(0xE8..=0xEF)
            .chain(0xF8..=0xFF)
            .collect();
        assert_eq!(invalid, expected);
        assert_eq!(decode(0xC7), Err(DecodeError::InvalidOpcode(0xC7)));
    }

    #[test]
    fn mnemonic_lookup_is_case_insensitive_and_roundtrips_names() {
        for mnemonic in Mnemonic::ALL {
            assert_eq!(Mnemonic::from_name(mnemonic.name()), Some(mnemonic));
            assert_eq!(
                Mnemonic::from_name(&mnemonic.name().to_ascii_lowercase()),
                Some(mnemonic)
            );
            assert_eq!(mnemonic.instruction().mnemonic, mnemonic);
        }
    }
}
