//! Instruction disassembly for the MICRO II.
//!
//! Converts words back to assembly source that re-assembles to the same
//! words. Memory operands are printed as absolute addresses inside the page
//! of the word being disassembled; a symbol table, when given, supplies
//! label names for addresses that are part of the image.

use std::fmt::Write as _;

use crate::decoder::{DecodedInstruction, Decoder, Operand};
use crate::fault::DecodeError;
use crate::image::{is_label_name, ProgramImage, SymbolTable};
use crate::memory::{compose_address, page_index};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled word.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address the word was read from.
    pub address: u8,
    /// Raw word.
    pub word: u8,
    /// Mnemonic, or `DATA` for an invalid encoding.
    pub mnemonic: String,
    /// Formatted operand; empty when the instruction has none.
    pub operand: String,
    /// Decode result for the word.
    pub decoded: Result<DecodedInstruction, DecodeError>,
}

impl DisassemblyRow {
    /// Whether the word is not a valid encoding.
    #[must_use]
    pub const fn is_illegal(&self) -> bool {
        self.decoded.is_err()
    }

    /// Source line for this row, without labels.
    #[must_use]
    pub fn render(&self) -> String {
        match (self.operand.is_empty(), self.is_illegal()) {
            (_, true) => format!("{} {} # invalid opcode", self.mnemonic, self.operand),
            (true, false) => self.mnemonic.clone(),
            (false, false) => format!("{} {}", self.mnemonic, self.operand),
        }
    }
}

/// Absolute address a memory-reference operand names when the word sits at
/// `address`.
#[must_use]
pub const fn operand_address(address: u8, offset: u8) -> u8 {
    compose_address(page_index(address), offset)
}

/// Disassembles one word without symbols.
#[must_use]
pub fn disassemble_word(address: u8, word: u8) -> DisassemblyRow {
    disassemble_with(address, word, |_| None)
}

fn disassemble_with<'a>(
    address: u8,
    word: u8,
    label_for: impl Fn(u8) -> Option<&'a str>,
) -> DisassemblyRow {
    let decoded = Decoder::decode(word);
    let (mnemonic, operand) = match decoded {
        Ok(instruction) => {
            let operand = match instruction.operand {
                Operand::Memory { offset, indirect } => {
                    let target = operand_address(address, offset);
                    let marker = if indirect { "*" } else { "" };
                    label_for(target).map_or_else(
                        || format!("{marker}{target}"),
                        |label| format!("{marker}{label}"),
                    )
                }
                Operand::Device(device) => device.to_string(),
                Operand::None => String::new(),
            };
            (instruction.mnemonic.name().to_string(), operand)
        }
        Err(_) => ("DATA".to_string(), word.to_string()),
    };
    DisassemblyRow {
        address,
        word,
        mnemonic,
        operand,
        decoded,
    }
}

/// Disassembles every word of `image` in address order.
///
/// With `symbols`, operands that point at a labelled address inside the
/// image print the label. Names the assembler would reject are skipped.
#[must_use]
pub fn disassemble_rows(image: &ProgramImage, symbols: Option<&SymbolTable>) -> Vec<DisassemblyRow> {
    let label_for = |target: u8| {
        symbols
            .filter(|_| image.contains(target))
            .and_then(|table| source_labels_at(table, target).next())
    };
    image
        .iter()
        .map(|(address, word)| disassemble_with(address, word, label_for))
        .collect()
}

fn source_labels_at(table: &SymbolTable, address: u8) -> impl Iterator<Item = &str> + '_ {
    table
        .labels_at(address)
        .filter(|name| is_label_name(name))
}

/// Disassembles a slice of live memory starting at `start`.
///
/// Rows stop at the end of the address space.
#[must_use]
pub fn disassemble_memory(words: &[u8], start: u8) -> Vec<DisassemblyRow> {
    (start..=u8::MAX)
        .zip(words)
        .map(|(address, word)| disassemble_word(address, *word))
        .collect()
}

/// Renders `image` as assembly source.
///
/// Each contiguous block starts with an `ORG` line. With `symbols`, labels
/// whose address lies in the image are emitted before their word.
#[must_use]
pub fn disassemble(image: &ProgramImage, symbols: Option<&SymbolTable>) -> String {
    let rows = disassemble_rows(image, symbols);
    let mut out = String::new();
    let mut expected: Option<u8> = None;

    for row in &rows {
        if expected != Some(row.address) {
            let _ = writeln!(out, "ORG {}", row.address);
        }
        if let Some(table) = symbols {
            for label in source_labels_at(table, row.address) {
                let _ = writeln!(out, "{label}:");
            }
        }
        let _ = writeln!(out, "    {}", row.render());
        expected = row.address.checked_add(1);
    }
    out
}
