//! Instruction and directive encoding (pass 2).
//!
//! Resolves operands against the pass-1 symbol table and produces one word
//! per emitting line. Errors are collected across the whole program.

use micro2_core::{
    encode, page_offset, same_page, DecodedInstruction, Instruction, OperandShape, SymbolTable,
};

use crate::errors::{AssembleErrors, AssemblyError, AssemblyErrorKind};
use crate::parser::{is_valid_label, parse_number, Statement};
use crate::symbols::Assignment;

/// Highest device id addressable by `SFG`, `INP` and `OUT`.
const MAX_DEVICE_ID: i32 = 7;

/// One emitted word with its source cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Address the word is placed at.
    pub address: u8,
    /// Encoded word.
    pub word: u8,
    /// 1-based source line.
    pub line: usize,
    /// Source text without the comment.
    pub source: String,
}

/// Encodes every emitting line of a pass-1 assignment.
///
/// # Errors
///
/// Returns every encoding error found, in source order.
pub fn encode_pass2(assignment: &Assignment) -> Result<Vec<ListingEntry>, AssembleErrors> {
    let mut listing = Vec::new();
    let mut errors = AssembleErrors::new();

    for addressed in &assignment.lines {
        let Some(address) = addressed.address else {
            continue;
        };
        let parsed = &addressed.parsed;
        let word = match &parsed.statement {
            Statement::Data(value) => encode_data(value.as_deref(), &assignment.symbols),
            Statement::Instruction { mnemonic, operand } => {
                encode_instruction(mnemonic, operand.as_deref(), address, &assignment.symbols)
            }
            Statement::Empty | Statement::Org(_) => continue,
        };
        match word {
            Ok(word) => listing.push(ListingEntry {
                address,
                word,
                line: parsed.line,
                source: parsed.source.clone(),
            }),
            Err(kind) => errors.push(AssemblyError::new(parsed.line, kind)),
        }
    }

    if errors.is_empty() {
        Ok(listing)
    } else {
        Err(errors)
    }
}

/// Encodes a single instruction placed at `address`.
///
/// # Errors
///
/// Returns the reason the instruction cannot be encoded.
pub fn encode_instruction(
    mnemonic: &str,
    operand: Option<&str>,
    address: u8,
    symbols: &SymbolTable,
) -> Result<u8, AssemblyErrorKind> {
    let row = encode(mnemonic)?;
    match (row.operand_shape, operand) {
        (OperandShape::None, None) => Ok(DecodedInstruction::bare(row.mnemonic).encode()),
        (OperandShape::None, Some(_)) => Err(AssemblyErrorKind::UnexpectedOperand(
            row.mnemonic.name().to_string(),
        )),
        (_, None) => Err(AssemblyErrorKind::MissingOperand(
            row.mnemonic.name().to_string(),
        )),
        (OperandShape::PageAddress, Some(text)) => encode_memory(row, text, address, symbols),
        (OperandShape::DeviceId, Some(text)) => encode_device(row, text),
    }
}

fn encode_memory(
    row: Instruction,
    text: &str,
    address: u8,
    symbols: &SymbolTable,
) -> Result<u8, AssemblyErrorKind> {
    let (indirect, target_text) = split_indirect(text);
    let target = resolve_address(target_text, symbols)?;
    if !same_page(target, address) {
        return Err(AssemblyErrorKind::AddressOutOfRange(format!(
            "operand {target} is not in the page of address {address}"
        )));
    }
    Ok(DecodedInstruction::memory(row.mnemonic, page_offset(target), indirect).encode())
}

fn encode_device(row: Instruction, text: &str) -> Result<u8, AssemblyErrorKind> {
    let value =
        parse_number(text).ok_or_else(|| AssemblyErrorKind::InvalidLiteral(text.to_string()))?;
    if !(0..=MAX_DEVICE_ID).contains(&value) {
        return Err(AssemblyErrorKind::AddressOutOfRange(format!(
            "device id {value} is outside 0..=7"
        )));
    }
    let device = u8::try_from(value)
        .map_err(|_| AssemblyErrorKind::InvalidLiteral(text.to_string()))?;
    Ok(DecodedInstruction::device(row.mnemonic, device).encode())
}

fn encode_data(value: Option<&str>, symbols: &SymbolTable) -> Result<u8, AssemblyErrorKind> {
    let text = value.ok_or_else(|| {
        AssemblyErrorKind::MalformedDirective("DATA requires a value".into())
    })?;
    match parse_number(text) {
        Some(number) => data_word(number).ok_or_else(|| {
            AssemblyErrorKind::AddressOutOfRange(format!(
                "data value {number} is outside -128..=255"
            ))
        }),
        None => resolve_label(text, symbols),
    }
}

/// Word for a `DATA` value; negatives are stored as two's complement.
fn data_word(value: i32) -> Option<u8> {
    if value < 0 {
        i8::try_from(value).ok().map(|signed| signed.to_ne_bytes()[0])
    } else {
        u8::try_from(value).ok()
    }
}

/// Splits a `*X` or `(X)` indirect marker from an operand.
fn split_indirect(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('*') {
        return (true, rest.trim());
    }
    text.strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .map_or((false, text), |inner| (true, inner.trim()))
}

fn resolve_address(text: &str, symbols: &SymbolTable) -> Result<u8, AssemblyErrorKind> {
    match parse_number(text) {
        Some(value) => u8::try_from(value).map_err(|_| {
            AssemblyErrorKind::AddressOutOfRange(format!("address {value} is outside 0..=255"))
        }),
        None => resolve_label(text, symbols),
    }
}

fn resolve_label(text: &str, symbols: &SymbolTable) -> Result<u8, AssemblyErrorKind> {
    if !is_valid_label(text) {
        return Err(AssemblyErrorKind::InvalidLiteral(text.to_string()));
    }
    symbols
        .get(text)
        .ok_or_else(|| AssemblyErrorKind::UnresolvedLabel(text.to_ascii_uppercase()))
}
