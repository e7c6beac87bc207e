//! Pass-1 address assignment and symbol table construction.
//!
//! Walks parsed lines with a cursor, binds every label to the cursor and
//! assigns each emitting line its address. The result is an immutable
//! [`Assignment`] consumed by pass 2. Any error here aborts assembly.

use std::collections::{BTreeSet, HashMap};

use micro2_core::SymbolTable;

use crate::errors::{AssemblyError, AssemblyErrorKind};
use crate::parser::{parse_number, ParsedLine, Statement};

/// Highest addressable word within a bank.
const MAX_ADDRESS: u16 = 0xFF;

/// A parsed line together with the address it emits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedLine {
    /// Address of the emitted word; `None` for lines that emit nothing.
    pub address: Option<u8>,
    /// The parsed line.
    pub parsed: ParsedLine,
}

/// Output of pass 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Every source line with its assigned address.
    pub lines: Vec<AddressedLine>,
    /// Label addresses.
    pub symbols: SymbolTable,
}

/// Assigns addresses and collects labels.
///
/// # Errors
///
/// Returns the first structural error: a malformed or out-of-range `ORG`,
/// emitting past address 255, an `ORG` that re-emits an address, or a
/// duplicate label.
pub fn assign_addresses(lines: &[ParsedLine]) -> Result<Assignment, AssemblyError> {
    let mut cursor: u16 = 0;
    let mut symbols = SymbolTable::new();
    let mut defined_at: HashMap<String, usize> = HashMap::new();
    let mut emitted: BTreeSet<u8> = BTreeSet::new();
    let mut addressed = Vec::with_capacity(lines.len());

    for parsed in lines {
        let line = parsed.line;

        if let Statement::Org(argument) = &parsed.statement {
            cursor = org_target(line, argument.as_deref())?;
        }

        if let Some(label) = &parsed.label {
            if let Some(&first_line) = defined_at.get(label) {
                return Err(AssemblyError::new(
                    line,
                    AssemblyErrorKind::DuplicateLabel {
                        name: label.clone(),
                        first_line,
                    },
                ));
            }
            let address = checked_address(line, cursor, || format!("label '{label}' at {cursor}"))?;
            defined_at.insert(label.clone(), line);
            symbols.insert(label, address);
        }

        let address = if parsed.statement.emits_word() {
            let address = checked_address(line, cursor, || {
                format!("address {cursor} is past the end of the bank")
            })?;
            if !emitted.insert(address) {
                return Err(AssemblyError::new(
                    line,
                    AssemblyErrorKind::OverlappingOrigin(address),
                ));
            }
            cursor += 1;
            Some(address)
        } else {
            None
        };

        addressed.push(AddressedLine {
            address,
            parsed: parsed.clone(),
        });
    }

    Ok(Assignment {
        lines: addressed,
        symbols,
    })
}

fn org_target(line: usize, argument: Option<&str>) -> Result<u16, AssemblyError> {
    let text = argument.ok_or_else(|| {
        AssemblyError::new(
            line,
            AssemblyErrorKind::MalformedDirective("ORG requires an address".into()),
        )
    })?;
    let value = parse_number(text).ok_or_else(|| {
        AssemblyError::new(
            line,
            AssemblyErrorKind::MalformedDirective(format!("ORG address '{text}' is not a number")),
        )
    })?;
    u16::try_from(value)
        .ok()
        .filter(|target| *target <= MAX_ADDRESS)
        .ok_or_else(|| {
            AssemblyError::new(
                line,
                AssemblyErrorKind::AddressOutOfRange(format!("ORG {value} is outside 0..=255")),
            )
        })
}

fn checked_address(
    line: usize,
    cursor: u16,
    describe: impl FnOnce() -> String,
) -> Result<u8, AssemblyError> {
    u8::try_from(cursor)
        .map_err(|_| AssemblyError::new(line, AssemblyErrorKind::AddressOutOfRange(describe())))
}

#[cfg(test)]
mod tests {
    use super::assign_addresses;
    use crate::errors::AssemblyErrorKind;
    use crate::parser::parse_source;

    fn assign(source: &str) -> Result<super::Assignment, crate::errors::AssemblyError> {
        assign_addresses(&parse_source(source).expect("parses"))
    }

    #[test]
    fn assigns_sequential_addresses() {
        let assignment = assign("CLR\nADD 20\n\nHLT").expect("assigns");
        let addresses: Vec<_> = assignment.lines.iter().map(|line| line.address).collect();
        assert_eq!(addresses, vec![Some(0), Some(1), None, Some(2)]);
    }

    #[test]
    fn labels_bind_to_next_word() {
        let assignment = assign("START:\n  CLR\nORG 16\nVALUE: DATA 35\nEND:").expect("assigns");
        assert_eq!(assignment.symbols.get("START"), Some(0));
        assert_eq!(assignment.symbols.get("value"), Some(16));
        assert_eq!(assignment.symbols.get("END"), Some(17));
    }

    #[test]
    fn label_on_org_line_binds_after_origin() {
        let assignment = assign("HERE: ORG 40\nDATA 1").expect("assigns");
        assert_eq!(assignment.symbols.get("HERE"), Some(40));
    }

    #[test]
    fn rejects_duplicate_label_with_first_line() {
        let error = assign("A: CLR\nB: CLR\na: HLT").expect_err("duplicate");
        assert_eq!(error.line, 3);
        assert_eq!(
            error.kind,
            AssemblyErrorKind::DuplicateLabel {
                name: "A".into(),
                first_line: 1,
            }
        );
    }

    #[test]
    fn rejects_emitting_past_last_address() {
        let error = assign("ORG 255\nDATA 1\nDATA 2").expect_err("overflow");
        assert_eq!(error.line, 3);
        assert!(matches!(error.kind, AssemblyErrorKind::AddressOutOfRange(_)));
    }

    #[test]
    fn label_after_last_word_is_out_of_range() {
        let error = assign("ORG 255\nDATA 1\nEND:").expect_err("overflow");
        assert!(matches!(error.kind, AssemblyErrorKind::AddressOutOfRange(_)));
    }

    #[test]
    fn rejects_org_beyond_bank() {
        let error = assign("ORG 256").expect_err("out of range");
        assert!(matches!(error.kind, AssemblyErrorKind::AddressOutOfRange(_)));
        let error = assign("ORG -1").expect_err("out of range");
        assert!(matches!(error.kind, AssemblyErrorKind::AddressOutOfRange(_)));
    }

    #[test]
    fn rejects_malformed_org() {
        let error = assign("ORG").expect_err("missing");
        assert!(matches!(error.kind, AssemblyErrorKind::MalformedDirective(_)));
        let error = assign("ORG start").expect_err("not a number");
        assert!(matches!(error.kind, AssemblyErrorKind::MalformedDirective(_)));
        let error = assign("ORG 0b+11").expect_err("signed binary digits");
        assert!(matches!(error.kind, AssemblyErrorKind::MalformedDirective(_)));
        let error = assign("ORG 0x-1").expect_err("signed hex digits");
        assert!(matches!(error.kind, AssemblyErrorKind::MalformedDirective(_)));
    }

    #[test]
    fn rejects_overlapping_origin() {
        let error = assign("CLR\nHLT\nORG 1\nNOP").expect_err("overlap");
        assert_eq!(error.line, 4);
        assert_eq!(error.kind, AssemblyErrorKind::OverlappingOrigin(1));
    }

    #[test]
    fn org_backwards_into_free_space_is_allowed() {
        let assignment = assign("ORG 10\nHLT\nORG 0\nJMP 10").expect("assigns");
        assert_eq!(assignment.lines[3].address, Some(0));
    }
}
