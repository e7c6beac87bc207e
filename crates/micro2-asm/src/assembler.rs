//! Top-level two-pass assembler pipeline.
//!
//! `parse_source` → `assign_addresses` (pass 1, aborts on the first error) →
//! `encode_pass2` (pass 2, collects every error) → [`AssembledProgram`].

use std::fs;
use std::path::Path;

use micro2_core::{ProgramImage, SymbolTable};

use crate::encoder::{encode_pass2, ListingEntry};
use crate::errors::{AssembleErrors, AssemblyError, AssemblyErrorKind};
use crate::parser::parse_source;
use crate::symbols::assign_addresses;

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    /// Sparse `(address, word)` image.
    pub image: ProgramImage,
    /// Label addresses.
    pub symbols: SymbolTable,
    /// Address-to-source cross-reference in source order.
    pub listing: Vec<ListingEntry>,
}

impl AssembledProgram {
    /// Source line that emitted the word at `address`.
    #[must_use]
    pub fn line_for(&self, address: u8) -> Option<usize> {
        self.listing
            .iter()
            .find(|entry| entry.address == address)
            .map(|entry| entry.line)
    }
}

/// Assembles source text.
///
/// # Errors
///
/// Returns a single error when parsing or pass 1 fails, or every pass-2
/// error otherwise.
pub fn assemble(source: &str) -> Result<AssembledProgram, AssembleErrors> {
    let parsed = parse_source(source)?;
    let assignment = assign_addresses(&parsed)?;
    let listing = encode_pass2(&assignment)?;

    let image = ProgramImage::from_pairs(listing.iter().map(|entry| (entry.address, entry.word)));

    Ok(AssembledProgram {
        image,
        symbols: assignment.symbols,
        listing,
    })
}

/// Reads and assembles a source file.
///
/// # Errors
///
/// Returns an [`AssemblyErrorKind::Io`] error (line 0) when the file cannot
/// be read, otherwise the errors of [`assemble`].
pub fn assemble_file(path: &Path) -> Result<AssembledProgram, AssembleErrors> {
    let source = fs::read_to_string(path).map_err(|error| {
        AssemblyError::new(
            0,
            AssemblyErrorKind::Io(format!("failed to read {}: {error}", path.display())),
        )
    })?;
    assemble(&source)
}
