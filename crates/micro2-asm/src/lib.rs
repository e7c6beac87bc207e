//! MICRO II two-pass assembler library.

/// Top-level two-pass assembler pipeline.
pub mod assembler;
/// Pass-2 instruction and directive encoding.
pub mod encoder;
/// Line-tagged assembly error types.
pub mod errors;
/// Source line parser for labels, instructions, and directives.
pub mod parser;
/// Pass-1 address assignment and symbol table construction.
pub mod symbols;

pub use assembler::{assemble, assemble_file, AssembledProgram};
pub use encoder::{encode_pass2, ListingEntry};
pub use errors::{AssembleErrors, AssemblyError, AssemblyErrorKind};
pub use parser::{parse_source, ParsedLine, Statement};
pub use symbols::{assign_addresses, AddressedLine, Assignment};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tempfile as _;
