//! Structured error reporting for assembler phases.
//!
//! Every error is tagged with its 1-based source line. Pass 2 collects all of
//! its errors into an [`AssembleErrors`] so a caller sees every bad line at
//! once.
//!
//! # Error Format
//!
//! ```text
//! line 10: error: unresolved label 'LOOP'
//! program.m2:10: error: unresolved label 'LOOP'
//! ```

use std::fmt;
use std::path::Path;

use micro2_core::UnknownMnemonic;
use thiserror::Error;

/// Classification of assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum AssemblyErrorKind {
    /// Mnemonic is not in the opcode table.
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    /// Operand names a label that is never defined.
    #[error("unresolved label '{0}'")]
    UnresolvedLabel(String),
    /// Address, device id or data value does not fit its field.
    #[error("out of range: {0}")]
    AddressOutOfRange(String),
    /// `ORG` or `DATA` with a missing or unusable argument.
    #[error("malformed directive: {0}")]
    MalformedDirective(String),
    /// Label defined more than once.
    #[error("duplicate label '{name}' (first defined at line {first_line})")]
    DuplicateLabel {
        /// Label name.
        name: String,
        /// Line of the first definition.
        first_line: usize,
    },
    /// Label text is not an identifier or collides with a reserved word.
    #[error("invalid label '{0}'")]
    InvalidLabel(String),
    /// An address would receive a second word.
    #[error("address {0} is already emitted (overlapping ORG)")]
    OverlappingOrigin(u8),
    /// Instruction requires an operand but none was given.
    #[error("{0} requires an operand")]
    MissingOperand(String),
    /// Instruction takes no operand but one was given.
    #[error("{0} takes no operand")]
    UnexpectedOperand(String),
    /// Operand text is neither a number nor a label.
    #[error("invalid literal '{0}'")]
    InvalidLiteral(String),
    /// Source file could not be read.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<UnknownMnemonic> for AssemblyErrorKind {
    fn from(error: UnknownMnemonic) -> Self {
        Self::UnknownMnemonic(error.0)
    }
}

/// An assembly error tagged with its source line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyError {
    /// 1-based source line; 0 when the error is not tied to a line.
    pub line: usize,
    /// What went wrong.
    pub kind: AssemblyErrorKind,
}

impl AssemblyError {
    /// Creates an error at `line`.
    #[must_use]
    pub const fn new(line: usize, kind: AssemblyErrorKind) -> Self {
        Self { line, kind }
    }

    /// Formats the error with a file prefix for stderr output.
    #[must_use]
    pub fn format_for_file(&self, file: &Path) -> String {
        if self.line == 0 {
            format!("{}: error: {}", file.display(), self.kind)
        } else {
            format!("{}:{}: error: {}", file.display(), self.line, self.kind)
        }
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "error: {}", self.kind)
        } else {
            write!(f, "line {}: error: {}", self.line, self.kind)
        }
    }
}

impl std::error::Error for AssemblyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Every error reported by one assembly attempt, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembleErrors(pub Vec<AssemblyError>);

impl AssembleErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds an error.
    pub fn push(&mut self, error: AssemblyError) {
        self.0.push(error);
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns an iterator over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &AssemblyError> {
        self.0.iter()
    }

    /// Returns the first error, if any.
    #[must_use]
    pub fn first(&self) -> Option<&AssemblyError> {
        self.0.first()
    }

    /// Formats all errors with a file prefix, one per line.
    #[must_use]
    pub fn format_for_file(&self, file: &Path) -> String {
        self.0
            .iter()
            .map(|error| error.format_for_file(file))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<AssemblyError> for AssembleErrors {
    fn from(error: AssemblyError) -> Self {
        Self(vec![error])
    }
}

impl FromIterator<AssemblyError> for AssembleErrors {
    fn from_iter<T: IntoIterator<Item = AssemblyError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AssembleErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssembleErrors {}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use micro2_core::UnknownMnemonic;

    use super::{AssembleErrors, AssemblyError, AssemblyErrorKind};

    #[test]
    fn error_displays_line_tag() {
        let error = AssemblyError::new(3, AssemblyErrorKind::UnresolvedLabel("LOOP".into()));
        assert_eq!(error.to_string(), "line 3: error: unresolved label 'LOOP'");
    }

    #[test]
    fn file_format_prefixes_path() {
        let error = AssemblyError::new(7, AssemblyErrorKind::MissingOperand("ADD".into()));
        assert_eq!(
            error.format_for_file(Path::new("prog.m2")),
            "prog.m2:7: error: ADD requires an operand"
        );

        let io = AssemblyError::new(0, AssemblyErrorKind::Io("not found".into()));
        assert_eq!(
            io.format_for_file(Path::new("prog.m2")),
            "prog.m2: error: i/o error: not found"
        );
    }

    #[test]
    fn unknown_mnemonic_converts_from_core_error() {
        let kind = AssemblyErrorKind::from(UnknownMnemonic("FOO".into()));
        assert_eq!(kind, AssemblyErrorKind::UnknownMnemonic("FOO".into()));
    }

    #[test]
    fn collection_displays_one_error_per_line() {
        let errors: AssembleErrors = [
            AssemblyError::new(1, AssemblyErrorKind::UnknownMnemonic("FOO".into())),
            AssemblyError::new(4, AssemblyErrorKind::InvalidLiteral("1z".into())),
        ]
        .into_iter()
        .collect();

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "line 1: error: unknown mnemonic 'FOO'\nline 4: error: invalid literal '1z'"
        );
        assert_eq!(errors.first().map(|error| error.line), Some(1));
    }

    #[test]
    fn duplicate_label_message_names_first_line() {
        let kind = AssemblyErrorKind::DuplicateLabel {
            name: "START".into(),
            first_line: 2,
        };
        assert_eq!(
            kind.to_string(),
            "duplicate label 'START' (first defined at line 2)"
        );
    }
}
