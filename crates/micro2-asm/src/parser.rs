//! Assembly source line parser for labels, instructions, and directives.
//!
//! Converts raw source lines into [`ParsedLine`] items ready for address
//! assignment and encoding. Operands are kept as text here; numeric and
//! label resolution happens once addresses are known.

use micro2_core::is_label_name;

use crate::errors::{AssemblyError, AssemblyErrorKind};

/// Statement carried by a source line after its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Blank, comment-only, or label-only line.
    Empty,
    /// `ORG n`; the argument is kept raw for pass 1 to validate.
    Org(Option<String>),
    /// `DATA v`; the argument is resolved in pass 2.
    Data(Option<String>),
    /// Mnemonic line with an optional operand.
    Instruction {
        /// Upper-cased mnemonic spelling (not yet validated).
        mnemonic: String,
        /// Raw operand text.
        operand: Option<String>,
    },
}

impl Statement {
    /// Whether this statement occupies a word in the image.
    #[must_use]
    pub const fn emits_word(&self) -> bool {
        matches!(self, Self::Data(_) | Self::Instruction { .. })
    }
}

/// A single parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based source line number.
    pub line: usize,
    /// Upper-cased label defined on this line.
    pub label: Option<String>,
    /// Statement following the label.
    pub statement: Statement,
    /// Source text with the comment stripped, for listings.
    pub source: String,
}

/// Parses a whole source text, stopping at the first malformed line.
///
/// # Errors
///
/// Returns [`AssemblyErrorKind::InvalidLabel`] for a label that is not an
/// identifier or that spells a mnemonic or directive.
pub fn parse_source(source: &str) -> Result<Vec<ParsedLine>, AssemblyError> {
    source
        .lines()
        .enumerate()
        .map(|(index, text)| parse_line(index + 1, text))
        .collect()
}

/// Parses one source line.
///
/// # Errors
///
/// Returns [`AssemblyErrorKind::InvalidLabel`] as described on
/// [`parse_source`].
pub fn parse_line(line: usize, text: &str) -> Result<ParsedLine, AssemblyError> {
    let code = strip_comment(text).trim();

    let (label, rest) = match code.split_once(':') {
        Some((name, rest)) => {
            let name = name.trim();
            if !is_valid_label(name) {
                return Err(AssemblyError::new(
                    line,
                    AssemblyErrorKind::InvalidLabel(name.to_string()),
                ));
            }
            (Some(name.to_ascii_uppercase()), rest.trim())
        }
        None => (None, code),
    };

    Ok(ParsedLine {
        line,
        label,
        statement: parse_statement(rest),
        source: code.to_string(),
    })
}

fn parse_statement(text: &str) -> Statement {
    let mut parts = text.splitn(2, char::is_whitespace);
    let Some(head) = parts.next().filter(|head| !head.is_empty()) else {
        return Statement::Empty;
    };
    let operand = parts
        .next()
        .map(str::trim)
        .filter(|operand| !operand.is_empty())
        .map(str::to_string);

    let head = head.to_ascii_uppercase();
    match head.as_str() {
        "ORG" => Statement::Org(operand),
        "DATA" => Statement::Data(operand),
        _ => Statement::Instruction {
            mnemonic: head,
            operand,
        },
    }
}

fn strip_comment(text: &str) -> &str {
    text.find(['#', ';']).map_or(text, |index| &text[..index])
}

/// Returns `true` for an identifier that is not a reserved word.
#[must_use]
pub fn is_valid_label(name: &str) -> bool {
    is_label_name(name)
}

/// Parses a numeric literal: decimal, `0x` hex or `0b` binary, with an
/// optional leading `-`.
///
/// Returns `None` when the text is not a number.
#[must_use]
pub fn parse_number(text: &str) -> Option<i32> {
    let (negative, digits) = text
        .strip_prefix('-')
        .map_or((false, text), |rest| (true, rest));
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else {
        (10, lower.as_str())
    };
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i32::from_str_radix(body, radix).ok()?;
    if negative {
        magnitude.checked_neg()
    } else {
        Some(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{is_valid_label, parse_line, parse_number, parse_source, Statement};
    use crate::errors::AssemblyErrorKind;

    #[test]
    fn parses_instruction_with_operand() {
        let parsed = parse_line(3, "    add 20   # load H").expect("parses");
        assert_eq!(parsed.line, 3);
        assert_eq!(parsed.label, None);
        assert_eq!(
            parsed.statement,
            Statement::Instruction {
                mnemonic: "ADD".into(),
                operand: Some("20".into()),
            }
        );
        assert_eq!(parsed.source, "add 20");
    }

    #[test]
    fn parses_label_before_statement() {
        let parsed = parse_line(1, "loop: JMP *ptr ; back").expect("parses");
        assert_eq!(parsed.label.as_deref(), Some("LOOP"));
        assert_eq!(
            parsed.statement,
            Statement::Instruction {
                mnemonic: "JMP".into(),
                operand: Some("*ptr".into()),
            }
        );
    }

    #[test]
    fn label_only_line_is_empty_statement() {
        let parsed = parse_line(1, "START:").expect("parses");
        assert_eq!(parsed.label.as_deref(), Some("START"));
        assert_eq!(parsed.statement, Statement::Empty);
        assert!(!parsed.statement.emits_word());
    }

    #[test]
    fn parses_directives() {
        let lines = parse_source("ORG 16\nDATA 35\nDATA\n").expect("parses");
        assert_eq!(lines[0].statement, Statement::Org(Some("16".into())));
        assert_eq!(lines[1].statement, Statement::Data(Some("35".into())));
        assert_eq!(lines[2].statement, Statement::Data(None));
    }

    #[test]
    fn comment_lines_are_empty() {
        let lines = parse_source("# header\n\n   ; note").expect("parses");
        assert!(lines.iter().all(|line| line.statement == Statement::Empty));
        assert_eq!(lines.len(), 3);
    }

    #[rstest]
    #[case("1abc: HLT")]
    #[case("bad-name: HLT")]
    #[case("add: HLT")]
    #[case("ORG: HLT")]
    #[case(": HLT")]
    fn rejects_bad_labels(#[case] text: &str) {
        let error = parse_line(5, text).expect_err("label rejected");
        assert_eq!(error.line, 5);
        assert!(matches!(error.kind, AssemblyErrorKind::InvalidLabel(_)));
    }

    #[rstest]
    #[case("42", Some(42))]
    #[case("0x2A", Some(42))]
    #[case("0B101010", Some(42))]
    #[case("-1", Some(-1))]
    #[case("-0x80", Some(-128))]
    #[case("", None)]
    #[case("12a", None)]
    #[case("label", None)]
    #[case("0x", None)]
    #[case("0x-1", None)]
    #[case("0b+11", None)]
    #[case("+5", None)]
    #[case("-0x-80000000", None)]
    #[case("0b102", None)]
    #[case("99999999999", None)]
    fn number_literals(#[case] text: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_number(text), expected);
    }

    #[test]
    fn labels_follow_identifier_rules() {
        assert!(is_valid_label("_tmp1"));
        assert!(is_valid_label("Value"));
        assert!(!is_valid_label("hlt"));
        assert!(!is_valid_label("data"));
    }
}
