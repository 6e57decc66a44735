use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Length of a legal-entity identifier, in digits.
pub const SIREN_LEN: usize = 9;

/// A validated 9-digit legal-entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Siren(String);

/// Raised when an input cannot be read as a 9-digit SIREN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a SIREN must contain exactly 9 digits, got {input:?}")]
pub struct SirenParseError {
    /// The offending input, as supplied by the caller.
    pub input: String,
}

impl Siren {
    /// Parses a SIREN, ignoring any non-digit characters in the input
    /// ("552 100 554" and "552.100.554" both parse).
    pub fn parse(raw: &str) -> Result<Self, SirenParseError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != SIREN_LEN {
            return Err(SirenParseError {
                input: raw.to_string(),
            });
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Siren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts every distinct SIREN from free text, in first-seen order.
///
/// ASCII spaces and tabs are skipped so human groupings ("481 986 446")
/// collapse into one digit run. A run counts only when it is exactly 9
/// digits long and bounded by non-digit context: a 10-digit run yields
/// nothing rather than a spurious 9-digit sub-window.
pub fn extract_sirens(text: &str) -> Vec<Siren> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Siren> = Vec::new();
    let mut run = String::new();

    // The trailing sentinel flushes a run that ends at end of input.
    for c in text.chars().chain(std::iter::once('\n')) {
        if c == ' ' || c == '\t' {
            continue;
        }
        if c.is_ascii_digit() {
            run.push(c);
            continue;
        }
        if run.len() == SIREN_LEN && !seen.contains(run.as_str()) {
            seen.insert(run.clone());
            out.push(Siren(std::mem::take(&mut run)));
        }
        run.clear();
    }

    out
}

/// Runs [`extract_sirens`] over every stringified cell of a table.
///
/// Cells are joined with newlines before a single extraction pass, so
/// identifiers may sit in any column and adjacent cells can never merge
/// into one digit run. Traversal order only affects first-seen ordering,
/// never the result set.
pub fn extract_sirens_from_cells<I>(cells: I) -> Vec<Siren>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut text = String::new();
    for cell in cells {
        text.push_str(cell.as_ref());
        text.push('\n');
    }
    extract_sirens(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_separators() {
        let siren = Siren::parse(" 552 100 554 ").unwrap();
        assert_eq!(siren.as_str(), "552100554");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Siren::parse("12345678").unwrap_err();
        assert_eq!(err.input, "12345678");
        assert!(Siren::parse("1234567890").is_err());
        assert!(Siren::parse("").is_err());
    }
}
