//! Intcode program text format.
//!
//! A program is a single line of comma-separated signed decimal integers:
//!
//! ```text
//! 1,9,10,3,2,3,11,0,99,30,40,50
//! ```
//!
//! No embedded whitespace; a trailing newline from a file is tolerated.
//! `Display` reproduces the format exactly, so parse/format round-trips.

pub mod disasm;

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A parsed Intcode program: the initial memory image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    values: Vec<i64>,
}

impl Program {
    /// Build a program directly from values.
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    /// Parse program text.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            return Err(ProgramError::Parse {
                index: 0,
                message: "empty program".to_string(),
            });
        }

        let mut values = Vec::new();
        for (index, field) in trimmed.split(',').enumerate() {
            let value = field.parse::<i64>().map_err(|e| ProgramError::Parse {
                index,
                message: format!("bad value {:?}: {}", field, e),
            })?;
            values.push(value);
        }

        Ok(Self { values })
    }

    /// The initial memory image.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Number of cells in the image.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the program has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromStr for Program {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for value in &self.values {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        Ok(())
    }
}

/// Load a program from a text file.
pub fn load_program_file<P: AsRef<Path>>(path: P) -> Result<Program, ProgramError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ProgramError::Io(e.to_string()))?;
    Program::parse(&text)
}

/// Save a program to a text file.
pub fn save_program_file<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ProgramError> {
    std::fs::write(path.as_ref(), format!("{}\n", program))
        .map_err(|e| ProgramError::Io(e.to_string()))
}

/// Errors that can occur loading or parsing program text.
#[derive(Debug, Clone, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error at value {index}: {message}")]
    Parse { index: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_simple() {
        let program = Program::parse("1,0,0,3,99").unwrap();
        assert_eq!(program.values(), &[1, 0, 0, 3, 99]);
    }

    #[test]
    fn test_parse_negative_values() {
        let program = Program::parse("109,-7,204,0,99").unwrap();
        assert_eq!(program.values(), &[109, -7, 204, 0, 99]);
    }

    #[test]
    fn test_parse_tolerates_trailing_newline() {
        let program = Program::parse("99\n").unwrap();
        assert_eq!(program.values(), &[99]);

        let crlf = Program::parse("1,2,3\r\n").unwrap();
        assert_eq!(crlf.values(), &[1, 2, 3]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Program::parse("1,two,3").unwrap_err();
        match err {
            ProgramError::Parse { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_embedded_whitespace() {
        assert!(Program::parse("1, 2,3").is_err());
        assert!(Program::parse("").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let text = "1,9,10,3,2,3,11,0,99,30,40,50";
        let program: Program = text.parse().unwrap();
        assert_eq!(program.to_string(), text);
    }

    #[test]
    fn test_from_str() {
        let program: Program = "104,1125899906842624,99".parse().unwrap();
        assert_eq!(program.values(), &[104, 1125899906842624, 99]);
    }

    proptest! {
        #[test]
        fn prop_format_parse_roundtrip(values in prop::collection::vec(any::<i64>(), 1..200)) {
            let program = Program::new(values.clone());
            let reparsed = Program::parse(&program.to_string()).unwrap();
            prop_assert_eq!(reparsed.values(), values.as_slice());
        }
    }
}
