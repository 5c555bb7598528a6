//! Instruction decoder for the Intcode machine.
//!
//! An instruction word packs an opcode in its two low decimal digits and
//! one addressing-mode digit per parameter in the digits above:
//!
//! ```text
//! ABCDE
//!   DE - two-digit opcode
//!    C - mode of parameter 1
//!    B - mode of parameter 2
//!    A - mode of parameter 3
//! ```
//!
//! Missing mode digits are zero, i.e. position mode.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Parameter addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// The parameter is an address; the operand lives at that address.
    Position,
    /// The parameter is the operand itself. Illegal for write targets.
    Immediate,
    /// The parameter plus the relative base forms the operand's address.
    Relative,
}

impl Mode {
    /// Decode a single mode digit.
    pub fn from_digit(digit: i64) -> Result<Self, DecodeError> {
        match digit {
            0 => Ok(Mode::Position),
            1 => Ok(Mode::Immediate),
            2 => Ok(Mode::Relative),
            _ => Err(DecodeError::UnknownMode(digit)),
        }
    }
}

/// The closed set of Intcode operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    /// dest := a + b
    Add,
    /// dest := a * b
    Multiply,
    /// dest := next queued input
    Input,
    /// append a to the output sequence
    Output,
    /// if cond != 0 then jump to target
    JumpIfTrue,
    /// if cond == 0 then jump to target
    JumpIfFalse,
    /// dest := 1 if a < b else 0
    LessThan,
    /// dest := 1 if a == b else 0
    Equals,
    /// relative base += a
    AdjustRelativeBase,
    /// stop execution
    Halt,
}

impl Opcode {
    /// Decode the low two digits of an instruction word.
    pub fn from_value(value: i64) -> Result<Self, DecodeError> {
        match value {
            1 => Ok(Opcode::Add),
            2 => Ok(Opcode::Multiply),
            3 => Ok(Opcode::Input),
            4 => Ok(Opcode::Output),
            5 => Ok(Opcode::JumpIfTrue),
            6 => Ok(Opcode::JumpIfFalse),
            7 => Ok(Opcode::LessThan),
            8 => Ok(Opcode::Equals),
            9 => Ok(Opcode::AdjustRelativeBase),
            99 => Ok(Opcode::Halt),
            _ => Err(DecodeError::UnknownOpcode(value)),
        }
    }

    /// Number of parameters the operation takes.
    ///
    /// The instruction pointer advances by `1 + operand_count()` unless a
    /// jump overwrites it.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustRelativeBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Assembly-style mnemonic, used by the disassembler and diagnostics.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Multiply => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustRelativeBase => "ARB",
            Opcode::Halt => "HLT",
        }
    }
}

/// A decoded instruction word: opcode plus per-parameter modes.
///
/// Only the mode digits covering the opcode's actual parameters are
/// validated; unused high digits are never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    opcode: Opcode,
    modes: [Mode; 3],
}

impl Instruction {
    /// Decode a full instruction word.
    pub fn decode(word: i64) -> Result<Self, DecodeError> {
        let opcode = Opcode::from_value(word % 100)?;

        let mut modes = [Mode::Position; 3];
        let mut digits = word / 100;
        for slot in modes.iter_mut().take(opcode.operand_count()) {
            *slot = Mode::from_digit(digits % 10)?;
            digits /= 10;
        }

        Ok(Self { opcode, modes })
    }

    /// The decoded operation.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Addressing mode of parameter `index` (0-based).
    pub fn mode(&self, index: usize) -> Mode {
        self.modes[index]
    }

    /// Width of the instruction in memory cells.
    pub fn width(&self) -> i64 {
        1 + self.opcode.operand_count() as i64
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(i64),

    #[error("unknown addressing mode digit {0}")]
    UnknownMode(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_add() {
        let instr = Instruction::decode(1).unwrap();
        assert_eq!(instr.opcode(), Opcode::Add);
        assert_eq!(instr.mode(0), Mode::Position);
        assert_eq!(instr.mode(1), Mode::Position);
        assert_eq!(instr.mode(2), Mode::Position);
        assert_eq!(instr.width(), 4);
    }

    #[test]
    fn test_decode_mixed_modes() {
        // 1002: MUL, param 1 position, param 2 immediate, param 3 position
        let instr = Instruction::decode(1002).unwrap();
        assert_eq!(instr.opcode(), Opcode::Multiply);
        assert_eq!(instr.mode(0), Mode::Position);
        assert_eq!(instr.mode(1), Mode::Immediate);
        assert_eq!(instr.mode(2), Mode::Position);
    }

    #[test]
    fn test_decode_relative_output() {
        // 204: OUT with a relative parameter
        let instr = Instruction::decode(204).unwrap();
        assert_eq!(instr.opcode(), Opcode::Output);
        assert_eq!(instr.mode(0), Mode::Relative);
        assert_eq!(instr.width(), 2);
    }

    #[test]
    fn test_decode_halt() {
        let instr = Instruction::decode(99).unwrap();
        assert_eq!(instr.opcode(), Opcode::Halt);
        assert_eq!(instr.width(), 1);
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(Instruction::decode(77), Err(DecodeError::UnknownOpcode(77)));
        assert_eq!(Instruction::decode(0), Err(DecodeError::UnknownOpcode(0)));
        assert_eq!(Instruction::decode(-1), Err(DecodeError::UnknownOpcode(-1)));
    }

    #[test]
    fn test_unknown_mode() {
        // 302: MUL with mode digit 3 on parameter 1
        assert_eq!(Instruction::decode(302), Err(DecodeError::UnknownMode(3)));
    }

    #[test]
    fn test_unused_mode_digits_ignored() {
        // HLT takes no parameters, so digits above the opcode are not
        // consulted even when they would be invalid modes.
        let instr = Instruction::decode(399).unwrap();
        assert_eq!(instr.opcode(), Opcode::Halt);
    }

    #[test]
    fn test_operand_counts() {
        assert_eq!(Opcode::Add.operand_count(), 3);
        assert_eq!(Opcode::JumpIfTrue.operand_count(), 2);
        assert_eq!(Opcode::Input.operand_count(), 1);
        assert_eq!(Opcode::Halt.operand_count(), 0);
    }
}
