//! Disassembler for Intcode programs.
//!
//! Converts a memory image back to readable mnemonics. Intcode freely mixes
//! code and data, so the linear sweep emits `DAT` for any word that does not
//! decode and resynchronizes on the next cell.

use crate::vm::decode::{Instruction, Mode};

/// Disassemble the instruction at `addr`.
///
/// Returns the formatted line and the number of cells consumed (1 for a
/// word that does not decode).
pub fn disassemble_instruction(cells: &[i64], addr: usize) -> (String, usize) {
    let word = match cells.get(addr) {
        Some(w) => *w,
        None => return ("DAT 0".to_string(), 1),
    };

    let instr = match Instruction::decode(word) {
        Ok(instr) => instr,
        Err(_) => return (format!("DAT {}", word), 1),
    };

    let count = instr.opcode().operand_count();
    if addr + count >= cells.len() {
        // Operands run past the image; treat the word as data.
        return (format!("DAT {}", word), 1);
    }

    let mut text = instr.opcode().mnemonic().to_string();
    for i in 0..count {
        let value = cells[addr + 1 + i];
        if i == 0 {
            text.push(' ');
        } else {
            text.push_str(", ");
        }
        text.push_str(&format_operand(value, instr.mode(i)));
    }

    (text, 1 + count)
}

/// Disassemble a full memory image with addresses.
pub fn disassemble(cells: &[i64]) -> String {
    let mut output = String::new();
    let mut addr = 0;

    while addr < cells.len() {
        let (text, width) = disassemble_instruction(cells, addr);
        let raw: Vec<String> = cells[addr..(addr + width).min(cells.len())]
            .iter()
            .map(|w| w.to_string())
            .collect();
        output.push_str(&format!("{:>5}: {:<24} ; {}\n", addr, text, raw.join(",")));
        addr += width;
    }

    output
}

/// Format a single operand with its addressing-mode notation.
///
/// Position is `[n]`, immediate is the bare value, relative is `[base+n]`.
pub fn format_operand(value: i64, mode: Mode) -> String {
    match mode {
        Mode::Position => format!("[{}]", value),
        Mode::Immediate => format!("{}", value),
        Mode::Relative => {
            if value < 0 {
                format!("[base-{}]", -value)
            } else {
                format!("[base+{}]", value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_add() {
        let cells = [1, 9, 10, 3, 99];
        let (text, width) = disassemble_instruction(&cells, 0);
        assert_eq!(text, "ADD [9], [10], [3]");
        assert_eq!(width, 4);
    }

    #[test]
    fn test_disassemble_immediate_mul() {
        let cells = [1002, 4, 3, 4, 33];
        let (text, width) = disassemble_instruction(&cells, 0);
        assert_eq!(text, "MUL [4], 3, [4]");
        assert_eq!(width, 4);
    }

    #[test]
    fn test_disassemble_relative_output() {
        let cells = [204, -1, 99];
        let (text, width) = disassemble_instruction(&cells, 0);
        assert_eq!(text, "OUT [base-1]");
        assert_eq!(width, 2);
    }

    #[test]
    fn test_disassemble_halt() {
        let cells = [99];
        let (text, width) = disassemble_instruction(&cells, 0);
        assert_eq!(text, "HLT");
        assert_eq!(width, 1);
    }

    #[test]
    fn test_undecodable_word_is_data() {
        let cells = [42, 99];
        let (text, width) = disassemble_instruction(&cells, 0);
        assert_eq!(text, "DAT 42");
        assert_eq!(width, 1);
    }

    #[test]
    fn test_full_sweep_resynchronizes() {
        // ADD, then a data word, then HLT
        let cells = [1101, 1, 1, 5, 77, 99];
        let listing = disassemble(&cells);
        assert!(listing.contains("ADD 1, 1, [5]"));
        assert!(listing.contains("DAT 77"));
        assert!(listing.contains("HLT"));
    }

    #[test]
    fn test_addresses_in_listing() {
        let cells = [99];
        let listing = disassemble(&cells);
        assert!(listing.starts_with("    0: HLT"));
    }
}
