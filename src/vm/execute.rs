//! Intcode execution engine.
//!
//! Implements the fetch-decode-execute cycle, the relative-base register,
//! and the cooperative suspend/resume contract that lets an external
//! orchestrator drive one or many machines incrementally.

use crate::vm::Memory;
use crate::vm::decode::{Instruction, Mode, Opcode, DecodeError};
use crate::vm::memory::MemoryError;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// VM execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// The machine can execute instructions.
    Running,
    /// The machine executed HALT (or has no program loaded).
    Halted,
}

/// Why `run_until_blocked` returned control to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The machine executed HALT.
    Halted,
    /// The next instruction is INPUT and the queue is exhausted. The
    /// instruction pointer is parked on that INPUT instruction; append
    /// input and call any run-mode to resume.
    NeedsInput,
}

/// The Intcode virtual machine.
///
/// Holds the complete resumable state: memory, instruction pointer,
/// relative base, input queue with read cursor, and output sequence.
/// Each `Vm` value is fully independent; wiring several together is the
/// caller's job (see [`crate::pipeline`]).
#[derive(Clone, Serialize, Deserialize)]
pub struct Vm {
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: VmState,
    /// Instruction count (for tracing and bounded runs).
    pub cycles: u64,
    ip: i64,
    relative_base: i64,
    inputs: Vec<i64>,
    input_cursor: usize,
    outputs: Vec<i64>,
    output_cursor: usize,
}

impl Vm {
    /// Create a VM with no program loaded. It stays Halted until
    /// [`load_program`](Self::load_program) is called.
    pub fn new() -> Self {
        Self {
            mem: Memory::new(),
            state: VmState::Halted,
            cycles: 0,
            ip: 0,
            relative_base: 0,
            inputs: Vec::new(),
            input_cursor: 0,
            outputs: Vec::new(),
            output_cursor: 0,
        }
    }

    /// Create a VM and load a program in one step.
    pub fn with_program(image: &[i64]) -> Self {
        let mut vm = Self::new();
        vm.load_program(image);
        vm
    }

    /// Load a program image, fully resetting the machine: instruction
    /// pointer and relative base to 0, input queue and output sequence
    /// emptied, cycle count cleared, state Running.
    pub fn load_program(&mut self, image: &[i64]) {
        self.mem.load_image(image);
        self.state = VmState::Running;
        self.cycles = 0;
        self.ip = 0;
        self.relative_base = 0;
        self.inputs.clear();
        self.input_cursor = 0;
        self.outputs.clear();
        self.output_cursor = 0;
    }

    /// Append one value to the input queue.
    pub fn add_input(&mut self, value: i64) {
        self.inputs.push(value);
    }

    /// Queued input values not yet consumed.
    pub fn pending_inputs(&self) -> &[i64] {
        &self.inputs[self.input_cursor..]
    }

    /// The full output sequence produced so far.
    pub fn outputs(&self) -> &[i64] {
        &self.outputs
    }

    /// Drain: return the outputs appended since the last drain and mark
    /// them seen. The full sequence stays available via
    /// [`outputs`](Self::outputs).
    pub fn take_new_outputs(&mut self) -> Vec<i64> {
        let fresh = self.outputs[self.output_cursor..].to_vec();
        self.output_cursor = self.outputs.len();
        fresh
    }

    /// Current instruction pointer.
    pub fn ip(&self) -> i64 {
        self.ip
    }

    /// Current relative base register.
    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    /// Check if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.state == VmState::Halted
    }

    /// Check if the machine can execute instructions.
    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }

    /// Read a memory cell without executing anything.
    pub fn peek(&self, addr: i64) -> Result<i64, MemoryError> {
        self.mem.read(addr)
    }

    /// Patch a memory cell without executing anything.
    pub fn poke(&mut self, addr: i64, value: i64) -> Result<(), MemoryError> {
        self.mem.write(addr, value)
    }

    /// Execute exactly one instruction.
    ///
    /// Fatal if the machine is already Halted, or if the next instruction
    /// is INPUT with an exhausted queue.
    pub fn step(&mut self) -> Result<Instruction, VmError> {
        if self.state != VmState::Running {
            return Err(VmError::NotRunning(self.state));
        }

        // Fetch and decode
        let word = self.mem.read(self.ip)?;
        let instr = Instruction::decode(word)
            .map_err(|source| VmError::Decode { ip: self.ip, source })?;

        // Execute
        self.execute(instr)?;

        self.cycles += 1;
        Ok(instr)
    }

    /// Run until HALT. INPUT with an exhausted queue is a caller contract
    /// violation and fails fatally rather than blocking.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, VmError> {
        if self.state != VmState::Running {
            return Err(VmError::NotRunning(self.state));
        }
        let start_cycles = self.cycles;

        while self.state == VmState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions. Stopping at the budget
    /// is not an error; input starvation still is.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, VmError> {
        if self.state != VmState::Running {
            return Err(VmError::NotRunning(self.state));
        }
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == VmState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run until HALT or until the next instruction is INPUT with an
    /// exhausted queue. Suspension is not an error: the instruction
    /// pointer stays on the INPUT instruction so the next call resumes
    /// the very same fetch.
    ///
    /// Calling this on an already-halted machine reports `Halted` rather
    /// than failing, so round-robin orchestrators need no pre-check.
    pub fn run_until_blocked(&mut self) -> Result<StopReason, VmError> {
        loop {
            if self.state == VmState::Halted {
                return Ok(StopReason::Halted);
            }
            if self.starved_on_input()? {
                return Ok(StopReason::NeedsInput);
            }
            self.step()?;
        }
    }

    /// True when the instruction at the IP is INPUT and no unread input
    /// remains.
    fn starved_on_input(&self) -> Result<bool, VmError> {
        if self.input_cursor < self.inputs.len() {
            return Ok(false);
        }
        let word = self.mem.read(self.ip)?;
        Ok(word % 100 == 3)
    }

    /// Execute one decoded instruction against memory and the registers.
    fn execute(&mut self, instr: Instruction) -> Result<(), VmError> {
        match instr.opcode() {
            Opcode::Add => {
                let a = self.operand(instr, 0)?;
                let b = self.operand(instr, 1)?;
                let dest = self.write_target(instr, 2)?;
                self.mem.write(dest, a + b)?;
                self.ip += instr.width();
            }

            Opcode::Multiply => {
                let a = self.operand(instr, 0)?;
                let b = self.operand(instr, 1)?;
                let dest = self.write_target(instr, 2)?;
                self.mem.write(dest, a * b)?;
                self.ip += instr.width();
            }

            Opcode::Input => {
                if self.input_cursor >= self.inputs.len() {
                    return Err(VmError::InputExhausted { ip: self.ip });
                }
                let value = self.inputs[self.input_cursor];
                self.input_cursor += 1;
                let dest = self.write_target(instr, 0)?;
                self.mem.write(dest, value)?;
                self.ip += instr.width();
            }

            Opcode::Output => {
                let a = self.operand(instr, 0)?;
                self.outputs.push(a);
                self.ip += instr.width();
            }

            Opcode::JumpIfTrue => {
                let cond = self.operand(instr, 0)?;
                let target = self.operand(instr, 1)?;
                if cond != 0 {
                    self.ip = target;
                } else {
                    self.ip += instr.width();
                }
            }

            Opcode::JumpIfFalse => {
                let cond = self.operand(instr, 0)?;
                let target = self.operand(instr, 1)?;
                if cond == 0 {
                    self.ip = target;
                } else {
                    self.ip += instr.width();
                }
            }

            Opcode::LessThan => {
                let a = self.operand(instr, 0)?;
                let b = self.operand(instr, 1)?;
                let dest = self.write_target(instr, 2)?;
                self.mem.write(dest, (a < b) as i64)?;
                self.ip += instr.width();
            }

            Opcode::Equals => {
                let a = self.operand(instr, 0)?;
                let b = self.operand(instr, 1)?;
                let dest = self.write_target(instr, 2)?;
                self.mem.write(dest, (a == b) as i64)?;
                self.ip += instr.width();
            }

            Opcode::AdjustRelativeBase => {
                let a = self.operand(instr, 0)?;
                self.relative_base += a;
                self.ip += instr.width();
            }

            Opcode::Halt => {
                self.state = VmState::Halted;
            }
        }

        Ok(())
    }

    /// Resolve a read parameter to its operand value.
    fn operand(&self, instr: Instruction, index: usize) -> Result<i64, VmError> {
        let raw = self.mem.read(self.ip + 1 + index as i64)?;
        let value = match instr.mode(index) {
            Mode::Position => self.mem.read(raw)?,
            Mode::Immediate => raw,
            Mode::Relative => self.mem.read(self.relative_base + raw)?,
        };
        Ok(value)
    }

    /// Resolve a destination parameter to a write address. Immediate mode
    /// never makes sense for a destination and fails fatally.
    fn write_target(&self, instr: Instruction, index: usize) -> Result<i64, VmError> {
        let raw = self.mem.read(self.ip + 1 + index as i64)?;
        match instr.mode(index) {
            Mode::Position => Ok(raw),
            Mode::Relative => Ok(self.relative_base + raw),
            Mode::Immediate => Err(VmError::ImmediateWriteTarget { ip: self.ip }),
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Vm {
    /// The current memory image in program text form (the to-string
    /// round-trip format).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mem)
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("state", &self.state)
            .field("ip", &self.ip)
            .field("relative_base", &self.relative_base)
            .field("cycles", &self.cycles)
            .field("pending_inputs", &self.pending_inputs().len())
            .field("outputs", &self.outputs.len())
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during VM execution.
///
/// All variants are unrecoverable at the VM layer; retries and fallbacks
/// belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("VM not running: {0:?}")]
    NotRunning(VmState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error at ip {ip}: {source}")]
    Decode {
        ip: i64,
        #[source]
        source: DecodeError,
    },

    #[error("INPUT at ip {ip} with no queued values")]
    InputExhausted { ip: i64 },

    #[error("immediate mode is illegal for a write target at ip {ip}")]
    ImmediateWriteTarget { ip: i64 },
}
