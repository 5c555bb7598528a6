//! WebAssembly bindings for the Intcode emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core machine.

use wasm_bindgen::prelude::*;
use crate::{Program, StopReason, Vm};
use crate::program::disasm::{disassemble, disassemble_instruction};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmVm {
    vm: Vm,
    program: Vec<i64>,
}

#[wasm_bindgen]
impl WasmVm {
    /// Create a new machine instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            vm: Vm::new(),
            program: Vec::new(),
        }
    }

    /// Load a program from comma-separated text. Returns the cell count.
    #[wasm_bindgen]
    pub fn load(&mut self, source: &str) -> Result<usize, JsError> {
        let program = Program::parse(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        self.program = program.values().to_vec();
        self.vm.load_program(&self.program);

        Ok(self.program.len())
    }

    /// Append one value to the input queue.
    #[wasm_bindgen]
    pub fn add_input(&mut self, value: i64) {
        self.vm.add_input(value);
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        // Disassemble before executing; the instruction may overwrite itself.
        let ip = self.vm.ip() as usize;
        let (text, _) = disassemble_instruction(self.vm.mem.cells(), ip);

        self.vm.step().map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(text)
    }

    /// Run until halt or max cycles. Returns the cycles executed.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.vm
            .run_limited(max_cycles as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Run until halt or input starvation. Returns "halted" or "needs_input".
    #[wasm_bindgen]
    pub fn run_until_blocked(&mut self) -> Result<String, JsError> {
        let stop = self
            .vm
            .run_until_blocked()
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(match stop {
            StopReason::Halted => "halted".to_string(),
            StopReason::NeedsInput => "needs_input".to_string(),
        })
    }

    /// Reset the machine to its initial state with the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.vm.load_program(&self.program);
    }

    /// Check if the machine is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.vm.is_running()
    }

    /// Check if the machine is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.vm.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.vm.cycles
    }

    /// Get the instruction pointer.
    #[wasm_bindgen]
    pub fn ip(&self) -> i64 {
        self.vm.ip()
    }

    /// Get the relative base register.
    #[wasm_bindgen]
    pub fn relative_base(&self) -> i64 {
        self.vm.relative_base()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.vm.state)
    }

    /// The full output sequence produced so far.
    #[wasm_bindgen]
    pub fn outputs(&self) -> Vec<i64> {
        self.vm.outputs().to_vec()
    }

    /// Drain the outputs appended since the last drain.
    #[wasm_bindgen]
    pub fn take_new_outputs(&mut self) -> Vec<i64> {
        self.vm.take_new_outputs()
    }

    /// Number of queued inputs not yet consumed.
    #[wasm_bindgen]
    pub fn pending_inputs(&self) -> usize {
        self.vm.pending_inputs().len()
    }

    /// Read one memory cell.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: i64) -> Result<i64, JsError> {
        self.vm
            .peek(addr)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Read a window of memory starting at `start`.
    #[wasm_bindgen]
    pub fn memory_window(&self, start: usize, count: usize) -> Vec<i64> {
        self.vm
            .mem
            .dump(start, count)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    /// JSON snapshot of the complete machine state.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.vm).map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmVm {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble program text to a readable listing.
#[wasm_bindgen]
pub fn wasm_disassemble(source: &str) -> Result<String, JsError> {
    let program = Program::parse(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(disassemble(program.values()))
}
