//! TUI debugger for the Intcode emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Disassembly view tracking the instruction pointer
//! - Register and I/O state visualization
//! - Memory view with scrolling
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
