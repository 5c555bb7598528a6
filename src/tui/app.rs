//! Debugger application state and logic.

use crate::Vm;
use crate::program::disasm::disassemble_instruction;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub vm: Vm,
    /// Original program for reset.
    pub program: Vec<i64>,
    /// Initial input queue for reset.
    pub initial_inputs: Vec<i64>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<i64>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program and queued inputs.
    pub fn new(program: Vec<i64>, inputs: Vec<i64>) -> Self {
        let mut vm = Vm::with_program(&program);
        for &value in &inputs {
            vm.add_input(value);
        }

        Self {
            vm,
            program,
            initial_inputs: inputs,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.vm.is_running() {
            self.status = format!("Machine halted: {:?}", self.vm.state);
            self.running = false;
            return;
        }

        // Disassemble before executing; the instruction may overwrite itself.
        let ip = self.vm.ip();
        let (text, _) = disassemble_instruction(self.vm.mem.cells(), ip as usize);

        match self.vm.step() {
            Ok(_) => {
                self.status = format!("ip={}: {}", ip, text);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.vm.is_running() {
            self.running = false;
            self.status = format!("Halted after {} cycles", self.vm.cycles);
            return;
        }

        // Check for breakpoint
        let ip = self.vm.ip();
        if self.breakpoints.contains(&ip) {
            self.running = false;
            self.status = format!("Breakpoint at ip={}", ip);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the current instruction pointer.
    pub fn toggle_breakpoint(&mut self) {
        let ip = self.vm.ip();
        if self.breakpoints.contains(&ip) {
            self.breakpoints.remove(&ip);
            self.status = format!("Removed breakpoint at ip={}", ip);
        } else {
            self.breakpoints.insert(ip);
            self.status = format!("Set breakpoint at ip={}", ip);
        }
    }

    /// Reset the machine to its initial state.
    pub fn reset(&mut self) {
        self.vm.load_program(&self.program);
        for &value in &self.initial_inputs {
            self.vm.add_input(value);
        }
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Get a disassembly window around the current instruction pointer.
    ///
    /// The listing is re-swept from address 0 on every call: Intcode
    /// programs self-modify, so yesterday's decode alignment may be stale.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(i64, String, bool)> {
        let cells = self.vm.mem.cells();
        let ip = self.vm.ip();

        let mut listing = Vec::new();
        let mut addr = 0usize;
        while addr < cells.len() {
            let (text, width) = disassemble_instruction(cells, addr);
            listing.push((addr as i64, text));
            addr += width;
        }

        let current = listing
            .iter()
            .position(|(a, _)| *a >= ip)
            .unwrap_or(listing.len().saturating_sub(1));
        let start = current.saturating_sub(lines / 2);

        listing
            .into_iter()
            .skip(start)
            .take(lines)
            .map(|(a, text)| (a, text, a == ip))
            .collect()
    }
}

/// Run the debugger with a program and initial inputs.
pub fn run_debugger(program: Vec<i64>, inputs: Vec<i64>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(program, inputs);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            if app.mem_scroll > 0 {
                                app.mem_scroll -= 1;
                            }
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < app.vm.mem.len() {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
