//! Intcode Emulator - CLI Entry Point
//!
//! Commands:
//! - `intcode-emu run <program>` - Run a program to completion
//! - `intcode-emu debug <program>` - Interactive debugger
//! - `intcode-emu disasm <program>` - Disassemble a program
//! - `intcode-emu test` - Built-in self-test

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "intcode-emu")]
#[command(version = "0.1.0")]
#[command(about = "A virtual machine for comma-separated Intcode programs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the program file to execute
        program: String,
        /// Input value to queue before execution (repeatable)
        #[arg(short, long = "input")]
        inputs: Vec<i64>,
        /// Maximum number of cycles to run (default: 1000000)
        #[arg(short, long, default_value = "1000000")]
        max_cycles: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program file to debug
        program: String,
        /// Input value to queue before execution (repeatable)
        #[arg(short, long = "input")]
        inputs: Vec<i64>,
    },
    /// Disassemble a program to readable mnemonics
    Disasm {
        /// Path to the program file
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, inputs, max_cycles, trace }) => {
            run_program(&program, &inputs, max_cycles, trace);
        }
        Some(Commands::Debug { program, inputs }) => {
            debug_program(&program, &inputs);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Intcode Emulator v0.1.0");
            println!("A virtual machine for comma-separated Intcode programs");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_machine();
        }
    }
}

fn load_or_exit(path: &str) -> intcode::Program {
    match intcode::load_program_file(path) {
        Ok(program) => {
            println!("📂 Loaded {} cells", program.len());
            program
        }
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, inputs: &[i64], max_cycles: u64, trace: bool) {
    use intcode::{disassemble_instruction, Vm};

    println!("🔧 Running: {}", path);
    let program = load_or_exit(path);

    let mut vm = Vm::with_program(program.values());
    for &value in inputs {
        vm.add_input(value);
    }

    println!();
    println!("━━━ Execution ━━━");

    while vm.is_running() && vm.cycles < max_cycles {
        let ip = vm.ip();
        if trace {
            let (text, _) = disassemble_instruction(vm.mem.cells(), ip as usize);
            println!("{:>5}: {:<24} base={}", ip, text, vm.relative_base());
        }

        if let Err(e) = vm.step() {
            eprintln!("❌ VM error: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", vm.cycles);
    println!("State: {:?}", vm.state);
    if vm.outputs().is_empty() {
        println!("Outputs: (none)");
    } else {
        let rendered: Vec<String> = vm.outputs().iter().map(|v| v.to_string()).collect();
        println!("Outputs: {}", rendered.join(","));
    }

    if vm.is_running() && vm.cycles >= max_cycles {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

fn debug_program(path: &str, inputs: &[i64]) {
    use intcode::run_debugger;

    println!("🔍 Loading: {}", path);
    let program = load_or_exit(path);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(program.values().to_vec(), inputs.to_vec()) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn disassemble_file(path: &str) {
    use intcode::disassemble;

    println!("📖 Disassembling: {}", path);
    println!();

    let program = load_or_exit(path);
    println!("{}", disassemble(program.values()));
}

fn demo_machine() {
    use intcode::{Program, Vm};

    println!("━━━ Intcode Demo ━━━");
    println!();

    // Historic add/multiply program: computes 30 + 40*50 into cell 0.
    let program: Program = "1,9,10,3,2,3,11,0,99,30,40,50".parse().unwrap();
    let mut vm = Vm::with_program(program.values());
    vm.run().unwrap();
    println!("Program:     {}", program);
    println!("Final image: {}", vm);
    println!("Cell 0:      {}", vm.peek(0).unwrap());
    println!();

    // A quine: copies its own image to the output using relative mode.
    let quine: Program = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99"
        .parse()
        .unwrap();
    let mut vm = Vm::with_program(quine.values());
    vm.run().unwrap();
    let rendered: Vec<String> = vm.outputs().iter().map(|v| v.to_string()).collect();
    println!("Quine:       {}", quine);
    println!("Output:      {}", rendered.join(","));
    println!();

    println!("✓ Machine working!");
}

fn run_self_test() {
    use intcode::{run_series, StopReason, Vm};

    println!("━━━ Intcode Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // Test 1: add/multiply example program
    print!("Add/multiply example... ");
    let mut vm = Vm::with_program(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
    let ok = vm.run().is_ok() && vm.peek(0).unwrap() == 3500;
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 2: position-mode equality check
    print!("Position-mode equality... ");
    let mut ok = true;
    for (input, expected) in [(8, 1), (7, 0)] {
        let mut vm = Vm::with_program(&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8]);
        vm.add_input(input);
        if vm.run().is_err() || vm.outputs() != &[expected] {
            ok = false;
            break;
        }
    }
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 3: relative-mode quine
    print!("Relative-mode quine... ");
    let image = [109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99];
    let mut vm = Vm::with_program(&image);
    let ok = vm.run().is_ok() && vm.outputs() == &image;
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 4: 64-bit arithmetic
    print!("64-bit multiply... ");
    let mut vm = Vm::with_program(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0]);
    let ok = vm.run().is_ok()
        && vm.outputs().len() == 1
        && vm.outputs()[0].to_string().len() == 16;
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 5: suspend and resume
    print!("Suspend/resume contract... ");
    let mut vm = Vm::with_program(&[3, 9, 1002, 9, 2, 9, 4, 9, 99, 0]);
    let mut ok = vm.run_until_blocked() == Ok(StopReason::NeedsInput);
    vm.add_input(21);
    ok = ok
        && vm.run_until_blocked() == Ok(StopReason::Halted)
        && vm.take_new_outputs() == [42];
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 6: five-stage series pipeline
    print!("Series pipeline... ");
    let image = [3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];
    let ok = run_series(&image, &[4, 3, 2, 1, 0], 0) == Ok(43210);
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
