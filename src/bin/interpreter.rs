//! Binary program interpreter CLI.
//!
//! Executes a packed binary stream against the virtual machine and writes
//! the requested memory sub-range as a YAML list of integers.
//!
//! # Usage
//! ```text
//! interpreter <input.bin> <result.yaml> <start:end>
//! ```
//!
//! # Arguments
//! - `input.bin`: Binary file produced by the assembler
//! - `result.yaml`: Output result file in YAML format
//! - `start:end`: Half-open memory range to report, e.g. `0:16`

use std::fs;
use std::path::Path;
use std::{env, process};

use uvm::trace::write_result;
use uvm::vm::{parse_memory_range, Vm};
use uvm::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
        print_usage(&args[0]);
        process::exit(0);
    }
    if args.len() != 4 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let result_path = &args[2];

    let (start, end) = match parse_memory_range(&args[3]) {
        Ok(range) => range,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if !Path::new(input_path).exists() {
        error!("Input file does not exist: {}", input_path);
        process::exit(1);
    }

    let binary = match fs::read(input_path) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read binary file: {}", e);
            process::exit(1);
        }
    };

    let mut vm = Vm::new(binary);
    if let Err(e) = vm.run() {
        error!("Execution failed: {}", e);
        process::exit(1);
    }

    let cells = match vm.memory_slice(start, end) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_result(result_path, cells) {
        error!("Failed to write result file: {}", e);
        process::exit(1);
    }

    info!(
        "Executed {} -> {} (memory[{}..{}])",
        input_path, result_path, start, end
    );
}

const USAGE: &str = "\
UVM Interpreter

USAGE:
    {program} <input.bin> <result.yaml> <start:end>

ARGS:
    <input.bin>     Binary file produced by the assembler
    <result.yaml>   Output result file in YAML format
    <start:end>     Half-open memory range to report, e.g. 0:16

OPTIONS:
    -h, --help      Print this help message
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
