//! Assembly to binary compiler CLI.
//!
//! Reads an assembly source file and writes the packed binary stream plus a
//! per-instruction YAML trace.
//!
//! # Usage
//! ```text
//! assembler <input.asm> <output.bin> <trace.yaml>
//! ```
//!
//! # Arguments
//! - `input.asm`: Assembly source file to translate
//! - `output.bin`: Output binary file
//! - `trace.yaml`: Output trace file in YAML format

use std::fs;
use std::path::Path;
use std::{env, process};

use uvm::assembler::assemble_file;
use uvm::trace::write_trace;
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
    let output_path = &args[2];
    let trace_path = &args[3];

    if !Path::new(input_path).exists() {
        error!("Input file does not exist: {}", input_path);
        process::exit(1);
    }

    for out in [output_path, trace_path] {
        if let Some(parent) = Path::new(out).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                error!("Output directory does not exist: {}", parent.display());
                process::exit(1);
            }
        }
    }

    let assembly = match assemble_file(input_path) {
        Ok(a) => a,
        Err(e) => {
            error!("Assembly failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = fs::write(output_path, &assembly.binary) {
        error!("Failed to write binary file: {}", e);
        process::exit(1);
    }

    if let Err(e) = write_trace(trace_path, &assembly.trace) {
        error!("Failed to write trace file: {}", e);
        process::exit(1);
    }

    info!(
        "Assembled {} -> {} ({} bytes, {} instructions)",
        input_path,
        output_path,
        assembly.binary.len(),
        assembly.trace.len()
    );
}

const USAGE: &str = "\
UVM Assembler

USAGE:
    {program} <input.asm> <output.bin> <trace.yaml>

ARGS:
    <input.asm>     Assembly source file to translate
    <output.bin>    Output binary file
    <trace.yaml>    Output trace file in YAML format

OPTIONS:
    -h, --help      Print this help message
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
