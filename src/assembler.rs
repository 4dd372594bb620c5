//! Assembly language parser and binary encoder.
//!
//! Converts assembly source into the packed instruction stream plus a
//! parallel [`TraceRecord`] list, one record per source instruction in input
//! order. Uses [`for_each_instruction!`](crate::for_each_instruction) to
//! generate `parse_instruction` from the canonical instruction table, so the
//! parser, the encoder, and the VM can never disagree about the ISA.
//!
//! # Syntax
//!
//! ```text
//! MNEMONIC [operand]
//! ```
//!
//! - One instruction per line
//! - Mnemonics are uppercase (`LOAD_CONST`, `LOAD_MEM`, `STORE_MEM`, `SHR`)
//! - Operands are base-10 unsigned integers
//! - Blank lines are ignored; there are no comments or labels

use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::errors::UvmError;
use crate::for_each_instruction;
use crate::isa::Instruction;
use crate::operand::{encode_addr12, encode_imm28};
use crate::trace::TraceRecord;

/// Output of a successful assembly pass.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// Packed instruction byte stream.
    pub binary: Vec<u8>,
    /// One trace record per source instruction, in input order.
    pub trace: Vec<TraceRecord>,
}

/// Formats a compiler-style diagnostic for assembly failures.
fn render_assembly_diagnostic(
    file: &str,
    source: &str,
    line: usize,
    offset: usize,
    message: &str,
) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> {file}:{line}:{offset}");
    if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
        let _ = writeln!(diag, "{line:>4} | {}", text.trim_end_matches('\r'));
        let _ = writeln!(diag, "     | {}^", " ".repeat(offset.saturating_sub(1)));
    }
    diag
}

/// Emits a diagnostic to stderr for assembly errors.
fn log_assembly_error(file: &str, source: &str, err: &UvmError) {
    match err {
        UvmError::AssemblyError {
            line,
            offset,
            message,
        } => {
            eprintln!(
                "{}",
                render_assembly_diagnostic(file, source, *line, *offset, message)
            );
        }
        _ => eprintln!("error: {err}"),
    }
}

#[derive(Debug, Clone)]
struct Token<'a> {
    text: &'a str,
    /// 1-based column offset in the line.
    offset: usize,
}

/// Splits a line into whitespace-separated tokens with column offsets.
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token {
                    text: &line[s..i],
                    offset: s + 1,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(Token {
            text: &line[s..],
            offset: s + 1,
        });
    }

    out
}

/// Parses a base-10 unsigned operand.
fn parse_operand(tok: &str) -> Result<u32, UvmError> {
    tok.parse::<u32>().map_err(|_| UvmError::InvalidOperand {
        token: tok.to_string(),
    })
}

macro_rules! define_assembler {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => $kind:ident, $size:expr
        ),* $(,)?
    ) => {
        fn instruction_from_str(name: &str) -> Result<Instruction, UvmError> {
            match name {
                $( $mnemonic => Ok(Instruction::$name), )*
                _ => Err(UvmError::InvalidInstructionName {
                    name: name.to_string(),
                }),
            }
        }

        /// Parses one tokenized line, appends its encoding to `out`, and
        /// returns the trace record for the line.
        ///
        /// The operand is parsed before any bytes are emitted, so a failed
        /// line contributes nothing to `out`.
        fn parse_instruction(tokens: &[Token], out: &mut Vec<u8>) -> Result<TraceRecord, UvmError> {
            let instr = instruction_from_str(tokens[0].text)?;

            match instr {
                $(
                    Instruction::$name => {
                        const EXPECTED: usize = define_assembler!(@arity $kind);
                        if tokens.len() != EXPECTED + 1 {
                            return Err(UvmError::ArityMismatch {
                                instruction: tokens[0].text.to_string(),
                                expected: EXPECTED,
                                actual: tokens.len() - 1,
                            });
                        }

                        let start = out.len();
                        let operand = define_assembler!(@encode $kind, $opcode, tokens, out);
                        Ok(TraceRecord::new($mnemonic, operand, &out[start..]))
                    }
                ),*
            }
        }
    };

    // ---------- source arity ----------
    (@arity None)   => { 0usize };
    (@arity Imm28)  => { 1usize };
    (@arity Addr12) => { 1usize };

    // ---------- encoding ----------
    (@encode None, $opcode:expr, $tokens:ident, $out:ident) => {{
        $out.push($opcode);
        Option::<u32>::None
    }};

    (@encode Imm28, $opcode:expr, $tokens:ident, $out:ident) => {{
        let value = parse_operand($tokens[1].text)?;
        encode_imm28($opcode, value, $out);
        Some(value)
    }};

    (@encode Addr12, $opcode:expr, $tokens:ident, $out:ident) => {{
        let address = parse_operand($tokens[1].text)?;
        encode_addr12($opcode, address, $out);
        Some(address)
    }};
}

for_each_instruction!(define_assembler);

/// Assembles a full source string.
///
/// Any malformed line aborts the whole pass with a located error; no partial
/// output is produced.
pub fn assemble_source(source: &str) -> Result<Assembly, UvmError> {
    assemble_source_with_name(source, "<source>")
}

/// Assembles source with an associated filename for error diagnostics.
///
/// On failure, logs a compiler-style diagnostic to stderr with source
/// location information and propagates the error.
fn assemble_source_with_name(source: &str, source_name: &str) -> Result<Assembly, UvmError> {
    let result = assemble_lines(source);
    if let Err(err) = &result {
        log_assembly_error(source_name, source, err);
    }
    result
}

fn assemble_lines(source: &str) -> Result<Assembly, UvmError> {
    let mut assembly = Assembly::default();

    for (line_no, line) in source.lines().enumerate() {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        let record = parse_instruction(&tokens, &mut assembly.binary).map_err(|e| {
            UvmError::AssemblyError {
                line: line_no + 1,
                offset: tokens[0].offset,
                message: e.to_string(),
            }
        })?;
        assembly.trace.push(record);
    }

    Ok(assembly)
}

/// Convenience: assemble directly from a file path.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Assembly, UvmError> {
    let path_ref = path.as_ref();
    let source = fs::read_to_string(path_ref).map_err(|e| UvmError::IoError {
        path: path_ref.display().to_string(),
        reason: e.to_string(),
    })?;
    assemble_source_with_name(&source, &path_ref.display().to_string())
}
