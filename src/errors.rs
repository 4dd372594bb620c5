use thiserror::Error;

/// Errors that can occur during assembly or execution.
#[derive(Debug, Error)]
pub enum UvmError {
    /// Unknown opcode nibble encountered in the byte stream.
    #[error("unknown opcode {opcode:#x} at byte offset {offset}")]
    InvalidInstruction { opcode: u8, offset: usize },
    /// Unrecognized instruction mnemonic during assembly.
    #[error("invalid instruction name: {name}")]
    InvalidInstructionName { name: String },
    /// Wrong number of operands for an instruction.
    #[error("{instruction} expects {expected} operand(s), got {actual}")]
    ArityMismatch {
        instruction: String,
        expected: usize,
        actual: usize,
    },
    /// Operand token is not a base-10 unsigned integer.
    #[error("invalid operand: {token}")]
    InvalidOperand { token: String },
    /// Assembly error with source location context.
    #[error("line {line}: {message}")]
    AssemblyError {
        line: usize,
        offset: usize,
        message: String,
    },
    /// Byte stream ended in the middle of an instruction.
    #[error(
        "unexpected end of bytecode at offset {offset}: needed {requested} bytes, {available} available"
    )]
    UnexpectedEndOfBytecode {
        offset: usize,
        requested: usize,
        available: usize,
    },
    /// Memory index outside the addressable array.
    #[error("memory address {address} out of bounds (memory size {size})")]
    OutOfBounds { address: u64, size: usize },
    /// Malformed or out-of-range `start:end` memory range.
    #[error("invalid memory range: {spec}")]
    InvalidMemoryRange { spec: String },
    /// Failed to serialize an output document.
    #[error("serialization error: {reason}")]
    SerializeError { reason: String },
    /// File I/O error with path context.
    #[error("io error on {path}: {reason}")]
    IoError { path: String, reason: String },
}
