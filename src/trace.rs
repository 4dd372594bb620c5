//! Assembly trace records and structured output files.
//!
//! The assembler produces one [`TraceRecord`] per source instruction
//! describing the mnemonic, the resolved operand, and the exact bytes
//! emitted. The trace is a diagnostic side channel only; the interpreter
//! never reads it. The interpreter's result file uses the same YAML
//! serialization, so both writers live here.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::errors::UvmError;

/// One assembled instruction, as recorded in the trace file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    /// Instruction mnemonic as written in the source.
    pub command: String,
    /// Resolved operand as parsed from the source, before any truncation by
    /// the packing. Absent for `LOAD_MEM`; named `address` for the other
    /// three mnemonics regardless of the operand's role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    /// Emitted bytes as uppercase `0xNN` strings.
    pub bytes: Vec<String>,
}

impl TraceRecord {
    /// Builds a record from the bytes just emitted for one instruction.
    pub fn new(command: &str, address: Option<u32>, emitted: &[u8]) -> Self {
        Self {
            command: command.to_string(),
            address,
            bytes: emitted.iter().map(|b| format!("0x{:02X}", b)).collect(),
        }
    }
}

/// Serializes trace records to a YAML string.
pub fn trace_to_yaml(records: &[TraceRecord]) -> Result<String, UvmError> {
    to_yaml(records)
}

/// Serializes a memory sub-range to a YAML string.
pub fn result_to_yaml(cells: &[u64]) -> Result<String, UvmError> {
    to_yaml(cells)
}

/// Writes trace records to a YAML file.
pub fn write_trace<P: AsRef<Path>>(path: P, records: &[TraceRecord]) -> Result<(), UvmError> {
    write_yaml(path, &trace_to_yaml(records)?)
}

/// Writes a memory sub-range to a YAML file.
pub fn write_result<P: AsRef<Path>>(path: P, cells: &[u64]) -> Result<(), UvmError> {
    write_yaml(path, &result_to_yaml(cells)?)
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, UvmError> {
    serde_yaml::to_string(value).map_err(|e| UvmError::SerializeError {
        reason: e.to_string(),
    })
}

fn write_yaml<P: AsRef<Path>>(path: P, document: &str) -> Result<(), UvmError> {
    let path_ref = path.as_ref();
    fs::write(path_ref, document).map_err(|e| UvmError::IoError {
        path: path_ref.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_uppercase_with_prefix() {
        let record = TraceRecord::new("LOAD_CONST", Some(7), &[0x7D, 0x00, 0xFF, 0x0A]);
        assert_eq!(record.bytes, ["0x7D", "0x00", "0xFF", "0x0A"]);
    }

    #[test]
    fn yaml_includes_address_when_present() {
        let record = TraceRecord::new("STORE_MEM", Some(3), &[0x3C, 0x00, 0x00, 0x00, 0x00]);
        let yaml = trace_to_yaml(&[record]).unwrap();
        assert!(yaml.contains("command: STORE_MEM"));
        assert!(yaml.contains("address: 3"));
        assert!(yaml.contains("0x3C"));
    }

    #[test]
    fn yaml_omits_address_when_absent() {
        let record = TraceRecord::new("LOAD_MEM", None, &[0x05]);
        let yaml = trace_to_yaml(&[record]).unwrap();
        assert!(yaml.contains("command: LOAD_MEM"));
        assert!(!yaml.contains("address"));
    }

    #[test]
    fn result_yaml_is_a_sequence_of_integers() {
        let yaml = result_to_yaml(&[7, 0, 1024]).unwrap();
        let lines: Vec<&str> = yaml.lines().collect();
        assert_eq!(lines, ["- 7", "- 0", "- 1024"]);
    }
}
