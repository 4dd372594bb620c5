//! Accumulator virtual machine.
//!
//! Executes the packed byte stream produced by the assembler: a single
//! accumulator register, a flat 1024-cell memory array, and a byte-offset
//! program counter walking a straight-line instruction stream. The
//! instruction set has no jumps or branches, so execution is a single linear
//! pass.
//!
//! The reference behavior places no width limit on the accumulator; this
//! implementation fixes the accumulator and memory cells at 64 bits
//! unsigned. Shift counts of 64 or more produce 0, matching the reference
//! semantics for large shifts.

use crate::errors::UvmError;
use crate::isa::Instruction;
use crate::operand::decode_operand;

/// Number of memory cells.
pub const MEMORY_SIZE: usize = 1024;

/// Byte-stream virtual machine with a single accumulator and flat memory.
pub struct Vm {
    /// Packed instruction stream to execute.
    data: Vec<u8>,
    /// Program counter (byte offset into the stream).
    pc: usize,
    /// Single general-purpose register.
    accumulator: u64,
    /// Flat memory array, zero-initialized.
    memory: Vec<u64>,
}

impl Vm {
    /// Creates a VM over the given byte stream with zeroed state.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pc: 0,
            accumulator: 0,
            memory: vec![0; MEMORY_SIZE],
        }
    }

    /// Executes instructions sequentially until the program counter reaches
    /// the end of the stream.
    pub fn run(&mut self) -> Result<(), UvmError> {
        while self.pc < self.data.len() {
            let offset = self.pc;
            let opcode = self.data[offset] & 0xF;
            let instr = Instruction::try_from(opcode)
                .map_err(|_| UvmError::InvalidInstruction { opcode, offset })?;
            self.exec(instr)?;
        }
        Ok(())
    }

    /// Final accumulator value.
    pub fn accumulator(&self) -> u64 {
        self.accumulator
    }

    /// Returns the half-open memory range `[start, end)`.
    pub fn memory_slice(&self, start: usize, end: usize) -> Result<&[u64], UvmError> {
        self.memory
            .get(start..end)
            .ok_or(UvmError::InvalidMemoryRange {
                spec: format!("{start}:{end}"),
            })
    }

    /// Reads the full encoded width of the instruction at the current pc,
    /// without advancing.
    ///
    /// The whole width is checked even when only a prefix is decoded, so a
    /// stream whose final instruction is truncated fails instead of silently
    /// ending.
    fn fetch(&self, count: usize) -> Result<&[u8], UvmError> {
        self.data
            .get(self.pc..self.pc + count)
            .ok_or(UvmError::UnexpectedEndOfBytecode {
                offset: self.pc,
                requested: count,
                available: self.data.len() - self.pc,
            })
    }

    /// Decodes the operand of the multi-byte instruction at the current pc.
    ///
    /// Always a little-endian read of bytes `[pc, pc+4)` shifted right by
    /// four, including for the big-endian `STORE_MEM`/`SHR` field; see
    /// [`decode_operand`] for why that reconstructs the address exactly.
    fn fetch_operand(&self, width: usize) -> Result<u32, UvmError> {
        let bytes = self.fetch(width)?;
        Ok(decode_operand([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Bounds-checked memory read.
    fn load(&self, address: u64) -> Result<u64, UvmError> {
        self.memory
            .get(address as usize)
            .copied()
            .ok_or(UvmError::OutOfBounds {
                address,
                size: MEMORY_SIZE,
            })
    }

    /// Bounds-checked memory write.
    fn store(&mut self, address: u64, value: u64) -> Result<(), UvmError> {
        let cell = self
            .memory
            .get_mut(address as usize)
            .ok_or(UvmError::OutOfBounds {
                address,
                size: MEMORY_SIZE,
            })?;
        *cell = value;
        Ok(())
    }

    /// Executes a single instruction.
    fn exec(&mut self, instr: Instruction) -> Result<(), UvmError> {
        match instr {
            Instruction::LoadConst => self.op_load_const(),
            Instruction::LoadMem => self.op_load_mem(),
            Instruction::StoreMem => self.op_store_mem(),
            Instruction::Shr => self.op_shr(),
        }
    }

    fn op_load_const(&mut self) -> Result<(), UvmError> {
        self.accumulator = self.fetch_operand(Instruction::LoadConst.size())? as u64;
        self.pc += Instruction::LoadConst.size();
        Ok(())
    }

    /// The accumulator's current value is the address to read.
    fn op_load_mem(&mut self) -> Result<(), UvmError> {
        self.accumulator = self.load(self.accumulator)?;
        self.pc += Instruction::LoadMem.size();
        Ok(())
    }

    fn op_store_mem(&mut self) -> Result<(), UvmError> {
        let address = self.fetch_operand(Instruction::StoreMem.size())?;
        self.store(address as u64, self.accumulator)?;
        self.pc += Instruction::StoreMem.size();
        Ok(())
    }

    fn op_shr(&mut self) -> Result<(), UvmError> {
        let address = self.fetch_operand(Instruction::Shr.size())?;
        let shift = self.load(address as u64)?;
        self.accumulator = if shift < u64::BITS as u64 {
            self.accumulator >> shift
        } else {
            0
        };
        self.pc += Instruction::Shr.size();
        Ok(())
    }
}

/// Parses a `start:end` colon-separated decimal pair into a half-open range
/// over the memory array.
pub fn parse_memory_range(spec: &str) -> Result<(usize, usize), UvmError> {
    let err = || UvmError::InvalidMemoryRange {
        spec: spec.to_string(),
    };

    let (start, end) = spec.split_once(':').ok_or_else(err)?;
    let start = start.trim().parse::<usize>().map_err(|_| err())?;
    let end = end.trim().parse::<usize>().map_err(|_| err())?;
    if start > end || end > MEMORY_SIZE {
        return Err(err());
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble_source;

    fn run_vm(source: &str) -> Vm {
        let assembly = assemble_source(source).expect("assembly failed");
        let mut vm = Vm::new(assembly.binary);
        vm.run().expect("vm run failed");
        vm
    }

    fn run_expect_err(source: &str) -> (Vm, UvmError) {
        let assembly = assemble_source(source).expect("assembly failed");
        let mut vm = Vm::new(assembly.binary);
        let err = vm.run().expect_err("expected execution error");
        (vm, err)
    }

    fn cell(vm: &Vm, index: usize) -> u64 {
        vm.memory_slice(index, index + 1).unwrap()[0]
    }

    #[test]
    fn shift_program_scenario() {
        let vm = run_vm("LOAD_CONST 7\nSTORE_MEM 3\nLOAD_CONST 2\nSHR 3\nSTORE_MEM 5\n");
        assert_eq!(cell(&vm, 3), 7);
        assert_eq!(cell(&vm, 5), 0); // 2 >> 7
        assert_eq!(vm.accumulator(), 0);
    }

    #[test]
    fn load_mem_reads_through_the_accumulator() {
        let vm = run_vm("LOAD_CONST 42\nSTORE_MEM 9\nLOAD_CONST 9\nLOAD_MEM");
        assert_eq!(vm.accumulator(), 42);
    }

    #[test]
    fn load_mem_on_empty_memory_yields_zero() {
        let vm = run_vm("LOAD_MEM");
        assert_eq!(vm.accumulator(), 0);
    }

    #[test]
    fn store_mem_address_wraps_modulo_4096() {
        // 4099 encodes as 3; the packing drops address bits 12 and above.
        let vm = run_vm("LOAD_CONST 7\nSTORE_MEM 4099");
        assert_eq!(cell(&vm, 3), 7);
    }

    #[test]
    fn shr_by_64_or_more_clears_the_accumulator() {
        let vm = run_vm("LOAD_CONST 100\nSTORE_MEM 1\nLOAD_CONST 5\nSHR 1");
        assert_eq!(vm.accumulator(), 0);
    }

    #[test]
    fn shr_by_zero_is_identity() {
        let vm = run_vm("LOAD_CONST 5\nSHR 0");
        assert_eq!(vm.accumulator(), 5);
    }

    #[test]
    fn accumulator_as_address_is_bounds_checked() {
        let (vm, err) = run_expect_err("LOAD_CONST 1024\nSTORE_MEM 0\nLOAD_MEM");
        // The store completed before the faulting load.
        assert_eq!(cell(&vm, 0), 1024);
        assert!(matches!(err, UvmError::OutOfBounds { address: 1024, .. }));
    }

    #[test]
    fn unknown_opcode_halts_with_memory_untouched() {
        let mut vm = Vm::new(vec![0x02]);
        let err = vm.run().expect_err("expected unknown opcode");
        assert!(matches!(
            err,
            UvmError::InvalidInstruction {
                opcode: 0x2,
                offset: 0
            }
        ));
        assert!(vm.memory_slice(0, MEMORY_SIZE).unwrap().iter().all(|&c| c == 0));
    }

    #[test]
    fn unknown_opcode_reports_its_offset() {
        // A valid LOAD_MEM followed by a bad byte.
        let mut vm = Vm::new(vec![0x05, 0x0E]);
        let err = vm.run().expect_err("expected unknown opcode");
        assert!(matches!(
            err,
            UvmError::InvalidInstruction {
                opcode: 0xE,
                offset: 1
            }
        ));
    }

    #[test]
    fn truncated_load_const_fails() {
        let mut vm = Vm::new(vec![0x7D, 0x00]);
        let err = vm.run().expect_err("expected truncation error");
        assert!(matches!(
            err,
            UvmError::UnexpectedEndOfBytecode {
                offset: 0,
                requested: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn truncated_store_mem_fails() {
        // STORE_MEM is 5 bytes; only 4 are present even though the operand
        // word itself is complete.
        let mut vm = Vm::new(vec![0x3C, 0x00, 0x00, 0x00]);
        let err = vm.run().expect_err("expected truncation error");
        assert!(matches!(
            err,
            UvmError::UnexpectedEndOfBytecode {
                offset: 0,
                requested: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn empty_stream_is_a_no_op() {
        let mut vm = Vm::new(Vec::new());
        vm.run().unwrap();
        assert_eq!(vm.accumulator(), 0);
    }

    #[test]
    fn large_immediates_round_trip_through_execution() {
        let vm = run_vm("LOAD_CONST 268435455\nSTORE_MEM 0"); // 2^28 - 1
        assert_eq!(cell(&vm, 0), (1 << 28) - 1);
    }

    #[test]
    fn memory_slice_bounds() {
        let vm = Vm::new(Vec::new());
        assert_eq!(vm.memory_slice(0, MEMORY_SIZE).unwrap().len(), MEMORY_SIZE);
        assert!(vm.memory_slice(5, 4).is_err());
        assert!(vm.memory_slice(0, MEMORY_SIZE + 1).is_err());
    }

    #[test]
    fn parse_memory_range_accepts_valid_pairs() {
        assert_eq!(parse_memory_range("0:10").unwrap(), (0, 10));
        assert_eq!(parse_memory_range("3:3").unwrap(), (3, 3));
        assert_eq!(parse_memory_range("0:1024").unwrap(), (0, 1024));
    }

    #[test]
    fn parse_memory_range_rejects_malformed_specs() {
        for spec in ["", "10", "a:b", "-1:4", "5:4", "0:1025", "1:2:3"] {
            assert!(
                matches!(
                    parse_memory_range(spec),
                    Err(UvmError::InvalidMemoryRange { .. })
                ),
                "{spec}"
            );
        }
    }
}
