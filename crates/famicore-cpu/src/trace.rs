//! Execution trace lines in nestest.log format.
//!
//! One line per instruction, captured before the instruction executes:
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7
//! ```

use std::fmt;

use crate::addressing::AddrMode;
use crate::cpu::{Cpu, CpuRegisters};
use crate::opcodes::OPCODE_TABLE;
use crate::Bus;

/// Captured state of one instruction about to execute.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// Address of the opcode.
    pub pc: u16,
    /// Opcode plus operand bytes (1-3 bytes).
    pub bytes: Vec<u8>,
    /// Disassembled instruction text.
    pub disassembly: String,
    /// Register snapshot before execution.
    pub registers: CpuRegisters,
    /// CPU cycle counter before execution.
    pub cycles: u64,
}

impl TraceEntry {
    /// Capture the instruction at the current PC.
    ///
    /// Operand bytes are read through the bus; callers trace code in ROM
    /// or RAM, where reads have no side effects.
    pub fn capture(cpu: &Cpu, bus: &mut impl Bus) -> Self {
        let registers = cpu.registers();
        let pc = registers.pc;
        let opcode = bus.read(pc);

        let (bytes, disassembly) = match OPCODE_TABLE[opcode as usize] {
            Some(info) => {
                let mut bytes = vec![opcode];
                for i in 0..info.mode.operand_len() {
                    bytes.push(bus.read(pc.wrapping_add(1 + i)));
                }
                let text = disassemble(info.mnemonic.as_str(), info.mode, pc, &bytes);
                (bytes, text)
            }
            None => (vec![opcode], format!(".byte ${opcode:02X}")),
        };

        Self {
            pc,
            bytes,
            disassembly,
            registers,
            cycles: cpu.cycles(),
        }
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = String::new();
        for byte in &self.bytes {
            if !bytes.is_empty() {
                bytes.push(' ');
            }
            bytes.push_str(&format!("{byte:02X}"));
        }

        write!(
            f,
            "{:04X}  {bytes:<10}{:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            self.disassembly,
            self.registers.a,
            self.registers.x,
            self.registers.y,
            self.registers.p.bits(),
            self.registers.sp,
            self.cycles,
        )
    }
}

fn disassemble(mnemonic: &str, mode: AddrMode, pc: u16, bytes: &[u8]) -> String {
    let lo = bytes.get(1).copied().unwrap_or(0);
    let hi = bytes.get(2).copied().unwrap_or(0);
    let word = u16::from_le_bytes([lo, hi]);

    match mode {
        AddrMode::Implied => mnemonic.to_string(),
        AddrMode::Accumulator => format!("{mnemonic} A"),
        AddrMode::Immediate => format!("{mnemonic} #${lo:02X}"),
        AddrMode::ZeroPage => format!("{mnemonic} ${lo:02X}"),
        AddrMode::ZeroPageX => format!("{mnemonic} ${lo:02X},X"),
        AddrMode::ZeroPageY => format!("{mnemonic} ${lo:02X},Y"),
        AddrMode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
            format!("{mnemonic} ${target:04X}")
        }
        AddrMode::Absolute => format!("{mnemonic} ${word:04X}"),
        AddrMode::AbsoluteX => format!("{mnemonic} ${word:04X},X"),
        AddrMode::AbsoluteY => format!("{mnemonic} ${word:04X},Y"),
        AddrMode::Indirect => format!("{mnemonic} (${word:04X})"),
        AddrMode::IndirectX => format!("{mnemonic} (${lo:02X},X)"),
        AddrMode::IndirectY => format!("{mnemonic} (${lo:02X}),Y"),
    }
}
