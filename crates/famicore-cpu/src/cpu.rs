//! 6502 interpreter core.
//!
//! The CPU executes whole instructions: fetch, decode through the opcode
//! table, resolve the addressing mode, execute, and account cycles
//! including page-cross and branch penalties. Interrupt lines are
//! sampled at instruction boundaries — a pending NMI is serviced before
//! the next fetch, an IRQ only while the I flag is clear.

use crate::addressing::AddrMode;
use crate::opcodes::{Mnemonic, OPCODE_TABLE};
use crate::status::Status;
use crate::{vectors, Bus, CpuError};

/// Register snapshot handed to trace hooks and introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuRegisters {
    /// Program counter.
    pub pc: u16,
    /// Stack pointer; the stack lives at $0100 + SP.
    pub sp: u8,
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Status register.
    pub p: Status,
}

/// Resolved operand of one instruction.
#[derive(Debug, Clone, Copy)]
enum Operand {
    None,
    Accumulator,
    Address(u16),
}

/// NES 6502 CPU.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer.
    pub sp: u8,
    /// Status register.
    pub status: Status,
    /// Total cycles executed since reset.
    cycles: u64,
    /// Edge-triggered NMI latch.
    nmi_pending: bool,
    /// Level-triggered IRQ line.
    irq_line: bool,
    /// Opcode currently executing (for diagnostics).
    opcode: u8,
}

impl Cpu {
    /// Create a CPU in power-on state. `reset` must run before stepping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::RESET,
            cycles: 0,
            nmi_pending: false,
            irq_line: false,
            opcode: 0,
        }
    }

    /// Run the reset sequence: SP ← $FD, P ← I|U, PC from the reset
    /// vector. The cycle counter restarts at the 7 reset cycles.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.sp = 0xFD;
        self.status = Status::RESET;
        self.pc = bus.read_u16(vectors::RESET);
        self.nmi_pending = false;
        self.irq_line = false;
        self.cycles = 7;
        log::debug!("reset: PC <- ${:04X}", self.pc);
    }

    /// Assert the NMI line. Serviced before the next instruction fetch.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Drive the IRQ line. Sampled at instruction boundaries while the
    /// I flag is clear.
    pub fn set_irq(&mut self, active: bool) {
        self.irq_line = active;
    }

    /// Total cycles executed since reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Account cycles spent stalled off the core (OAM DMA). Keeps the
    /// cycle counter aligned with the 3-dots-per-cycle PPU ratio.
    pub fn stall(&mut self, cycles: u32) {
        self.cycles += u64::from(cycles);
    }

    /// Opcode of the most recently fetched instruction.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Current register snapshot.
    #[must_use]
    pub fn registers(&self) -> CpuRegisters {
        CpuRegisters {
            pc: self.pc,
            sp: self.sp,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.status,
        }
    }

    /// Execute one instruction (or service a pending interrupt) and
    /// return the cycles consumed.
    ///
    /// # Panics
    ///
    /// An unimplemented unofficial opcode is a fatal fault and panics
    /// with the formatted [`CpuError::UnknownOpcode`].
    pub fn step(&mut self, bus: &mut impl Bus) -> u8 {
        if self.nmi_pending {
            self.nmi_pending = false;
            return self.interrupt(bus, vectors::NMI);
        }
        if self.irq_line && !self.status.contains(Status::I) {
            return self.interrupt(bus, vectors::IRQ);
        }

        let pc = self.pc;
        let opcode = bus.read(pc);
        self.pc = self.pc.wrapping_add(1);
        self.opcode = opcode;

        let Some(info) = OPCODE_TABLE[opcode as usize] else {
            panic!("{}", CpuError::UnknownOpcode(opcode, pc));
        };

        let (operand, page_crossed) = self.resolve(info.mode, bus);

        let mut cycles = info.cycles;
        if page_crossed && info.page_penalty {
            cycles += 1;
        }
        cycles += self.execute(info.mnemonic, operand, page_crossed, bus);

        self.cycles += u64::from(cycles);
        cycles
    }

    // =====================================================================
    // Addressing
    // =====================================================================

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Resolve the operand for an addressing mode, advancing PC past the
    /// operand bytes. Returns the operand and whether the effective
    /// address crossed a page relative to its base.
    fn resolve(&mut self, mode: AddrMode, bus: &mut impl Bus) -> (Operand, bool) {
        match mode {
            AddrMode::Implied => (Operand::None, false),
            AddrMode::Accumulator => (Operand::Accumulator, false),
            AddrMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (Operand::Address(addr), false)
            }
            AddrMode::ZeroPage => {
                let addr = u16::from(self.fetch(bus));
                (Operand::Address(addr), false)
            }
            AddrMode::ZeroPageX => {
                let addr = u16::from(self.fetch(bus).wrapping_add(self.x));
                (Operand::Address(addr), false)
            }
            AddrMode::ZeroPageY => {
                let addr = u16::from(self.fetch(bus).wrapping_add(self.y));
                (Operand::Address(addr), false)
            }
            AddrMode::Relative => {
                let offset = self.fetch(bus) as i8;
                let target = self.pc.wrapping_add(offset as u16);
                let crossed = target & 0xFF00 != self.pc & 0xFF00;
                (Operand::Address(target), crossed)
            }
            AddrMode::Absolute => {
                let addr = self.fetch_word(bus);
                (Operand::Address(addr), false)
            }
            AddrMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                (Operand::Address(addr), addr & 0xFF00 != base & 0xFF00)
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                (Operand::Address(addr), addr & 0xFF00 != base & 0xFF00)
            }
            AddrMode::Indirect => {
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr);
                // High byte fetch does not carry into the next page.
                let hi = bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF));
                (Operand::Address(u16::from_le_bytes([lo, hi])), false)
            }
            AddrMode::IndirectX => {
                let zp = self.fetch(bus).wrapping_add(self.x);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                (Operand::Address(u16::from_le_bytes([lo, hi])), false)
            }
            AddrMode::IndirectY => {
                let zp = self.fetch(bus);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                (Operand::Address(addr), addr & 0xFF00 != base & 0xFF00)
            }
        }
    }

    fn load(&mut self, operand: Operand, bus: &mut impl Bus) -> u8 {
        match operand {
            Operand::Accumulator => self.a,
            Operand::Address(addr) => bus.read(addr),
            Operand::None => unreachable!("load with no operand"),
        }
    }

    fn addr(operand: Operand) -> u16 {
        match operand {
            Operand::Address(addr) => addr,
            _ => unreachable!("operand has no address"),
        }
    }

    // =====================================================================
    // Stack
    // =====================================================================

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    // =====================================================================
    // Interrupts
    // =====================================================================

    /// Service an interrupt: push PC and status (B clear), set I, load
    /// the vector. 7 cycles.
    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u8 {
        self.push_word(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
        self.cycles += 7;
        7
    }

    // =====================================================================
    // Execution
    // =====================================================================

    /// Execute one decoded instruction. Returns extra cycles beyond the
    /// table base (branch penalties only).
    #[allow(clippy::too_many_lines)] // One arm per mnemonic.
    fn execute(
        &mut self,
        mnemonic: Mnemonic,
        operand: Operand,
        page_crossed: bool,
        bus: &mut impl Bus,
    ) -> u8 {
        match mnemonic {
            // Loads and stores
            Mnemonic::Lda => {
                self.a = self.load(operand, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.load(operand, bus);
                self.status.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.load(operand, bus);
                self.status.set_zn(self.y);
            }
            Mnemonic::Sta => bus.write(Self::addr(operand), self.a),
            Mnemonic::Stx => bus.write(Self::addr(operand), self.x),
            Mnemonic::Sty => bus.write(Self::addr(operand), self.y),

            // Arithmetic
            Mnemonic::Adc => {
                let value = self.load(operand, bus);
                self.add(value);
            }
            Mnemonic::Sbc => {
                // SBC is ADC of the one's complement; the carry supplies
                // the borrow.
                let value = self.load(operand, bus);
                self.add(!value);
            }
            Mnemonic::Cmp => {
                let value = self.load(operand, bus);
                self.compare(self.a, value);
            }
            Mnemonic::Cpx => {
                let value = self.load(operand, bus);
                self.compare(self.x, value);
            }
            Mnemonic::Cpy => {
                let value = self.load(operand, bus);
                self.compare(self.y, value);
            }

            // Logic
            Mnemonic::And => {
                self.a &= self.load(operand, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= self.load(operand, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= self.load(operand, bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Bit => {
                let value = self.load(operand, bus);
                self.status.set_flag(Status::Z, self.a & value == 0);
                self.status.set_flag(Status::V, value & 0x40 != 0);
                self.status.set_flag(Status::N, value & 0x80 != 0);
            }

            // Increment / decrement
            Mnemonic::Inc => self.modify(operand, bus, |_, v| v.wrapping_add(1)),
            Mnemonic::Dec => self.modify(operand, bus, |_, v| v.wrapping_sub(1)),
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Shifts and rotates
            Mnemonic::Asl => self.modify(operand, bus, |cpu, v| {
                cpu.status.set_flag(Status::C, v & 0x80 != 0);
                v << 1
            }),
            Mnemonic::Lsr => self.modify(operand, bus, |cpu, v| {
                cpu.status.set_flag(Status::C, v & 0x01 != 0);
                v >> 1
            }),
            Mnemonic::Rol => self.modify(operand, bus, |cpu, v| {
                let carry_in = u8::from(cpu.status.contains(Status::C));
                cpu.status.set_flag(Status::C, v & 0x80 != 0);
                (v << 1) | carry_in
            }),
            Mnemonic::Ror => self.modify(operand, bus, |cpu, v| {
                let carry_in = u8::from(cpu.status.contains(Status::C)) << 7;
                cpu.status.set_flag(Status::C, v & 0x01 != 0);
                (v >> 1) | carry_in
            }),

            // Branches
            Mnemonic::Bcc => return self.branch(!self.status.contains(Status::C), operand, page_crossed),
            Mnemonic::Bcs => return self.branch(self.status.contains(Status::C), operand, page_crossed),
            Mnemonic::Beq => return self.branch(self.status.contains(Status::Z), operand, page_crossed),
            Mnemonic::Bne => return self.branch(!self.status.contains(Status::Z), operand, page_crossed),
            Mnemonic::Bmi => return self.branch(self.status.contains(Status::N), operand, page_crossed),
            Mnemonic::Bpl => return self.branch(!self.status.contains(Status::N), operand, page_crossed),
            Mnemonic::Bvs => return self.branch(self.status.contains(Status::V), operand, page_crossed),
            Mnemonic::Bvc => return self.branch(!self.status.contains(Status::V), operand, page_crossed),

            // Jumps and returns
            Mnemonic::Jmp => self.pc = Self::addr(operand),
            Mnemonic::Jsr => {
                // Return address is the last byte of the JSR instruction.
                self.push_word(bus, self.pc.wrapping_sub(1));
                self.pc = Self::addr(operand);
            }
            Mnemonic::Rts => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            Mnemonic::Rti => {
                let status = self.pull(bus);
                self.status = Status::from_stack_byte(status);
                self.pc = self.pull_word(bus);
            }
            Mnemonic::Brk => {
                // Two-byte instruction; the padding byte is skipped.
                self.pc = self.pc.wrapping_add(1);
                self.push_word(bus, self.pc);
                self.push(bus, self.status.to_stack_byte(true));
                self.status.insert(Status::I);
                self.pc = bus.read_u16(vectors::IRQ);
            }

            // Stack operations
            Mnemonic::Pha => self.push(bus, self.a),
            Mnemonic::Php => {
                let value = self.status.to_stack_byte(true);
                self.push(bus, value);
            }
            Mnemonic::Pla => {
                self.a = self.pull(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Plp => {
                let value = self.pull(bus);
                self.status = Status::from_stack_byte(value);
            }

            // Flag operations
            Mnemonic::Clc => self.status.set_flag(Status::C, false),
            Mnemonic::Sec => self.status.set_flag(Status::C, true),
            Mnemonic::Cli => self.status.set_flag(Status::I, false),
            Mnemonic::Sei => self.status.set_flag(Status::I, true),
            Mnemonic::Clv => self.status.set_flag(Status::V, false),
            Mnemonic::Cld => self.status.set_flag(Status::D, false),
            Mnemonic::Sed => self.status.set_flag(Status::D, true),

            // Transfers
            Mnemonic::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Mnemonic::Txs => self.sp = self.x,

            Mnemonic::Nop => {}
        }
        0
    }

    /// ADC core shared with SBC (operand complemented by the caller).
    fn add(&mut self, value: u8) {
        let a = u16::from(self.a);
        let v = u16::from(value);
        let carry = u16::from(self.status.contains(Status::C));

        let sum = a + v + carry;
        let result = sum as u8;

        self.status.set_flag(Status::C, sum > 0xFF);
        // Overflow: both inputs share a sign the result does not.
        self.status
            .set_flag(Status::V, (a ^ sum) & (v ^ sum) & 0x80 != 0);
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set_flag(Status::C, register >= value);
        self.status.set_zn(register.wrapping_sub(value));
    }

    /// Read-modify-write on the accumulator or memory; Z/N track the
    /// result.
    fn modify(
        &mut self,
        operand: Operand,
        bus: &mut impl Bus,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) {
        match operand {
            Operand::Accumulator => {
                let value = self.a;
                let result = f(self, value);
                self.a = result;
                self.status.set_zn(result);
            }
            Operand::Address(addr) => {
                let value = bus.read(addr);
                let result = f(self, value);
                bus.write(addr, result);
                self.status.set_zn(result);
            }
            Operand::None => unreachable!("modify with no operand"),
        }
    }

    /// Take or skip a branch. A taken branch costs one extra cycle, one
    /// more when the target sits on a different page.
    fn branch(&mut self, taken: bool, operand: Operand, page_crossed: bool) -> u8 {
        if taken {
            self.pc = Self::addr(operand);
            1 + u8::from(page_crossed)
        } else {
            0
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
