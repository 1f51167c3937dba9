//! Console orchestration.
//!
//! The console owns the CPU and the bus (which owns the PPU and the
//! mapper) and keeps the two clock domains coupled: after every CPU
//! instruction the PPU advances exactly three dots per consumed cycle,
//! OAM DMA stalls included. The PPU's NMI line is sampled after each
//! catch-up and latched into the CPU, so a VBlank that starts inside
//! an instruction is serviced before the next one.

use crate::bus::{Bus, ControllerRead};
use famicore_cpu::{Cpu, CpuRegisters};
use famicore_mappers::{create_mapper, Cartridge, RomError, RomHeader};
use famicore_ppu::{PixelSink, Ppu, DOTS_PER_SCANLINE, SCANLINES_PER_FRAME};

/// Errors surfaced when inserting a cartridge.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsoleError {
    /// The ROM image failed to parse or needs an unsupported mapper.
    #[error(transparent)]
    Rom(#[from] RomError),
}

/// Host hook invoked after each completed instruction, before PPU
/// catch-up, with the program counter and a register snapshot. Must
/// not re-enter the console.
pub type TraceHook = Box<dyn FnMut(u16, &CpuRegisters)>;

/// An NES console without the cartridge slot filled.
pub struct Console {
    cpu: Cpu,
    bus: Bus,
    header: Option<RomHeader>,
    trace_hook: Option<TraceHook>,
    /// Dot mark the next `step_scanline` runs toward.
    scanline_mark: u64,
}

impl Console {
    /// Build a console delivering pixels to `pixel_sink` and polling
    /// controllers through `controller_read`.
    #[must_use]
    pub fn new(pixel_sink: PixelSink, controller_read: ControllerRead) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(Ppu::new(pixel_sink), controller_read),
            header: None,
            trace_hook: None,
            scanline_mark: 0,
        }
    }

    /// Parse a ROM image, build its mapper, attach it, and reset.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Rom`] for a malformed image or an
    /// unsupported mapper; the console state is left untouched.
    pub fn insert_cartridge(&mut self, image: Vec<u8>) -> Result<(), ConsoleError> {
        let cart = Cartridge::load(image)?;
        let header = *cart.header();
        let mapper = create_mapper(cart)?;

        log::info!(
            "cartridge inserted: mapper {} ({}), {} KiB PRG, {} KiB CHR",
            header.mapper,
            mapper.name(),
            u32::from(header.prg_pages) * 16,
            u32::from(header.chr_pages) * 8,
        );

        self.bus.attach_mapper(mapper);
        self.header = Some(header);
        self.reset();
        Ok(())
    }

    /// Reset the console: the CPU runs its 7-cycle reset sequence and
    /// the PPU advances the matching 21 dots.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.bus.step_ppu(21);
        self.scanline_mark = self.bus.ppu.dots();
    }

    /// Install or clear the per-instruction trace hook.
    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.trace_hook = hook;
    }

    /// Execute one CPU instruction (or a pending OAM DMA) and catch the
    /// PPU up by three dots per cycle. Returns the CPU cycles consumed.
    pub fn step_instruction(&mut self) -> u32 {
        if self.header.is_none() {
            return 0;
        }

        // A latched $4014 write stalls the CPU for the whole transfer.
        if self.bus.oam_dma_pending() {
            let cycles = self.bus.run_oam_dma(self.cpu.cycles());
            self.cpu.stall(cycles);
            self.finish_step(cycles);
            return cycles;
        }

        let cycles = u32::from(self.cpu.step(&mut self.bus));

        if let Some(hook) = &mut self.trace_hook {
            let registers = self.cpu.registers();
            hook(registers.pc, &registers);
        }

        self.finish_step(cycles);
        cycles
    }

    fn finish_step(&mut self, cycles: u32) {
        self.bus.step_ppu(cycles * 3);
        if self.bus.ppu.take_nmi() {
            self.cpu.nmi();
        }
    }

    /// Run instructions until the PPU has advanced at least one
    /// scanline's worth of dots past the previous mark. Overshoot rolls
    /// into the next scanline.
    pub fn step_scanline(&mut self) {
        self.scanline_mark += u64::from(DOTS_PER_SCANLINE);
        while self.bus.ppu.dots() < self.scanline_mark {
            if self.step_instruction() == 0 {
                return;
            }
        }
    }

    /// Run a full 262-scanline frame.
    pub fn step_frame(&mut self) {
        for _ in 0..SCANLINES_PER_FRAME {
            self.step_scanline();
        }
    }

    // =====================================================================
    // Introspection
    // =====================================================================

    /// CPU register snapshot.
    #[must_use]
    pub fn cpu_registers(&self) -> CpuRegisters {
        self.cpu.registers()
    }

    /// Total CPU cycles since reset.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Completed PPU frames.
    #[must_use]
    pub fn ppu_frame(&self) -> u64 {
        self.bus.ppu.frame()
    }

    /// Current PPU scanline.
    #[must_use]
    pub fn ppu_scanline(&self) -> u16 {
        self.bus.ppu.scanline()
    }

    /// Current PPU dot.
    #[must_use]
    pub fn ppu_dot(&self) -> u16 {
        self.bus.ppu.dot()
    }

    /// Total PPU dots since reset.
    #[must_use]
    pub fn ppu_dots(&self) -> u64 {
        self.bus.ppu.dots()
    }

    /// Palette RAM contents.
    #[must_use]
    pub fn palette_ram(&self) -> &[u8; 32] {
        self.bus.ppu.palette_ram()
    }

    /// OAM contents.
    #[must_use]
    pub fn oam(&self) -> &[u8; 256] {
        self.bus.ppu.oam()
    }

    /// Header of the inserted cartridge.
    #[must_use]
    pub fn cartridge_header(&self) -> Option<&RomHeader> {
        self.header.as_ref()
    }
}
