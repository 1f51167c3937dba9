//! CPU address space decode.
//!
//! ```text
//! $0000-$1FFF  2 KiB internal RAM, mirrored every $0800
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4000-$4013  APU registers (placeholder, reads return 0)
//! $4014        OAM DMA page latch
//! $4015        APU status (placeholder)
//! $4016-$4017  Controller serial ports
//! $4018-$401F  Test-mode registers (placeholder)
//! $4020-$7FFF  Unmapped / cartridge RAM space (reads return 0)
//! $8000-$FFFF  Cartridge PRG through the mapper
//! ```

use famicore_cpu::Bus as CpuBus;
use famicore_mappers::Mapper;
use famicore_ppu::{Ppu, PpuBus};

/// Controller button bits, in serial read order from bit 0.
pub mod buttons {
    /// A button.
    pub const A: u8 = 0x01;
    /// B button.
    pub const B: u8 = 0x02;
    /// Select button.
    pub const SELECT: u8 = 0x04;
    /// Start button.
    pub const START: u8 = 0x08;
    /// D-pad up.
    pub const UP: u8 = 0x10;
    /// D-pad down.
    pub const DOWN: u8 = 0x20;
    /// D-pad left.
    pub const LEFT: u8 = 0x40;
    /// D-pad right.
    pub const RIGHT: u8 = 0x80;
}

/// Host callback returning the current state of both controllers.
pub type ControllerRead = Box<dyn FnMut() -> (u8, u8)>;

/// 2 KiB of CPU RAM mirrored through $1FFF.
#[derive(Debug, Clone)]
pub struct CpuRam {
    bytes: [u8; 0x0800],
}

impl CpuRam {
    /// Fresh RAM, all zero.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: [0; 0x0800] }
    }

    /// Read at any address in $0000-$1FFF.
    #[inline]
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr & 0x07FF)]
    }

    /// Write at any address in $0000-$1FFF.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.bytes[usize::from(addr & 0x07FF)] = value;
    }
}

impl Default for CpuRam {
    fn default() -> Self {
        Self::new()
    }
}

/// Mapper adapter serving the PPU side of the cartridge.
struct MapperPpuBus<'a> {
    mapper: &'a mut dyn Mapper,
}

impl PpuBus for MapperPpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        self.mapper.ppu_read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.mapper.ppu_write(addr, value);
    }
}

/// The CPU-visible system bus.
pub struct Bus {
    ram: CpuRam,
    /// The PPU; the console reaches it for stepping and introspection.
    pub ppu: Ppu,
    mapper: Option<Box<dyn Mapper>>,
    controller_read: ControllerRead,
    shift1: u8,
    shift2: u8,
    strobe: bool,
    dma_page: Option<u8>,
    open_bus: u8,
}

impl Bus {
    /// Build the bus around a PPU and the host controller callback. No
    /// cartridge is attached yet.
    #[must_use]
    pub fn new(ppu: Ppu, controller_read: ControllerRead) -> Self {
        Self {
            ram: CpuRam::new(),
            ppu,
            mapper: None,
            controller_read,
            shift1: 0,
            shift2: 0,
            strobe: false,
            dma_page: None,
            open_bus: 0,
        }
    }

    /// Attach a cartridge mapper, replacing any previous one.
    pub fn attach_mapper(&mut self, mapper: Box<dyn Mapper>) {
        self.mapper = Some(mapper);
    }

    /// Whether a cartridge is attached.
    #[must_use]
    pub fn has_mapper(&self) -> bool {
        self.mapper.is_some()
    }

    /// Clear RAM, controller latches, DMA state, and the PPU.
    pub fn reset(&mut self) {
        self.ram = CpuRam::new();
        self.ppu.reset();
        self.shift1 = 0;
        self.shift2 = 0;
        self.strobe = false;
        self.dma_page = None;
        self.open_bus = 0;
    }

    /// Advance the PPU, giving it mapper access for its fetches.
    pub fn step_ppu(&mut self, dots: u32) {
        let Some(mapper) = self.mapper.as_deref_mut() else {
            return;
        };
        let mut ppu_bus = MapperPpuBus { mapper };
        self.ppu.step_many(dots, &mut ppu_bus);
    }

    /// A `$4014` write is waiting to be serviced.
    #[must_use]
    pub fn oam_dma_pending(&self) -> bool {
        self.dma_page.is_some()
    }

    /// Copy the latched page into OAM. Returns the CPU stall cost:
    /// 513 cycles, 514 when the CPU sits on an odd cycle.
    pub fn run_oam_dma(&mut self, cpu_cycles: u64) -> u32 {
        let Some(page) = self.dma_page.take() else {
            return 0;
        };

        let base = u16::from(page) << 8;
        for i in 0..=255u8 {
            let value = self.read(base + u16::from(i));
            self.ppu.write_oam(i, value);
        }

        513 + u32::from(cpu_cycles % 2 == 1)
    }

    fn latch_controllers(&mut self) {
        let (pad1, pad2) = (self.controller_read)();
        self.shift1 = pad1;
        self.shift2 = pad2;
    }

    fn read_controller(&mut self, port: usize) -> u8 {
        // While the strobe is high every read sees the live first bit.
        if self.strobe {
            self.latch_controllers();
        }
        let shift = if port == 0 {
            &mut self.shift1
        } else {
            &mut self.shift2
        };
        let bit = *shift & 1;
        // Ones feed in from the top once all buttons have been read.
        *shift = (*shift >> 1) | 0x80;
        bit | (self.open_bus & 0xE0)
    }

    fn write_strobe(&mut self, value: u8) {
        let new_strobe = value & 1 != 0;
        if self.strobe && !new_strobe {
            self.latch_controllers();
        }
        self.strobe = new_strobe;
        if self.strobe {
            self.latch_controllers();
        }
    }

    fn ppu_register_read(&mut self, addr: u16) -> u8 {
        let Some(mapper) = self.mapper.as_deref_mut() else {
            return 0;
        };
        let mut ppu_bus = MapperPpuBus { mapper };
        self.ppu.cpu_read(addr, &mut ppu_bus)
    }

    fn ppu_register_write(&mut self, addr: u16, value: u8) {
        let Some(mapper) = self.mapper.as_deref_mut() else {
            return;
        };
        let mut ppu_bus = MapperPpuBus { mapper };
        self.ppu.cpu_write(addr, value, &mut ppu_bus);
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram.read(addr),
            0x2000..=0x3FFF => self.ppu_register_read(addr),
            0x4016 => self.read_controller(0),
            0x4017 => self.read_controller(1),
            // APU and I/O placeholders.
            0x4000..=0x401F => 0,
            // Unmapped cartridge space; no PRG RAM on supported boards.
            0x4020..=0x7FFF => 0,
            0x8000..=0xFFFF => match self.mapper.as_deref() {
                Some(mapper) => mapper.cpu_read(addr),
                None => 0,
            },
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;
        match addr {
            0x0000..=0x1FFF => self.ram.write(addr, value),
            0x2000..=0x3FFF => self.ppu_register_write(addr, value),
            0x4014 => self.dma_page = Some(value),
            0x4016 => self.write_strobe(value),
            0x4000..=0x401F => {}
            0x4020..=0x7FFF => {}
            0x8000..=0xFFFF => {
                if let Some(mapper) = self.mapper.as_deref_mut() {
                    mapper.cpu_write(addr, value);
                }
            }
        }
    }
}
