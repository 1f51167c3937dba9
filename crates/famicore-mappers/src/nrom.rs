//! Mapper 0: NROM.
//!
//! The trivially-banked board: 16 or 32 KiB of PRG ROM with no registers,
//! 8 KiB of CHR ROM or CHR RAM, fixed nametable arrangement. A 16 KiB PRG
//! image is mirrored into both CPU slots so the reset vector at $FFFC
//! resolves either way.

use crate::mapper::{BankWindow, Mapper, NametableArrangement};
use crate::rom::Cartridge;

const CIRAM_SIZE: usize = 2048;

/// NROM (mapper 0).
pub struct Nrom {
    cart: Cartridge,
    /// 8 KiB CHR RAM, allocated only when the image declares no CHR ROM.
    chr_ram: Vec<u8>,
    /// Internal 2 KiB nametable RAM.
    ciram: [u8; CIRAM_SIZE],
    prg: BankWindow<2>,
    chr: BankWindow<1>,
    nametables: BankWindow<4>,
}

impl Nrom {
    /// Build the mapper, taking ownership of the cartridge.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        let prg_slots = if cart.prg_rom().len() <= 16 * 1024 {
            [0x0000, 0x0000]
        } else {
            [0x0000, 0x4000]
        };

        let chr_ram = if cart.has_chr_ram() {
            vec![0; 8 * 1024]
        } else {
            Vec::new()
        };

        let arrangement = cart.header().arrangement;
        Self {
            cart,
            chr_ram,
            ciram: [0; CIRAM_SIZE],
            prg: BankWindow::new(0x8000, 0x4000, prg_slots),
            chr: BankWindow::new(0x0000, 0x2000, [0x0000]),
            nametables: BankWindow::new(0x2000, 0x0400, arrangement.ciram_slots()),
        }
    }

    fn ciram_offset(&self, addr: u16) -> usize {
        // $3000-$3EFF mirrors $2000-$2EFF.
        self.nametables.offset(0x2000 | (addr & 0x0FFF))
    }
}

impl Mapper for Nrom {
    fn cpu_read(&self, addr: u16) -> u8 {
        self.cart.prg_rom()[self.prg.offset(addr)]
    }

    fn cpu_write(&mut self, _addr: u16, _value: u8) {
        // No registers; PRG ROM writes are ignored. Some ROMs write here
        // by accident and must not be corrupted.
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                let offset = self.chr.offset(addr);
                if self.cart.has_chr_ram() {
                    self.chr_ram[offset]
                } else {
                    self.cart.chr_rom()[offset]
                }
            }
            0x2000..=0x3EFF => self.ciram[self.ciram_offset(addr)],
            _ => {
                log::warn!("PPU read from unmapped address ${addr:04X}");
                0
            }
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                if self.cart.has_chr_ram() {
                    let offset = self.chr.offset(addr);
                    self.chr_ram[offset] = value;
                }
                // CHR ROM is read-only.
            }
            0x2000..=0x3EFF => {
                let offset = self.ciram_offset(addr);
                self.ciram[offset] = value;
            }
            _ => log::warn!("PPU write to unmapped address ${addr:04X}"),
        }
    }

    fn arrangement(&self) -> NametableArrangement {
        self.cart.header().arrangement
    }

    fn mapper_id(&self) -> u8 {
        0
    }

    fn name(&self) -> &'static str {
        "NROM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_cart(prg_pages: u8, chr_pages: u8, flags6: u8) -> Cartridge {
        let mut image = vec![0x4E, 0x45, 0x53, 0x1A, prg_pages, chr_pages, flags6, 0x00];
        image.extend_from_slice(&[0; 8]);
        for page in 0..prg_pages {
            image.extend(std::iter::repeat(page).take(16384));
        }
        image.extend(std::iter::repeat(0xC5).take(usize::from(chr_pages) * 8192));
        Cartridge::load(image).unwrap()
    }

    #[test]
    fn prg_32k_maps_linearly() {
        let mapper = Nrom::new(build_cart(2, 1, 0));
        assert_eq!(mapper.cpu_read(0x8000), 0);
        assert_eq!(mapper.cpu_read(0xC000), 1);
        assert_eq!(mapper.cpu_read(0xFFFF), 1);
    }

    #[test]
    fn prg_16k_mirrors_upper_slot() {
        let mapper = Nrom::new(build_cart(1, 1, 0));
        assert_eq!(mapper.cpu_read(0x8000), mapper.cpu_read(0xC000));
        assert_eq!(mapper.cpu_read(0xBFFF), mapper.cpu_read(0xFFFF));
    }

    #[test]
    fn prg_writes_ignored() {
        let mut mapper = Nrom::new(build_cart(1, 1, 0));
        let before = mapper.cpu_read(0x8000);
        mapper.cpu_write(0x8000, !before);
        assert_eq!(mapper.cpu_read(0x8000), before);
    }

    #[test]
    fn chr_rom_reads_and_rejects_writes() {
        let mut mapper = Nrom::new(build_cart(1, 1, 0));
        assert_eq!(mapper.ppu_read(0x0000), 0xC5);
        mapper.ppu_write(0x0000, 0x11);
        assert_eq!(mapper.ppu_read(0x0000), 0xC5);
    }

    #[test]
    fn chr_ram_round_trips() {
        let mut mapper = Nrom::new(build_cart(1, 0, 0));
        mapper.ppu_write(0x1FFF, 0x42);
        assert_eq!(mapper.ppu_read(0x1FFF), 0x42);
    }

    #[test]
    fn vertical_arrangement_stacks_tables() {
        // Flags 6 bit 0 clear = vertical arrangement: $2400 mirrors $2000.
        let mut mapper = Nrom::new(build_cart(1, 1, 0x00));
        mapper.ppu_write(0x2000, 0xAA);
        assert_eq!(mapper.ppu_read(0x2400), 0xAA);
        assert_eq!(mapper.ppu_read(0x2800), 0x00);

        mapper.ppu_write(0x2800, 0xBB);
        assert_eq!(mapper.ppu_read(0x2C00), 0xBB);
    }

    #[test]
    fn horizontal_arrangement_sides_are_distinct() {
        let mut mapper = Nrom::new(build_cart(1, 1, 0x01));
        mapper.ppu_write(0x2000, 0xAA);
        assert_eq!(mapper.ppu_read(0x2800), 0xAA);
        assert_eq!(mapper.ppu_read(0x2400), 0x00);

        mapper.ppu_write(0x2400, 0xBB);
        assert_eq!(mapper.ppu_read(0x2C00), 0xBB);
    }

    #[test]
    fn nametable_high_mirror() {
        let mut mapper = Nrom::new(build_cart(1, 1, 0x00));
        mapper.ppu_write(0x2005, 0x5A);
        assert_eq!(mapper.ppu_read(0x3005), 0x5A);

        mapper.ppu_write(0x3105, 0x66);
        assert_eq!(mapper.ppu_read(0x2105), 0x66);
    }
}
