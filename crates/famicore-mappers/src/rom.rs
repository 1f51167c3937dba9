//! iNES ROM image parsing.
//!
//! An iNES file is a 16-byte header, an optional 512-byte trainer, then
//! PRG ROM (16 KiB pages) followed by CHR ROM (8 KiB pages). A CHR page
//! count of zero means the board carries CHR RAM instead.

use crate::mapper::NametableArrangement;

/// Errors produced while parsing a ROM image.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RomError {
    /// Header magic mismatch or header shorter than 16 bytes.
    #[error("invalid iNES header: expected magic [4E 45 53 1A], got {0:02X?}")]
    InvalidHeader([u8; 4]),

    /// Image shorter than the header-declared PRG/CHR payload.
    #[error("ROM image truncated: expected {expected} bytes, got {actual}")]
    TruncatedImage {
        /// Bytes required by the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Mapper id not implemented by this crate.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// Parsed 16-byte iNES header.
///
/// ```text
/// Byte 0-3: magic "NES\x1A"
/// Byte 4:   PRG ROM pages (16 KiB units)
/// Byte 5:   CHR ROM pages (8 KiB units, 0 = CHR RAM)
/// Byte 6:   arrangement bit, battery, trainer, alt layout, mapper low nibble
/// Byte 7:   mapper high nibble, NES 2.0 marker (bits 2-3 = 10)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomHeader {
    /// PRG ROM size in 16 KiB pages.
    pub prg_pages: u8,
    /// CHR ROM size in 8 KiB pages; 0 means 8 KiB of CHR RAM.
    pub chr_pages: u8,
    /// iNES mapper id.
    pub mapper: u8,
    /// Nametable arrangement selected by the board.
    pub arrangement: NametableArrangement,
    /// Battery-backed PRG RAM present.
    pub has_battery: bool,
    /// 512-byte trainer precedes PRG ROM.
    pub has_trainer: bool,
    /// Alternative nametable layout flag (four-screen boards).
    pub alt_nametable: bool,
    /// Header carries the NES 2.0 marker.
    pub is_nes2: bool,
}

impl RomHeader {
    /// Header length in bytes.
    pub const SIZE: usize = 16;

    const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

    /// Parse the first 16 bytes of a ROM image.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::InvalidHeader`] on a short buffer or magic
    /// mismatch.
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < Self::SIZE {
            let mut magic = [0u8; 4];
            magic[..data.len().min(4)].copy_from_slice(&data[..data.len().min(4)]);
            return Err(RomError::InvalidHeader(magic));
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != Self::MAGIC {
            return Err(RomError::InvalidHeader(magic));
        }

        let flags6 = data[6];
        let flags7 = data[7];

        // Flags 6 bit 0: 0 = vertical arrangement, 1 = horizontal.
        let arrangement = if flags6 & 0x01 != 0 {
            NametableArrangement::Horizontal
        } else {
            NametableArrangement::Vertical
        };

        Ok(Self {
            prg_pages: data[4],
            chr_pages: data[5],
            mapper: (flags7 & 0xF0) | (flags6 >> 4),
            arrangement,
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
            alt_nametable: flags6 & 0x08 != 0,
            is_nes2: flags7 & 0x0C == 0x08,
        })
    }

    /// PRG ROM length in bytes.
    #[must_use]
    pub fn prg_rom_len(&self) -> usize {
        usize::from(self.prg_pages) * 16 * 1024
    }

    /// CHR ROM length in bytes (0 when the board uses CHR RAM).
    #[must_use]
    pub fn chr_rom_len(&self) -> usize {
        usize::from(self.chr_pages) * 8 * 1024
    }
}

/// An inserted cartridge: the raw image plus the parsed header.
///
/// The cartridge owns the full ROM byte vector and hands out immutable
/// PRG/CHR slices computed from the header offsets. Nothing mutates it
/// after construction.
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: RomHeader,
    data: Vec<u8>,
    prg_start: usize,
    chr_start: usize,
}

impl Cartridge {
    /// Parse a complete ROM image, taking ownership of the bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::InvalidHeader`] for a bad header and
    /// [`RomError::TruncatedImage`] when the payload declared by the
    /// header is not fully present.
    pub fn load(data: Vec<u8>) -> Result<Self, RomError> {
        let header = RomHeader::parse(&data)?;

        let prg_start = RomHeader::SIZE + if header.has_trainer { 512 } else { 0 };
        let chr_start = prg_start + header.prg_rom_len();
        let expected = chr_start + header.chr_rom_len();

        if data.len() < expected {
            return Err(RomError::TruncatedImage {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            header,
            data,
            prg_start,
            chr_start,
        })
    }

    /// The parsed header.
    #[must_use]
    pub fn header(&self) -> &RomHeader {
        &self.header
    }

    /// PRG ROM region (`prg_pages` × 16 KiB).
    #[must_use]
    pub fn prg_rom(&self) -> &[u8] {
        &self.data[self.prg_start..self.prg_start + self.header.prg_rom_len()]
    }

    /// CHR ROM region (`chr_pages` × 8 KiB); empty when CHR RAM is used.
    #[must_use]
    pub fn chr_rom(&self) -> &[u8] {
        &self.data[self.chr_start..self.chr_start + self.header.chr_rom_len()]
    }

    /// True when the board provides CHR RAM instead of CHR ROM.
    #[must_use]
    pub fn has_chr_ram(&self) -> bool {
        self.header.chr_pages == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_image(prg_pages: u8, chr_pages: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut image = vec![0x4E, 0x45, 0x53, 0x1A, prg_pages, chr_pages, flags6, flags7];
        image.extend_from_slice(&[0; 8]);
        image.extend(std::iter::repeat(0xEA).take(usize::from(prg_pages) * 16384));
        image.extend(std::iter::repeat(0x55).take(usize::from(chr_pages) * 8192));
        image
    }

    #[test]
    fn parses_minimal_header() {
        let header = RomHeader::parse(&build_image(2, 1, 0x00, 0x00)).unwrap();
        assert_eq!(header.prg_pages, 2);
        assert_eq!(header.chr_pages, 1);
        assert_eq!(header.mapper, 0);
        assert_eq!(header.arrangement, NametableArrangement::Vertical);
        assert!(!header.has_trainer);
        assert!(!header.is_nes2);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut image = build_image(1, 1, 0, 0);
        image[0] = 0x00;
        assert!(matches!(
            Cartridge::load(image),
            Err(RomError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_short_header() {
        assert!(matches!(
            RomHeader::parse(&[0x4E, 0x45, 0x53]),
            Err(RomError::InvalidHeader(_))
        ));
    }

    #[test]
    fn mapper_nibbles_combine() {
        let header = RomHeader::parse(&build_image(1, 1, 0x40, 0x20)).unwrap();
        assert_eq!(header.mapper, 0x24);
    }

    #[test]
    fn arrangement_bit_selects_horizontal() {
        let header = RomHeader::parse(&build_image(1, 1, 0x01, 0x00)).unwrap();
        assert_eq!(header.arrangement, NametableArrangement::Horizontal);
    }

    #[test]
    fn nes2_marker_detected() {
        let header = RomHeader::parse(&build_image(1, 1, 0x00, 0x08)).unwrap();
        assert!(header.is_nes2);
        let header = RomHeader::parse(&build_image(1, 1, 0x00, 0x0C)).unwrap();
        assert!(!header.is_nes2);
    }

    #[test]
    fn slices_line_up_with_header() {
        let cart = Cartridge::load(build_image(2, 1, 0, 0)).unwrap();
        assert_eq!(cart.prg_rom().len(), 32768);
        assert_eq!(cart.chr_rom().len(), 8192);
        assert_eq!(cart.prg_rom()[0], 0xEA);
        assert_eq!(cart.chr_rom()[0], 0x55);
        assert!(!cart.has_chr_ram());
    }

    #[test]
    fn trainer_shifts_prg_offset() {
        let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 1, 0, 0x04, 0x00];
        image.extend_from_slice(&[0; 8]);
        image.extend_from_slice(&[0xFF; 512]);
        image.extend_from_slice(&[0xAB; 16384]);

        let cart = Cartridge::load(image).unwrap();
        assert!(cart.header().has_trainer);
        assert_eq!(cart.prg_rom()[0], 0xAB);
        assert!(cart.has_chr_ram());
        assert!(cart.chr_rom().is_empty());
    }

    #[test]
    fn truncated_payload_rejected() {
        let mut image = build_image(2, 1, 0, 0);
        image.truncate(16 + 1024);
        assert!(matches!(
            Cartridge::load(image),
            Err(RomError::TruncatedImage { .. })
        ));
    }
}
