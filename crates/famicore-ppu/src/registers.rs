//! CPU-visible PPU control, mask, and status registers.

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL ($2000), write only.
    ///
    /// ```text
    /// 7  bit  0
    /// VPHB SINN
    /// |||| ||++- Base nametable (0=$2000, 1=$2400, 2=$2800, 3=$2C00)
    /// |||| |+--- VRAM increment per PPUDATA access (0: +1, 1: +32)
    /// |||| +---- Sprite pattern table for 8×8 sprites (0: $0000, 1: $1000)
    /// |||+------ Background pattern table (0: $0000, 1: $1000)
    /// ||+------- Sprite size (0: 8×8, 1: 8×16)
    /// |+-------- Master/slave select (unused on the NES)
    /// +--------- Raise NMI at the start of VBlank
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        /// Nametable select, bit 0.
        const NAMETABLE_X = 0b0000_0001;
        /// Nametable select, bit 1.
        const NAMETABLE_Y = 0b0000_0010;
        /// VRAM address increment.
        const VRAM_INCREMENT = 0b0000_0100;
        /// Sprite pattern table (8×8 mode).
        const SPRITE_TABLE = 0b0000_1000;
        /// Background pattern table.
        const BG_TABLE = 0b0001_0000;
        /// 8×16 sprite mode.
        const SPRITE_SIZE = 0b0010_0000;
        /// Master/slave select.
        const MASTER_SLAVE = 0b0100_0000;
        /// NMI enable.
        const NMI_ENABLE = 0b1000_0000;
    }
}

impl PpuCtrl {
    /// PPUDATA address increment (1 across, 32 down).
    #[inline]
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Sprite pattern table base for 8×8 sprites.
    #[inline]
    #[must_use]
    pub fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Background pattern table base.
    #[inline]
    #[must_use]
    pub fn bg_table_addr(self) -> u16 {
        if self.contains(Self::BG_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in pixels (8 or 16).
    #[inline]
    #[must_use]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }

    /// NMI requested at VBlank.
    #[inline]
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// PPUMASK ($2001), write only.
    ///
    /// ```text
    /// 7  bit  0
    /// BGRs bMmG
    /// |||| |||+- Grayscale
    /// |||| ||+-- Show background in the leftmost 8 pixels
    /// |||| |+--- Show sprites in the leftmost 8 pixels
    /// |||| +---- Show background
    /// |||+------ Show sprites
    /// ||+------- Emphasize red
    /// |+-------- Emphasize green
    /// +--------- Emphasize blue
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        /// Grayscale output.
        const GRAYSCALE = 0b0000_0001;
        /// Show background in the left 8 pixels.
        const BG_LEFT = 0b0000_0010;
        /// Show sprites in the left 8 pixels.
        const SPRITE_LEFT = 0b0000_0100;
        /// Background rendering enable.
        const SHOW_BG = 0b0000_1000;
        /// Sprite rendering enable.
        const SHOW_SPRITES = 0b0001_0000;
        /// Red emphasis.
        const EMPHASIZE_RED = 0b0010_0000;
        /// Green emphasis.
        const EMPHASIZE_GREEN = 0b0100_0000;
        /// Blue emphasis.
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl PpuMask {
    /// Background or sprite rendering enabled.
    #[inline]
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BG | Self::SHOW_SPRITES)
    }

    /// Background visible at screen column `x`.
    #[inline]
    #[must_use]
    pub fn bg_visible_at(self, x: u16) -> bool {
        self.contains(Self::SHOW_BG) && (x >= 8 || self.contains(Self::BG_LEFT))
    }

    /// Sprites visible at screen column `x`.
    #[inline]
    #[must_use]
    pub fn sprites_visible_at(self, x: u16) -> bool {
        self.contains(Self::SHOW_SPRITES) && (x >= 8 || self.contains(Self::SPRITE_LEFT))
    }
}

bitflags! {
    /// PPUSTATUS ($2002), read only. Only the top three bits are driven;
    /// the rest read back as open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        /// More than 8 sprites matched one scanline.
        const SPRITE_OVERFLOW = 0b0010_0000;
        /// Opaque sprite-0 pixel met an opaque background pixel.
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Vertical blank in progress.
        const VBLANK = 0b1000_0000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_accessors() {
        let ctrl = PpuCtrl::from_bits_truncate(0b1011_1100);
        assert!(ctrl.nmi_enabled());
        assert_eq!(ctrl.vram_increment(), 32);
        assert_eq!(ctrl.sprite_table_addr(), 0x1000);
        assert_eq!(ctrl.bg_table_addr(), 0x1000);
        assert_eq!(ctrl.sprite_height(), 16);

        assert_eq!(PpuCtrl::empty().vram_increment(), 1);
        assert_eq!(PpuCtrl::empty().sprite_height(), 8);
    }

    #[test]
    fn mask_rendering_enable() {
        assert!(!PpuMask::empty().rendering_enabled());
        assert!(PpuMask::SHOW_BG.rendering_enabled());
        assert!(PpuMask::SHOW_SPRITES.rendering_enabled());
    }

    #[test]
    fn mask_left_column_gates() {
        let mask = PpuMask::SHOW_BG;
        assert!(!mask.bg_visible_at(0));
        assert!(mask.bg_visible_at(8));

        let mask = PpuMask::SHOW_BG | PpuMask::BG_LEFT;
        assert!(mask.bg_visible_at(0));

        assert!(!PpuMask::SHOW_BG.sprites_visible_at(100));
    }
}
