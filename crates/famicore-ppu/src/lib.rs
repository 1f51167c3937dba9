//! Ricoh 2C02 PPU emulator for NES.
//!
//! A per-dot state machine: 262 scanlines of 341 dots, one pixel per
//! visible dot, delivered through a host callback as it is produced —
//! the PPU keeps no frame buffer. CPU-visible registers ($2000-$2007)
//! implement the full side-effect surface: PPUSTATUS read clears
//! VBlank and the write latch, PPUDATA reads are buffered below the
//! palettes, the two-pass scroll/address writes share the w toggle.
//!
//! Pattern tables and nametables are reached through the [`PpuBus`]
//! trait, served by the cartridge mapper; palette RAM lives inside the
//! PPU.

mod background;
mod oam;
mod palette;
mod ppu;
mod registers;
mod scroll;
mod sprites;

pub use oam::{Oam, SecondaryOam, Sprite, SpriteAttributes};
pub use palette::{rgb, PaletteRam, NES_PALETTE};
pub use ppu::{
    PixelSink, Ppu, PpuBus, DOTS_PER_SCANLINE, SCANLINES_PER_FRAME, VISIBLE_HEIGHT, VISIBLE_WIDTH,
};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::Scroll;
pub use sprites::{SpriteEvaluator, SpritePixel, SpriteScanline};
