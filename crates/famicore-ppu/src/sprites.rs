//! Sprite evaluation and scanline rendering.
//!
//! During a visible scanline the evaluator scans primary OAM (one entry
//! every third dot across dots 65-256) for sprites overlapping the next
//! scanline, filling secondary OAM and latching overflow past eight.
//! Dots 257-320 fetch pattern data for the selected sprites into eight
//! scanline units; during the next scanline the units count down X and
//! shift out pixels, first opaque unit wins.

use crate::oam::{Oam, SecondaryOam, Sprite, SpriteAttributes};

/// Sprite pixel produced by the scanline units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePixel {
    /// 2-bit pattern value, never 0.
    pub pattern: u8,
    /// Sprite palette select (0-3).
    pub palette: u8,
    /// Renders behind opaque background.
    pub behind_background: bool,
    /// Pixel belongs to OAM sprite 0.
    pub sprite_zero: bool,
}

/// Incremental secondary-OAM fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteEvaluator {
    next_entry: u8,
}

impl SpriteEvaluator {
    /// Start a fresh scan (dot 65).
    pub fn begin(&mut self) {
        self.next_entry = 0;
    }

    /// Examine one OAM entry against the next scanline. Returns true
    /// when a ninth in-range sprite was found (overflow).
    pub fn step(
        &mut self,
        oam: &Oam,
        scanline: u16,
        sprite_height: u16,
        secondary: &mut SecondaryOam,
    ) -> bool {
        if self.next_entry >= 64 {
            return false;
        }
        let index = self.next_entry;
        self.next_entry += 1;

        let sprite = oam.sprite(index);
        // OAM Y holds the top scanline minus one; evaluation during
        // scanline N selects sprites shown on N+1.
        let row = scanline.wrapping_sub(u16::from(sprite.y));
        if row >= sprite_height {
            return false;
        }

        !secondary.push(sprite, row, index == 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SpriteUnit {
    x_counter: u8,
    attributes: SpriteAttributes,
    pattern_low: u8,
    pattern_high: u8,
    sprite_zero: bool,
    loaded: bool,
}

/// The eight per-scanline sprite units.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteScanline {
    units: [SpriteUnit; 8],
}

impl SpriteScanline {
    /// Drop all units (dot 257, before the fetches refill them).
    pub fn clear(&mut self) {
        self.units = [SpriteUnit::default(); 8];
    }

    /// Load one unit with fetched pattern data. Horizontal flip must be
    /// applied by the caller (bit-reversed planes).
    pub fn load(
        &mut self,
        slot: usize,
        sprite: &Sprite,
        pattern_low: u8,
        pattern_high: u8,
        sprite_zero: bool,
    ) {
        self.units[slot] = SpriteUnit {
            x_counter: sprite.x,
            attributes: sprite.attributes,
            pattern_low,
            pattern_high,
            sprite_zero,
            loaded: true,
        };
    }

    /// Advance one dot: inactive units count down X, active units shift.
    pub fn tick(&mut self) {
        for unit in &mut self.units {
            if !unit.loaded {
                continue;
            }
            if unit.x_counter > 0 {
                unit.x_counter -= 1;
            } else {
                unit.pattern_low <<= 1;
                unit.pattern_high <<= 1;
            }
        }
    }

    /// First opaque pixel among active units, in OAM priority order.
    #[must_use]
    pub fn pixel(&self) -> Option<SpritePixel> {
        for unit in &self.units {
            if !unit.loaded || unit.x_counter != 0 {
                continue;
            }
            let low = u8::from(unit.pattern_low & 0x80 != 0);
            let high = u8::from(unit.pattern_high & 0x80 != 0);
            let pattern = low | (high << 1);
            if pattern == 0 {
                continue;
            }
            return Some(SpritePixel {
                pattern,
                palette: unit.attributes.palette(),
                behind_background: unit.attributes.behind_background(),
                sprite_zero: unit.sprite_zero,
            });
        }
        None
    }
}
