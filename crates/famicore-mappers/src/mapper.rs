//! Mapper trait and the banked address window helper.
//!
//! A mapper sits in two address spaces at once: the CPU side ($8000-$FFFF
//! PRG) and the PPU side ($0000-$1FFF CHR, $2000-$3EFF nametables). The
//! nametable CIRAM lives inside the mapper because the board, not the
//! console, decides how the four logical tables fold onto the two
//! physical banks.

/// Nametable arrangement wired by the cartridge.
///
/// Horizontal arrangement puts two distinct tables side by side
/// ($2000 ≠ $2400, $2800 mirrors $2000); vertical stacks them
/// ($2000 ≠ $2800, $2400 mirrors $2000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NametableArrangement {
    /// Slots 0..4 map to CIRAM banks 0,1,0,1.
    Horizontal,
    /// Slots 0..4 map to CIRAM banks 0,0,1,1.
    #[default]
    Vertical,
}

/// Cartridge capability contract seen by the bus and the PPU.
pub trait Mapper {
    /// Read a PRG byte. Defined for CPU addresses at $8000 and above.
    fn cpu_read(&self, addr: u16) -> u8;

    /// Write into PRG space. Mapper registers live here on banked boards;
    /// boards without registers ignore the write.
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// Read from PPU space: CHR below $2000, nametables in $2000-$3EFF.
    fn ppu_read(&self, addr: u16) -> u8;

    /// Write into PPU space: CHR RAM (when present) below $2000,
    /// nametable CIRAM in $2000-$3EFF.
    fn ppu_write(&mut self, addr: u16, value: u8);

    /// The board's nametable arrangement.
    fn arrangement(&self) -> NametableArrangement;

    /// iNES mapper id.
    fn mapper_id(&self) -> u8;

    /// Human-readable board name.
    fn name(&self) -> &'static str;
}

/// Fixed-size banked window over a backing buffer.
///
/// Maps addresses in `[start, start + SLOTS * slot_size)` to byte offsets:
/// the slot index picks a base offset from the table, the remainder is the
/// offset within the bank. Slot tables are rewritten by banked mappers and
/// fixed after construction on unbanked ones.
#[derive(Debug, Clone, Copy)]
pub struct BankWindow<const SLOTS: usize> {
    start: u16,
    slot_size: u16,
    slots: [usize; SLOTS],
}

impl<const SLOTS: usize> BankWindow<SLOTS> {
    /// Build a window starting at `start` with `SLOTS` slots of
    /// `slot_size` bytes each, backed at the given base offsets.
    #[must_use]
    pub const fn new(start: u16, slot_size: u16, slots: [usize; SLOTS]) -> Self {
        Self {
            start,
            slot_size,
            slots,
        }
    }

    /// Translate an address to a backing-buffer offset.
    ///
    /// # Panics
    ///
    /// Addresses outside the window are internal invariant violations
    /// (a bus decode bug, not bad input) and abort with a clear message.
    #[must_use]
    pub fn offset(&self, addr: u16) -> usize {
        let rel = addr.checked_sub(self.start).unwrap_or_else(|| {
            panic!("address ${addr:04X} out of range: below window ${:04X}", self.start)
        });
        let slot = usize::from(rel / self.slot_size);
        assert!(
            slot < SLOTS,
            "address ${addr:04X} out of range: past slot {SLOTS} of window ${:04X}",
            self.start
        );
        self.slots[slot] + usize::from(rel % self.slot_size)
    }

    /// Replace one slot's base offset.
    pub fn set_slot(&mut self, slot: usize, base: usize) {
        self.slots[slot] = base;
    }
}

impl NametableArrangement {
    /// CIRAM base offsets for the four nametable slots, 1 KiB banks.
    #[must_use]
    pub const fn ciram_slots(self) -> [usize; 4] {
        match self {
            Self::Horizontal => [0x0000, 0x0400, 0x0000, 0x0400],
            Self::Vertical => [0x0000, 0x0000, 0x0400, 0x0400],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_maps_slot_and_remainder() {
        let window = BankWindow::new(0x8000, 0x4000, [0x0000, 0x4000]);
        assert_eq!(window.offset(0x8000), 0x0000);
        assert_eq!(window.offset(0x8001), 0x0001);
        assert_eq!(window.offset(0xC000), 0x4000);
        assert_eq!(window.offset(0xFFFF), 0x7FFF);
    }

    #[test]
    fn window_honors_slot_table() {
        // 16 KiB image mirrored across both slots.
        let window = BankWindow::new(0x8000, 0x4000, [0x0000, 0x0000]);
        assert_eq!(window.offset(0xC000), 0x0000);
        assert_eq!(window.offset(0xFFFC), 0x3FFC);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn window_rejects_low_address() {
        let window = BankWindow::new(0x8000, 0x4000, [0, 0]);
        let _ = window.offset(0x7FFF);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn offset_matches_slot_formula(addr in 0x8000u16..=0xFFFF) {
                let window = BankWindow::new(0x8000, 0x4000, [0x0000, 0x4000]);
                prop_assert_eq!(window.offset(addr), usize::from(addr - 0x8000));
            }

            #[test]
            fn mirrored_slots_alias(addr in 0x8000u16..=0xBFFF) {
                let window = BankWindow::new(0x8000, 0x4000, [0x0000, 0x0000]);
                prop_assert_eq!(window.offset(addr), window.offset(addr + 0x4000));
            }
        }
    }

    #[test]
    fn horizontal_arrangement_pairs_columns() {
        let slots = NametableArrangement::Horizontal.ciram_slots();
        assert_eq!(slots, [0x0000, 0x0400, 0x0000, 0x0400]);
    }

    #[test]
    fn vertical_arrangement_pairs_rows() {
        let slots = NametableArrangement::Vertical.ciram_slots();
        assert_eq!(slots, [0x0000, 0x0000, 0x0400, 0x0400]);
    }
}
